pub mod customer;
pub mod dataset;
pub mod month;

pub use customer::*;
pub use dataset::*;
pub use month::*;
