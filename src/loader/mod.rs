pub mod spreadsheet_loader;

pub use spreadsheet_loader::*;
