use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A retained month column, ordered by `(period, index)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthColumn {
    /// Normalized header, e.g. `2024_2025_MES_3`
    pub header: String,
    /// Leading year token; 0 when the header does not start with digits
    pub period: u32,
    /// Trailing month index
    pub index: u32,
}

impl MonthColumn {
    pub fn sort_key(&self) -> (u32, u32) {
        (self.period, self.index)
    }
}

impl Ord for MonthColumn {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.header.cmp(&other.header))
    }
}

impl PartialOrd for MonthColumn {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One point of a customer's purchase history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthAmount {
    pub month: String,
    pub amount: f64,
}
