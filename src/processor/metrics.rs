use serde::{Deserialize, Serialize};

/// Trailing slice of the chronologically sorted month sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Window {
    All,
    Last(usize),
}

impl Window {
    /// The `K` latest entries, or the whole series when it is shorter.
    pub fn slice<'a, T>(&self, series: &'a [T]) -> &'a [T] {
        match *self {
            Window::All => series,
            Window::Last(k) => &series[series.len().saturating_sub(k)..],
        }
    }

    /// Number of months this window actually covers on a series of `available` months.
    pub fn effective_len(&self, available: usize) -> usize {
        match *self {
            Window::All => available,
            Window::Last(k) => k.min(available),
        }
    }

    pub fn is_truncated(&self, available: usize) -> bool {
        matches!(*self, Window::Last(k) if k > available)
    }
}

pub fn frequency(amounts: &[f64]) -> usize {
    amounts.iter().filter(|&&a| a > 0.0).count()
}

pub fn total(amounts: &[f64]) -> f64 {
    amounts.iter().sum()
}

/// Average over months with a purchase; 0 when there are none.
pub fn average_nonzero(amounts: &[f64]) -> f64 {
    match frequency(amounts) {
        0 => 0.0,
        f => total(amounts) / f as f64,
    }
}

/// Average over every month of the slice, zero months included.
pub fn average_inclusive(amounts: &[f64]) -> f64 {
    if amounts.is_empty() {
        0.0
    } else {
        total(amounts) / amounts.len() as f64
    }
}

pub fn has_recent_activity(recent: &[f64]) -> bool {
    recent.iter().any(|&a| a > 0.0)
}

/// All metrics of one window, computed in a single place so callers never
/// mix the two average definitions by accident.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PurchaseMetrics {
    pub months: usize,
    pub frequency: usize,
    pub total: f64,
    pub average_nonzero: f64,
    pub average_inclusive: f64,
}

impl PurchaseMetrics {
    pub fn compute(amounts: &[f64], window: Window) -> Self {
        let slice = window.slice(amounts);
        Self {
            months: slice.len(),
            frequency: frequency(slice),
            total: total(slice),
            average_nonzero: average_nonzero(slice),
            average_inclusive: average_inclusive(slice),
        }
    }
}
