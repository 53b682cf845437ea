use crate::config::ClassificationConfig;
use crate::models::{CustomerClass, CustomerDataset, CustomerRecord};
use crate::processor::metrics::{Window, average_nonzero, frequency, has_recent_activity};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

const GOLD_MIN_FREQUENCY: usize = 8;
const REGULAR_FREQUENCY: RangeInclusive<usize> = 6..=7;
const SPORADIC_FREQUENCY: RangeInclusive<usize> = 4..=5;
const INACTIVE_FREQUENCY: RangeInclusive<usize> = 1..=3;

/// Rule-based marketing classifier over the full purchase history.
///
/// Rules are evaluated in order and the first match wins:
///
/// 1. no purchases, or a per-purchase average below `min_average` => potencial
/// 2. nothing in the recency window and 1..=3 purchases => inactivo
/// 3. 8+ purchases => habitualgold above `gold_average`, habitual otherwise
/// 4. 6..=7 purchases => regular
/// 5. 4..=5 purchases => esporadico
#[derive(Debug, Clone)]
pub struct CustomerClassifier {
    min_average: f64,
    gold_average: f64,
    recency: Window,
}

impl CustomerClassifier {
    pub fn new(config: &ClassificationConfig) -> Self {
        Self {
            min_average: config.min_average,
            gold_average: config.gold_average,
            recency: Window::Last(config.recency_months),
        }
    }

    pub fn classify_amounts(&self, amounts: &[f64]) -> CustomerClass {
        let frequency = frequency(amounts);
        let average = average_nonzero(amounts);

        if frequency == 0 || average < self.min_average {
            return CustomerClass::Potential;
        }

        let recent = has_recent_activity(self.recency.slice(amounts));
        if !recent && INACTIVE_FREQUENCY.contains(&frequency) {
            return CustomerClass::Inactive;
        }

        if frequency >= GOLD_MIN_FREQUENCY {
            return if average > self.gold_average {
                CustomerClass::HabitualGold
            } else {
                CustomerClass::Habitual
            };
        }

        if REGULAR_FREQUENCY.contains(&frequency) {
            return CustomerClass::Regular;
        }

        if SPORADIC_FREQUENCY.contains(&frequency) {
            return CustomerClass::Sporadic;
        }

        CustomerClass::Potential
    }

    pub fn classify(&self, record: &CustomerRecord) -> CustomerClass {
        self.classify_amounts(&record.amounts)
    }

    pub fn classify_all<'a>(&self, dataset: &'a CustomerDataset) -> Vec<ClassifiedCustomer<'a>> {
        dataset
            .customers
            .iter()
            .map(|record| ClassifiedCustomer {
                record,
                class: self.classify(record),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassifiedCustomer<'a> {
    #[serde(flatten)]
    pub record: &'a CustomerRecord,
    pub class: CustomerClass,
}

/// Members per class, with every class present (zero when unused).
pub fn class_distribution<I>(classes: I) -> BTreeMap<CustomerClass, usize>
where
    I: IntoIterator<Item = CustomerClass>,
{
    let mut counts: BTreeMap<CustomerClass, usize> =
        CustomerClass::ALL.into_iter().map(|c| (c, 0)).collect();
    for class in classes {
        *counts.entry(class).or_default() += 1;
    }
    counts
}

/// Class counts over a whole classified population.
pub fn population_summary(population: &[ClassifiedCustomer<'_>]) -> BTreeMap<CustomerClass, usize> {
    class_distribution(population.iter().map(|c| c.class))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> CustomerClassifier {
        CustomerClassifier::new(&ClassificationConfig::default())
    }

    /// `early` purchases at the start of a 12-month series and `recent`
    /// purchases at its end, all of `amount`.
    fn series(early: usize, recent: usize, amount: f64) -> Vec<f64> {
        let mut amounts = vec![0.0; 12];
        for slot in amounts.iter_mut().take(early) {
            *slot = amount;
        }
        for slot in amounts.iter_mut().rev().take(recent) {
            *slot = amount;
        }
        amounts
    }

    #[test]
    fn test_no_purchases_is_potential() {
        assert_eq!(classifier().classify_amounts(&[0.0; 12]), CustomerClass::Potential);
        assert_eq!(classifier().classify_amounts(&[0.0]), CustomerClass::Potential);
    }

    #[test]
    fn test_low_average_is_potential_regardless_of_frequency() {
        let amounts = [299_999.0; 12];
        assert_eq!(classifier().classify_amounts(&amounts), CustomerClass::Potential);
    }

    #[test]
    fn test_average_at_floor_is_not_potential() {
        let amounts = series(0, 6, 300_000.0);
        assert_eq!(classifier().classify_amounts(&amounts), CustomerClass::Regular);
    }

    #[test]
    fn test_nine_months_at_400k_is_habitual() {
        let amounts = [
            0.0, 0.0, 0.0, 400_000.0, 400_000.0, 400_000.0, 400_000.0, 400_000.0, 400_000.0,
            400_000.0, 400_000.0, 400_000.0,
        ];
        assert_eq!(classifier().classify_amounts(&amounts), CustomerClass::Habitual);
    }

    #[test]
    fn test_gold_requires_average_above_threshold() {
        assert_eq!(
            classifier().classify_amounts(&[5_000_001.0; 8]),
            CustomerClass::HabitualGold
        );
        assert_eq!(
            classifier().classify_amounts(&[5_000_000.0; 8]),
            CustomerClass::Habitual
        );
    }

    #[test]
    fn test_regular_band() {
        assert_eq!(classifier().classify_amounts(&series(1, 5, 500_000.0)), CustomerClass::Regular);
        assert_eq!(classifier().classify_amounts(&series(2, 5, 500_000.0)), CustomerClass::Regular);
    }

    #[test]
    fn test_five_recent_purchases_at_310k_is_sporadic() {
        let amounts = series(0, 5, 310_000.0);
        assert_eq!(classifier().classify_amounts(&amounts), CustomerClass::Sporadic);
    }

    #[test]
    fn test_two_old_purchases_is_inactive() {
        let amounts = series(2, 0, 900_000.0);
        assert_eq!(classifier().classify_amounts(&amounts), CustomerClass::Inactive);
    }

    #[test]
    fn test_inactive_band_edges() {
        assert_eq!(classifier().classify_amounts(&series(3, 0, 900_000.0)), CustomerClass::Inactive);
        // four old purchases fall through to the frequency bands
        assert_eq!(classifier().classify_amounts(&series(4, 0, 900_000.0)), CustomerClass::Sporadic);
    }

    #[test]
    fn test_low_average_wins_over_inactivity() {
        let amounts = series(2, 0, 1_000.0);
        assert_eq!(classifier().classify_amounts(&amounts), CustomerClass::Potential);
    }

    #[test]
    fn test_recent_low_frequency_falls_back_to_potential() {
        let amounts = series(0, 2, 900_000.0);
        assert_eq!(classifier().classify_amounts(&amounts), CustomerClass::Potential);
    }

    #[test]
    fn test_short_history_uses_all_months_for_recency() {
        // three months only: the recency window covers the whole series
        assert_eq!(
            classifier().classify_amounts(&[0.0, 0.0, 700_000.0]),
            CustomerClass::Potential
        );
    }

    #[test]
    fn test_class_distribution_lists_every_class() {
        let counts = class_distribution([CustomerClass::Regular, CustomerClass::Regular]);
        assert_eq!(counts.len(), 6);
        assert_eq!(counts[&CustomerClass::Regular], 2);
        assert_eq!(counts[&CustomerClass::Inactive], 0);
    }
}
