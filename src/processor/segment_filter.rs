use crate::error::Result;
use crate::models::{CustomerClass, CustomerDataset};
use crate::processor::classifier::{ClassifiedCustomer, class_distribution};
use crate::processor::metrics::{Window, average_inclusive, frequency};
use polars::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;
use tracing::{info, warn};

/// User-chosen segment constraints. An empty category set selects nobody;
/// categories match ignoring case and surrounding whitespace.
#[derive(Debug, Clone)]
pub struct SegmentQuery {
    pub categories: BTreeSet<String>,
    pub frequency: RangeInclusive<usize>,
    pub average: RangeInclusive<f64>,
    pub window: Window,
}

impl SegmentQuery {
    /// Unbounded ranges over the given categories.
    pub fn for_categories<I, S>(categories: I, window_months: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
            frequency: 0..=usize::MAX,
            average: 0.0..=f64::MAX,
            window: Window::Last(window_months),
        }
    }

    pub fn with_frequency(mut self, range: RangeInclusive<usize>) -> Self {
        self.frequency = range;
        self
    }

    pub fn with_average(mut self, range: RangeInclusive<f64>) -> Self {
        self.average = range;
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SegmentMember<'a> {
    #[serde(flatten)]
    pub customer: ClassifiedCustomer<'a>,
    pub frequency: usize,
    pub average_inclusive: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Segment<'a> {
    /// Months actually covered by the window
    pub window_months: usize,
    /// Fewer months were available than the query asked for
    pub window_truncated: bool,
    pub members: Vec<SegmentMember<'a>>,
}

impl<'a> Segment<'a> {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn class_distribution(&self) -> BTreeMap<CustomerClass, usize> {
        class_distribution(self.members.iter().map(|m| m.customer.class))
    }

    /// Tabular view of the segment for export.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let record = |m: &SegmentMember<'a>| m.customer.record;

        let df = DataFrame::new(vec![
            Column::new(
                "CODIGO".into(),
                self.members.iter().map(|m| record(m).code.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                "NOM_LEGAL".into(),
                self.members.iter().map(|m| record(m).legal_name.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                "CLASE".into(),
                self.members
                    .iter()
                    .map(|m| record(m).effective_category.clone())
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                "E_MAIL".into(),
                self.members.iter().map(|m| record(m).email.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                "TELEFONO".into(),
                self.members.iter().map(|m| record(m).phone.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                "PROVINCIA".into(),
                self.members.iter().map(|m| record(m).province.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                "CLASE_CLIENTE".into(),
                self.members
                    .iter()
                    .map(|m| m.customer.class.label())
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                format!("FRECUENCIA_{}M", self.window_months).into(),
                self.members.iter().map(|m| m.frequency as u32).collect::<Vec<_>>(),
            ),
            Column::new(
                format!("PROMEDIO_{}M", self.window_months).into(),
                self.members.iter().map(|m| m.average_inclusive).collect::<Vec<_>>(),
            ),
        ])?;

        Ok(df)
    }
}

fn category_key(category: &str) -> String {
    category.trim().to_uppercase()
}

pub struct SegmentFilter;

impl SegmentFilter {
    /// `population` is the classified form of `dataset`.
    pub fn apply<'a>(
        &self,
        dataset: &CustomerDataset,
        population: &[ClassifiedCustomer<'a>],
        query: &SegmentQuery,
    ) -> Segment<'a> {
        let months = dataset.months.len();
        let window_months = query.window.effective_len(months);
        let window_truncated = query.window.is_truncated(months);

        if window_truncated {
            warn!(
                "Only {} months available; segment metrics use all of them instead of {:?}",
                months, query.window
            );
        }

        let selected: BTreeSet<String> = query.categories.iter().map(|c| category_key(c)).collect();
        let in_category: Vec<&ClassifiedCustomer<'a>> = population
            .iter()
            .filter(|c| selected.contains(&category_key(&c.record.effective_category)))
            .collect();
        let after_category = in_category.len();

        let members: Vec<SegmentMember<'a>> = in_category
            .into_iter()
            .map(|customer| {
                let slice = query.window.slice(&customer.record.amounts);
                SegmentMember {
                    customer: *customer,
                    frequency: frequency(slice),
                    average_inclusive: average_inclusive(slice),
                }
            })
            .filter(|m| query.frequency.contains(&m.frequency) && query.average.contains(&m.average_inclusive))
            .collect();

        info!(
            "Segment funnel: {} customers, {} in selected categories, {} within ranges ({} month window)",
            population.len(),
            after_category,
            members.len(),
            window_months
        );

        Segment {
            window_months,
            window_truncated,
            members,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassificationConfig;
    use crate::models::{CustomerDataset, CustomerRecord, MonthColumn};
    use crate::processor::classifier::CustomerClassifier;

    fn record(code: &str, category: &str, amounts: Vec<f64>) -> CustomerRecord {
        CustomerRecord {
            code: code.to_string(),
            legal_name: format!("Cliente {}", code),
            category_raw: category.to_string(),
            effective_category: category.to_string(),
            email: None,
            phone: Some("555".to_string()),
            province: None,
            amounts,
        }
    }

    fn dataset(months: usize, customers: Vec<CustomerRecord>) -> CustomerDataset {
        CustomerDataset {
            months: (1..=months as u32)
                .map(|index| MonthColumn {
                    header: format!("2024_MES_{}", index),
                    period: 2024,
                    index,
                })
                .collect(),
            customers,
        }
    }

    fn fourteen_month_dataset() -> CustomerDataset {
        let mut early_spender = vec![0.0; 14];
        early_spender[0] = 9_000_000.0;
        early_spender[1] = 9_000_000.0;

        dataset(
            14,
            vec![
                record("1", "COMERCIO", vec![100_000.0; 14]),
                record("2", "COMERCIO", early_spender),
                record("3", "DISTRIBUIDOR", vec![1_000_000.0; 14]),
                record("4", "COMERCIO", {
                    let mut a = vec![0.0; 14];
                    a[13] = 1_200_000.0;
                    a
                }),
            ],
        )
    }

    fn apply(data: &CustomerDataset, query: &SegmentQuery) -> Vec<String> {
        let classifier = CustomerClassifier::new(&ClassificationConfig::default());
        let population = classifier.classify_all(data);
        SegmentFilter
            .apply(data, &population, query)
            .members
            .iter()
            .map(|m| m.customer.record.code.clone())
            .collect()
    }

    #[test]
    fn test_empty_category_selection_selects_nobody() {
        let data = fourteen_month_dataset();
        let query = SegmentQuery::for_categories(Vec::<String>::new(), 12);
        assert!(apply(&data, &query).is_empty());
    }

    #[test]
    fn test_category_filter() {
        let data = fourteen_month_dataset();
        let query = SegmentQuery::for_categories(["DISTRIBUIDOR"], 12);
        assert_eq!(apply(&data, &query), vec!["3"]);
    }

    #[test]
    fn test_category_match_ignores_case() {
        let data = fourteen_month_dataset();
        let query = SegmentQuery::for_categories([" distribuidor "], 12);
        assert_eq!(apply(&data, &query), vec!["3"]);
    }

    #[test]
    fn test_window_excludes_older_months() {
        let data = fourteen_month_dataset();
        // customer 2 only bought in the first two of fourteen months
        let query = SegmentQuery::for_categories(["COMERCIO"], 12).with_frequency(1..=12);
        assert_eq!(apply(&data, &query), vec!["1", "4"]);
    }

    #[test]
    fn test_average_range_uses_inclusive_average() {
        let data = fourteen_month_dataset();
        // customer 4: one purchase of 1.2M over 12 months => 100k inclusive
        let query = SegmentQuery::for_categories(["COMERCIO"], 12)
            .with_frequency(1..=1)
            .with_average(100_000.0..=100_000.0);
        assert_eq!(apply(&data, &query), vec!["4"]);
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let data = fourteen_month_dataset();
        let query = SegmentQuery::for_categories(["COMERCIO", "DISTRIBUIDOR"], 12)
            .with_frequency(12..=12)
            .with_average(100_000.0..=1_000_000.0);
        assert_eq!(apply(&data, &query), vec!["1", "3"]);
    }

    #[test]
    fn test_short_dataset_uses_available_months() {
        let data = dataset(5, vec![record("9", "COMERCIO", vec![0.0, 10.0, 0.0, 10.0, 0.0])]);
        let classifier = CustomerClassifier::new(&ClassificationConfig::default());
        let population = classifier.classify_all(&data);
        let query = SegmentQuery::for_categories(["COMERCIO"], 12);
        let segment = SegmentFilter.apply(&data, &population, &query);

        assert_eq!(segment.window_months, 5);
        assert!(segment.window_truncated);
        assert_eq!(segment.members[0].frequency, 2);
        assert_eq!(segment.members[0].average_inclusive, 4.0);
    }

    #[test]
    fn test_segment_keeps_class_and_exports() {
        let data = fourteen_month_dataset();
        let classifier = CustomerClassifier::new(&ClassificationConfig::default());
        let population = classifier.classify_all(&data);
        let query = SegmentQuery::for_categories(["COMERCIO", "DISTRIBUIDOR"], 12);
        let segment = SegmentFilter.apply(&data, &population, &query);

        let distribution = segment.class_distribution();
        assert_eq!(distribution[&CustomerClass::Habitual], 1);
        assert_eq!(distribution[&CustomerClass::Inactive], 1);
        assert_eq!(distribution[&CustomerClass::Potential], 2);

        let df = segment.to_dataframe().unwrap();
        assert_eq!(df.height(), 4);
        assert!(df.column("FRECUENCIA_12M").is_ok());
        assert!(df.column("PROMEDIO_12M").is_ok());
    }
}
