use crate::error::{Result, SegmentError};
use crate::models::{CustomerDataset, CustomerRecord};
use crate::processor::tables::{GoalTable, UNDEFINED_DISCOUNT};
use serde::Serialize;

/// Month positions used for goal evaluation: `current` drives the
/// shortfall, `comparison` decides whether the goal was met.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthPair {
    pub current: usize,
    pub comparison: Option<usize>,
}

impl MonthPair {
    /// The two latest months; no comparison month on a single-month dataset.
    pub fn latest(dataset: &CustomerDataset) -> Result<Self> {
        let len = dataset.months.len();
        if len == 0 {
            return Err(SegmentError::NoMonthColumns);
        }

        Ok(Self {
            current: len - 1,
            comparison: len.checked_sub(2),
        })
    }

    /// Chosen months by header; whichever side is not given falls back
    /// to its value in [`MonthPair::latest`].
    pub fn resolve(dataset: &CustomerDataset, current: Option<&str>, comparison: Option<&str>) -> Result<Self> {
        let latest = Self::latest(dataset)?;
        let position = |header: &str| {
            dataset
                .month_position(header)
                .ok_or_else(|| SegmentError::UnknownMonth(header.to_string()))
        };

        Ok(Self {
            current: current.map(position).transpose()?.unwrap_or(latest.current),
            comparison: match comparison {
                Some(header) => Some(position(header)?),
                None => latest.comparison,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalEvaluation {
    pub current_month: String,
    pub comparison_month: Option<String>,
    pub goal_defined: bool,
    pub goal_amount: f64,
    pub discount_label: String,
    pub current_amount: f64,
    pub comparison_amount: Option<f64>,
    /// None when there is no comparison month
    pub met_goal: Option<bool>,
    pub shortfall: f64,
}

pub struct GoalEvaluator<'a> {
    goals: &'a GoalTable,
}

impl<'a> GoalEvaluator<'a> {
    pub fn new(goals: &'a GoalTable) -> Self {
        Self { goals }
    }

    pub fn evaluate(&self, dataset: &CustomerDataset, record: &CustomerRecord, pair: MonthPair) -> GoalEvaluation {
        let (goal_defined, goal_amount, discount_label) = match self.goals.get(&record.effective_category) {
            Some(goal) => (true, goal.target_amount, goal.discount_label.clone()),
            None => (false, 0.0, UNDEFINED_DISCOUNT.to_string()),
        };

        let amount_at = |position: usize| record.amounts.get(position).copied().unwrap_or(0.0);
        let header_at = |position: usize| {
            dataset
                .months
                .get(position)
                .map(|m| m.header.clone())
                .unwrap_or_default()
        };

        let current_amount = amount_at(pair.current);
        let comparison_amount = pair.comparison.map(amount_at);

        GoalEvaluation {
            current_month: header_at(pair.current),
            comparison_month: pair.comparison.map(header_at),
            goal_defined,
            goal_amount,
            discount_label,
            current_amount,
            comparison_amount,
            met_goal: comparison_amount.map(|amount| amount >= goal_amount),
            shortfall: (goal_amount - current_amount).max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SegmentationConfig;
    use crate::models::MonthColumn;

    fn dataset(amounts: Vec<f64>, category: &str) -> CustomerDataset {
        let months = (1..=amounts.len() as u32)
            .map(|index| MonthColumn {
                header: format!("2024_MES_{}", index),
                period: 2024,
                index,
            })
            .collect();

        CustomerDataset {
            months,
            customers: vec![CustomerRecord {
                code: "1".to_string(),
                legal_name: "Cliente".to_string(),
                category_raw: category.to_string(),
                effective_category: category.to_string(),
                email: None,
                phone: None,
                province: None,
                amounts,
            }],
        }
    }

    fn goals() -> GoalTable {
        GoalTable::from_config(&SegmentationConfig::default())
    }

    #[test]
    fn test_goal_met_on_comparison_month() {
        let data = dataset(vec![0.0, 1_200_000.0, 400_000.0], "COMERCIO");
        let goals = goals();
        let pair = MonthPair::latest(&data).unwrap();
        let result = GoalEvaluator::new(&goals).evaluate(&data, &data.customers[0], pair);

        assert_eq!(result.current_month, "2024_MES_3");
        assert_eq!(result.comparison_month.as_deref(), Some("2024_MES_2"));
        assert_eq!(result.goal_amount, 1_100_000.0);
        assert_eq!(result.discount_label, "NC 10%");
        assert_eq!(result.met_goal, Some(true));
        assert_eq!(result.shortfall, 700_000.0);
    }

    #[test]
    fn test_shortfall_never_negative() {
        let data = dataset(vec![0.0, 6_000_000.0], "DISTRIBUIDOR");
        let goals = goals();
        let pair = MonthPair::latest(&data).unwrap();
        let result = GoalEvaluator::new(&goals).evaluate(&data, &data.customers[0], pair);

        assert_eq!(result.met_goal, Some(false));
        assert_eq!(result.shortfall, 0.0);
    }

    #[test]
    fn test_unknown_category_has_undefined_goal() {
        let data = dataset(vec![10.0, 20.0], "MAYORISTA");
        let goals = goals();
        let pair = MonthPair::latest(&data).unwrap();
        let result = GoalEvaluator::new(&goals).evaluate(&data, &data.customers[0], pair);

        assert!(!result.goal_defined);
        assert_eq!(result.goal_amount, 0.0);
        assert_eq!(result.discount_label, "undefined");
        assert_eq!(result.shortfall, 0.0);
    }

    #[test]
    fn test_single_month_has_no_comparison() {
        let data = dataset(vec![500_000.0], "COMERCIO");
        let goals = goals();
        let pair = MonthPair::latest(&data).unwrap();
        assert_eq!(pair.comparison, None);

        let result = GoalEvaluator::new(&goals).evaluate(&data, &data.customers[0], pair);
        assert_eq!(result.met_goal, None);
        assert_eq!(result.comparison_month, None);
        assert_eq!(result.shortfall, 600_000.0);
    }

    #[test]
    fn test_explicit_month_pair() {
        let data = dataset(vec![1_100_000.0, 0.0, 0.0], "COMERCIO");
        let pair = MonthPair::resolve(&data, Some("2024_MES_2"), Some("2024_MES_1")).unwrap();
        assert_eq!(pair, MonthPair { current: 1, comparison: Some(0) });

        let goals = goals();
        let result = GoalEvaluator::new(&goals).evaluate(&data, &data.customers[0], pair);
        assert_eq!(result.met_goal, Some(true));

        assert!(matches!(
            MonthPair::resolve(&data, Some("2030_MES_1"), None),
            Err(SegmentError::UnknownMonth(_))
        ));
    }

    #[test]
    fn test_comparison_month_alone_keeps_latest_current() {
        let data = dataset(vec![1_100_000.0, 0.0, 200_000.0], "COMERCIO");
        let pair = MonthPair::resolve(&data, None, Some("2024_MES_1")).unwrap();
        assert_eq!(pair, MonthPair { current: 2, comparison: Some(0) });

        let goals = goals();
        let result = GoalEvaluator::new(&goals).evaluate(&data, &data.customers[0], pair);
        assert_eq!(result.comparison_month.as_deref(), Some("2024_MES_1"));
        assert_eq!(result.met_goal, Some(true));
        assert_eq!(result.shortfall, 900_000.0);

        let only_current = MonthPair::resolve(&data, Some("2024_MES_2"), None).unwrap();
        assert_eq!(only_current, MonthPair { current: 1, comparison: Some(1) });
        assert_eq!(MonthPair::resolve(&data, None, None).unwrap(), MonthPair::latest(&data).unwrap());
    }
}
