use crate::config::SegmentationConfig;
use crate::error::{Result, SegmentError};
use crate::models::CustomerClass;
use std::collections::HashMap;

pub const UNDEFINED_DISCOUNT: &str = "undefined";

#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    pub target_amount: f64,
    pub discount_label: String,
}

/// Category-indexed monthly goals. Keys are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct GoalTable {
    goals: HashMap<String, Goal>,
}

impl GoalTable {
    pub fn from_config(config: &SegmentationConfig) -> Self {
        let goals = config
            .goals
            .iter()
            .map(|(category, goal)| {
                (
                    category.trim().to_uppercase(),
                    Goal {
                        target_amount: goal.target_amount,
                        discount_label: goal.discount_label.clone(),
                    },
                )
            })
            .collect();

        Self { goals }
    }

    pub fn get(&self, category: &str) -> Option<&Goal> {
        self.goals.get(&category.trim().to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }
}

/// Recommended marketing action for each of the six classes.
#[derive(Debug, Clone)]
pub struct ActionTable {
    actions: HashMap<CustomerClass, String>,
}

impl ActionTable {
    pub fn from_config(config: &SegmentationConfig) -> Result<Self> {
        let mut actions = HashMap::new();
        for class in CustomerClass::ALL {
            let action = config
                .actions
                .get(&class)
                .map(|a| a.trim())
                .filter(|a| !a.is_empty())
                .ok_or_else(|| {
                    SegmentError::Config(format!("no marketing action for class '{}'", class))
                })?;
            actions.insert(class, action.to_string());
        }

        Ok(Self { actions })
    }

    pub fn action(&self, class: CustomerClass) -> &str {
        // from_config guarantees every class is present
        self.actions.get(&class).map(String::as_str).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_class_has_an_action() {
        let table = ActionTable::from_config(&SegmentationConfig::default()).unwrap();
        for class in CustomerClass::ALL {
            assert!(!table.action(class).is_empty());
        }
    }

    #[test]
    fn test_incomplete_action_table_is_rejected() {
        let mut config = SegmentationConfig::default();
        config.actions.remove(&CustomerClass::Inactive);
        assert!(matches!(
            ActionTable::from_config(&config),
            Err(SegmentError::Config(_))
        ));
    }

    #[test]
    fn test_goal_lookup_ignores_case() {
        let mut config = SegmentationConfig::default();
        let comercio = config.goals.remove("COMERCIO").unwrap();
        config.goals.insert("comercio".to_string(), comercio);

        let table = GoalTable::from_config(&config);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("COMERCIO").unwrap().target_amount, 1_100_000.0);
        assert_eq!(table.get(" Distribuidor ").unwrap().discount_label, "25%");
        assert!(table.get("ACUARISMO").is_none());
    }
}
