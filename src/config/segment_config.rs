use crate::error::{Result, SegmentError};
use crate::models::CustomerClass;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const ENV_PREFIX: &str = "SEGMENTS";
pub const DEFAULT_CONFIG_PATH: &str = "src/configs/segments.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    pub normalizer: NormalizerConfig,
    pub classification: ClassificationConfig,
    pub segment: SegmentConfig,
    pub report: ReportConfig,
    pub goals: HashMap<String, GoalConfig>,
    pub actions: HashMap<CustomerClass, String>,
}

/// Header discovery rules for month columns
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub month_marker: String,
    pub year_markers: Vec<String>,
    pub future_cutoff: Option<FutureCutoff>,
    pub category_remap: HashMap<String, String>,
}

/// Placeholder months of a still-running period: headers containing
/// `period` with an index above `max_index` are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FutureCutoff {
    pub period: String,
    pub max_index: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    pub min_average: f64,
    pub gold_average: f64,
    pub recency_months: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    pub window_months: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub window_months: usize,
    pub chart_months: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalConfig {
    pub target_amount: f64,
    pub discount_label: String,
}

impl SegmentationConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SegmentationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML file (optional) overlaid with `SEGMENTS__SECTION__KEY`
    /// environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let layered = ::config::Config::builder()
            .add_source(::config::File::with_name(path).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: SegmentationConfig = layered.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for class in CustomerClass::ALL {
            match self.actions.get(&class) {
                Some(action) if !action.trim().is_empty() => {}
                _ => {
                    return Err(SegmentError::Config(format!(
                        "no marketing action configured for class '{}'",
                        class
                    )));
                }
            }
        }

        if self.classification.recency_months == 0 {
            return Err(SegmentError::Config(
                "classification.recency_months must be at least 1".to_string(),
            ));
        }

        if self.segment.window_months == 0 || self.report.window_months == 0 {
            return Err(SegmentError::Config(
                "window_months must be at least 1".to_string(),
            ));
        }

        if self.normalizer.month_marker.is_empty() {
            return Err(SegmentError::Config(
                "normalizer.month_marker cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            normalizer: NormalizerConfig::default(),
            classification: ClassificationConfig::default(),
            segment: SegmentConfig::default(),
            report: ReportConfig::default(),
            goals: default_goals(),
            actions: default_actions(),
        }
    }
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        let mut category_remap = HashMap::new();
        category_remap.insert("ACUARISMO".to_string(), "COMERCIO".to_string());

        Self {
            month_marker: "MES_".to_string(),
            year_markers: vec!["ANO_".to_string(), "AÑO_".to_string()],
            future_cutoff: Some(FutureCutoff {
                period: "2024_2025".to_string(),
                max_index: 16,
            }),
            category_remap,
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            min_average: 300_000.0,
            gold_average: 5_000_000.0,
            recency_months: 6,
        }
    }
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self { window_months: 12 }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            window_months: 12,
            chart_months: 24,
        }
    }
}

fn default_goals() -> HashMap<String, GoalConfig> {
    let mut goals = HashMap::new();
    goals.insert(
        "COMERCIO".to_string(),
        GoalConfig {
            target_amount: 1_100_000.0,
            discount_label: "NC 10%".to_string(),
        },
    );
    goals.insert(
        "DISTRIBUIDOR".to_string(),
        GoalConfig {
            target_amount: 5_000_000.0,
            discount_label: "25%".to_string(),
        },
    );
    goals
}

fn default_actions() -> HashMap<CustomerClass, String> {
    let mut actions = HashMap::new();
    actions.insert(
        CustomerClass::HabitualGold,
        "Programa de fidelidad exclusivo + regalos sorpresa".to_string(),
    );
    actions.insert(
        CustomerClass::Habitual,
        "Descuento adicional + referidos".to_string(),
    );
    actions.insert(
        CustomerClass::Regular,
        "Emails con novedades destacadas".to_string(),
    );
    actions.insert(
        CustomerClass::Sporadic,
        "Promos flash personalizadas".to_string(),
    );
    actions.insert(
        CustomerClass::Potential,
        "Bienvenida + primer descuento".to_string(),
    );
    actions.insert(
        CustomerClass::Inactive,
        "Reactivación con beneficio extra".to_string(),
    );
    actions
}
