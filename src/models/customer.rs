use serde::{Deserialize, Serialize};
use std::fmt;

/// Marketing class assigned to every customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CustomerClass {
    #[serde(rename = "habitualgold")]
    HabitualGold,
    #[serde(rename = "habitual")]
    Habitual,
    #[serde(rename = "regular")]
    Regular,
    #[serde(rename = "esporadico")]
    Sporadic,
    #[serde(rename = "potencial")]
    Potential,
    #[serde(rename = "inactivo")]
    Inactive,
}

impl CustomerClass {
    pub const ALL: [CustomerClass; 6] = [
        CustomerClass::HabitualGold,
        CustomerClass::Habitual,
        CustomerClass::Regular,
        CustomerClass::Sporadic,
        CustomerClass::Potential,
        CustomerClass::Inactive,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CustomerClass::HabitualGold => "habitualgold",
            CustomerClass::Habitual => "habitual",
            CustomerClass::Regular => "regular",
            CustomerClass::Sporadic => "esporadico",
            CustomerClass::Potential => "potencial",
            CustomerClass::Inactive => "inactivo",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|class| class.label() == label)
    }
}

impl fmt::Display for CustomerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the dataset after normalization.
///
/// `amounts` is aligned with the dataset's month columns: entry `i` is the
/// purchase total for `CustomerDataset::months[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub code: String,
    pub legal_name: String,
    pub category_raw: String,
    pub effective_category: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub province: Option<String>,
    pub amounts: Vec<f64>,
}
