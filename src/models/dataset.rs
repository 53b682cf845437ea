use super::{CustomerRecord, MonthAmount, MonthColumn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Immutable snapshot of one loaded file.
///
/// Every record carries exactly `months.len()` amounts and `months` is
/// strictly increasing by `(period, index)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerDataset {
    pub months: Vec<MonthColumn>,
    pub customers: Vec<CustomerRecord>,
}

impl CustomerDataset {
    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    pub fn month_headers(&self) -> Vec<&str> {
        self.months.iter().map(|m| m.header.as_str()).collect()
    }

    pub fn month_position(&self, header: &str) -> Option<usize> {
        self.months.iter().position(|m| m.header == header)
    }

    /// Sorted, de-duplicated legal names for a customer picker.
    pub fn legal_names(&self) -> Vec<&str> {
        self.customers
            .iter()
            .map(|c| c.legal_name.trim())
            .filter(|name| !name.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Picker entries containing `fragment`, ignoring case.
    pub fn names_containing(&self, fragment: &str) -> Vec<&str> {
        let needle = fragment.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.legal_names()
            .into_iter()
            .filter(|name| name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Sorted, de-duplicated effective categories.
    pub fn categories(&self) -> Vec<&str> {
        self.customers
            .iter()
            .map(|c| c.effective_category.as_str())
            .filter(|category| !category.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn history(&self, record: &CustomerRecord) -> Vec<MonthAmount> {
        self.months
            .iter()
            .zip(record.amounts.iter())
            .map(|(month, amount)| MonthAmount {
                month: month.header.clone(),
                amount: *amount,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, legal_name: &str, category: &str) -> CustomerRecord {
        CustomerRecord {
            code: code.to_string(),
            legal_name: legal_name.to_string(),
            category_raw: category.to_string(),
            effective_category: category.to_string(),
            email: None,
            phone: None,
            province: None,
            amounts: vec![0.0],
        }
    }

    fn dataset() -> CustomerDataset {
        CustomerDataset {
            months: vec![MonthColumn {
                header: "2024_MES_1".to_string(),
                period: 2024,
                index: 1,
            }],
            customers: vec![
                record("3", "Pez Dorado", "COMERCIO"),
                record("1", "Acuario Sur", "COMERCIO"),
                record("2", " Pez Dorado ", "DISTRIBUIDOR"),
                record("4", "", ""),
            ],
        }
    }

    #[test]
    fn test_legal_names_are_sorted_and_unique() {
        assert_eq!(dataset().legal_names(), vec!["Acuario Sur", "Pez Dorado"]);
        assert_eq!(dataset().categories(), vec!["COMERCIO", "DISTRIBUIDOR"]);
    }

    #[test]
    fn test_names_containing() {
        let data = dataset();
        assert_eq!(data.names_containing("dorado"), vec!["Pez Dorado"]);
        assert!(data.names_containing("  ").is_empty());
        assert!(data.names_containing("Nadie").is_empty());
    }
}
