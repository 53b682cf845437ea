use crate::config::NormalizerConfig;
use crate::error::{Result, SegmentError};
use crate::models::{CustomerDataset, CustomerRecord, MonthColumn};
use crate::processor::month_column::{HeaderKind, MonthHeaderParser, normalize_header};
use polars::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

pub const CODE_COLUMN: &str = "CODIGO";
pub const NAME_COLUMN: &str = "NOM_LEGAL";
pub const CATEGORY_COLUMN: &str = "RUBRO";
pub const EMAIL_COLUMN: &str = "E_MAIL";
pub const PHONE_COLUMN: &str = "TELEFONO";
pub const PROVINCE_COLUMN: &str = "PROVINCIA";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    MalformedMonth,
    YearMarker,
    FuturePeriod,
    DuplicatePeriod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedColumn {
    pub header: String,
    pub reason: DropReason,
}

/// Result of header discovery: chronologically sorted month columns plus
/// everything that was set aside.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaDescription {
    pub months: Vec<MonthColumn>,
    pub dropped: Vec<DroppedColumn>,
    pub other: Vec<String>,
}

pub struct SchemaNormalizer {
    parser: MonthHeaderParser,
    category_remap: HashMap<String, String>,
}

impl SchemaNormalizer {
    pub fn new(config: &NormalizerConfig) -> Result<Self> {
        let category_remap = config
            .category_remap
            .iter()
            .map(|(from, to)| (from.trim().to_uppercase(), to.trim().to_string()))
            .collect();

        Ok(Self {
            parser: MonthHeaderParser::new(config)?,
            category_remap,
        })
    }

    /// Folds the configured raw categories into their reporting category.
    pub fn effective_category(&self, raw: &str) -> String {
        match self.category_remap.get(&raw.trim().to_uppercase()) {
            Some(target) => target.clone(),
            None => raw.to_string(),
        }
    }

    /// Sorts headers into months, dropped columns and descriptive columns.
    /// Headers must already be normalized.
    pub fn describe<S: AsRef<str>>(&self, headers: &[S]) -> SchemaDescription {
        let mut description = SchemaDescription::default();
        let mut months = Vec::new();

        for header in headers {
            let header = header.as_ref();
            match self.parser.classify(header) {
                HeaderKind::Month(month) => months.push(month),
                HeaderKind::Year => description.dropped.push(DroppedColumn {
                    header: header.to_string(),
                    reason: DropReason::YearMarker,
                }),
                HeaderKind::MalformedMonth => description.dropped.push(DroppedColumn {
                    header: header.to_string(),
                    reason: DropReason::MalformedMonth,
                }),
                HeaderKind::Future(_) => description.dropped.push(DroppedColumn {
                    header: header.to_string(),
                    reason: DropReason::FuturePeriod,
                }),
                HeaderKind::Other => description.other.push(header.to_string()),
            }
        }

        // Stable on equal keys, so among headers resolving to the same
        // (period, index) the first in header order is kept.
        months.sort_by_key(MonthColumn::sort_key);

        let mut seen = HashSet::new();
        for month in months {
            if seen.insert(month.sort_key()) {
                description.months.push(month);
            } else {
                description.dropped.push(DroppedColumn {
                    header: month.header,
                    reason: DropReason::DuplicatePeriod,
                });
            }
        }

        for dropped in &description.dropped {
            warn!("Discarding column {}: {:?}", dropped.header, dropped.reason);
        }

        description
    }

    /// Normalizes the raw frame and builds the immutable customer dataset.
    pub fn normalize(&self, raw: &DataFrame) -> Result<CustomerDataset> {
        let mut df = raw.clone();
        self.normalize_headers(&mut df)?;

        let headers: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let description = self.describe(&headers);

        if description.months.is_empty() {
            return Err(SegmentError::NoMonthColumns);
        }

        for required in [CODE_COLUMN, NAME_COLUMN, CATEGORY_COLUMN] {
            if df.column(required).is_err() {
                return Err(SegmentError::MissingColumn(required.to_string()));
            }
        }

        let height = df.height();
        let codes = text_values(df.column(CODE_COLUMN)?)?;
        let names = text_values(df.column(NAME_COLUMN)?)?;
        let categories = text_values(df.column(CATEGORY_COLUMN)?)?;
        let emails = optional_text_values(&df, EMAIL_COLUMN, height)?;
        let phones = optional_text_values(&df, PHONE_COLUMN, height)?;
        let provinces = optional_text_values(&df, PROVINCE_COLUMN, height)?;

        let mut series_by_month = Vec::with_capacity(description.months.len());
        for month in &description.months {
            series_by_month.push(amount_values(df.column(&month.header)?)?);
        }

        let mut customers = Vec::with_capacity(height);
        for row in 0..height {
            let category_raw = categories[row].clone().unwrap_or_default();
            customers.push(CustomerRecord {
                code: codes[row].clone().unwrap_or_default(),
                legal_name: names[row].clone().unwrap_or_default(),
                effective_category: self.effective_category(&category_raw),
                category_raw,
                email: emails[row].clone(),
                phone: phones[row].clone(),
                province: provinces[row].clone(),
                amounts: series_by_month.iter().map(|series| series[row]).collect(),
            });
        }

        info!(
            "Normalized {} customers over {} month columns ({} .. {}), {} columns dropped",
            customers.len(),
            description.months.len(),
            description.months[0].header,
            description.months[description.months.len() - 1].header,
            description.dropped.len()
        );

        Ok(CustomerDataset {
            months: description.months,
            customers,
        })
    }

    fn normalize_headers(&self, df: &mut DataFrame) -> Result<()> {
        let original: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut seen = HashSet::new();
        for name in &original {
            let normalized = normalize_header(name);
            if !seen.insert(normalized.clone()) {
                return Err(SegmentError::DuplicateColumn(normalized));
            }
        }

        for name in original {
            let normalized = normalize_header(&name);
            if normalized != name {
                debug!("Renaming column {} -> {}", name, normalized);
                df.rename(&name, normalized.into())?;
            }
        }

        Ok(())
    }
}

/// Month amounts as f64; nulls and unparseable cells become 0.
fn amount_values(column: &Column) -> Result<Vec<f64>> {
    let casted = column.cast(&DataType::Float64)?;
    Ok(casted
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()).unwrap_or(0.0))
        .collect())
}

/// Text view of a column. Integral floats (spreadsheet codes and phone
/// numbers) are rendered without a fractional part.
fn text_values(column: &Column) -> Result<Vec<Option<String>>> {
    let values: Vec<Option<String>> = if column.dtype().is_float() {
        let casted = column.cast(&DataType::Float64)?;
        casted
            .f64()?
            .into_iter()
            .map(|v| v.map(render_number))
            .collect()
    } else {
        let casted = column.cast(&DataType::String)?;
        casted
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.trim().to_string()))
            .collect()
    };

    Ok(values
        .into_iter()
        .map(|v| v.filter(|s| !s.is_empty()))
        .collect())
}

fn optional_text_values(df: &DataFrame, name: &str, height: usize) -> Result<Vec<Option<String>>> {
    match df.column(name) {
        Ok(column) => text_values(column),
        Err(_) => Ok(vec![None; height]),
    }
}

fn render_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
