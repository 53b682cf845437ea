use crate::error::{Result, SegmentError};
use calamine::{Data, Reader, open_workbook_auto};
use polars::prelude::*;
use std::path::Path;
use tracing::info;

/// Reads the first sheet of a workbook, or a CSV file, into a raw frame.
/// Headers are left untouched; normalization happens downstream.
pub struct SpreadsheetLoader;

impl SpreadsheetLoader {
    pub fn load(path: &Path) -> Result<DataFrame> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        let result = match extension.as_str() {
            "csv" => Self::load_csv(path),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Self::load_workbook(path),
            other => Err(SegmentError::MalformedInput {
                path: path.display().to_string(),
                reason: format!("unsupported file extension '{}'", other),
            }),
        };

        result.map_err(|e| match e {
            SegmentError::Polars(_) | SegmentError::Excel(_) | SegmentError::Io(_) => {
                SegmentError::MalformedInput {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                }
            }
            other => other,
        })
    }

    fn load_csv(path: &Path) -> Result<DataFrame> {
        // every column is read as text so codes keep their leading zeros;
        // month columns are cast to numbers by the normalizer
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        info!(
            "Loaded CSV {}: {} rows, {} columns",
            path.display(),
            df.height(),
            df.width()
        );
        Ok(df)
    }

    fn load_workbook(path: &Path) -> Result<DataFrame> {
        let mut workbook = open_workbook_auto(path)?;
        let sheet_name = workbook.sheet_names().first().cloned().unwrap_or_default();
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| SegmentError::MalformedInput {
                path: path.display().to_string(),
                reason: "workbook has no sheets".to_string(),
            })??;

        let mut rows = range.rows();
        let header_row = rows.next().ok_or_else(|| SegmentError::MalformedInput {
            path: path.display().to_string(),
            reason: format!("sheet '{}' is empty", sheet_name),
        })?;

        let headers: Vec<String> = header_row
            .iter()
            .enumerate()
            .map(|(i, cell)| match cell {
                Data::Empty => format!("COLUMN_{}", i + 1),
                other => other.to_string(),
            })
            .collect();
        let body: Vec<&[Data]> = rows.collect();

        let columns = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let cells: Vec<&Data> = body
                    .iter()
                    .map(|row| row.get(i).unwrap_or(&Data::Empty))
                    .collect();
                build_column(header, &cells)
            })
            .collect::<Vec<_>>();

        let df = DataFrame::new(columns)?;
        info!(
            "Loaded sheet '{}' from {}: {} rows, {} columns",
            sheet_name,
            path.display(),
            df.height(),
            df.width()
        );
        Ok(df)
    }
}

/// Numeric cells become a Float64 column; anything else is kept as text.
fn build_column(header: &str, cells: &[&Data]) -> Column {
    let numeric = cells
        .iter()
        .all(|cell| matches!(cell, Data::Int(_) | Data::Float(_) | Data::Empty));

    if numeric {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|cell| match cell {
                Data::Int(i) => Some(*i as f64),
                Data::Float(f) => Some(*f),
                _ => None,
            })
            .collect();
        Column::new(header.into(), values)
    } else {
        let values: Vec<Option<String>> = cells
            .iter()
            .map(|cell| match cell {
                Data::Empty | Data::Error(_) => None,
                other => Some(other.to_string()),
            })
            .collect();
        Column::new(header.into(), values)
    }
}
