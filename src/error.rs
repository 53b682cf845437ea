use thiserror::Error;

#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("failed to read dataset '{path}': {reason}")]
    MalformedInput { path: String, reason: String },

    #[error("required column missing: {0}")]
    MissingColumn(String),

    #[error("column '{0}' appears more than once after header normalization")]
    DuplicateColumn(String),

    #[error("no valid month columns found")]
    NoMonthColumns,

    #[error("no customer matches '{0}'")]
    CustomerNotFound(String),

    #[error("'{0}' is not a retained month column")]
    UnknownMonth(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),

    #[error(transparent)]
    Excel(#[from] calamine::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Layered(#[from] ::config::ConfigError),
}

impl SegmentError {
    /// True for conditions that invalidate the whole load rather than a
    /// single request.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            SegmentError::MalformedInput { .. }
                | SegmentError::MissingColumn(_)
                | SegmentError::DuplicateColumn(_)
                | SegmentError::NoMonthColumns
                | SegmentError::Polars(_)
                | SegmentError::Excel(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SegmentError>;
