use crate::config::{FutureCutoff, NormalizerConfig};
use crate::error::{Result, SegmentError};
use crate::models::MonthColumn;
use regex::Regex;

/// Spaces become underscores, letters are uppercased.
pub fn normalize_header(raw: &str) -> String {
    raw.trim().replace(' ', "_").to_uppercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderKind {
    Month(MonthColumn),
    /// Year marker columns never enter the time series
    Year,
    /// Carries the month marker but no `<prefix>_..._<marker><index>` shape
    MalformedMonth,
    /// Index beyond the configured cutoff of a still-running period
    Future(MonthColumn),
    Other,
}

pub struct MonthHeaderParser {
    marker: String,
    year_markers: Vec<String>,
    cutoff: Option<FutureCutoff>,
    pattern: Regex,
}

impl MonthHeaderParser {
    pub fn new(config: &NormalizerConfig) -> Result<Self> {
        let marker = normalize_header(&config.month_marker);
        let pattern = Regex::new(&format!(
            r"^(?P<prefix>[^_]+)_(?:.*_)?{}(?P<index>\d+)$",
            regex::escape(&marker)
        ))
        .map_err(|e| SegmentError::Config(format!("invalid month marker: {}", e)))?;

        Ok(Self {
            marker,
            year_markers: config
                .year_markers
                .iter()
                .map(|m| normalize_header(m))
                .filter(|m| !m.is_empty())
                .collect(),
            cutoff: config.future_cutoff.clone(),
            pattern,
        })
    }

    /// Classifies an already-normalized header.
    pub fn classify(&self, header: &str) -> HeaderKind {
        if self.year_markers.iter().any(|m| header.contains(m.as_str())) {
            return HeaderKind::Year;
        }

        if !header.contains(self.marker.as_str()) {
            return HeaderKind::Other;
        }

        let Some(month) = self.parse(header) else {
            return HeaderKind::MalformedMonth;
        };

        match &self.cutoff {
            Some(cutoff) if header.contains(cutoff.period.as_str()) && month.index > cutoff.max_index => {
                HeaderKind::Future(month)
            }
            _ => HeaderKind::Month(month),
        }
    }

    fn parse(&self, header: &str) -> Option<MonthColumn> {
        let captures = self.pattern.captures(header)?;
        let index = captures.name("index")?.as_str().parse::<u32>().ok()?;
        let period = captures
            .name("prefix")
            .and_then(|p| p.as_str().parse::<u32>().ok())
            .unwrap_or(0);

        Some(MonthColumn {
            header: header.to_string(),
            period,
            index,
        })
    }
}
