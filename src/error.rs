use serde::Serialize;
use std::fmt;

use crate::types::Dimension;

/// Structural failures. Per-record data problems never end up here; they are
/// collected as [`DataQualityWarning`]s instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(
        "shape mismatch: expected a {expected} summary but got a {found} summary ({rows} rows)"
    )]
    ShapeMismatch {
        expected: Dimension,
        found: Dimension,
        rows: usize,
    },

    #[error("input is missing required column '{column}' for field '{field}'")]
    MissingColumn { field: &'static str, column: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WarningKind {
    UnparsableDate { raw: String },
    MissingStatus,
}

/// A non-fatal problem with one record. The record is still classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataQualityWarning {
    /// Position of the record in the classified batch.
    pub index: usize,
    pub work_order: String,
    pub field: &'static str,
    #[serde(flatten)]
    pub kind: WarningKind,
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = if self.work_order.is_empty() { "<no id>" } else { &self.work_order };
        match &self.kind {
            WarningKind::UnparsableDate { raw } => write!(
                f,
                "record {} ({}): {} '{}' is not a date, treated as absent",
                self.index, id, self.field, raw
            ),
            WarningKind::MissingStatus => {
                write!(f, "record {} ({}): {} is empty", self.index, id, self.field)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mismatch_message_names_dimensions_and_rows() {
        let err = EngineError::ShapeMismatch {
            expected: Dimension::Group,
            found: Dimension::Period,
            rows: 4,
        };
        assert_eq!(
            err.to_string(),
            "shape mismatch: expected a group summary but got a period summary (4 rows)"
        );
    }

    #[test]
    fn warning_display_includes_raw_value() {
        let w = DataQualityWarning {
            index: 2,
            work_order: "WO-7".into(),
            field: "target_date",
            kind: WarningKind::UnparsableDate { raw: "soon".into() },
        };
        assert_eq!(
            w.to_string(),
            "record 2 (WO-7): target_date 'soon' is not a date, treated as absent"
        );
    }
}
