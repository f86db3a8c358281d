// Engine configuration.
//
// Loaded from an optional TOML file; every section falls back to defaults so
// an empty file (or no file at all) gives the standard governance setup. The
// as-of date is deliberately not part of this file: callers pass it in.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{EngineError, Result};
use crate::util::normalize_status;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub classifier: ClassifierConfig,
    pub columns: ColumnMap,
    pub report: ReportConfig,
    pub disposition: DispositionConfig,
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.report.lookback_months == 0 {
            return Err(EngineError::InvalidConfig(
                "report.lookback_months must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Status values that mark a work order as cancelled. Compared trimmed and
    /// upper-cased.
    pub cancellation_keywords: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            cancellation_keywords: vec!["CAN".into(), "CANCELLED".into(), "CANCELED".into()],
        }
    }
}

impl ClassifierConfig {
    pub fn is_cancellation(&self, status: &str) -> bool {
        let status = normalize_status(status);
        !status.is_empty()
            && self
                .cancellation_keywords
                .iter()
                .any(|k| normalize_status(k) == status)
    }
}

/// Source header name for each normalized field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub work_order: String,
    pub status: String,
    pub target_date: String,
    pub actual_finish: String,
    pub group: String,
    pub work_type: String,
    pub description: String,
    pub report_date: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            work_order: "work_orders".into(),
            status: "current_status".into(),
            target_date: "targ_comp_date".into(),
            actual_finish: "act_finish".into(),
            group: "wo_assigned_group".into(),
            work_type: "work_type".into(),
            description: "wo_description".into(),
            report_date: "report_date".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Number of complete months before the as-of month kept in trend tables.
    /// Must be at least 1; a config built in code with 0 is treated as 1.
    pub lookback_months: u32,
    /// Overdue threshold for the extreme-late listing.
    pub extreme_late_days: i64,
    pub stoplight: StoplightConfig,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            lookback_months: 12,
            extreme_late_days: 90,
            stoplight: StoplightConfig::default(),
        }
    }
}

/// Missed-count thresholds for stoplight annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoplightConfig {
    pub acceptable_max: usize,
    pub caution_max: usize,
}

impl Default for StoplightConfig {
    fn default() -> Self {
        Self { acceptable_max: 4, caution_max: 7 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispositionConfig {
    pub closed_statuses: Vec<String>,
    pub qa_statuses: Vec<String>,
}

impl Default for DispositionConfig {
    fn default() -> Self {
        Self {
            closed_statuses: ["CLOSE", "REVWD", "PENRVW", "COMP", "CORRTD"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            qa_statuses: vec!["PENDQA".into()],
        }
    }
}
