// Chart-ready "missed" projections of summary tables.
use crate::config::StoplightConfig;
use crate::error::{EngineError, Result};
use crate::types::{Dimension, GroupMissedSeries, PeriodMissedSeries, SummaryTable};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

fn expect_dimension(summary: &SummaryTable, expected: Dimension) -> Result<()> {
    if summary.dimension != expected {
        return Err(EngineError::ShapeMismatch {
            expected,
            found: summary.dimension,
            rows: summary.rows.len(),
        });
    }
    Ok(())
}

/// Per-period due / complete / missed counts.
///
/// `due` is everything with a target date that has come due, so
/// `due == complete + missed` for every period.
pub fn build_period_missed_series(summary: &SummaryTable) -> Result<PeriodMissedSeries> {
    expect_dimension(summary, Dimension::Period)?;
    let mut series = PeriodMissedSeries::default();
    for row in &summary.rows {
        series.periods.push(row.key.clone());
        series.due.push(row.due());
        series.complete.push(row.complete());
        series.missed.push(row.missed);
    }
    Ok(series)
}

/// Per-group missed count and fraction, highest missed fraction first.
///
/// Ties keep the summary's own order.
pub fn build_group_missed_series(summary: &SummaryTable) -> Result<GroupMissedSeries> {
    expect_dimension(summary, Dimension::Group)?;
    let mut rows: Vec<_> = summary.rows.iter().collect();
    rows.sort_by(|a, b| {
        b.missed_percent
            .partial_cmp(&a.missed_percent)
            .unwrap_or(Ordering::Equal)
    });
    let mut series = GroupMissedSeries::default();
    for row in rows {
        series.groups.push(row.key.clone());
        series.missed.push(row.missed);
        series.missed_percent.push(row.missed_percent);
    }
    Ok(series)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stoplight {
    Acceptable,
    Caution,
    Critical,
}

impl Stoplight {
    pub fn rate(missed: usize, config: &StoplightConfig) -> Self {
        if missed <= config.acceptable_max {
            Stoplight::Acceptable
        } else if missed <= config.caution_max {
            Stoplight::Caution
        } else {
            Stoplight::Critical
        }
    }
}

impl fmt::Display for Stoplight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stoplight::Acceptable => f.write_str("Acceptable"),
            Stoplight::Caution => f.write_str("Caution"),
            Stoplight::Critical => f.write_str("Critical"),
        }
    }
}

impl PeriodMissedSeries {
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn stoplights(&self, config: &StoplightConfig) -> Vec<Stoplight> {
        self.missed.iter().map(|m| Stoplight::rate(*m, config)).collect()
    }
}

impl GroupMissedSeries {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn stoplights(&self, config: &StoplightConfig) -> Vec<Stoplight> {
        self.missed.iter().map(|m| Stoplight::rate(*m, config)).collect()
    }
}
