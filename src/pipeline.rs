use chrono::{Datelike, NaiveDate};
use tracing::info;

use crate::classifier::ClassifyOutcome;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::missed::{build_group_missed_series, build_period_missed_series};
use crate::summary::{
    disposition_summary, extract_flagged, extreme_late, filter_work_type, governance_overview,
    period_slice, summarize, trailing_window, window_bounds, year_slice,
};
use crate::types::{
    Classification, Dimension, GovernanceReport, ReportPeriod, WorkOrderRow, WorkTypeCategory,
};

/// Build every governance table from one classified batch.
///
/// Trend tables cover the configured trailing window; the group breakdown
/// covers the month before `as_of`; the year-to-date table keeps the window
/// months of the as-of calendar year; the extreme-late listing looks at the
/// whole batch.
pub fn prepare_report(
    outcome: &ClassifyOutcome,
    as_of: NaiveDate,
    config: &EngineConfig,
    work_type: Option<WorkTypeCategory>,
) -> Result<GovernanceReport> {
    let scoped = match work_type {
        Some(category) => filter_work_type(&outcome.records, category),
        None => outcome.records.clone(),
    };

    let months = config.report.lookback_months;
    let (window_start, window_end) = window_bounds(as_of, months);
    let window = trailing_window(&scoped, as_of, months);

    let monthly = summarize(&window, Dimension::Period);
    let monthly_total = monthly.grand_total();
    let period_series = build_period_missed_series(&monthly)?;

    let group_period = ReportPeriod::of(as_of).previous();
    let previous_month = monthly.row(&group_period.to_string()).cloned();
    let year_to_date = summarize(&year_slice(&window, as_of.year()), Dimension::Period);
    let year_to_date_total = year_to_date.grand_total();

    let by_group = summarize(&period_slice(&scoped, group_period), Dimension::Group);
    let group_series = build_group_missed_series(&by_group)?;

    let late: Vec<WorkOrderRow> =
        extract_flagged(&window, &[Classification::Late, Classification::Missed])
            .into_iter()
            .map(WorkOrderRow::from)
            .collect();

    let report = GovernanceReport {
        as_of,
        window_start,
        window_end,
        overview: governance_overview(&window),
        monthly,
        monthly_total,
        previous_month,
        year_to_date,
        year_to_date_total,
        group_period,
        by_group,
        period_series,
        group_series,
        late,
        extreme_late: extreme_late(&scoped, as_of, config.report.extreme_late_days),
        disposition: disposition_summary(&window, &config.disposition),
        warnings: outcome.warnings.clone(),
    };
    info!(
        scoped = scoped.len(),
        window = window.len(),
        start = %window_start,
        end = %window_end,
        late = report.late.len(),
        extreme_late = report.extreme_late.len(),
        "prepared governance report"
    );
    Ok(report)
}
