use chrono::NaiveDate;
use tracing::{debug, info};

use crate::config::ClassifierConfig;
use crate::error::{DataQualityWarning, WarningKind};
use crate::types::{Classification, ClassifiedRecord, WorkOrderRecord};

/// Classified batch plus every data-quality note raised while classifying it.
#[derive(Debug, Clone, Default)]
pub struct ClassifyOutcome {
    pub records: Vec<ClassifiedRecord>,
    pub warnings: Vec<DataQualityWarning>,
}

/// Assign a classification to every record.
///
/// `as_of` is the reference "today"; the clock is never read here, so the same
/// inputs always give the same output.
pub fn classify(
    records: Vec<WorkOrderRecord>,
    as_of: NaiveDate,
    config: &ClassifierConfig,
) -> ClassifyOutcome {
    let mut warnings = Vec::new();
    let records: Vec<ClassifiedRecord> = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            collect_warnings(index, &record, &mut warnings);
            let classification = classify_record(&record, as_of, config);
            ClassifiedRecord { record, classification }
        })
        .collect();

    for w in &warnings {
        debug!(warning = %w, "data quality");
    }
    info!(
        records = records.len(),
        warnings = warnings.len(),
        %as_of,
        "classified work orders"
    );
    ClassifyOutcome { records, warnings }
}

/// Classify one record. First matching rule wins:
///
/// 1. cancellation status -> `Cancelled`
/// 2. finished: no target or finished on/before target -> `OnTime`, otherwise `Late`
/// 3. unfinished: no target -> `Unknown`, target before `as_of` -> `Missed`,
///    otherwise `Open` (due on the as-of day itself is still open)
pub fn classify_record(
    record: &WorkOrderRecord,
    as_of: NaiveDate,
    config: &ClassifierConfig,
) -> Classification {
    if config.is_cancellation(&record.status) {
        return Classification::Cancelled;
    }
    match (record.actual_finish_date.date(), record.target_date.date()) {
        (Some(_), None) => Classification::OnTime,
        (Some(finish), Some(target)) if finish <= target => Classification::OnTime,
        (Some(_), Some(_)) => Classification::Late,
        (None, None) => Classification::Unknown,
        (None, Some(target)) if target < as_of => Classification::Missed,
        (None, Some(_)) => Classification::Open,
    }
}

fn collect_warnings(index: usize, record: &WorkOrderRecord, out: &mut Vec<DataQualityWarning>) {
    let mut push = |field: &'static str, kind: WarningKind| {
        out.push(DataQualityWarning {
            index,
            work_order: record.work_order.clone(),
            field,
            kind,
        })
    };
    if record.status.trim().is_empty() {
        push("status", WarningKind::MissingStatus);
    }
    if let Some(raw) = record.target_date.unparsable_raw() {
        push("target_date", WarningKind::UnparsableDate { raw: raw.to_string() });
    }
    if let Some(raw) = record.actual_finish_date.unparsable_raw() {
        push("actual_finish_date", WarningKind::UnparsableDate { raw: raw.to_string() });
    }
}
