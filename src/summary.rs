use crate::config::DispositionConfig;
use crate::types::{
    Classification, ClassifiedRecord, Dimension, DispositionRow, GovernanceOverview,
    LateWorkOrderRow, ReportPeriod, SummaryRow, SummaryTable, WorkTypeCategory,
};
use crate::util::{days_diff, normalize_status, ratio};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

pub const GRAND_TOTAL: &str = "Grand Total";

impl SummaryRow {
    pub fn record(&mut self, classification: Classification) {
        self.total += 1;
        match classification {
            Classification::OnTime => self.on_time += 1,
            Classification::Late => self.late += 1,
            Classification::Missed => self.missed += 1,
            Classification::Open => self.open += 1,
            Classification::Cancelled => self.cancelled += 1,
            Classification::Unknown => self.unknown += 1,
        }
    }

    fn finish(mut self) -> Self {
        self.missed_percent = ratio(self.missed, self.total);
        self.completion_percent = ratio(self.on_time, self.due());
        self
    }
}

impl SummaryTable {
    /// Sum of every row, with percentages recomputed from the summed counts.
    pub fn grand_total(&self) -> SummaryRow {
        let mut acc = SummaryRow::empty(GRAND_TOTAL);
        for r in &self.rows {
            acc.total += r.total;
            acc.on_time += r.on_time;
            acc.late += r.late;
            acc.missed += r.missed;
            acc.open += r.open;
            acc.cancelled += r.cancelled;
            acc.unknown += r.unknown;
        }
        acc.finish()
    }
}

/// Group classified records along `dimension` and count each classification.
///
/// Every record lands in exactly one row (missing keys go to `Unassigned`), so
/// the row totals add up to the input length. Period rows are chronological;
/// group rows are by descending total, then name.
pub fn summarize(classified: &[ClassifiedRecord], dimension: Dimension) -> SummaryTable {
    if classified.is_empty() {
        warn!(%dimension, "no work orders to summarize, returning an empty table");
        return SummaryTable { dimension, rows: Vec::new() };
    }

    let rows = match dimension {
        Dimension::Period => by_period(classified),
        Dimension::Group => by_group(classified),
    };
    debug!(%dimension, records = classified.len(), rows = rows.len(), "summarized work orders");
    SummaryTable { dimension, rows }
}

fn by_period(classified: &[ClassifiedRecord]) -> Vec<SummaryRow> {
    let mut map: BTreeMap<ReportPeriod, SummaryRow> = BTreeMap::new();
    for c in classified {
        let period = c.record.report_period;
        map.entry(period)
            .or_insert_with(|| SummaryRow::empty(period.to_string()))
            .record(c.classification);
    }
    map.into_values().map(SummaryRow::finish).collect()
}

fn by_group(classified: &[ClassifiedRecord]) -> Vec<SummaryRow> {
    let mut map: HashMap<&str, SummaryRow> = HashMap::new();
    for c in classified {
        let key = c.record.group_key();
        map.entry(key)
            .or_insert_with(|| SummaryRow::empty(key))
            .record(c.classification);
    }
    let mut rows: Vec<SummaryRow> = map.into_values().map(SummaryRow::finish).collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.key.cmp(&b.key)));
    rows
}

/// Records whose classification is one of `variants`, in input order.
pub fn extract_flagged<'a>(
    classified: &'a [ClassifiedRecord],
    variants: &[Classification],
) -> Vec<&'a ClassifiedRecord> {
    classified
        .iter()
        .filter(|c| variants.contains(&c.classification))
        .collect()
}

pub fn governance_overview(classified: &[ClassifiedRecord]) -> GovernanceOverview {
    let mut row = SummaryRow::empty(GRAND_TOTAL);
    for c in classified {
        row.record(c.classification);
    }
    GovernanceOverview {
        total: row.total,
        due: row.due(),
        completed: row.complete(),
        on_time: row.on_time,
        late: row.late,
        missed: row.missed,
        open: row.open,
        cancelled: row.cancelled,
        unknown: row.unknown,
        completion_percent: ratio(row.on_time, row.due()),
    }
}

/// First and last period of the `months` complete months before the as-of month.
pub fn window_bounds(as_of: NaiveDate, months: u32) -> (ReportPeriod, ReportPeriod) {
    let current = ReportPeriod::of(as_of);
    // A zero-month window is read as one month.
    (current.months_back(months.max(1)), current.previous())
}

/// Keep records reporting into the `months` complete months before `as_of`.
pub fn trailing_window(
    classified: &[ClassifiedRecord],
    as_of: NaiveDate,
    months: u32,
) -> Vec<ClassifiedRecord> {
    let (start, end) = window_bounds(as_of, months);
    let mut unknown = 0usize;
    let kept: Vec<ClassifiedRecord> = classified
        .iter()
        .filter(|c| {
            let p = c.record.report_period;
            if !p.is_known() {
                unknown += 1;
                return false;
            }
            start <= p && p <= end
        })
        .cloned()
        .collect();
    if unknown > 0 {
        debug!(excluded = unknown, "records without a report period left out of trailing window");
    }
    kept
}

pub fn period_slice(
    classified: &[ClassifiedRecord],
    period: ReportPeriod,
) -> Vec<ClassifiedRecord> {
    classified
        .iter()
        .filter(|c| c.record.report_period == period)
        .cloned()
        .collect()
}

/// Keep records reporting into a month of calendar `year`.
pub fn year_slice(classified: &[ClassifiedRecord], year: i32) -> Vec<ClassifiedRecord> {
    classified
        .iter()
        .filter(|c| c.record.report_period.year() == Some(year))
        .cloned()
        .collect()
}

pub fn filter_work_type(
    classified: &[ClassifiedRecord],
    category: WorkTypeCategory,
) -> Vec<ClassifiedRecord> {
    classified
        .iter()
        .filter(|c| WorkTypeCategory::from_work_type(&c.record.work_type) == category)
        .cloned()
        .collect()
}

/// Missed work orders overdue by more than `threshold_days` at `as_of`.
///
/// Sorted by period, then group, then most overdue first.
pub fn extreme_late(
    classified: &[ClassifiedRecord],
    as_of: NaiveDate,
    threshold_days: i64,
) -> Vec<LateWorkOrderRow> {
    let mut rows: Vec<(ReportPeriod, LateWorkOrderRow)> = classified
        .iter()
        .filter(|c| c.classification == Classification::Missed)
        .filter_map(|c| {
            let target = c.record.target_date.date()?;
            let days_late = days_diff(target, as_of);
            (days_late > threshold_days).then(|| {
                let r = &c.record;
                (
                    r.report_period,
                    LateWorkOrderRow {
                        report_period: r.report_period.to_string(),
                        work_order: r.work_order.clone(),
                        group: r.group_key().to_string(),
                        target_date: r.target_date.to_string(),
                        days_late,
                        description: r.description.clone(),
                        classification: c.classification.to_string(),
                        status: r.status.clone(),
                    },
                )
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| a.1.group.cmp(&b.1.group))
            .then_with(|| b.1.days_late.cmp(&a.1.days_late))
    });
    rows.into_iter().map(|(_, row)| row).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Closed,
    AwaitingQa,
    AwaitingDept,
}

impl Disposition {
    pub fn of_status(status: &str, config: &DispositionConfig) -> Self {
        let status = normalize_status(status);
        let listed = |list: &[String]| list.iter().any(|s| normalize_status(s) == status);
        if listed(&config.closed_statuses) {
            Disposition::Closed
        } else if listed(&config.qa_statuses) {
            Disposition::AwaitingQa
        } else {
            Disposition::AwaitingDept
        }
    }
}

/// Where late and missed work orders currently stand, per period.
pub fn disposition_summary(
    classified: &[ClassifiedRecord],
    config: &DispositionConfig,
) -> Vec<DispositionRow> {
    let mut map: BTreeMap<ReportPeriod, DispositionRow> = BTreeMap::new();
    for c in classified {
        if !matches!(c.classification, Classification::Late | Classification::Missed) {
            continue;
        }
        let period = c.record.report_period;
        let row = map.entry(period).or_insert_with(|| DispositionRow {
            report_period: period.to_string(),
            closed: 0,
            awaiting_qa: 0,
            awaiting_dept: 0,
            total: 0,
        });
        row.total += 1;
        match Disposition::of_status(&c.record.status, config) {
            Disposition::Closed => row.closed += 1,
            Disposition::AwaitingQa => row.awaiting_qa += 1,
            Disposition::AwaitingDept => row.awaiting_dept += 1,
        }
    }
    map.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WorkOrderRecord;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn cr(record: WorkOrderRecord, classification: Classification) -> ClassifiedRecord {
        ClassifiedRecord { record, classification }
    }

    fn sample() -> Vec<ClassifiedRecord> {
        vec![
            cr(
                WorkOrderRecord::new("WO-1", "COMP")
                    .with_target(d(2024, 1, 10))
                    .with_group("Facilities"),
                Classification::OnTime,
            ),
            cr(
                WorkOrderRecord::new("WO-2", "REVWD")
                    .with_target(d(2024, 1, 10))
                    .with_group("Grounds"),
                Classification::Late,
            ),
            cr(
                WorkOrderRecord::new("WO-3", "INPRG")
                    .with_target(d(2024, 1, 10))
                    .with_group("Facilities"),
                Classification::Missed,
            ),
            cr(
                WorkOrderRecord::new("WO-4", "INPRG").with_target(d(2023, 12, 1)),
                Classification::Missed,
            ),
            cr(WorkOrderRecord::new("WO-5", "INPRG"), Classification::Unknown),
            cr(
                WorkOrderRecord::new("WO-6", "CAN")
                    .with_target(d(2024, 2, 3))
                    .with_group("Grounds"),
                Classification::Cancelled,
            ),
        ]
    }

    #[test]
    fn period_rows_are_chronological_and_conserve_totals() {
        let data = sample();
        let table = summarize(&data, Dimension::Period);
        let keys: Vec<&str> = table.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["2023-12", "2024-01", "2024-02", "Unassigned"]);
        assert_eq!(table.total(), data.len());

        let jan = table.row("2024-01").unwrap();
        assert_eq!((jan.total, jan.on_time, jan.late, jan.missed), (3, 1, 1, 1));
        assert!((jan.missed_percent - 1.0 / 3.0).abs() < 1e-9);
        assert!((jan.completion_percent - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn group_rows_order_by_total_then_name() {
        let table = summarize(&sample(), Dimension::Group);
        let keys: Vec<(&str, usize)> =
            table.rows.iter().map(|r| (r.key.as_str(), r.total)).collect();
        assert_eq!(
            keys,
            vec![("Facilities", 2), ("Grounds", 2), ("Unassigned", 2)]
        );
        assert_eq!(table.total(), 6);
    }

    #[test]
    fn summarize_is_deterministic() {
        let data = sample();
        let mut reversed = data.clone();
        reversed.reverse();
        for dimension in [Dimension::Period, Dimension::Group] {
            let first = summarize(&data, dimension);
            assert_eq!(summarize(&data, dimension), first);
            assert_eq!(summarize(&reversed, dimension), first);
        }
    }

    #[test]
    fn year_slice_keeps_one_calendar_year() {
        let data = sample();
        let ids: Vec<String> =
            year_slice(&data, 2024).into_iter().map(|c| c.record.work_order).collect();
        assert_eq!(ids, vec!["WO-1", "WO-2", "WO-3", "WO-6"]);
        assert_eq!(year_slice(&data, 2023).len(), 1);
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let table = summarize(&[], Dimension::Period);
        assert!(table.is_empty());
        assert_eq!(table.total(), 0);
        assert_eq!(table.dimension, Dimension::Period);
        let total = table.grand_total();
        assert_eq!(total.total, 0);
        assert_eq!(total.missed_percent, 0.0);
    }

    #[test]
    fn grand_total_sums_rows() {
        let table = summarize(&sample(), Dimension::Period);
        let total = table.grand_total();
        assert_eq!(total.key, GRAND_TOTAL);
        assert_eq!(total.total, 6);
        assert_eq!(total.missed, 2);
        assert!((total.missed_percent - 2.0 / 6.0).abs() < 1e-9);
        assert!((total.completion_percent - 1.0 / 4.0).abs() < 1e-9);
    }

    #[test]
    fn extract_flagged_preserves_order() {
        let data = sample();
        let flagged = extract_flagged(&data, &[Classification::Missed, Classification::Late]);
        let ids: Vec<&str> = flagged.iter().map(|c| c.record.work_order.as_str()).collect();
        assert_eq!(ids, vec!["WO-2", "WO-3", "WO-4"]);
    }

    #[test]
    fn overview_counts_due_and_completion() {
        let o = governance_overview(&sample());
        assert_eq!(o.total, 6);
        assert_eq!(o.due, 4);
        assert_eq!(o.completed, 2);
        assert_eq!(o.missed, 2);
        assert_eq!(o.cancelled, 1);
        assert!((o.completion_percent - 0.25).abs() < 1e-9);
    }

    #[test]
    fn trailing_window_keeps_complete_months_before_as_of() {
        let data = sample();
        // Window for as-of 2024-02-15 with 2 months: 2023-12 ..= 2024-01.
        let kept = trailing_window(&data, d(2024, 2, 15), 2);
        let ids: Vec<&str> = kept.iter().map(|c| c.record.work_order.as_str()).collect();
        assert_eq!(ids, vec!["WO-1", "WO-2", "WO-3", "WO-4"]);

        let kept = trailing_window(&data, d(2024, 2, 15), 1);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn period_slice_and_work_type_filter() {
        let mut data = sample();
        data[0].record.work_type = "PM".into();
        let jan = period_slice(&data, ReportPeriod::of(d(2024, 1, 1)));
        assert_eq!(jan.len(), 3);
        let pm = filter_work_type(&data, WorkTypeCategory::Pm);
        assert_eq!(pm.len(), 1);
        assert_eq!(pm[0].record.work_order, "WO-1");
    }

    #[test]
    fn extreme_late_sorts_and_thresholds() {
        let data = vec![
            cr(
                WorkOrderRecord::new("A", "INPRG").with_target(d(2024, 1, 20)).with_group("Z"),
                Classification::Missed,
            ),
            cr(
                WorkOrderRecord::new("B", "INPRG").with_target(d(2024, 1, 2)).with_group("Z"),
                Classification::Missed,
            ),
            cr(
                WorkOrderRecord::new("C", "INPRG").with_target(d(2024, 1, 25)).with_group("A"),
                Classification::Missed,
            ),
            cr(
                WorkOrderRecord::new("D", "INPRG").with_target(d(2024, 4, 1)).with_group("A"),
                Classification::Missed,
            ),
            cr(
                WorkOrderRecord::new("E", "COMP").with_target(d(2023, 1, 1)),
                Classification::Late,
            ),
        ];
        let rows = extreme_late(&data, d(2024, 5, 1), 90);
        let ids: Vec<(&str, i64)> =
            rows.iter().map(|r| (r.work_order.as_str(), r.days_late)).collect();
        assert_eq!(ids, vec![("C", 97), ("B", 120), ("A", 102)]);
    }

    #[test]
    fn disposition_buckets_late_and_missed_by_status() {
        let due = |id: &str, status: &str, target: NaiveDate, c: Classification| {
            cr(WorkOrderRecord::new(id, status).with_target(target), c)
        };
        let data = vec![
            due("A", "CLOSE", d(2024, 1, 2), Classification::Late),
            due("B", "pendqa", d(2024, 1, 3), Classification::Missed),
            due("C", "INPRG", d(2024, 1, 4), Classification::Missed),
            due("D", "INPRG", d(2023, 11, 4), Classification::Missed),
            due("E", "COMP", d(2024, 1, 4), Classification::OnTime),
        ];
        let rows = disposition_summary(&data, &DispositionConfig::default());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].report_period, "2023-11");
        assert_eq!(rows[0].awaiting_dept, 1);
        let jan = &rows[1];
        assert_eq!((jan.closed, jan.awaiting_qa, jan.awaiting_dept, jan.total), (1, 1, 1, 3));
    }
}
