use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use std::fmt;
use tabled::Tabled;

use crate::error::DataQualityWarning;
use crate::util::format_number;

/// Bucket name for records whose group or period is missing.
pub const UNASSIGNED: &str = "Unassigned";

/// Raw string fields pulled out of one input row after header mapping.
#[derive(Debug, Default, Clone)]
pub struct RawRow {
    pub work_order: Option<String>,
    pub status: Option<String>,
    pub target_date: Option<String>,
    pub actual_finish: Option<String>,
    pub group: Option<String>,
    pub work_type: Option<String>,
    pub description: Option<String>,
    pub report_date: Option<String>,
}

/// A date column as it arrived from the normalizer.
///
/// `Unparsable` keeps the raw text so the classifier can report it; for every
/// comparison it behaves exactly like `Missing`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DateField {
    #[default]
    Missing,
    Parsed(NaiveDate),
    Unparsable(String),
}

impl DateField {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            DateField::Parsed(d) => Some(*d),
            _ => None,
        }
    }

    pub fn unparsable_raw(&self) -> Option<&str> {
        match self {
            DateField::Unparsable(raw) => Some(raw),
            _ => None,
        }
    }
}

impl From<NaiveDate> for DateField {
    fn from(d: NaiveDate) -> Self {
        DateField::Parsed(d)
    }
}

impl From<Option<NaiveDate>> for DateField {
    fn from(d: Option<NaiveDate>) -> Self {
        d.map_or(DateField::Missing, DateField::Parsed)
    }
}

impl fmt::Display for DateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateField::Missing => Ok(()),
            DateField::Parsed(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            DateField::Unparsable(raw) => write!(f, "{}", raw),
        }
    }
}

/// Calendar month a work order reports into.
///
/// The derived ordering is chronological, with `Unknown` after every month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReportPeriod {
    Month { year: i32, month: u32 },
    Unknown,
}

impl ReportPeriod {
    pub fn of(date: NaiveDate) -> Self {
        ReportPeriod::Month { year: date.year(), month: date.month() }
    }

    pub fn from_date(date: Option<NaiveDate>) -> Self {
        date.map_or(ReportPeriod::Unknown, ReportPeriod::of)
    }

    pub fn is_known(&self) -> bool {
        matches!(self, ReportPeriod::Month { .. })
    }

    pub fn year(&self) -> Option<i32> {
        match self {
            ReportPeriod::Month { year, .. } => Some(*year),
            ReportPeriod::Unknown => None,
        }
    }

    pub fn previous(self) -> Self {
        self.months_back(1)
    }

    pub fn months_back(self, n: u32) -> Self {
        match self {
            ReportPeriod::Month { year, month } => {
                // Months since year 0, so the arithmetic wraps across years.
                let idx = i64::from(year) * 12 + i64::from(month) - 1 - i64::from(n);
                ReportPeriod::Month {
                    year: idx.div_euclid(12) as i32,
                    month: (idx.rem_euclid(12) + 1) as u32,
                }
            }
            ReportPeriod::Unknown => ReportPeriod::Unknown,
        }
    }

    /// Short chart label such as `Jan-24`.
    pub fn label(&self) -> String {
        match self {
            ReportPeriod::Month { year, month } => NaiveDate::from_ymd_opt(*year, *month, 1)
                .map(|d| d.format("%b-%y").to_string())
                .unwrap_or_else(|| self.to_string()),
            ReportPeriod::Unknown => UNASSIGNED.to_string(),
        }
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportPeriod::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
            ReportPeriod::Unknown => f.write_str(UNASSIGNED),
        }
    }
}

impl Serialize for ReportPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One maintenance work order, as handed over by the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkOrderRecord {
    pub work_order: String,
    pub status: String,
    pub target_date: DateField,
    pub actual_finish_date: DateField,
    pub group: Option<String>,
    pub work_type: String,
    pub description: String,
    pub report_period: ReportPeriod,
}

impl WorkOrderRecord {
    pub fn new(work_order: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            work_order: work_order.into(),
            status: status.into(),
            target_date: DateField::Missing,
            actual_finish_date: DateField::Missing,
            group: None,
            work_type: String::new(),
            description: String::new(),
            report_period: ReportPeriod::Unknown,
        }
    }

    /// Sets the target date and derives the report period from it.
    pub fn with_target(mut self, target: NaiveDate) -> Self {
        self.target_date = DateField::Parsed(target);
        self.report_period = ReportPeriod::of(target);
        self
    }

    pub fn with_finish(mut self, finish: NaiveDate) -> Self {
        self.actual_finish_date = DateField::Parsed(finish);
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_work_type(mut self, work_type: impl Into<String>) -> Self {
        self.work_type = work_type.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Group name with blanks folded into the `Unassigned` bucket.
    pub fn group_key(&self) -> &str {
        match self.group.as_deref().map(str::trim) {
            Some(g) if !g.is_empty() => g,
            _ => UNASSIGNED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    OnTime,
    Late,
    Missed,
    Open,
    Cancelled,
    Unknown,
}

impl Classification {
    pub const ALL: [Classification; 6] = [
        Classification::OnTime,
        Classification::Late,
        Classification::Missed,
        Classification::Open,
        Classification::Cancelled,
        Classification::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::OnTime => "ON_TIME",
            Classification::Late => "LATE",
            Classification::Missed => "MISSED",
            Classification::Open => "OPEN",
            Classification::Cancelled => "CANCELLED",
            Classification::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRecord {
    pub record: WorkOrderRecord,
    pub classification: Classification,
}

/// Work type buckets used to pick out preventive maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkTypeCategory {
    Pm,
    Ca,
    Rql,
    Other,
}

impl WorkTypeCategory {
    pub fn from_work_type(work_type: &str) -> Self {
        let upper = work_type.to_uppercase();
        if upper.contains("PM") {
            WorkTypeCategory::Pm
        } else if upper.contains("CA") {
            WorkTypeCategory::Ca
        } else if upper.contains("RQL") {
            WorkTypeCategory::Rql
        } else {
            WorkTypeCategory::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Period,
    Group,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Period => f.write_str("period"),
            Dimension::Group => f.write_str("group"),
        }
    }
}

fn display_percent(v: &f64) -> String {
    format!("{}%", format_number(v * 100.0, 1))
}

/// Counts for one dimension bucket. Percentages are fractions in `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct SummaryRow {
    #[serde(rename = "Key")]
    #[tabled(rename = "Key")]
    pub key: String,
    #[serde(rename = "Total")]
    #[tabled(rename = "Total")]
    pub total: usize,
    #[serde(rename = "OnTime")]
    #[tabled(rename = "OnTime")]
    pub on_time: usize,
    #[serde(rename = "Late")]
    #[tabled(rename = "Late")]
    pub late: usize,
    #[serde(rename = "Missed")]
    #[tabled(rename = "Missed")]
    pub missed: usize,
    #[serde(rename = "Open")]
    #[tabled(rename = "Open")]
    pub open: usize,
    #[serde(rename = "Cancelled")]
    #[tabled(rename = "Cancelled")]
    pub cancelled: usize,
    #[serde(rename = "Unknown")]
    #[tabled(rename = "Unknown")]
    pub unknown: usize,
    #[serde(rename = "MissedPct")]
    #[tabled(rename = "MissedPct", display_with = "display_percent")]
    pub missed_percent: f64,
    #[serde(rename = "CompletionPct")]
    #[tabled(rename = "CompletionPct", display_with = "display_percent")]
    pub completion_percent: f64,
}

impl SummaryRow {
    pub fn empty(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            total: 0,
            on_time: 0,
            late: 0,
            missed: 0,
            open: 0,
            cancelled: 0,
            unknown: 0,
            missed_percent: 0.0,
            completion_percent: 0.0,
        }
    }

    /// Work that has come due: anything with a target date that is finished or overdue.
    pub fn due(&self) -> usize {
        self.on_time + self.late + self.missed
    }

    pub fn complete(&self) -> usize {
        self.on_time + self.late
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTable {
    pub dimension: Dimension,
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> usize {
        self.rows.iter().map(|r| r.total).sum()
    }

    pub fn row(&self, key: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.key == key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodMissedSeries {
    pub periods: Vec<String>,
    pub due: Vec<usize>,
    pub complete: Vec<usize>,
    pub missed: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupMissedSeries {
    pub groups: Vec<String>,
    pub missed: Vec<usize>,
    pub missed_percent: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GovernanceOverview {
    pub total: usize,
    pub due: usize,
    pub completed: usize,
    pub on_time: usize,
    pub late: usize,
    pub missed: usize,
    pub open: usize,
    pub cancelled: usize,
    pub unknown: usize,
    pub completion_percent: f64,
}

/// Flat export shape of a classified work order.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct WorkOrderRow {
    #[serde(rename = "WorkOrder")]
    #[tabled(rename = "WorkOrder")]
    pub work_order: String,
    #[serde(rename = "Status")]
    #[tabled(rename = "Status")]
    pub status: String,
    #[serde(rename = "TargetDate")]
    #[tabled(rename = "TargetDate")]
    pub target_date: String,
    #[serde(rename = "ActualFinish")]
    #[tabled(rename = "ActualFinish")]
    pub actual_finish: String,
    #[serde(rename = "Group")]
    #[tabled(rename = "Group")]
    pub group: String,
    #[serde(rename = "WorkType")]
    #[tabled(rename = "WorkType")]
    pub work_type: String,
    #[serde(rename = "ReportPeriod")]
    #[tabled(rename = "ReportPeriod")]
    pub report_period: String,
    #[serde(rename = "Classification")]
    #[tabled(rename = "Classification")]
    pub classification: String,
    #[serde(rename = "Description")]
    #[tabled(rename = "Description")]
    pub description: String,
}

impl From<&ClassifiedRecord> for WorkOrderRow {
    fn from(c: &ClassifiedRecord) -> Self {
        let r = &c.record;
        Self {
            work_order: r.work_order.clone(),
            status: r.status.clone(),
            target_date: r.target_date.to_string(),
            actual_finish: r.actual_finish_date.to_string(),
            group: r.group_key().to_string(),
            work_type: r.work_type.clone(),
            report_period: r.report_period.to_string(),
            classification: c.classification.to_string(),
            description: r.description.clone(),
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct LateWorkOrderRow {
    #[serde(rename = "ReportPeriod")]
    #[tabled(rename = "ReportPeriod")]
    pub report_period: String,
    #[serde(rename = "WorkOrder")]
    #[tabled(rename = "WorkOrder")]
    pub work_order: String,
    #[serde(rename = "Group")]
    #[tabled(rename = "Group")]
    pub group: String,
    #[serde(rename = "TargetDate")]
    #[tabled(rename = "TargetDate")]
    pub target_date: String,
    #[serde(rename = "DaysLate")]
    #[tabled(rename = "DaysLate")]
    pub days_late: i64,
    #[serde(rename = "Description")]
    #[tabled(rename = "Description")]
    pub description: String,
    #[serde(rename = "Classification")]
    #[tabled(rename = "Classification")]
    pub classification: String,
    #[serde(rename = "Status")]
    #[tabled(rename = "Status")]
    pub status: String,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct DispositionRow {
    #[serde(rename = "ReportPeriod")]
    #[tabled(rename = "ReportPeriod")]
    pub report_period: String,
    #[serde(rename = "Closed")]
    #[tabled(rename = "Closed")]
    pub closed: usize,
    #[serde(rename = "AwaitingQA")]
    #[tabled(rename = "AwaitingQA")]
    pub awaiting_qa: usize,
    #[serde(rename = "AwaitingDept")]
    #[tabled(rename = "AwaitingDept")]
    pub awaiting_dept: usize,
    #[serde(rename = "Total")]
    #[tabled(rename = "Total")]
    pub total: usize,
}

/// Everything one governance run produces, ready for export.
#[derive(Debug, Clone, Serialize)]
pub struct GovernanceReport {
    pub as_of: NaiveDate,
    pub window_start: ReportPeriod,
    pub window_end: ReportPeriod,
    pub overview: GovernanceOverview,
    pub monthly: SummaryTable,
    pub monthly_total: SummaryRow,
    /// Monthly row for the month before `as_of`, when it falls in the window.
    pub previous_month: Option<SummaryRow>,
    /// Monthly rows of the window that fall in the as-of calendar year.
    pub year_to_date: SummaryTable,
    pub year_to_date_total: SummaryRow,
    pub group_period: ReportPeriod,
    pub by_group: SummaryTable,
    pub period_series: PeriodMissedSeries,
    pub group_series: GroupMissedSeries,
    pub late: Vec<WorkOrderRow>,
    pub extreme_late: Vec<LateWorkOrderRow>,
    pub disposition: Vec<DispositionRow>,
    pub warnings: Vec<DataQualityWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn period_ordering_is_chronological_with_unknown_last() {
        let mut periods = vec![
            ReportPeriod::Unknown,
            ReportPeriod::of(d(2024, 3, 1)),
            ReportPeriod::of(d(2023, 12, 31)),
            ReportPeriod::of(d(2024, 1, 15)),
        ];
        periods.sort();
        let keys: Vec<String> = periods.iter().map(|p| p.to_string()).collect();
        assert_eq!(keys, vec!["2023-12", "2024-01", "2024-03", "Unassigned"]);
    }

    #[test]
    fn months_back_wraps_across_years() {
        let jan = ReportPeriod::of(d(2024, 1, 10));
        assert_eq!(jan.previous(), ReportPeriod::Month { year: 2023, month: 12 });
        assert_eq!(jan.months_back(13), ReportPeriod::Month { year: 2022, month: 12 });
        assert_eq!(ReportPeriod::Unknown.previous(), ReportPeriod::Unknown);
        assert_eq!(jan.year(), Some(2024));
        assert_eq!(ReportPeriod::Unknown.year(), None);
    }

    #[test]
    fn period_label_uses_short_month() {
        assert_eq!(ReportPeriod::of(d(2024, 1, 10)).label(), "Jan-24");
        assert_eq!(ReportPeriod::Unknown.label(), "Unassigned");
    }

    #[test]
    fn blank_group_folds_into_unassigned() {
        let r = WorkOrderRecord::new("WO-1", "INPRG").with_group("   ");
        assert_eq!(r.group_key(), UNASSIGNED);
        let r = WorkOrderRecord::new("WO-2", "INPRG").with_group(" Facilities ");
        assert_eq!(r.group_key(), "Facilities");
    }

    #[test]
    fn work_type_category_precedence() {
        assert_eq!(WorkTypeCategory::from_work_type("pm-weekly"), WorkTypeCategory::Pm);
        assert_eq!(WorkTypeCategory::from_work_type("CA"), WorkTypeCategory::Ca);
        assert_eq!(WorkTypeCategory::from_work_type("rql"), WorkTypeCategory::Rql);
        assert_eq!(WorkTypeCategory::from_work_type("Corrective"), WorkTypeCategory::Other);
    }

    #[test]
    fn unparsable_date_behaves_as_absent() {
        let f = DateField::Unparsable("31/31/2024".into());
        assert_eq!(f.date(), None);
        assert_eq!(f.unparsable_raw(), Some("31/31/2024"));
        assert_eq!(DateField::from(Some(d(2024, 1, 2))).to_string(), "2024-01-02");
    }
}
