use crate::config::ColumnMap;
use crate::error::{EngineError, Result};
use crate::types::{RawRow, ReportPeriod, WorkOrderRecord};
use crate::util::{parse_date_field, parse_date_safe};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    pub unknown_period: usize,
}

/// Header positions for each normalized field.
struct HeaderIndex {
    work_order: Option<usize>,
    status: usize,
    target_date: usize,
    actual_finish: Option<usize>,
    group: Option<usize>,
    work_type: Option<usize>,
    description: Option<usize>,
    report_date: Option<usize>,
}

impl HeaderIndex {
    fn resolve(headers: &StringRecord, columns: &ColumnMap) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
        };
        let require = |field: &'static str, name: &str| {
            find(name).ok_or_else(|| EngineError::MissingColumn {
                field,
                column: name.to_string(),
            })
        };
        Ok(Self {
            work_order: find(columns.work_order.as_str()),
            status: require("status", columns.status.as_str())?,
            target_date: require("target_date", columns.target_date.as_str())?,
            actual_finish: find(columns.actual_finish.as_str()),
            group: find(columns.group.as_str()),
            work_type: find(columns.work_type.as_str()),
            description: find(columns.description.as_str()),
            report_date: find(columns.report_date.as_str()),
        })
    }

    fn extract(&self, row: &StringRecord) -> RawRow {
        let get = |idx: Option<usize>| idx.and_then(|i| row.get(i)).map(str::to_string);
        RawRow {
            work_order: get(self.work_order),
            status: get(Some(self.status)),
            target_date: get(Some(self.target_date)),
            actual_finish: get(self.actual_finish),
            group: get(self.group),
            work_type: get(self.work_type),
            description: get(self.description),
            report_date: get(self.report_date),
        }
    }
}

pub fn load_work_orders(
    path: impl AsRef<Path>,
    columns: &ColumnMap,
) -> Result<(Vec<WorkOrderRecord>, LoadReport)> {
    let path = path.as_ref();
    let rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)?;
    let (records, report) = read_records(rdr, columns)?;
    info!(
        path = %path.display(),
        total = report.total_rows,
        loaded = report.loaded_rows,
        skipped = report.parse_errors,
        "loaded work orders"
    );
    Ok((records, report))
}

pub fn load_from_reader<R: Read>(
    reader: R,
    columns: &ColumnMap,
) -> Result<(Vec<WorkOrderRecord>, LoadReport)> {
    let rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    read_records(rdr, columns)
}

fn read_records<R: Read>(
    mut rdr: csv::Reader<R>,
    columns: &ColumnMap,
) -> Result<(Vec<WorkOrderRecord>, LoadReport)> {
    let headers = rdr.headers()?.clone();
    let index = HeaderIndex::resolve(&headers, columns)?;

    let mut report = LoadReport::default();
    let mut records = Vec::new();
    for result in rdr.records() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(row = report.total_rows, error = %e, "skipping malformed row");
                report.parse_errors += 1;
                continue;
            }
        };
        let record = normalize(index.extract(&row));
        if !record.report_period.is_known() {
            report.unknown_period += 1;
        }
        records.push(record);
    }
    report.loaded_rows = records.len();
    Ok((records, report))
}

/// Turn raw text fields into a typed record.
///
/// The report period comes from the target date, falling back to the report
/// date column when the target is missing or unreadable.
pub fn normalize(row: RawRow) -> WorkOrderRecord {
    let clean = |s: Option<String>| s.map(|v| v.trim().to_string()).unwrap_or_default();

    let target_date = parse_date_field(row.target_date.as_deref());
    let actual_finish_date = parse_date_field(row.actual_finish.as_deref());
    let reference = target_date
        .date()
        .or_else(|| parse_date_safe(row.report_date.as_deref()));

    WorkOrderRecord {
        work_order: clean(row.work_order),
        status: clean(row.status),
        target_date,
        actual_finish_date,
        group: row
            .group
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty()),
        work_type: clean(row.work_type),
        description: clean(row.description),
        report_period: ReportPeriod::from_date(reference),
    }
}
