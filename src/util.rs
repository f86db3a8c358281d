// Utility helpers for parsing and formatting.
//
// This module centralizes the "dirty" text handling so the engine can work
// with typed dates and normalized statuses.
use chrono::{NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

use crate::types::DateField;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d-%b-%Y"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
];

/// Parse a date exported by the work order system.
///
/// Plain dates and date-times are both accepted; the time part is dropped.
/// Returns `None` for blank or unrecognized text.
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
}

/// Like [`parse_date_safe`], but keeps non-blank text that failed to parse so
/// it can be reported later.
pub fn parse_date_field(s: Option<&str>) -> DateField {
    let Some(raw) = s.map(str::trim).filter(|s| !s.is_empty()) else {
        return DateField::Missing;
    };
    match parse_date_safe(Some(raw)) {
        Some(d) => DateField::Parsed(d),
        None => DateField::Unparsable(raw.to_string()),
    }
}

pub fn days_diff(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

pub fn normalize_status(s: &str) -> String {
    s.trim().to_uppercase()
}

/// `num / den`, or 0 when there is nothing to divide by.
pub fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        return 0.0;
    }
    num as f64 / den as f64
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals with locale thousands separators, e.g. `1,234,567.89`.
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_common_export_formats() {
        assert_eq!(parse_date_safe(Some("2024-01-10")), Some(d(2024, 1, 10)));
        assert_eq!(parse_date_safe(Some(" 01/10/2024 ")), Some(d(2024, 1, 10)));
        assert_eq!(parse_date_safe(Some("2024-01-10 13:45:00")), Some(d(2024, 1, 10)));
        assert_eq!(parse_date_safe(Some("2024-01-10T08:00:00")), Some(d(2024, 1, 10)));
        assert_eq!(parse_date_safe(Some("10-Jan-2024")), Some(d(2024, 1, 10)));
        assert_eq!(parse_date_safe(Some("")), None);
        assert_eq!(parse_date_safe(None), None);
        assert_eq!(parse_date_safe(Some("next week")), None);
    }

    #[test]
    fn date_field_keeps_unparsable_text() {
        assert_eq!(parse_date_field(Some("  ")), DateField::Missing);
        assert_eq!(parse_date_field(None), DateField::Missing);
        assert_eq!(
            parse_date_field(Some("2024-02-30")),
            DateField::Unparsable("2024-02-30".into())
        );
        assert_eq!(parse_date_field(Some("2024-02-29")), DateField::Parsed(d(2024, 2, 29)));
    }

    #[test]
    fn ratio_guards_zero_denominator() {
        assert_eq!(ratio(3, 0), 0.0);
        assert!((ratio(1, 3) - 0.3333).abs() < 1e-3);
    }

    #[test]
    fn formats_numbers_with_separators() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(33.333, 1), "33.3");
        assert_eq!(format_number(-5.0, 0), "-5");
        assert_eq!(format_number(0.0, 1), "0.0");
        assert_eq!(format_int(9855usize), "9,855");
    }
}
