//! Cell cleaning and coercion
//!
//! Every function here is total: a value that cannot be coerced falls back
//! to an empty string or zero instead of failing.

use crate::types::CellValue;
use chrono::{Datelike, Days, Local, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;

/// Output format of `format_date`
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Trimmed text of a cell; missing values and a lone "-" become "".
pub fn sanitize_text(value: &CellValue) -> String {
    if value.is_missing() {
        return String::new();
    }

    let text = value.to_string();
    let stripped = text.trim();
    if stripped == "-" {
        String::new()
    } else {
        stripped.to_string()
    }
}

/// Integer content of a cell.
///
/// Numbers are truncated toward zero. Text keeps only its ASCII digits, so
/// signs and decimal points are discarded: "Cantidad: 15 unidades" is 15,
/// "-3.5" is 35.
pub fn extract_number(value: &CellValue) -> i64 {
    match value {
        _ if value.is_missing() => 0,
        CellValue::Integer(i) => *i,
        CellValue::Number(n) => n.trunc() as i64,
        CellValue::Text(s) => s
            .chars()
            .filter(char::is_ascii_digit)
            .filter_map(|c| c.to_digit(10))
            .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(d as i64)),
        _ => 0,
    }
}

/// Cell rendered as `DD/MM/YYYY`, or "" when it is not a date.
pub fn format_date(value: &CellValue) -> String {
    parse_date(value)
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// A cell that carries data: not missing, not blank text, not "-".
pub fn is_valid(value: &CellValue) -> bool {
    match value {
        _ if value.is_missing() => false,
        CellValue::Text(s) => {
            let stripped = s.trim();
            !(stripped.is_empty() || stripped == "-")
        }
        _ => true,
    }
}

/// Calendar date of a cell.
///
/// Numbers are Excel date serials. Text is read month-first; the day-first
/// reading is used only when month-first gives no valid date.
pub fn parse_date(value: &CellValue) -> Option<NaiveDate> {
    match value {
        _ if value.is_missing() => None,
        CellValue::Date(d) => Some(*d),
        CellValue::Integer(i) => excel_serial_to_date(*i as f64),
        CellValue::Number(n) => excel_serial_to_date(*n),
        CellValue::Text(s) => parse_date_text(s),
        CellValue::Empty => None,
    }
}

/// Date of an Excel serial number (1900 date system).
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial >= 2_958_466.0 {
        return None;
    }

    let days = serial.floor() as u64;
    // Serials below 60 predate Excel's phantom 1900-02-29.
    let base = if days < 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    base.checked_add_days(Days::new(days))
}

fn numeric_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{1,4})[/\-.](\d{1,2})[/\-.](\d{1,4})(?:[ T]\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?)?$")
            .expect("valid date regex")
    })
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = numeric_date_pattern().captures(text) {
        let first = &caps[1];
        let second: u32 = caps[2].parse().ok()?;
        let third = &caps[3];

        if first.len() == 4 {
            let year: i32 = first.parse().ok()?;
            let day: u32 = third.parse().ok()?;
            return NaiveDate::from_ymd_opt(year, second, day);
        }

        let first: u32 = first.parse().ok()?;
        let year = expand_year(third)?;
        return NaiveDate::from_ymd_opt(year, first, second)
            .or_else(|| NaiveDate::from_ymd_opt(year, second, first));
    }

    if text.len() == 8 && text.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y%m%d") {
            return Some(date);
        }
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Some(datetime.date());
        }
    }

    for format in ["%d %B %Y", "%B %d, %Y", "%B %d %Y", "%d-%b-%Y", "%d %b %Y", "%b %d, %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }

    None
}

fn expand_year(text: &str) -> Option<i32> {
    let year: i32 = text.parse().ok()?;
    match text.len() {
        4 => Some(year),
        1 | 2 => Some(century_window(year, Local::now().year())),
        _ => None,
    }
}

/// Two-digit year placed within 50 years of `current`.
fn century_window(two_digit: i32, current: i32) -> i32 {
    let year = current / 100 * 100 + two_digit;
    if year >= current + 50 {
        year - 100
    } else if year < current - 50 {
        year + 100
    } else {
        year
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text(&CellValue::Empty), "");
        assert_eq!(sanitize_text(&CellValue::Number(f64::NAN)), "");
        assert_eq!(sanitize_text(&CellValue::from("  Tornillo ")), "Tornillo");
        assert_eq!(sanitize_text(&CellValue::from(" - ")), "");
        assert_eq!(sanitize_text(&CellValue::from("   ")), "");
        assert_eq!(sanitize_text(&CellValue::from("A-1")), "A-1");
        assert_eq!(sanitize_text(&CellValue::Integer(1042)), "1042");
        assert_eq!(sanitize_text(&CellValue::Number(2.5)), "2.5");
    }

    #[test]
    fn test_extract_number() {
        assert_eq!(extract_number(&CellValue::from("Cantidad: 15 unidades")), 15);
        assert_eq!(extract_number(&CellValue::from("-")), 0);
        assert_eq!(extract_number(&CellValue::Empty), 0);
        assert_eq!(extract_number(&CellValue::Number(f64::NAN)), 0);
        assert_eq!(extract_number(&CellValue::from("10 kg")), 10);
        assert_eq!(extract_number(&CellValue::from("-3.5")), 35);
        assert_eq!(extract_number(&CellValue::Number(7.9)), 7);
        assert_eq!(extract_number(&CellValue::Number(-7.9)), -7);
        assert_eq!(extract_number(&CellValue::Date(date(2024, 1, 1))), 0);
    }

    #[test]
    fn test_extract_number_idempotent_on_integers() {
        for n in [0i64, 1, 15, 2024] {
            let once = extract_number(&CellValue::Integer(n));
            assert_eq!(once, n);
            assert_eq!(extract_number(&CellValue::Integer(once)), n);
            assert_eq!(extract_number(&CellValue::from(n.to_string())), n);
        }
    }

    #[test]
    fn test_extract_number_saturates() {
        let huge = CellValue::from("99999999999999999999999");
        assert_eq!(extract_number(&huge), i64::MAX);
    }

    #[test]
    fn test_is_valid() {
        assert!(!is_valid(&CellValue::from("")));
        assert!(!is_valid(&CellValue::from("-")));
        assert!(!is_valid(&CellValue::from("  -  ")));
        assert!(!is_valid(&CellValue::Empty));
        assert!(!is_valid(&CellValue::Number(f64::NAN)));
        assert!(is_valid(&CellValue::Integer(0)));
        assert!(is_valid(&CellValue::Number(0.0)));
        assert!(is_valid(&CellValue::from("x")));
        assert!(is_valid(&CellValue::Date(date(2024, 1, 1))));
    }

    #[test]
    fn test_format_date_from_date_cell() {
        assert_eq!(format_date(&CellValue::Date(date(2024, 3, 5))), "05/03/2024");
    }

    #[test]
    fn test_format_date_iso_text() {
        assert_eq!(format_date(&CellValue::from("2024-03-05")), "05/03/2024");
        assert_eq!(format_date(&CellValue::from("2024/03/05")), "05/03/2024");
        assert_eq!(
            format_date(&CellValue::from("2024-03-05 00:00:00")),
            "05/03/2024"
        );
        assert_eq!(
            format_date(&CellValue::from("2024-03-05T10:30:00")),
            "05/03/2024"
        );
        assert_eq!(format_date(&CellValue::from("20240305")), "05/03/2024");
    }

    #[test]
    fn test_format_date_is_month_first() {
        // Ambiguous: read as March 4th
        assert_eq!(format_date(&CellValue::from("03/04/2024")), "04/03/2024");
        // Impossible as month-first: falls back to day-first
        assert_eq!(format_date(&CellValue::from("25/12/2023")), "25/12/2023");
        assert_eq!(format_date(&CellValue::from("3-4-24")), "04/03/2024");
    }

    #[test]
    fn test_two_digit_year_window_follows_current_year() {
        assert_eq!(century_window(24, 2026), 2024);
        assert_eq!(century_window(75, 2026), 2075);
        assert_eq!(century_window(76, 2026), 1976);
        assert_eq!(century_window(5, 2090), 2105);
        assert_eq!(century_window(99, 2001), 1999);
    }

    #[test]
    fn test_format_date_textual_month() {
        assert_eq!(format_date(&CellValue::from("5 March 2024")), "05/03/2024");
        assert_eq!(format_date(&CellValue::from("Mar 5, 2024")), "05/03/2024");
    }

    #[test]
    fn test_format_date_excel_serial() {
        assert_eq!(format_date(&CellValue::Number(45356.0)), "05/03/2024");
        assert_eq!(format_date(&CellValue::Integer(45356)), "05/03/2024");
        assert_eq!(format_date(&CellValue::Number(1.0)), "01/01/1900");
        assert_eq!(format_date(&CellValue::Number(61.0)), "01/03/1900");
    }

    #[test]
    fn test_format_date_unparseable() {
        assert_eq!(format_date(&CellValue::Empty), "");
        assert_eq!(format_date(&CellValue::from("-")), "");
        assert_eq!(format_date(&CellValue::from("pendiente")), "");
        assert_eq!(format_date(&CellValue::from("31/31/2024")), "");
        assert_eq!(format_date(&CellValue::Number(0.0)), "");
        assert_eq!(format_date(&CellValue::Number(-4.0)), "");
    }
}
