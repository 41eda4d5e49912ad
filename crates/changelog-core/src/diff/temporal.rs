//! Display and comparison form of date, time and timestamp values.
//!
//! Accepted inputs: RFC 3339 strings, `YYYY-MM-DD HH:MM:SS`,
//! `YYYY-MM-DD`, `HH:MM:SS` and integer epoch seconds. Anything else is
//! passed through untouched.

use crate::config::ChangeLogConfig;
use crate::schema::ColumnType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;
use std::fmt::Write as _;

enum Parsed {
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
}

fn parse(value: &Value) -> Option<Parsed> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| Parsed::DateTime(dt.naive_utc())),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(Parsed::DateTime(dt.naive_utc()));
            }
            for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                    return Some(Parsed::DateTime(dt));
                }
            }
            if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return Some(Parsed::Date(date));
            }
            NaiveTime::parse_from_str(s, "%H:%M:%S")
                .ok()
                .map(Parsed::Time)
        }
        _ => None,
    }
}

fn render(item: impl std::fmt::Display) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", item).ok()?;
    Some(out)
}

/// Format a value of `column_type` with the configured format strings
///
/// Non-temporal columns, nulls and unparseable values come back unchanged.
/// An invalid format string also leaves the value unchanged.
pub fn format_value(value: &Value, column_type: ColumnType, config: &ChangeLogConfig) -> Value {
    if !column_type.is_temporal() {
        return value.clone();
    }
    let Some(parsed) = parse(value) else {
        return value.clone();
    };
    let formatted = match (column_type, parsed) {
        (ColumnType::Date, Parsed::DateTime(dt)) => render(dt.date().format(&config.date_format)),
        (ColumnType::Date, Parsed::Date(d)) => render(d.format(&config.date_format)),
        (ColumnType::Time, Parsed::DateTime(dt)) => render(dt.time().format(&config.time_format)),
        (ColumnType::Time, Parsed::Time(t)) => render(t.format(&config.time_format)),
        (ColumnType::Timestamp, Parsed::DateTime(dt)) => {
            render(dt.format(&config.date_time_format))
        }
        (ColumnType::Timestamp, Parsed::Date(d)) => d
            .and_hms_opt(0, 0, 0)
            .and_then(|dt| render(dt.format(&config.date_time_format))),
        _ => None,
    };
    formatted.map(Value::String).unwrap_or_else(|| value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_date_formats() {
        let config = ChangeLogConfig::default();
        assert_eq!(
            format_value(&json!("2024-03-05"), ColumnType::Date, &config),
            json!("2024/03/05")
        );
        assert_eq!(
            format_value(&json!("2024-03-05T10:20:30Z"), ColumnType::Timestamp, &config),
            json!("2024/03/05 10:20:30")
        );
        assert_eq!(
            format_value(&json!("10:20:30"), ColumnType::Time, &config),
            json!("10:20:30")
        );
    }

    #[test]
    fn test_epoch_seconds() {
        let config = ChangeLogConfig::default();
        assert_eq!(
            format_value(&json!(0), ColumnType::Timestamp, &config),
            json!("1970/01/01 00:00:00")
        );
    }

    #[test]
    fn test_passthrough() {
        let config = ChangeLogConfig::default();
        assert_eq!(format_value(&json!("soon"), ColumnType::Date, &config), json!("soon"));
        assert_eq!(format_value(&Value::Null, ColumnType::Date, &config), Value::Null);
        assert_eq!(format_value(&json!(5), ColumnType::Numeric, &config), json!(5));
    }

    #[test]
    fn test_invalid_format_string_does_not_panic() {
        let config = ChangeLogConfig {
            date_format: "%Q".to_string(),
            ..ChangeLogConfig::default()
        };
        assert_eq!(
            format_value(&json!("2024-03-05"), ColumnType::Date, &config),
            json!("2024-03-05")
        );
    }
}
