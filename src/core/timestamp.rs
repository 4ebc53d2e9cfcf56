use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};

pub const OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f %z", "%Y-%m-%dT%H:%M:%S%.f%z"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %I:%M:%S%.f %p",
    "%Y-%m-%d %I:%M %p",
    "%d/%m/%Y %I:%M:%S %p",
    "%d/%m/%Y %I:%M %p",
];

/// Date-only values are taken at midnight.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

fn is_meridiem(token: &str) -> bool {
    token.eq_ignore_ascii_case("am") || token.eq_ignore_ascii_case("pm")
}

/// Parses the timestamp shapes seen in fleet exports, e.g.
/// `2025-10-15 04:23:34.525 +0530 IST`. Values carrying a UTC offset keep
/// their local wall-clock time so hour-of-day survives.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let mut value = raw.trim();
    if value.is_empty() {
        return None;
    }

    // 去掉尾端的時區縮寫 (IST, UTC...)
    if let Some((head, tail)) = value.rsplit_once(' ') {
        if !tail.is_empty() && !is_meridiem(tail) && tail.chars().all(|c| c.is_ascii_alphabetic()) {
            value = head.trim_end();
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.naive_local());
        }
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

pub fn shift_days(timestamp: NaiveDateTime, days: i64) -> Option<NaiveDateTime> {
    timestamp.checked_add_signed(Duration::days(days))
}

pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(OUTPUT_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_export_format_with_zone_name() {
        let ts = parse_timestamp("2025-10-15 04:23:34.525 +0530 IST").unwrap();
        assert_eq!(format_timestamp(&ts), "2025-10-15 04:23:34");
        assert_eq!(ts.hour(), 4);
    }

    #[test]
    fn test_parse_plain_and_iso_formats() {
        assert!(parse_timestamp("2025-10-15 18:00:00").is_some());
        assert!(parse_timestamp("2025-10-15T18:00:00").is_some());
        assert!(parse_timestamp("2025-10-15T18:00:00+05:30").is_some());
        assert!(parse_timestamp("15/10/2025 18:00").is_some());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2025-13-40 99:00:00").is_none());
    }

    #[test]
    fn test_parse_date_only_values_at_midnight() {
        let iso = parse_timestamp("2025-10-15").unwrap();
        assert_eq!(format_timestamp(&iso), "2025-10-15 00:00:00");

        let dmy = parse_timestamp(" 15/10/2025 ").unwrap();
        assert_eq!(dmy, iso);
    }

    #[test]
    fn test_parse_twelve_hour_clock() {
        let pm = parse_timestamp("2025-10-15 04:23 PM").unwrap();
        assert_eq!(pm.hour(), 16);

        let am = parse_timestamp("2025-10-15 04:23:10 am").unwrap();
        assert_eq!(am.hour(), 4);

        let with_zone = parse_timestamp("15/10/2025 11:05 PM IST").unwrap();
        assert_eq!(format_timestamp(&with_zone), "2025-10-15 23:05:00");
    }

    #[test]
    fn test_shift_preserves_time_of_day() {
        let ts = parse_timestamp("2025-03-01 23:15:00").unwrap();
        let shifted = shift_days(ts, -180).unwrap();
        assert_eq!(format_timestamp(&shifted), "2024-09-02 23:15:00");
        assert_eq!(shifted.hour(), ts.hour());
    }
}
