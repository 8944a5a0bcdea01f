use std::path::Path;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Identifiers for the records that come without one.
///
/// The position of the source in the list of inputs is part of the id: two
/// exports may have the same file name.
pub fn make_default_id(source: usize, path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}#{}-{:08}", simplified_file_name, source, lineno)
}

/// Empty cells are missing values.
pub fn cell_value(cell: Option<&str>) -> Option<String> {
    cell.map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Reads a timestamp from an export. RFC 3339 is expected, but the plain
/// `2025-04-13 14:05:00` form of database dumps is accepted as UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(_) => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .map(|naive| Utc.from_utc_datetime(&naive)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn default_ids() {
        let f = make_default_id(0, "/tmp/exports/votes.csv");
        assert_eq!(f(12), "votes.csv#0-00000012");
        let g = make_default_id(1, "/tmp/backup/votes.csv");
        assert_ne!(f(12), g(12));
    }

    #[test]
    fn timestamps() {
        let t = parse_timestamp("2025-04-13T09:05:00-05:00").unwrap();
        assert_eq!(t.hour(), 14);
        let t = parse_timestamp("2025-04-13 09:05:00").unwrap();
        assert_eq!(t.hour(), 9);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn cells() {
        assert_eq!(cell_value(Some("  ")), None);
        assert_eq!(cell_value(None), None);
        assert_eq!(cell_value(Some(" Lima ")), Some("Lima".to_string()));
    }
}
