use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Layouts with an explicit numeric offset, tried after RFC 2822 / RFC 3339.
const ZONED_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M %z",
    "%d %b %Y %H:%M:%S %z",
    "%a %b %d %H:%M:%S %z %Y",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S %z",
    "%A, %d-%b-%y %H:%M:%S %z",
];

/// Layouts without zone information; interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%a %b %d %H:%M:%S %Y",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d %b %Y", "%a, %d %b %Y", "%B %d, %Y", "%Y/%m/%d"];

/// Zone abbreviations that show up in feeds and that chrono's RFC 2822
/// parser does not know, mapped to numeric offsets.
const ZONE_ABBREVIATIONS: &[(&str, &str)] = &[
    ("UTC", "+0000"),
    ("Z", "+0000"),
    ("CET", "+0100"),
    ("CEST", "+0200"),
    ("BST", "+0100"),
    ("IST", "+0530"),
    ("JST", "+0900"),
    ("AEST", "+1000"),
    ("AEDT", "+1100"),
];

/// Best-effort parsing of the date strings found in RSS and Atom feeds.
///
/// Tries RFC 2822 and RFC 3339 first, then a list of layouts commonly
/// produced by broken feed generators. Returns `None` when nothing matches;
/// callers keep the raw string in that case.
///
/// # Examples
///
/// ```
/// use feedloom::util::parse_date;
///
/// assert!(parse_date("Mon, 02 Jan 2006 15:04:05 GMT").is_some());
/// assert!(parse_date("2006-01-02T15:04:05Z").is_some());
/// assert!(parse_date("sometime last week").is_none());
/// ```
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let normalized = replace_zone_abbreviation(s);
    let candidate = normalized.as_deref().unwrap_or(s);
    if normalized.is_some() {
        if let Ok(dt) = DateTime::parse_from_rfc2822(candidate) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(candidate, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
        }
    }

    tracing::trace!(date = %s, "unrecognized date format");
    None
}

/// Replaces a trailing zone abbreviation with its numeric offset.
fn replace_zone_abbreviation(s: &str) -> Option<String> {
    let (head, zone) = s.rsplit_once(' ')?;
    ZONE_ABBREVIATIONS
        .iter()
        .find(|(abbr, _)| abbr.eq_ignore_ascii_case(zone))
        .map(|(_, offset)| format!("{head} {offset}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use chrono::Timelike;

    fn ymd_hms(dt: DateTime<Utc>) -> (i32, u32, u32, u32, u32, u32) {
        (
            dt.year(),
            dt.month(),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second(),
        )
    }

    #[test]
    fn test_rfc2822() {
        let dt = parse_date("Tue, 10 Jun 2003 04:00:00 GMT").unwrap();
        assert_eq!(ymd_hms(dt), (2003, 6, 10, 4, 0, 0));
    }

    #[test]
    fn test_rfc2822_with_offset_normalized_to_utc() {
        let dt = parse_date("Tue, 10 Jun 2003 04:00:00 +0200").unwrap();
        assert_eq!(ymd_hms(dt), (2003, 6, 10, 2, 0, 0));
    }

    #[test]
    fn test_rfc3339() {
        let dt = parse_date("2003-12-13T18:30:02Z").unwrap();
        assert_eq!(ymd_hms(dt), (2003, 12, 13, 18, 30, 2));

        let dt = parse_date("2003-12-13T18:30:02.25+01:00").unwrap();
        assert_eq!(ymd_hms(dt), (2003, 12, 13, 17, 30, 2));
    }

    #[test]
    fn test_zone_abbreviation() {
        let dt = parse_date("Tue, 10 Jun 2003 04:00:00 CEST").unwrap();
        assert_eq!(ymd_hms(dt), (2003, 6, 10, 2, 0, 0));
    }

    #[test]
    fn test_naive_datetime_is_utc() {
        let dt = parse_date("2003-12-13 18:30:02").unwrap();
        assert_eq!(ymd_hms(dt), (2003, 12, 13, 18, 30, 2));
    }

    #[test]
    fn test_date_only() {
        let dt = parse_date("2003-12-13").unwrap();
        assert_eq!(ymd_hms(dt), (2003, 12, 13, 0, 0, 0));
    }

    #[test]
    fn test_garbage_is_none() {
        assert!(parse_date("").is_none());
        assert!(parse_date("   ").is_none());
        assert!(parse_date("not a date").is_none());
    }
}
