use crate::domain::model::{NormalizedResponse, TrendPoint, TrendSeries, UNKNOWN_LABEL};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use std::collections::BTreeMap;

pub const DEFAULT_TIMEZONE: &str = "Africa/Lagos";

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses the timestamp shapes the forms API has been seen to send.
///
/// Offset-less values are read as UTC. Digit-only strings such as `"20250801"`
/// are not dates; numeric epoch values are converted to RFC 3339 when the
/// record is deserialized. Anything else yields `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Month-by-month response counts evaluated in one fixed civil timezone.
#[derive(Debug, Clone, Copy)]
pub struct TrendBucketer {
    tz: Tz,
}

impl Default for TrendBucketer {
    fn default() -> Self {
        Self {
            tz: chrono_tz::Africa::Lagos,
        }
    }
}

impl TrendBucketer {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// `YYYY-MM` of the timestamp in the reference zone.
    pub fn month_key(&self, raw: Option<&str>) -> Option<String> {
        let utc = parse_timestamp(raw?)?;
        Some(utc.with_timezone(&self.tz).format("%Y-%m").to_string())
    }

    pub fn bucket(&self, responses: &[NormalizedResponse]) -> TrendSeries {
        let mut months: BTreeMap<String, usize> = BTreeMap::new();
        let mut unknown = 0usize;

        for response in responses {
            match self.month_key(response.created_at.as_deref()) {
                Some(key) => *months.entry(key).or_insert(0) += 1,
                None => unknown += 1,
            }
        }

        let mut points: Vec<TrendPoint> = months
            .into_iter()
            .map(|(key, count)| TrendPoint {
                label: month_label(&key),
                key,
                count,
            })
            .collect();

        if unknown > 0 {
            points.push(TrendPoint {
                key: UNKNOWN_LABEL.to_string(),
                label: UNKNOWN_LABEL.to_string(),
                count: unknown,
            });
        }

        TrendSeries { points }
    }
}

/// "2025-08" -> "Aug 2025".
pub fn month_label(key: &str) -> String {
    NaiveDate::parse_from_str(&format!("{}-01", key), "%Y-%m-%d")
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_else(|_| key.to_string())
}

pub fn compute_trend(responses: &[NormalizedResponse]) -> TrendSeries {
    TrendBucketer::default().bucket(responses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dated(created_at: Option<&str>) -> NormalizedResponse {
        NormalizedResponse {
            created_at: created_at.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_trend_scenario() {
        let responses = vec![
            dated(Some("2025-08-01")),
            dated(Some("2025-08-15")),
            dated(Some("2025-09-02")),
            dated(None),
        ];

        let trend = compute_trend(&responses);

        assert_eq!(
            trend.labels_and_counts(),
            vec![("Aug 2025", 2), ("Sep 2025", 1), ("Unknown", 1)]
        );
    }

    #[test]
    fn test_unknown_is_last_and_months_are_chronological() {
        let responses = vec![
            dated(Some("garbage")),
            dated(Some("2026-01-10T08:00:00Z")),
            dated(Some("2024-12-31T10:00:00+01:00")),
            dated(Some("2025-02-13 09:15:00")),
            dated(Some("2025-13-40")),
            dated(Some("")),
        ];

        let trend = compute_trend(&responses);

        let keys: Vec<&str> = trend.points.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["2024-12", "2025-02", "2026-01", "Unknown"]);
        assert_eq!(trend.points.last().unwrap().count, 3);
    }

    #[test]
    fn test_no_unknown_bucket_when_all_dates_parse() {
        let trend = compute_trend(&[
            dated(Some("2025-08-01")),
            dated(Some("2025-08-01T00:00:00.000Z")),
        ]);
        assert_eq!(trend.labels_and_counts(), vec![("Aug 2025", 2)]);
    }

    #[test]
    fn test_digit_only_strings_are_unknown() {
        let trend = compute_trend(&[
            dated(Some("20250801")),
            dated(Some("2025")),
            dated(Some("2025-09-02")),
        ]);
        assert_eq!(
            trend.labels_and_counts(),
            vec![("Sep 2025", 1), ("Unknown", 2)]
        );
    }

    #[test]
    fn test_buckets_in_reference_zone_not_utc() {
        // 23:30 UTC on Aug 31 is already September in Lagos (UTC+1).
        let late = vec![dated(Some("2025-08-31T23:30:00Z"))];
        assert_eq!(compute_trend(&late).points[0].key, "2025-09");

        let new_york = TrendBucketer::new(chrono_tz::America::New_York);
        let early = vec![dated(Some("2025-09-01T02:00:00Z"))];
        assert_eq!(new_york.bucket(&early).points[0].key, "2025-08");
    }

    #[test]
    fn test_empty_input_yields_empty_series() {
        assert!(compute_trend(&[]).is_empty());
    }

    #[test]
    fn test_parse_timestamp_shapes() {
        assert!(parse_timestamp("2025-08-01T10:00:00.123Z").is_some());
        assert!(parse_timestamp("Fri, 01 Aug 2025 10:00:00 +0000").is_some());
        assert!(parse_timestamp("2025-08-01T10:00").is_some());
        assert!(parse_timestamp("   ").is_none());
        assert!(parse_timestamp("NaN").is_none());
        assert!(parse_timestamp("20250801").is_none());
        assert!(parse_timestamp("1754006400000").is_none());
        assert_eq!(
            parse_timestamp("2025-08-01T00:00:00.000Z").unwrap(),
            Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_month_label() {
        assert_eq!(month_label("2025-08"), "Aug 2025");
        assert_eq!(month_label("2024-01"), "Jan 2024");
    }
}
