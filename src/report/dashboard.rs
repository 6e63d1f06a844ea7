//! Dashboard aggregate over stored reports.

use serde::Serialize;

use super::StoredReport;

/// Shown when a report key carries no parseable timestamp.
pub const UNKNOWN_TIMESTAMP: &str = "Unknown";

const DISPLAY_FORMAT: &str = "%d-%b-%Y %H:%M:%S";

/// One row of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardEntry {
    pub key: String,
    pub file: String,
    pub ai_score: f64,
    pub authenticity_score: f64,
    /// `"Verified"` or `"Not Verified"`.
    pub verification: String,
    pub hash: String,
    /// e.g. `27-Oct-2025 19:45:00`, or [`UNKNOWN_TIMESTAMP`].
    pub timestamp: String,
}

/// Counts and rows for the dashboard view.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Dashboard {
    pub total: usize,
    /// Reports with `ai_score < 0.5`.
    pub real_count: usize,
    /// Everything else, including exactly 0.5.
    pub fake_count: usize,
    pub entries: Vec<DashboardEntry>,
}

impl Dashboard {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Aggregate reports in the order given.
pub fn aggregate<I>(reports: I) -> Dashboard
where
    I: IntoIterator<Item = StoredReport>,
{
    let mut dashboard = Dashboard::default();

    for stored in reports {
        let report = stored.report;
        if report.is_real() {
            dashboard.real_count += 1;
        } else {
            dashboard.fake_count += 1;
        }
        dashboard.total += 1;

        let timestamp = stored
            .timestamp
            .map(|t| t.format(DISPLAY_FORMAT).to_string())
            .unwrap_or_else(|| UNKNOWN_TIMESTAMP.to_string());
        let verification = if report.blockchain_verified {
            "Verified"
        } else {
            "Not Verified"
        };

        dashboard.entries.push(DashboardEntry {
            key: stored.key,
            file: report.file,
            ai_score: report.ai_score,
            authenticity_score: report.authenticity_score,
            verification: verification.to_string(),
            hash: report.hash,
            timestamp,
        });
    }

    dashboard
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Report;
    use chrono::NaiveDate;

    fn stored(key: &str, ai: f64, verified: bool) -> StoredReport {
        StoredReport {
            key: key.to_string(),
            timestamp: crate::report::parse_key_timestamp(key),
            report: Report::new(&format!("{}.png", key), ai, verified, 0.5, "ff"),
        }
    }

    #[test]
    fn test_partition_with_boundary() {
        let reports = vec![
            stored("report_20251027_100000", 0.1, false),
            stored("report_20251027_100001", 0.499, false),
            stored("report_20251027_100002", 0.5, false),
            stored("report_20251027_100003", 0.7, false),
            stored("report_20251027_100004", 1.0, false),
        ];

        let dashboard = aggregate(reports);
        assert_eq!(dashboard.total, 5);
        assert_eq!(dashboard.real_count, 2);
        assert_eq!(dashboard.fake_count, 3);
        assert_eq!(dashboard.entries.len(), 5);
    }

    #[test]
    fn test_display_fields() {
        let dashboard = aggregate(vec![stored("report_20251027_194500", 0.2, true)]);
        let entry = &dashboard.entries[0];
        assert_eq!(entry.timestamp, "27-Oct-2025 19:45:00");
        assert_eq!(entry.verification, "Verified");
        assert_eq!(entry.file, "report_20251027_194500.png");
        assert_eq!(entry.hash, "ff");
    }

    #[test]
    fn test_unknown_timestamp_still_counted() {
        let dashboard = aggregate(vec![
            stored("report_garbage", 0.9, false),
            stored("report_20251027_194500", 0.1, false),
        ]);
        assert_eq!(dashboard.total, 2);
        assert_eq!(dashboard.real_count, 1);
        assert_eq!(dashboard.fake_count, 1);
        assert_eq!(dashboard.entries[0].timestamp, UNKNOWN_TIMESTAMP);
        assert_eq!(dashboard.entries[0].verification, "Not Verified");
    }

    #[test]
    fn test_preserves_order() {
        let dashboard = aggregate(vec![
            stored("report_20251027_120000", 0.1, false),
            stored("report_20251027_080000", 0.1, false),
        ]);
        let keys: Vec<&str> = dashboard.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["report_20251027_120000", "report_20251027_080000"]);
    }

    #[test]
    fn test_empty() {
        let dashboard = aggregate(Vec::new());
        assert!(dashboard.is_empty());
        assert_eq!(dashboard, Dashboard::default());
    }

    #[test]
    fn test_explicit_timestamp_formatting() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap();
        let report = StoredReport {
            key: "custom".to_string(),
            timestamp: Some(ts),
            report: Report::new("x.jpg", 0.3, false, 0.66, "aa"),
        };
        assert_eq!(aggregate(vec![report]).entries[0].timestamp, "05-Jan-2024 07:08:09");
    }
}
