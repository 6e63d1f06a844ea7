//! Audit reports: the record, its storage, and the dashboard aggregate.

mod dashboard;
mod store;

pub use dashboard::{aggregate, Dashboard, DashboardEntry, UNKNOWN_TIMESTAMP};
pub use store::{parse_key_timestamp, ReportIter, ReportStore, StoredReport};

use serde::{Deserialize, Serialize};

/// The durable record of one processed upload.
///
/// Field names are the on-disk format and must stay stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Original filename with spaces replaced by underscores.
    pub file: String,
    /// Probability of fake content, 3 decimals.
    pub ai_score: f64,
    pub blockchain_verified: bool,
    /// Fused authenticity score, 3 decimals.
    pub authenticity_score: f64,
    /// Hex SHA-256 of the uploaded file.
    pub hash: String,
}

impl Report {
    /// Build a report, rounding both scores to 3 decimals.
    pub fn new(
        file: &str,
        ai_score: f64,
        blockchain_verified: bool,
        authenticity_score: f64,
        hash: impl Into<String>,
    ) -> Self {
        Self {
            file: sanitize_filename(file),
            ai_score: round3(ai_score),
            blockchain_verified,
            authenticity_score: round3(authenticity_score),
            hash: hash.into(),
        }
    }

    /// Real when the AI score is strictly below 0.5.
    pub fn is_real(&self) -> bool {
        self.ai_score < 0.5
    }
}

/// Replace spaces so the name is safe to use as a path component.
pub fn sanitize_filename(name: &str) -> String {
    name.replace(' ', "_")
}

fn round3(value: f64) -> f64 {
    ((value * 1000.0).round() / 1000.0).clamp(0.0, 1.0)
}
