//! Saved report records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A snapshot of one verification, captured on explicit user action and
/// appended to the bounded report log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedReport {
    /// The text that was checked.
    pub text: String,
    /// When the report was saved.
    pub timestamp: DateTime<Utc>,
    /// Classified verdict label ("Verified", "Suspicious", "Fake", "Unknown").
    pub verdict: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    pub explanation: String,
}

impl SavedReport {
    /// Create a report stamped with the current time.
    pub fn new(
        text: impl Into<String>,
        verdict: impl Into<String>,
        confidence: f64,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now(),
            verdict: verdict.into(),
            confidence,
            explanation: explanation.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stamps_timestamp() {
        let before = Utc::now();
        let report = SavedReport::new("claim", "Verified", 0.9, "checks out");
        assert!(report.timestamp >= before);
        assert_eq!(report.verdict, "Verified");
        assert!((report.confidence - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_roundtrip() {
        let report = SavedReport::new("claim", "Fake", 0.8, "refuted");
        let json = serde_json::to_string(&report).unwrap();
        let parsed: SavedReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }
}
