//! Verification service wire types.
//!
//! Shapes of the `POST {api_base}/check` exchange with the external
//! verification service. Every response field is optional on the wire and
//! defaulted on decode; a bare `{}` is a valid (unknown) verdict. Favors
//! graceful degradation over hard decode failure.

use serde::{Deserialize, Serialize};

/// Request body for the external verification service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckRequest {
    pub content: String,
}

/// Response payload of one verification cycle. Owned by the panel until the
/// next result supersedes it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VerificationResult {
    #[serde(default)]
    pub analysis: Analysis,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scam: Option<ScamSignal>,
}

impl VerificationResult {
    /// Whether the service flagged scam indicators.
    pub fn is_suspicious(&self) -> bool {
        self.scam.as_ref().is_some_and(|s| s.is_suspicious)
    }
}

/// The verdict proper.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Analysis {
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default = "default_explanation")]
    pub explanation: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub evidence: Vec<EvidenceItem>,
}

impl Default for Analysis {
    fn default() -> Self {
        Self {
            label: default_label(),
            explanation: default_explanation(),
            confidence: default_confidence(),
            evidence: Vec::new(),
        }
    }
}

fn default_label() -> String {
    "Unknown".to_string()
}

fn default_explanation() -> String {
    "No explanation available".to_string()
}

fn default_confidence() -> f64 {
    0.5
}

/// A quoted piece of evidence with its stance toward the claim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvidenceItem {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_quote")]
    pub quote: String,
    #[serde(default = "default_support")]
    pub support: String,
}

fn default_quote() -> String {
    "No quote available".to_string()
}

fn default_support() -> String {
    "unrelated".to_string()
}

/// A consulted source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceRef {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_source_title")]
    pub title: String,
}

fn default_source_title() -> String {
    "Source".to_string()
}

impl SourceRef {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self { url: url.into(), title: title.into() }
    }

    /// A source can be opened in a tab only with a real URL. Placeholder
    /// `#` entries come from the service when a source has no link.
    pub fn is_openable(&self) -> bool {
        !self.url.is_empty() && self.url != "#"
    }
}

/// Scam heuristics attached by the service.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ScamSignal {
    #[serde(default)]
    pub is_suspicious: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_response_defaults() {
        let result: VerificationResult = serde_json::from_str("{}").unwrap();
        assert_eq!(result.analysis.label, "Unknown");
        assert_eq!(result.analysis.explanation, "No explanation available");
        assert!((result.analysis.confidence - 0.5).abs() < f64::EPSILON);
        assert!(result.analysis.evidence.is_empty());
        assert!(result.sources.is_empty());
        assert!(result.scam.is_none());
        assert!(!result.is_suspicious());
    }

    #[test]
    fn test_partial_analysis_defaults() {
        let result: VerificationResult =
            serde_json::from_str(r#"{"analysis":{"label":"Verified"}}"#).unwrap();
        assert_eq!(result.analysis.label, "Verified");
        assert!((result.analysis.confidence - 0.5).abs() < f64::EPSILON);
        assert_eq!(result.analysis.explanation, "No explanation available");
    }

    #[test]
    fn test_full_response_deserialization() {
        let json = serde_json::json!({
            "analysis": {
                "label": "Fake",
                "explanation": "Contradicted by multiple outlets",
                "confidence": 0.92,
                "evidence": [
                    {"url": "https://example.org/a", "quote": "not true", "support": "refutes"}
                ]
            },
            "sources": [{"url": "https://example.org", "title": "Example"}],
            "scam": {"is_suspicious": true}
        });

        let result: VerificationResult = serde_json::from_value(json).unwrap();
        assert_eq!(result.analysis.label, "Fake");
        assert!((result.analysis.confidence - 0.92).abs() < f64::EPSILON);
        assert_eq!(result.analysis.evidence.len(), 1);
        assert_eq!(result.analysis.evidence[0].support, "refutes");
        assert_eq!(result.sources.len(), 1);
        assert!(result.is_suspicious());
    }

    #[test]
    fn test_evidence_item_defaults() {
        let item: EvidenceItem = serde_json::from_str("{}").unwrap();
        assert_eq!(item.url, "");
        assert_eq!(item.quote, "No quote available");
        assert_eq!(item.support, "unrelated");
    }

    #[test]
    fn test_source_ref_defaults() {
        let source: SourceRef = serde_json::from_str(r#"{"url":"https://a.com"}"#).unwrap();
        assert_eq!(source.title, "Source");
    }

    #[test]
    fn test_source_openable() {
        assert!(SourceRef::new("https://a.com", "A").is_openable());
        assert!(!SourceRef::new("#", "B").is_openable());
        assert!(!SourceRef::new("", "C").is_openable());
    }

    #[test]
    fn test_check_request_wire_shape() {
        let request = CheckRequest { content: "claim text".to_string() };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({"content": "claim text"}));
    }

    #[test]
    fn test_scam_signal_default_not_suspicious() {
        let scam: ScamSignal = serde_json::from_str("{}").unwrap();
        assert!(!scam.is_suspicious);
    }
}
