//! Verdict view model.
//!
//! The rendering layer distilled to data: classification of the service's
//! free-form label, confidence as a percentage, capped evidence and source
//! lists. `Display` renders the terminal panel.

use std::fmt;

use url::Url;

use veracity_protocols::verdict::VerificationResult;

/// Evidence entries shown per verdict.
pub const MAX_EVIDENCE: usize = 3;
/// Source entries shown per verdict.
pub const MAX_SOURCES: usize = 8;

/// Classified verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Verified,
    Suspicious,
    Fake,
    Unknown,
}

impl Verdict {
    /// Classify the service's free-form label by substring.
    pub fn classify(label: &str) -> Self {
        let label = label.to_lowercase();
        if label.contains("verified") || label.contains("true") {
            Verdict::Verified
        } else if label.contains("suspicious") {
            Verdict::Suspicious
        } else if label.contains("fake") || label.contains("false") {
            Verdict::Fake
        } else {
            Verdict::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Verified => "Verified",
            Verdict::Suspicious => "Suspicious",
            Verdict::Fake => "Fake",
            Verdict::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stance of an evidence item toward the claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    Supports,
    Refutes,
    Unrelated,
}

impl Support {
    pub fn classify(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "supports" => Support::Supports,
            "refutes" => Support::Refutes,
            _ => Support::Unrelated,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Support::Supports => "supports",
            Support::Refutes => "refutes",
            Support::Unrelated => "unrelated",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceView {
    pub quote: String,
    pub url: String,
    pub support: Support,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceView {
    pub title: String,
    pub url: String,
    pub domain: String,
}

/// One verification result prepared for display.
#[derive(Debug, Clone, PartialEq)]
pub struct VerdictView {
    pub verdict: Verdict,
    pub confidence_percent: u8,
    pub explanation: String,
    pub evidence: Vec<EvidenceView>,
    pub sources: Vec<SourceView>,
    /// Total sources reported, before capping.
    pub source_count: usize,
    pub scam_warning: bool,
}

impl From<&VerificationResult> for VerdictView {
    fn from(result: &VerificationResult) -> Self {
        let analysis = &result.analysis;
        let confidence_percent = (analysis.confidence.clamp(0.0, 1.0) * 100.0).round() as u8;

        let evidence = analysis
            .evidence
            .iter()
            .take(MAX_EVIDENCE)
            .map(|item| EvidenceView {
                quote: item.quote.clone(),
                url: item.url.clone(),
                support: Support::classify(&item.support),
            })
            .collect();

        let sources = result
            .sources
            .iter()
            .take(MAX_SOURCES)
            .map(|source| SourceView {
                title: source.title.clone(),
                url: source.url.clone(),
                domain: extract_domain(&source.url),
            })
            .collect();

        Self {
            verdict: Verdict::classify(&analysis.label),
            confidence_percent,
            explanation: analysis.explanation.clone(),
            evidence,
            sources,
            source_count: result.sources.len(),
            scam_warning: result.is_suspicious(),
        }
    }
}

impl fmt::Display for VerdictView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Verdict: {} ({}% confidence)", self.verdict, self.confidence_percent)?;
        writeln!(f, "  [{}]", confidence_bar(self.confidence_percent))?;
        writeln!(f, "  {}", self.explanation)?;

        if self.scam_warning {
            writeln!(f, "  ! Possible scam indicators detected")?;
        }

        if !self.evidence.is_empty() {
            writeln!(f, "  Evidence:")?;
            for (index, item) in self.evidence.iter().enumerate() {
                writeln!(f, "    {}. \"{}\" [{}]", index + 1, item.quote, item.support.as_str())?;
            }
        }

        if self.sources.is_empty() {
            writeln!(f, "  Sources: verified from the model's knowledge base")?;
        } else {
            writeln!(f, "  Sources ({}):", self.source_count)?;
            for (index, source) in self.sources.iter().enumerate() {
                writeln!(f, "    {}. {} ({})", index + 1, source.title, source.domain)?;
                writeln!(f, "       {}", source.url)?;
            }
        }
        Ok(())
    }
}

/// Plain-text report for copy/share and the saved log.
pub fn report_text(text: &str, view: &VerdictView) -> String {
    format!(
        "Fact Check Report:\n\n\
         Text: \"{}\"\n\n\
         Verdict: {}\n\
         Confidence: {}% confidence\n\n\
         Explanation: {}\n",
        text, view.verdict, view.confidence_percent, view.explanation
    )
}

/// Hostname without the `www.` prefix; falls back to the raw string.
pub fn extract_domain(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed
            .host_str()
            .map(|host| host.strip_prefix("www.").unwrap_or(host).to_string())
            .unwrap_or_else(|| url.to_string()),
        Err(_) => url.to_string(),
    }
}

fn confidence_bar(percent: u8) -> String {
    let filled = (percent as usize).min(100) / 5;
    let mut bar = String::with_capacity(20);
    for i in 0..20 {
        bar.push(if i < filled { '#' } else { '-' });
    }
    bar
}
