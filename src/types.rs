use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Market scope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketScope {
    #[default]
    Regional,
    Global,
    /// Any other label the client sends ("Local", "National", ...).
    Other(String),
}

impl MarketScope {
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.eq_ignore_ascii_case("regional") {
            MarketScope::Regional
        } else if s.eq_ignore_ascii_case("global") {
            MarketScope::Global
        } else {
            MarketScope::Other(s.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            MarketScope::Regional => "Regional",
            MarketScope::Global => "Global",
            MarketScope::Other(s) => s,
        }
    }
}

impl std::fmt::Display for MarketScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

/// Which source produced the returned score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Exact name match in the reference dataset.
    ExactMatch,
    /// Probability from the trained classifier artifact.
    ClassifierModel,
    /// Static base score plus jitter.
    Default,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Provenance::ExactMatch => "exact_match",
            Provenance::ClassifierModel => "classifier_model",
            Provenance::Default => "default",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Narrative source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeSource {
    Model,
    Fallback,
}

/// Why a fallback payload replaced the model's reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// No API key configured.
    NoModel,
    /// Rate limited on every attempt.
    QuotaExhausted,
    /// Network failure, non-2xx status or empty reply.
    Unavailable,
    /// Reply was not valid JSON after fence stripping.
    ParseError,
    /// Reply parsed but had the wrong shape (e.g. not 3 recommendations).
    RejectedShape,
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FallbackReason::NoModel => "no_model",
            FallbackReason::QuotaExhausted => "quota_exhausted",
            FallbackReason::Unavailable => "unavailable",
            FallbackReason::ParseError => "parse_error",
            FallbackReason::RejectedShape => "rejected_shape",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Analysis result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Always within 0..=100.
    pub score: u8,
    pub analysis: String,
    /// Exactly three entries.
    pub recommendations: Vec<String>,
    pub source: Provenance,
    pub narrative_source: NarrativeSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
}

/// Format an amount the way the analysis copy shows it: `₹1,250,000`.
pub fn format_rupees(amount: f64) -> String {
    let whole = amount.max(0.0).round() as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    format!("₹{out}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_scope_is_case_insensitive() {
        assert_eq!(MarketScope::parse(" global "), MarketScope::Global);
        assert_eq!(MarketScope::parse("REGIONAL"), MarketScope::Regional);
        assert_eq!(
            MarketScope::parse("National"),
            MarketScope::Other("National".to_string())
        );
    }

    #[test]
    fn rupees_get_thousands_separators() {
        assert_eq!(format_rupees(0.0), "₹0");
        assert_eq!(format_rupees(2000.0), "₹2,000");
        assert_eq!(format_rupees(1_250_000.4), "₹1,250,000");
        assert_eq!(format_rupees(999.0), "₹999");
    }

    #[test]
    fn fallback_reason_omitted_when_absent() {
        let result = AnalysisResult {
            score: 50,
            analysis: "ok".to_string(),
            recommendations: vec!["a".into(), "b".into(), "c".into()],
            source: Provenance::Default,
            narrative_source: NarrativeSource::Model,
            fallback_reason: None,
        };
        let v = serde_json::to_value(&result).unwrap();
        assert!(v.get("fallback_reason").is_none());
        assert_eq!(v["source"], "default");
        assert_eq!(v["narrative_source"], "model");
    }
}
