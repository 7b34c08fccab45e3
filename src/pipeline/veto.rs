use crate::pipeline::input::AnalysisRequest;
use crate::types::{format_rupees, MarketScope};

/// Deterministic clamps applied to a resolved score. First matching rule wins.
#[derive(Debug, Clone, PartialEq)]
pub struct VetoRules {
    pub low_funding_max: f64,
    pub low_funding_ceiling: u8,
    pub global_funding_min: f64,
    pub global_ceiling: u8,
    pub regional_funding_min: f64,
    pub regional_floor: u8,
}

impl Default for VetoRules {
    fn default() -> Self {
        use crate::config::veto_thresholds::*;
        Self {
            low_funding_max: LOW_FUNDING_MAX,
            low_funding_ceiling: LOW_FUNDING_CEILING,
            global_funding_min: GLOBAL_FUNDING_MIN,
            global_ceiling: GLOBAL_CEILING,
            regional_funding_min: REGIONAL_FUNDING_MIN,
            regional_floor: REGIONAL_FLOOR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VetoRule {
    LowFunding,
    UnderfundedGlobal,
    FundedRegional,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Override {
    pub score: u8,
    /// Replacement narrative, set only by the low-funding rule.
    pub narrative: Option<String>,
    pub rule: Option<VetoRule>,
}

impl VetoRules {
    pub fn apply(&self, score: u8, req: &AnalysisRequest) -> Override {
        let score = score.min(100);

        if req.funding < self.low_funding_max {
            return Override {
                score: score.min(self.low_funding_ceiling),
                narrative: Some(low_funding_message(req.funding)),
                rule: Some(VetoRule::LowFunding),
            };
        }

        match req.market {
            MarketScope::Global if req.funding < self.global_funding_min => Override {
                score: score.min(self.global_ceiling),
                narrative: None,
                rule: Some(VetoRule::UnderfundedGlobal),
            },
            MarketScope::Regional if req.funding > self.regional_funding_min => Override {
                score: score.max(self.regional_floor),
                narrative: None,
                rule: Some(VetoRule::FundedRegional),
            },
            _ => Override { score, narrative: None, rule: None },
        }
    }
}

pub fn low_funding_message(funding: f64) -> String {
    format!(
        "Funding of {} is too low for business operations.",
        format_rupees(funding)
    )
}
