use serde::{Deserialize, Serialize};

use crate::jitter::Jitter;
use crate::pipeline::input::AnalysisRequest;
use crate::pipeline::narrative::Descriptor;
use crate::types::format_rupees;

pub const FALLBACK_RECOMMENDATIONS: [&str; 3] = [
    "Secure additional funding before scaling operations",
    "Build a minimum viable product and test it with real users",
    "Validate demand with a small paying customer segment",
];

/// Model reply for `/api/analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisNarrative {
    pub analysis: String,
    pub recommendations: Vec<String>,
}

pub struct NarrativeContext {
    pub request: AnalysisRequest,
    /// Resolved score before veto rules.
    pub score: u8,
}

pub struct StartupAnalysis;

impl Descriptor for StartupAnalysis {
    type Input = NarrativeContext;
    type Output = AnalysisNarrative;
    const NAME: &'static str = "analyze";

    fn prompt(ctx: &NarrativeContext) -> String {
        let req = &ctx.request;
        format!(
            r#"Act as a strict Venture Capitalist. Evaluate this startup:

Name: {name}
Funding: {funding}
Market Scope: {market}
Team Size: {team}
Sector: {sector}
Competition: {competition}
Estimated Success Score: {score}%

TASK:
1. Write a 2-sentence analysis consistent with the estimated score.
2. Provide exactly 3 specific recommendations.

RETURN JSON ONLY, no markdown, no extra text:
{{
    "analysis": "string",
    "recommendations": ["string", "string", "string"]
}}"#,
            name = req.startup_name,
            funding = format_rupees(req.funding),
            market = req.market,
            team = req.team_label,
            sector = req.sector,
            competition = req.competition,
            score = ctx.score,
        )
    }

    fn accept(out: &AnalysisNarrative) -> bool {
        !out.analysis.trim().is_empty()
            && out.recommendations.len() == 3
            && out.recommendations.iter().all(|r| !r.trim().is_empty())
    }

    fn fallback(ctx: &NarrativeContext, _jitter: &Jitter) -> AnalysisNarrative {
        let req = &ctx.request;
        let outlook = match ctx.score {
            0..=30 => "limited",
            31..=60 => "moderate",
            _ => "strong",
        };
        AnalysisNarrative {
            analysis: format!(
                "{} shows {outlook} potential with an estimated success score of {}% in a {} market. \
                 With {} in funding and a team of {}, execution speed and capital efficiency will decide the outcome.",
                req.startup_name,
                ctx.score,
                req.market,
                format_rupees(req.funding),
                req.team_label,
            ),
            recommendations: FALLBACK_RECOMMENDATIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}
