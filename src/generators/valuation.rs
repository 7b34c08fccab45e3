use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::jitter::Jitter;
use crate::llm::reply::lenient_string;
use crate::pipeline::input::{number_field, string_field};
use crate::pipeline::narrative::Descriptor;

/// Revenue multiple used when the model cannot be reached.
pub const FALLBACK_REVENUE_MULTIPLE: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ValuationInput {
    pub revenue: f64,
    pub users: f64,
    pub growth_rate: String,
    pub industry: String,
}

impl ValuationInput {
    pub fn from_body(body: &Value) -> Result<Self> {
        Ok(Self {
            revenue: number_field(body, "revenue")?,
            users: number_field(body, "users")?,
            growth_rate: string_field(body, &["growth_rate", "growth"]).unwrap_or_else(|| "0%".to_string()),
            industry: string_field(body, &["industry"]).unwrap_or_else(|| "General Tech".to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    #[serde(deserialize_with = "lenient_string")]
    pub estimated_valuation: String,
    #[serde(deserialize_with = "lenient_string")]
    pub multiples_used: String,
    #[serde(deserialize_with = "lenient_string")]
    pub confidence_score: String,
    pub key_factors: Vec<String>,
}

pub struct ValuationEstimate;

impl Descriptor for ValuationEstimate {
    type Input = ValuationInput;
    type Output = Valuation;
    const NAME: &'static str = "calculate_valuation";
    const REQUIRES_MODEL: bool = true;

    fn prompt(v: &ValuationInput) -> String {
        format!(
            r#"Act as a Venture Capital Analyst.
Calculate an estimated valuation for a startup in the {industry} sector
with ${revenue} annual revenue, {users} users, and a {growth} growth rate.

Return ONLY a JSON object with:
1. "estimated_valuation": A string (e.g. "$5M - $7M").
2. "multiples_used": The industry multiple applied.
3. "confidence_score": A percentage.
4. "key_factors": List of 3 reasons for this valuation."#,
            industry = v.industry,
            revenue = v.revenue,
            users = v.users,
            growth = v.growth_rate,
        )
    }

    fn accept(out: &Valuation) -> bool {
        !out.estimated_valuation.trim().is_empty() && !out.key_factors.is_empty()
    }

    fn fallback(v: &ValuationInput, jitter: &Jitter) -> Valuation {
        let low = v.revenue * (FALLBACK_REVENUE_MULTIPLE - 1.0);
        let high = v.revenue * (FALLBACK_REVENUE_MULTIPLE + 1.0);
        Valuation {
            estimated_valuation: format!("{} - {}", compact_usd(low), compact_usd(high)),
            multiples_used: format!("{FALLBACK_REVENUE_MULTIPLE:.0}x revenue"),
            confidence_score: format!("{}%", jitter.score(40)),
            key_factors: vec![
                format!("Baseline {FALLBACK_REVENUE_MULTIPLE:.0}x revenue multiple for {}", v.industry),
                format!("Reported growth rate of {}", v.growth_rate),
                "Live comparables unavailable, estimate is indicative only".to_string(),
            ],
        }
    }
}

/// 1_250_000 → "$1.3M".
pub fn compact_usd(amount: f64) -> String {
    let a = amount.max(0.0);
    if a >= 1e9 {
        format!("${:.1}B", a / 1e9)
    } else if a >= 1e6 {
        format!("${:.1}M", a / 1e6)
    } else if a >= 1e3 {
        format!("${:.0}K", a / 1e3)
    } else {
        format!("${a:.0}")
    }
}
