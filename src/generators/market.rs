use serde::{Deserialize, Serialize};

use crate::jitter::Jitter;
use crate::llm::reply::{lenient_f64, lenient_string};
use crate::pipeline::narrative::Descriptor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthPoint {
    #[serde(deserialize_with = "lenient_string")]
    pub year: String,
    /// Billions.
    #[serde(deserialize_with = "lenient_f64")]
    pub market_size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentShare {
    #[serde(alias = "sentiment", alias = "label")]
    pub name: String,
    #[serde(alias = "percentage", deserialize_with = "lenient_f64")]
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingConcept {
    pub name: String,
    #[serde(default)]
    pub subtitle: String,
    pub competition: String,
    #[serde(rename = "avgFunding", deserialize_with = "lenient_string")]
    pub avg_funding: String,
    #[serde(rename = "successRate", deserialize_with = "lenient_f64")]
    pub success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketReport {
    pub summary: String,
    #[serde(default)]
    pub growth_trend: Vec<GrowthPoint>,
    #[serde(default)]
    pub sentiment_distribution: Vec<SentimentShare>,
    #[serde(default)]
    pub trending_startups_heatmap: Vec<TrendingConcept>,
}

pub struct MarketAnalysis;

impl Descriptor for MarketAnalysis {
    type Input = str;
    type Output = MarketReport;
    const NAME: &'static str = "analyze_market";
    const REQUIRES_MODEL: bool = true;

    fn prompt(industry: &str) -> String {
        format!(
            r#"Act as a Senior Market Research Analyst.
Analyze the current real-world market for the "{industry}" industry (focus on India and Global trends).

Return STRICT JSON with these exact keys:

1. "summary": A 1-sentence executive summary.
2. "growth_trend": List of 6 objects (2020-2025) format: {{"year": "202x", "market_size": number_in_billions}}.
3. "sentiment_distribution": List of 3 objects {{"name": "Positive" | "Neutral" | "Negative", "value": number}} summing to 100.
4. "trending_startups_heatmap": 4 TRENDING startup concepts in "{industry}", each with
   "name", "subtitle" (problem solved, max 6 words), "competition" ("High", "Medium" or "Low"),
   "avgFunding" (e.g. "₹5Cr", "$1M") and "successRate" (number between 50 and 95)."#
        )
    }

    fn accept(report: &MarketReport) -> bool {
        !report.summary.trim().is_empty()
            && report
                .trending_startups_heatmap
                .iter()
                .all(|c| (0.0..=100.0).contains(&c.success_rate))
    }

    fn fallback(industry: &str, jitter: &Jitter) -> MarketReport {
        let base = [4.2, 4.9, 5.8, 6.9, 8.1, 9.6];
        let growth_trend = base
            .iter()
            .enumerate()
            .map(|(i, size)| GrowthPoint {
                year: (2020 + i).to_string(),
                market_size: *size,
            })
            .collect();

        let concepts = [
            ("Vertical SaaS", "Workflow software for niche operators", "Medium", "₹3Cr"),
            ("Embedded Finance", "Credit at the point of sale", "High", "₹10Cr"),
            ("AI Co-pilot", "Automates repetitive analyst work", "High", "₹8Cr"),
            ("Rural Distribution", "Last-mile access in tier-3 towns", "Low", "₹2Cr"),
        ];
        let trending_startups_heatmap = concepts
            .iter()
            .map(|(name, subtitle, competition, funding)| TrendingConcept {
                name: format!("{industry} {name}"),
                subtitle: subtitle.to_string(),
                competition: competition.to_string(),
                avg_funding: funding.to_string(),
                success_rate: f64::from(jitter.range(50, 95)),
            })
            .collect();

        MarketReport {
            summary: format!(
                "The {industry} market is growing steadily, with live market data temporarily unavailable."
            ),
            growth_trend,
            sentiment_distribution: vec![
                SentimentShare { name: "Positive".to_string(), value: 60.0 },
                SentimentShare { name: "Neutral".to_string(), value: 30.0 },
                SentimentShare { name: "Negative".to_string(), value: 10.0 },
            ],
            trending_startups_heatmap,
        }
    }
}
