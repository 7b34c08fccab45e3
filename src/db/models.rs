use std::time::{SystemTime, UNIX_EPOCH};

use crate::pipeline::input::AnalysisRequest;
use crate::types::AnalysisResult;

/// One completed analysis, as queued for the history table.
#[derive(Debug, Clone)]
pub struct HistoryRecord {
    pub startup_name: String,
    pub funding: f64,
    pub market_size: String,
    pub team_size: String,
    pub sector: String,
    pub score: i64,
    pub source: String,
    pub result_json: String,
    /// Unix seconds.
    pub created_at: i64,
}

impl HistoryRecord {
    pub fn new(req: &AnalysisRequest, result: &AnalysisResult) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;
        Self {
            startup_name: req.startup_name.clone(),
            funding: req.funding,
            market_size: req.market.label().to_string(),
            team_size: req.team_label.clone(),
            sector: req.sector.clone(),
            score: i64::from(result.score),
            source: result.source.to_string(),
            result_json: serde_json::to_string(result).unwrap_or_default(),
            created_at,
        }
    }
}
