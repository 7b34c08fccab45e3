//! Coerces loosely typed request bodies into typed values with defaults.

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::types::MarketScope;

pub const DEFAULT_STARTUP_NAME: &str = "Startup";
pub const DEFAULT_MARKET: &str = "Regional";
pub const DEFAULT_TEAM: &str = "Solo Founder";
pub const DEFAULT_SECTOR: &str = "General";
pub const DEFAULT_COMPETITION: &str = "Medium";

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub startup_name: String,
    pub funding: f64,
    pub market: MarketScope,
    /// Headcount bucket. "Solo Founder" is 1.
    pub team_size: u32,
    /// Raw team label as the client sent it, for prompts and history.
    pub team_label: String,
    pub sector: String,
    pub competition: String,
}

impl AnalysisRequest {
    pub fn from_body(body: &Value) -> Result<Self> {
        let startup_name = string_field(body, &["startupName", "name"])
            .unwrap_or_else(|| DEFAULT_STARTUP_NAME.to_string());

        let funding = number_value(body.get("funding"), "funding")?;

        let market = MarketScope::parse(
            &string_field(body, &["marketSize", "market"]).unwrap_or_else(|| DEFAULT_MARKET.to_string()),
        );

        let (team_size, team_label) = match body.get("teamSize") {
            Some(Value::Number(n)) => {
                let size = n.as_f64().unwrap_or(1.0).round().max(1.0) as u32;
                (size, size.to_string())
            }
            Some(Value::String(s)) if !s.trim().is_empty() => {
                (team_bucket(s), s.trim().to_string())
            }
            _ => (team_bucket(DEFAULT_TEAM), DEFAULT_TEAM.to_string()),
        };

        let sector = string_field(body, &["sector", "industry"])
            .unwrap_or_else(|| DEFAULT_SECTOR.to_string());
        let competition = string_field(body, &["competition"])
            .unwrap_or_else(|| DEFAULT_COMPETITION.to_string());

        Ok(Self {
            startup_name,
            funding,
            market,
            team_size,
            team_label,
            sector,
            competition,
        })
    }
}

/// First non-empty string among `keys`.
pub fn string_field(body: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| body.get(*k))
        .filter_map(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .find(|s| !s.is_empty())
}

/// Non-negative number from a JSON number or numeric string; missing means 0.
pub fn number_field(body: &Value, key: &str) -> Result<f64> {
    number_value(body.get(key), key)
}

fn number_value(v: Option<&Value>, key: &str) -> Result<f64> {
    match v {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .ok_or_else(|| AppError::Validation(format!("{key} must be a non-negative number"))),
        Some(Value::String(s)) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| *c != ',' && *c != '_' && !c.is_whitespace())
                .collect();
            if cleaned.is_empty() {
                return Ok(0.0);
            }
            cleaned
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .ok_or_else(|| AppError::Validation(format!("{key} must be a non-negative number")))
        }
        Some(_) => Err(AppError::Validation(format!("{key} must be a non-negative number"))),
    }
}

/// Map a team label to a headcount bucket. Ranges like "2-5" take the upper
/// bound; labels without digits count as a solo founder.
pub fn team_bucket(label: &str) -> u32 {
    label
        .split(|c: char| !c.is_ascii_digit())
        .filter_map(|part| part.parse::<u32>().ok())
        .max()
        .unwrap_or(1)
        .max(1)
}
