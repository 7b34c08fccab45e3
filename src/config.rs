use crate::error::{AppError, Result};

pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_MODEL: &str = "gemini-2.5-flash-lite";
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Locale filter appended to every talent search query.
pub const TALENT_LOCATION: &str = "India";

/// Maximum candidates returned by a talent search.
pub const TALENT_RESULT_CAP: usize = 9;

/// Talent results are padded from the fallback list up to this count.
pub const TALENT_MIN_RESULTS: usize = 3;

/// Candidates requested per GitHub search page. Larger than the cap because the
/// full-name filter discards many accounts.
pub const TALENT_SEARCH_PAGE_SIZE: usize = 30;

/// Concurrent per-candidate detail fetches.
pub const TALENT_DETAIL_CONCURRENCY: usize = 4;

/// Upstream model attempts per request. Only quota errors trigger a second attempt.
pub const MODEL_MAX_ATTEMPTS: u32 = 2;

/// Probability reported by the classifier path when no artifact is loaded.
pub const DEFAULT_CLASSIFIER_PROBABILITY: f64 = 0.5;

/// Channel capacity for the history writer.
pub const CHANNEL_CAPACITY: usize = 1024;

/// Veto rule thresholds (funding in currency units, scores in percent).
pub mod veto_thresholds {
    pub const LOW_FUNDING_MAX: f64 = 5_000.0;
    pub const LOW_FUNDING_CEILING: u8 = 15;
    pub const GLOBAL_FUNDING_MIN: f64 = 500_000.0;
    pub const GLOBAL_CEILING: u8 = 35;
    pub const REGIONAL_FUNDING_MIN: f64 = 100_000.0;
    pub const REGIONAL_FLOOR: u8 = 60;
}

/// Base scores used when neither the dataset nor the classifier produced one.
pub mod default_score {
    /// Funding below this gets the pocket-money base score.
    pub const SMALL_FUNDING_MAX: f64 = 10_000.0;
    pub const SMALL_FUNDING_BASE: i32 = 10;
    pub const BASE: i32 = 50;
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Gemini API key (GEMINI_API_KEY). Without it generative endpoints degrade.
    pub gemini_api_key: Option<String>,
    pub gemini_api_url: String,
    pub gemini_model: String,
    /// Optional GitHub token (GITHUB_TOKEN), raises search rate limits.
    pub github_token: Option<String>,
    pub github_api_url: String,
    pub talent_location: String,
    /// Reference dataset for exact-name score lookups (DATASET_PATH).
    pub dataset_path: String,
    /// Trained classifier artifact (CLASSIFIER_PATH). Missing file is not an error.
    pub classifier_path: String,
    /// Socket timeout for every outbound call (UPSTREAM_TIMEOUT_SECS).
    pub upstream_timeout_secs: u64,
    /// Sleep between quota-limited model attempts (MODEL_RETRY_BACKOFF_SECS).
    pub model_retry_backoff_secs: u64,
    /// Max +/- jitter applied to default scores (FALLBACK_JITTER). 0 disables.
    pub fallback_jitter: u8,
    /// Fixed RNG seed for reproducible fallbacks (JITTER_SEED).
    pub jitter_seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "startup_iq.db".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            gemini_api_url: std::env::var("GEMINI_API_URL")
                .unwrap_or_else(|_| GEMINI_API_URL.to_string()),
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| GEMINI_MODEL.to_string()),
            github_token: non_empty_var("GITHUB_TOKEN"),
            github_api_url: std::env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| GITHUB_API_URL.to_string()),
            talent_location: std::env::var("TALENT_LOCATION")
                .unwrap_or_else(|_| TALENT_LOCATION.to_string()),
            dataset_path: std::env::var("DATASET_PATH")
                .unwrap_or_else(|_| "data/reference_startups.json".to_string()),
            classifier_path: std::env::var("CLASSIFIER_PATH")
                .unwrap_or_else(|_| "data/startup_classifier.json".to_string()),
            upstream_timeout_secs: std::env::var("UPSTREAM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "8".to_string())
                .parse::<u64>()
                .unwrap_or(8),
            model_retry_backoff_secs: std::env::var("MODEL_RETRY_BACKOFF_SECS")
                .unwrap_or_else(|_| "2".to_string())
                .parse::<u64>()
                .unwrap_or(2),
            fallback_jitter: std::env::var("FALLBACK_JITTER")
                .unwrap_or_else(|_| "5".to_string())
                .parse::<u8>()
                .map_err(|_| AppError::Config("FALLBACK_JITTER must be 0-255".to_string()))?,
            jitter_seed: match std::env::var("JITTER_SEED") {
                Ok(s) => Some(s.trim().parse::<u64>().map_err(|_| {
                    AppError::Config("JITTER_SEED must be an unsigned integer".to_string())
                })?),
                Err(_) => None,
            },
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
