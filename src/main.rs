mod api;
mod config;
mod db;
mod error;
mod generators;
mod jitter;
mod llm;
mod ml;
mod pipeline;
mod talent;
mod types;

use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::SqliteConnectOptions;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::api::routes::{router, ApiState};
use crate::config::{Config, CHANNEL_CAPACITY};
use crate::db::{HistorySink, HistoryWriter};
use crate::error::Result;
use crate::jitter::Jitter;
use crate::llm::{GeminiClient, TextModel};
use crate::ml::{ForestClassifier, ReferenceDataset};
use crate::pipeline::{AnalysisPipeline, NarrativeGenerator, RetryPolicy, ScoreResolver, VetoRules};
use crate::talent::TalentSearch;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let health = Arc::new(HealthState::new());
    let latency = Arc::new(LatencyStats::new());
    let timeout = Duration::from_secs(cfg.upstream_timeout_secs);

    // --- History database (optional) ---
    let history = match open_history_db(&cfg).await {
        Ok(pool) => {
            info!("Database ready at {}", cfg.db_path);
            let (history_tx, history_rx) = mpsc::channel(CHANNEL_CAPACITY);
            tokio::spawn(HistoryWriter::new(pool, history_rx, Arc::clone(&health)).run());
            HistorySink::new(history_tx, Arc::clone(&health))
        }
        Err(e) => {
            warn!("History database unavailable, analyses will not be recorded: {e}");
            HistorySink::disabled(Arc::clone(&health))
        }
    };

    // --- Scoring artifacts ---
    let dataset = match ReferenceDataset::load(&cfg.dataset_path) {
        Ok(d) => d,
        Err(e) => {
            warn!("Ignoring reference dataset: {e}");
            ReferenceDataset::default()
        }
    };
    if dataset.is_empty() {
        warn!("Reference dataset is empty, exact-match scoring disabled");
    }
    health.set_dataset_rows(dataset.len() as u64);

    let classifier = match ForestClassifier::load(&cfg.classifier_path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Ignoring classifier artifact: {e}");
            None
        }
    };
    health.set_classifier_loaded(classifier.is_some());

    // --- Generative model ---
    let model: Option<Arc<dyn TextModel>> = match &cfg.gemini_api_key {
        Some(key) => {
            let client = GeminiClient::new(&cfg.gemini_api_url, key, &cfg.gemini_model, timeout)?;
            info!(model = %cfg.gemini_model, "Gemini client configured");
            Some(Arc::new(client))
        }
        None => {
            warn!("GEMINI_API_KEY not set, generative endpoints will serve fallbacks");
            None
        }
    };
    health.set_model_configured(model.is_some());

    // --- Pipeline ---
    let jitter = Arc::new(Jitter::new(cfg.fallback_jitter, cfg.jitter_seed));
    let resolver = ScoreResolver::new(Arc::new(dataset), classifier.map(Arc::new), Arc::clone(&jitter));
    let generator = NarrativeGenerator::new(
        model,
        RetryPolicy {
            backoff: Duration::from_secs(cfg.model_retry_backoff_secs),
            ..RetryPolicy::default()
        },
        jitter,
        Arc::clone(&health),
        Arc::clone(&latency),
    );
    let pipeline = AnalysisPipeline::new(resolver, generator, VetoRules::default(), history);

    let talent = TalentSearch::new(
        &cfg.github_api_url,
        cfg.github_token.clone(),
        &cfg.talent_location,
        timeout,
    )?;

    // --- REST API server ---
    let state = ApiState {
        pipeline: Arc::new(pipeline),
        talent: Arc::new(talent),
        health,
        latency,
    };
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cfg.api_port)).await?;
    info!("REST API listening on 0.0.0.0:{}", cfg.api_port);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn open_history_db(cfg: &Config) -> Result<sqlx::SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(&cfg.db_path)
        .create_if_missing(true);
    let pool = sqlx::SqlitePool::connect_with(options).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}
