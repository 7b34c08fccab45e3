use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};

use crate::api::health::{HealthSnapshot, HealthState};
use crate::api::latency::LatencyStats;
use crate::error::AppError;
use crate::generators::brands::{with_domains, BrandSuggestion};
use crate::generators::ideas::Idea;
use crate::generators::market::MarketReport;
use crate::generators::pitch::Slide;
use crate::generators::valuation::Valuation;
use crate::generators::{
    BrandNaming, IdeaGeneration, MarketAnalysis, PitchDeck, ValuationEstimate, ValuationInput,
};
use crate::pipeline::input::string_field;
use crate::pipeline::{AnalysisPipeline, AnalysisRequest};
use crate::talent::{Candidate, TalentSearch};
use crate::types::AnalysisResult;

#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<AnalysisPipeline>,
    pub talent: Arc<TalentSearch>,
    pub health: Arc<HealthState>,
    pub latency: Arc<LatencyStats>,
}

pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(get_banner))
        .route("/health", get(get_health))
        .route("/stats/latency", get(get_stats_latency))
        .route("/api/analyze", post(post_analyze))
        .route("/api/generate_idea", post(post_generate_idea))
        .route("/api/generate_ideas", post(post_generate_idea))
        .route("/api/analyze_market", post(post_analyze_market))
        .route("/api/calculate_valuation", post(post_calculate_valuation))
        .route("/api/search_talent", post(post_search_talent))
        .route("/api/generate_brands", post(post_generate_brands))
        .route("/api/generate_pitch", post(post_generate_pitch))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct LatencyResponse {
    pub samples: u64,
    pub p50_ms: Option<u64>,
    pub p95_ms: Option<u64>,
    pub p99_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// A malformed or missing JSON body is treated as `{}` so that every field
/// falls back to its default.
fn body_or_empty(body: Result<Json<Value>, JsonRejection>) -> Value {
    match body {
        Ok(Json(v)) if v.is_object() => v,
        _ => Value::Object(Default::default()),
    }
}

fn required(body: &Value, keys: &[&str], message: &str) -> Result<String, AppError> {
    string_field(body, keys).ok_or_else(|| AppError::Validation(message.to_string()))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_banner() -> Json<Value> {
    Json(serde_json::json!({
        "service": "StartupIQ API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthSnapshot> {
    Json(state.health.snapshot())
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<LatencyResponse> {
    let (p50_ms, p95_ms, p99_ms) = state.latency.percentiles();
    Json(LatencyResponse {
        samples: state.latency.len(),
        p50_ms,
        p95_ms,
        p99_ms,
    })
}

async fn post_analyze(
    State(state): State<ApiState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AnalysisResult>, AppError> {
    let request = AnalysisRequest::from_body(&body_or_empty(body))?;
    let result = state.pipeline.run(request).await?;
    Ok(Json(result))
}

async fn post_generate_idea(
    State(state): State<ApiState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Vec<Idea>>, AppError> {
    let body = body_or_empty(body);
    let topic = string_field(&body, &["topic", "keywords"]).unwrap_or_else(|| "Startup".to_string());
    let ideas = state.pipeline.generator().run::<IdeaGeneration>(&topic).await?;
    Ok(Json(ideas.into_value()))
}

async fn post_analyze_market(
    State(state): State<ApiState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<MarketReport>, AppError> {
    let industry = required(&body_or_empty(body), &["industry"], "Industry is required")?;
    let report = state.pipeline.generator().run::<MarketAnalysis>(&industry).await?;
    Ok(Json(report.into_value()))
}

async fn post_calculate_valuation(
    State(state): State<ApiState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Valuation>, AppError> {
    let input = ValuationInput::from_body(&body_or_empty(body))?;
    let valuation = state.pipeline.generator().run::<ValuationEstimate>(&input).await?;
    Ok(Json(valuation.into_value()))
}

async fn post_search_talent(
    State(state): State<ApiState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Json<Vec<Candidate>> {
    let body = body_or_empty(body);
    let skill = string_field(&body, &["skill"]).unwrap_or_default();
    let page = body
        .get("page")
        .and_then(Value::as_u64)
        .map(|p| p.min(u64::from(u32::MAX)) as u32)
        .unwrap_or(1);
    Json(state.talent.search(&skill, page).await)
}

async fn post_generate_brands(
    State(state): State<ApiState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Vec<BrandSuggestion>>, AppError> {
    let description = required(&body_or_empty(body), &["description"], "Description is required")?;
    let generator = state.pipeline.generator();
    let names = generator.run::<BrandNaming>(&description).await?;
    Ok(Json(with_domains(names.into_value(), generator.jitter())))
}

async fn post_generate_pitch(
    State(state): State<ApiState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Vec<Slide>>, AppError> {
    let idea = required(&body_or_empty(body), &["idea"], "Startup idea is required")?;
    let slides = state.pipeline.generator().run::<PitchDeck>(&idea).await?;
    Ok(Json(slides.into_value()))
}
