use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, UpstreamError};
use crate::llm::TextModel;

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [PartIn<'a>; 1],
}

#[derive(Serialize)]
struct PartIn<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartOut>,
}

#[derive(Deserialize)]
struct PartOut {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(api_url: &str, api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.api_url, self.model)
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> std::result::Result<String, UpstreamError> {
        let body = GenerateRequest {
            contents: [Content { parts: [PartIn { text: prompt }] }],
        };

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let detail = resp.text().await.unwrap_or_default();
            return Err(UpstreamError::Quota(truncate(&detail, 200)));
        }
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(UpstreamError::Unavailable(format!(
                "Gemini returned {status}: {}",
                truncate(&detail, 200)
            )));
        }

        let parsed: GenerateResponse = resp.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(UpstreamError::Unavailable("empty reply from model".to_string()));
        }
        debug!(model = %self.model, chars = text.len(), "Gemini reply received");
        Ok(text)
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Serves `generateContent`: first `quota_hits` calls get 429, later ones `reply`.
    async fn mock_gemini(quota_hits: usize, reply: serde_json::Value) -> (String, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let state = (Arc::clone(&calls), quota_hits, reply);
        let app = Router::new()
            .route(
                "/v1beta/models/:model_call",
                post(
                    |State((calls, quota_hits, reply)): State<(Arc<AtomicUsize>, usize, serde_json::Value)>,
                     headers: HeaderMap,
                     Json(body): Json<serde_json::Value>| async move {
                        let n = calls.fetch_add(1, Ordering::SeqCst);
                        assert_eq!(headers["x-goog-api-key"], "test-key");
                        assert!(body["contents"][0]["parts"][0]["text"].is_string());
                        if n < quota_hits {
                            (axum::http::StatusCode::TOO_MANY_REQUESTS, Json(serde_json::json!({"error": "quota"})))
                        } else {
                            (axum::http::StatusCode::OK, Json(reply))
                        }
                    },
                ),
            )
            .with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{addr}"), calls)
    }

    fn client(url: &str) -> GeminiClient {
        GeminiClient::new(url, "test-key", "gemini-test", Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn returns_candidate_text() {
        let reply = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"ok\":" }, { "text": "true}" }] } }]
        });
        let (url, calls) = mock_gemini(0, reply).await;
        let text = client(&url).generate("hello").await.unwrap();
        assert_eq!(text, "{\"ok\":true}");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rate_limit_maps_to_quota() {
        let (url, _) = mock_gemini(1, serde_json::json!({})).await;
        let err = client(&url).generate("hello").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Quota(_)), "{err:?}");
    }

    #[tokio::test]
    async fn empty_candidates_are_unavailable() {
        let (url, _) = mock_gemini(0, serde_json::json!({ "candidates": [] })).await;
        let err = client(&url).generate("hello").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Unavailable(_)), "{err:?}");
    }

    #[tokio::test]
    async fn connection_refused_is_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = client(&format!("http://{addr}")).generate("hello").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Unavailable(_)), "{err:?}");
    }

    #[test]
    fn truncates_on_char_boundary() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("₹₹₹₹", 2), "₹₹…");
    }
}
