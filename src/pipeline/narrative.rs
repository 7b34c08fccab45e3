use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::config::MODEL_MAX_ATTEMPTS;
use crate::error::{AppError, UpstreamError};
use crate::jitter::Jitter;
use crate::llm::reply::parse_reply;
use crate::llm::TextModel;
use crate::types::{FallbackReason, NarrativeSource};

/// Declares one generative endpoint: what to ask, what counts as a usable
/// answer, and what to return when there is none.
pub trait Descriptor {
    type Input: ?Sized;
    type Output: DeserializeOwned + Serialize + Send;

    /// Endpoint name used in logs.
    const NAME: &'static str;

    /// When true and no model is configured the endpoint fails with
    /// `ModelNotConfigured` instead of serving the fallback.
    const REQUIRES_MODEL: bool = false;

    fn prompt(input: &Self::Input) -> String;

    /// Shape check on a parsed reply.
    fn accept(_output: &Self::Output) -> bool {
        true
    }

    fn fallback(input: &Self::Input, jitter: &Jitter) -> Self::Output;
}

/// A payload plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Generated<T> {
    Model(T),
    Fallback { value: T, reason: FallbackReason },
}

impl<T> Generated<T> {
    pub fn into_value(self) -> T {
        match self {
            Generated::Model(v) => v,
            Generated::Fallback { value, .. } => value,
        }
    }

    pub fn source(&self) -> NarrativeSource {
        match self {
            Generated::Model(_) => NarrativeSource::Model,
            Generated::Fallback { .. } => NarrativeSource::Fallback,
        }
    }

    pub fn reason(&self) -> Option<FallbackReason> {
        match self {
            Generated::Model(_) => None,
            Generated::Fallback { reason, .. } => Some(*reason),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Sleep before retrying a quota error.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MODEL_MAX_ATTEMPTS,
            backoff: Duration::from_secs(2),
        }
    }
}

pub struct NarrativeGenerator {
    model: Option<Arc<dyn TextModel>>,
    retry: RetryPolicy,
    jitter: Arc<Jitter>,
    health: Arc<HealthState>,
    latency: Arc<LatencyStats>,
}

impl NarrativeGenerator {
    pub fn new(
        model: Option<Arc<dyn TextModel>>,
        retry: RetryPolicy,
        jitter: Arc<Jitter>,
        health: Arc<HealthState>,
        latency: Arc<LatencyStats>,
    ) -> Self {
        Self { model, retry, jitter, health, latency }
    }

    pub fn jitter(&self) -> &Jitter {
        &self.jitter
    }

    /// One prompt, up to `max_attempts` calls. Only quota errors are retried;
    /// the last quota error is returned and handled like unavailability.
    pub async fn complete(&self, model: &dyn TextModel, prompt: &str) -> Result<String, UpstreamError> {
        let attempts = self.retry.max_attempts.max(1);
        for attempt in 1..=attempts {
            let started = Instant::now();
            let result = model.generate(prompt).await;
            self.latency.record(started.elapsed());

            match result {
                Ok(text) => return Ok(text),
                Err(UpstreamError::Quota(detail)) if attempt < attempts => {
                    warn!(
                        model = model.name(),
                        attempt,
                        "Model quota hit, retrying in {:?}: {detail}",
                        self.retry.backoff
                    );
                    tokio::time::sleep(self.retry.backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
        Err(UpstreamError::Unavailable("no attempts made".to_string()))
    }

    /// Run a descriptor. Upstream and parse failures become the descriptor's
    /// fallback; only a missing model on a model-only endpoint is an error.
    pub async fn run<D: Descriptor>(&self, input: &D::Input) -> Result<Generated<D::Output>, AppError> {
        let Some(model) = self.model.as_deref() else {
            if D::REQUIRES_MODEL {
                return Err(AppError::ModelNotConfigured);
            }
            return Ok(self.fall_back::<D>(input, FallbackReason::NoModel, "no model configured"));
        };

        let prompt = D::prompt(input);
        let raw = match self.complete(model, &prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                let reason = match &e {
                    UpstreamError::Quota(_) => FallbackReason::QuotaExhausted,
                    UpstreamError::Parse(_) => FallbackReason::ParseError,
                    UpstreamError::Unavailable(_) => FallbackReason::Unavailable,
                };
                return Ok(self.fall_back::<D>(input, reason, &e.to_string()));
            }
        };

        match parse_reply::<D::Output>(&raw) {
            Ok(output) if D::accept(&output) => {
                self.health.inc_model_replies();
                debug!(endpoint = D::NAME, "Model reply accepted");
                Ok(Generated::Model(output))
            }
            Ok(_) => Ok(self.fall_back::<D>(input, FallbackReason::RejectedShape, "reply failed shape check")),
            Err(e) => Ok(self.fall_back::<D>(input, FallbackReason::ParseError, &e.to_string())),
        }
    }

    fn fall_back<D: Descriptor>(
        &self,
        input: &D::Input,
        reason: FallbackReason,
        detail: &str,
    ) -> Generated<D::Output> {
        self.health.inc_fallbacks();
        info!(endpoint = D::NAME, reason = %reason, "Serving fallback payload: {detail}");
        Generated::Fallback {
            value: D::fallback(input, &self.jitter),
            reason,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::llm::testing::ScriptedModel;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub(crate) struct Echo {
        pub words: Vec<String>,
    }

    struct EchoDescriptor;

    impl Descriptor for EchoDescriptor {
        type Input = str;
        type Output = Echo;
        const NAME: &'static str = "echo";

        fn prompt(input: &str) -> String {
            format!("Repeat {input} three times as JSON")
        }

        fn accept(output: &Echo) -> bool {
            output.words.len() == 3
        }

        fn fallback(input: &str, _jitter: &Jitter) -> Echo {
            Echo { words: vec![input.to_string(); 3] }
        }
    }

    struct StrictEcho;

    impl Descriptor for StrictEcho {
        type Input = str;
        type Output = Echo;
        const NAME: &'static str = "strict_echo";
        const REQUIRES_MODEL: bool = true;

        fn prompt(input: &str) -> String {
            input.to_string()
        }

        fn fallback(_input: &str, _jitter: &Jitter) -> Echo {
            Echo { words: Vec::new() }
        }
    }

    pub(crate) fn generator(model: Option<Arc<dyn TextModel>>) -> NarrativeGenerator {
        NarrativeGenerator::new(
            model,
            RetryPolicy { max_attempts: 2, backoff: Duration::ZERO },
            Arc::new(Jitter::disabled()),
            Arc::new(HealthState::new()),
            Arc::new(LatencyStats::new()),
        )
    }

    const GOOD: &str = "```json\n{\"words\": [\"hi\", \"hi\", \"hi\"]}\n```";

    #[tokio::test]
    async fn model_reply_is_used() {
        let model = Arc::new(ScriptedModel::replying(GOOD));
        let gen = generator(Some(model.clone()));
        let out = gen.run::<EchoDescriptor>("hi").await.unwrap();
        assert_eq!(out.source(), NarrativeSource::Model);
        assert_eq!(out.into_value().words, vec!["hi"; 3]);
        assert_eq!(model.last_prompt().unwrap(), "Repeat hi three times as JSON");
    }

    #[tokio::test]
    async fn quota_once_then_success_retries() {
        let model = Arc::new(ScriptedModel::new(vec![
            Err(UpstreamError::Quota("slow down".into())),
            Ok(GOOD.to_string()),
        ]));
        let gen = generator(Some(model.clone()));
        let out = gen.run::<EchoDescriptor>("hi").await.unwrap();
        assert_eq!(out, Generated::Model(Echo { words: vec!["hi".to_string(); 3] }));
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn quota_twice_falls_back() {
        let model = Arc::new(ScriptedModel::new(vec![
            Err(UpstreamError::Quota("1".into())),
            Err(UpstreamError::Quota("2".into())),
            Ok(GOOD.to_string()),
        ]));
        let gen = generator(Some(model.clone()));
        let out = gen.run::<EchoDescriptor>("yo").await.unwrap();
        assert_eq!(out.reason(), Some(FallbackReason::QuotaExhausted));
        assert_eq!(out.into_value().words, vec!["yo"; 3]);
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let model = Arc::new(ScriptedModel::new(vec![
            Err(UpstreamError::Unavailable("503".into())),
            Ok(GOOD.to_string()),
        ]));
        let gen = generator(Some(model.clone()));
        let out = gen.run::<EchoDescriptor>("yo").await.unwrap();
        assert_eq!(out.reason(), Some(FallbackReason::Unavailable));
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn parse_and_shape_failures_fall_back() {
        let gen = generator(Some(Arc::new(ScriptedModel::replying("not json at all"))));
        let out = gen.run::<EchoDescriptor>("a").await.unwrap();
        assert_eq!(out.reason(), Some(FallbackReason::ParseError));

        let gen = generator(Some(Arc::new(ScriptedModel::replying("{\"words\": [\"only one\"]}"))));
        let out = gen.run::<EchoDescriptor>("a").await.unwrap();
        assert_eq!(out.reason(), Some(FallbackReason::RejectedShape));
        assert_eq!(gen.health.snapshot().fallbacks, 1);
    }

    #[tokio::test]
    async fn missing_model_depends_on_descriptor() {
        let gen = generator(None);
        let out = gen.run::<EchoDescriptor>("a").await.unwrap();
        assert_eq!(out.reason(), Some(FallbackReason::NoModel));

        let err = gen.run::<StrictEcho>("a").await.unwrap_err();
        assert!(matches!(err, AppError::ModelNotConfigured));
    }

    #[tokio::test]
    async fn latency_recorded_per_attempt() {
        let model = Arc::new(ScriptedModel::new(vec![
            Err(UpstreamError::Quota("1".into())),
            Ok(GOOD.to_string()),
        ]));
        let gen = generator(Some(model));
        gen.run::<EchoDescriptor>("hi").await.unwrap();
        assert_eq!(gen.latency.len(), 2);
    }
}
