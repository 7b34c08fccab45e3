pub mod gemini;
pub mod reply;

use async_trait::async_trait;

use crate::error::UpstreamError;

pub use gemini::GeminiClient;

/// A text-generation backend. One call is one attempt; retries live in the
/// narrative generator.
#[async_trait]
pub trait TextModel: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, UpstreamError>;
}
