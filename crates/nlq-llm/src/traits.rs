use crate::error::LlmResult;
use async_trait::async_trait;

/// Produces candidate SQL strings for a prompt. `k` is the number of
/// independent completions to request; implementations may fan these out in
/// parallel or sequentially depending on configuration.
#[async_trait]
pub trait GeneratorClient: Send + Sync {
    async fn generate(&self, prompt: &str, k: usize, temperature: f32) -> LlmResult<Vec<String>>;
}

/// Produces a dense embedding vector for a piece of text (a question or a
/// table/column summary).
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> LlmResult<Vec<f32>>;

    /// Calls `embed` once, retrying exactly once on failure before giving up.
    /// Every caller that holds a trait object gets this for free instead of
    /// only the concrete HTTP client, so retrieval's retry-then-degrade
    /// policy (spec §4.3) applies no matter which client is wired in.
    async fn embed_with_retry(&self, text: &str) -> LlmResult<Vec<f32>> {
        match self.embed(text).await {
            Ok(embedding) => Ok(embedding),
            Err(first_error) => {
                log::warn!("embedding request failed, retrying once: {first_error}");
                self.embed(text).await.map_err(|second_error| {
                    log::error!("embedding worker unavailable after retry: {second_error}");
                    second_error
                })
            }
        }
    }
}
