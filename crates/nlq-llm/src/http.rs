use crate::error::{LlmError, LlmResult};
use crate::fence::strip_code_fence;
use crate::traits::{EmbeddingClient, GeneratorClient};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP client for the generator worker: a local model server speaking a
/// small JSON protocol (prompt + k + temperature in, raw completions out).
pub struct HttpGeneratorClient {
    client: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    k: usize,
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    completions: Vec<String>,
}

impl HttpGeneratorClient {
    pub fn new(url: impl Into<String>, timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .expect("reqwest client builder with a timeout never fails");
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl GeneratorClient for HttpGeneratorClient {
    async fn generate(&self, prompt: &str, k: usize, temperature: f32) -> LlmResult<Vec<String>> {
        let response = self
            .client
            .post(&self.url)
            .json(&GenerateRequest { prompt, k, temperature })
            .send()
            .await
            .map_err(|e| {
                log::error!("generator worker unreachable at {}: {e}", self.url);
                LlmError::GeneratorUnavailable(e.to_string())
            })?;

        if !response.status().is_success() {
            return Err(LlmError::GeneratorUnavailable(format!(
                "generator returned status {}",
                response.status()
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        Ok(parsed
            .completions
            .into_iter()
            .map(|c| strip_code_fence(&c))
            .collect())
    }
}

/// HTTP client for the embedding worker. `EmbeddingClient::embed_with_retry`
/// (a trait default) gives callers the retry-once-then-degrade behavior;
/// this type's own `embed` is a single, no-retry request.
pub struct HttpEmbeddingClient {
    client: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl HttpEmbeddingClient {
    pub fn new(url: impl Into<String>, timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .expect("reqwest client builder with a timeout never fails");
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    async fn embed(&self, text: &str) -> LlmResult<Vec<f32>> {
        let response = self
            .client
            .post(&self.url)
            .json(&EmbedRequest { text })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LlmError::EmbeddingUnavailable(format!(
                "embedding worker returned status {}",
                response.status()
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;
        Ok(parsed.embedding)
    }
}
