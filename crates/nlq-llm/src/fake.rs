//! Hand-written fakes for tests, following the teacher's preference over
//! mocking frameworks.

use crate::error::{LlmError, LlmResult};
use crate::traits::{EmbeddingClient, GeneratorClient};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Returns a fixed list of completions regardless of prompt, truncated or
/// cycled to satisfy `k`. Set `fail` to simulate an unreachable worker.
pub struct FakeGeneratorClient {
    pub completions: Vec<String>,
    pub fail: bool,
}

impl FakeGeneratorClient {
    pub fn new(completions: Vec<String>) -> Self {
        Self {
            completions,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            completions: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl GeneratorClient for FakeGeneratorClient {
    async fn generate(&self, _prompt: &str, k: usize, _temperature: f32) -> LlmResult<Vec<String>> {
        if self.fail {
            return Err(LlmError::GeneratorUnavailable("fake generator set to fail".to_string()));
        }
        Ok(self.completions.iter().cycle().take(k).cloned().collect())
    }
}

/// Returns a preset embedding per input text (keyed verbatim), or a default
/// vector for unknown text. `fail_count` simulates transient failures: each
/// call decrements it and errors until it reaches zero.
pub struct FakeEmbeddingClient {
    pub vectors: HashMap<String, Vec<f32>>,
    pub default_vector: Vec<f32>,
    fail_count: Mutex<usize>,
}

impl FakeEmbeddingClient {
    pub fn new(vectors: HashMap<String, Vec<f32>>) -> Self {
        Self {
            vectors,
            default_vector: vec![0.0, 0.0],
            fail_count: Mutex::new(0),
        }
    }

    pub fn failing_times(mut self, times: usize) -> Self {
        self.fail_count = Mutex::new(times);
        self
    }
}

#[async_trait]
impl EmbeddingClient for FakeEmbeddingClient {
    async fn embed(&self, text: &str) -> LlmResult<Vec<f32>> {
        let mut remaining = self.fail_count.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            return Err(LlmError::EmbeddingUnavailable("fake embedding set to fail".to_string()));
        }
        Ok(self.vectors.get(text).cloned().unwrap_or_else(|| self.default_vector.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_generator_cycles_to_satisfy_k() {
        let client = FakeGeneratorClient::new(vec!["SELECT 1".to_string(), "SELECT 2".to_string()]);
        let result = client.generate("prompt", 3, 0.5).await.unwrap();
        assert_eq!(result.len(), 3);
    }

    #[tokio::test]
    async fn fake_embedding_fails_then_succeeds() {
        let client = FakeEmbeddingClient::new(HashMap::new()).failing_times(1);
        assert!(client.embed("question").await.is_err());
        assert!(client.embed("question").await.is_ok());
    }
}
