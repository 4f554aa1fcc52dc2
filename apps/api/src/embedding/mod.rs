//! Embedding provider: turns searchable text into a vector.
//!
//! The contract seen by the rest of the service is infallible: any failure
//! (unreachable endpoint, non-2xx status, malformed payload) is logged here and
//! surfaces as an empty vector, which callers treat as "no embedding available".

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod text;

const EMBEDDINGS_PATH: &str = "/api/embeddings";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model name stored alongside every generated vector.
    fn model(&self) -> &str;

    /// Never fails. Returns an empty vector when no embedding can be produced.
    async fn embed(&self, text: &str) -> Vec<f32>;
}

#[derive(Debug, Error)]
enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("provider returned no embedding")]
    Empty,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Accepts both the single-vector and the batched response shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbeddingResponse {
    Single { embedding: Vec<f32> },
    Batch { embeddings: Vec<Vec<f32>> },
}

/// HTTP client for an Ollama-compatible embeddings endpoint.
#[derive(Clone)]
pub struct HttpEmbeddingClient {
    client: Client,
    base_url: String,
    model: String,
}

impl HttpEmbeddingClient {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), EMBEDDINGS_PATH)
    }

    async fn request(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let response = self
            .client
            .post(self.endpoint())
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        decode_embedding(&body)
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Vec<f32> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        match self.request(text).await {
            Ok(vector) => {
                debug!(dim = vector.len(), "Generated embedding");
                vector
            }
            Err(e) => {
                warn!("Embedding unavailable, continuing without it: {e}");
                Vec::new()
            }
        }
    }
}

fn decode_embedding(body: &str) -> Result<Vec<f32>, EmbeddingError> {
    let vector = match serde_json::from_str::<EmbeddingResponse>(body)? {
        EmbeddingResponse::Single { embedding } => embedding,
        EmbeddingResponse::Batch { embeddings } => {
            embeddings.into_iter().next().unwrap_or_default()
        }
    };

    if vector.is_empty() {
        return Err(EmbeddingError::Empty);
    }
    Ok(vector)
}

/// Fixed-response providers for exercising the scoring paths.
#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    pub const TEST_MODEL: &str = "test-embed";

    /// Returns the vector registered for an exact text, otherwise `fallback`.
    #[derive(Default)]
    pub struct StaticEmbeddings {
        by_text: HashMap<String, Vec<f32>>,
        fallback: Vec<f32>,
        calls: AtomicUsize,
    }

    impl StaticEmbeddings {
        /// A provider that is always unavailable.
        pub fn unavailable() -> Self {
            Self::default()
        }

        pub fn always(vector: Vec<f32>) -> Self {
            Self {
                fallback: vector,
                ..Self::default()
            }
        }

        pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
            self.by_text.insert(text.to_string(), vector);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EmbeddingProvider for StaticEmbeddings {
        fn model(&self) -> &str {
            TEST_MODEL
        }

        async fn embed(&self, text: &str) -> Vec<f32> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.by_text
                .get(text)
                .cloned()
                .unwrap_or_else(|| self.fallback.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_single_embedding() {
        let vector = decode_embedding(r#"{"embedding": [0.1, 0.2, 0.3]}"#).unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_decode_batched_embedding_takes_first() {
        let vector = decode_embedding(r#"{"embeddings": [[1.0, 2.0], [3.0, 4.0]]}"#).unwrap();
        assert_eq!(vector, vec![1.0, 2.0]);
    }

    #[test]
    fn test_decode_rejects_malformed_and_empty_payloads() {
        assert!(matches!(
            decode_embedding(r#"{"data": []}"#),
            Err(EmbeddingError::Parse(_))
        ));
        assert!(matches!(
            decode_embedding(r#"{"embedding": []}"#),
            Err(EmbeddingError::Empty)
        ));
    }

    #[test]
    fn test_endpoint_joins_base_url_without_double_slash() {
        let client = HttpEmbeddingClient::new(
            "http://localhost:11434/".to_string(),
            "nomic-embed-text".to_string(),
        );
        assert_eq!(client.endpoint(), "http://localhost:11434/api/embeddings");
        assert_eq!(client.model(), "nomic-embed-text");
    }

    #[tokio::test]
    async fn test_embed_blank_text_skips_provider() {
        let client = HttpEmbeddingClient::new("http://127.0.0.1:9".to_string(), "m".to_string());
        assert!(client.embed("   ").await.is_empty());
    }

    #[tokio::test]
    async fn test_embed_unreachable_endpoint_returns_empty_vector() {
        let client = HttpEmbeddingClient::new("http://127.0.0.1:9".to_string(), "m".to_string());
        assert!(client.embed("rust engineer").await.is_empty());
    }
}
