use crate::error::{Result, ServiceError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the external embedding service.
///
/// The service is a narrow interface: `POST {texts}` in, `{vectors}` out.
/// Vector computation itself stays external to this repository.
pub struct EmbedderClient {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    vectors: Option<Vec<Vec<f32>>>,
}

impl EmbedderClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    /// Embed a batch of texts, returning one vector per input text.
    ///
    /// A non-success status or a reply without a `vectors` key is a hard
    /// failure.
    pub async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        log::debug!("Embedding {} texts via {}", texts.len(), self.endpoint);
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest { texts })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbedResponse = resp.json().await?;
        extract_vectors(parsed)
    }
}

fn extract_vectors(parsed: EmbedResponse) -> Result<Vec<Vec<f32>>> {
    parsed
        .vectors
        .ok_or_else(|| ServiceError::MalformedReply("reply is missing 'vectors'".to_string()))
}
