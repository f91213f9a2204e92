//! Client for the document API that stores generated tests.

use anyhow::Context;
use serde::Deserialize;
use tracing::instrument;

use quizforge_core::model::Document;

use crate::error::DocumentError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Responses come either as the bare document or wrapped in `{ "document": … }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum DocumentEnvelope {
    Wrapped { document: Document },
    Bare(Document),
}

impl DocumentEnvelope {
    fn into_document(self) -> Document {
        match self {
            DocumentEnvelope::Wrapped { document } | DocumentEnvelope::Bare(document) => document,
        }
    }
}

/// Reads documents from `{base_url}/documents/{id}`.
pub struct DocumentClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl DocumentClient {
    pub fn new(base_url: &str, token: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    /// Fetch one document by id.
    #[instrument(skip(self))]
    pub async fn fetch(&self, id: &str) -> Result<Document, DocumentError> {
        let mut req = self
            .client
            .get(format!("{}/documents/{}", self.base_url, id))
            .header("accept", "application/json");
        if let Some(token) = &self.token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let response = req
            .send()
            .await
            .map_err(|e| DocumentError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        match status {
            404 => return Err(DocumentError::NotFound(id.to_string())),
            401 | 403 => return Err(DocumentError::Unauthorized(id.to_string())),
            s if s >= 400 => {
                let message = response.text().await.unwrap_or_default();
                return Err(DocumentError::Api { status, message });
            }
            _ => {}
        }

        let envelope: DocumentEnvelope =
            response.json().await.map_err(|e| DocumentError::Api {
                status,
                message: format!("failed to parse document: {e}"),
            })?;
        let document = envelope.into_document();
        tracing::debug!(title = %document.title, "fetched document");
        Ok(document)
    }
}
