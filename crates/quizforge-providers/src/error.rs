//! Provider and document API error types.

use thiserror::Error;

pub use quizforge_core::error::ProviderError;

/// Errors returned by the document API client.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// No document exists under the requested id.
    #[error("document not found: {0}")]
    NotFound(String),

    /// The API token was missing or rejected.
    #[error("not authorized to read document {0}")]
    Unauthorized(String),

    /// The API returned an unexpected response.
    #[error("document API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),
}
