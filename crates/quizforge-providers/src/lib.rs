//! quizforge-providers: LLM backends and remote document access.
//!
//! Implements the `LlmProvider` trait for OpenAI-compatible chat APIs (Groq
//! and OpenAI) plus a mock, loads `quizforge.toml`, and fetches stored
//! documents from the document API.

pub mod config;
pub mod documents;
pub mod error;
pub mod mock;
pub mod openai;

pub use config::{create_provider, load_config, load_config_from, ProviderConfig, QuizforgeConfig};
pub use documents::DocumentClient;
pub use error::{DocumentError, ProviderError};
