//! quizforge-core: Content parsing, grading, and test sessions.
//!
//! This crate turns raw LLM-generated test content into structured questions,
//! grades learner answers, and drives generation through the `LlmProvider`
//! trait that `quizforge-providers` implements.

pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod plan;
pub mod prompt;
pub mod report;
pub mod scoring;
pub mod session;
pub mod traits;
