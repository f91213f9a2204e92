//! Generation and submission reports with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::model::Document;
use crate::session::Submission;
use crate::traits::TokenUsage;

/// Outcome of a generation batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub provider: String,
    pub model: String,
    /// Documents that parsed into at least one question.
    pub documents: Vec<GeneratedDocument>,
    /// Specs that could not be turned into a usable test.
    pub failures: Vec<GenerationFailure>,
    /// Usage summed over every successful request.
    pub token_usage: TokenUsage,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// One successfully generated document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedDocument {
    pub spec_id: String,
    pub document: Document,
    /// Questions the parser kept.
    pub question_count: usize,
    /// Question fragments the parser dropped.
    pub dropped_questions: usize,
    pub token_usage: TokenUsage,
    pub latency_ms: u64,
    /// Provider calls made, retries included.
    pub attempts: u32,
}

/// A spec that failed to generate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationFailure {
    pub spec_id: String,
    pub error: String,
}

impl GenerationReport {
    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_json(self, path, "generation report")
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        load_json(path, "generation report")
    }

    /// Percentage of specs that produced a usable document.
    pub fn success_rate(&self) -> f64 {
        let total = self.documents.len() + self.failures.len();
        if total == 0 {
            return 0.0;
        }
        self.documents.len() as f64 / total as f64
    }
}

/// A stored test attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: Uuid,
    pub document_id: String,
    pub title: String,
    pub submission: Submission,
}

impl SubmissionRecord {
    pub fn new(document: &Document, submission: Submission) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id: document.id.clone(),
            title: document.title.clone(),
            submission,
        }
    }

    /// File name used when storing the record in a results directory.
    pub fn file_name(&self) -> String {
        format!(
            "submission-{}-attempt{}-{}.json",
            self.document_id,
            self.submission.attempt,
            self.submission.submitted_at.format("%Y-%m-%dT%H%M%S")
        )
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_json(self, path, "submission")
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        load_json(path, "submission")
    }
}

fn save_json<T: Serialize>(value: &T, path: &Path, what: &str) -> Result<()> {
    let json =
        serde_json::to_string_pretty(value).with_context(|| format!("failed to serialize {what}"))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("failed to write {what} to {}", path.display()))?;
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} from {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {what} JSON"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InteractiveSettings;
    use crate::parser::parse;
    use crate::session::{SubmitReason, TestSession};

    const SAMPLE: &str = "1. What is 2+2?\nA. 3\nB. 4 [CORRECT]\nC. 5\nD. 6\n2. Describe photosynthesis in two paragraphs.";

    fn make_report() -> GenerationReport {
        GenerationReport {
            id: Uuid::nil(),
            created_at: Utc::now(),
            provider: "mock".into(),
            model: "mock-model".into(),
            documents: vec![GeneratedDocument {
                spec_id: "math".into(),
                document: Document::from_raw("Math", SAMPLE),
                question_count: 2,
                dropped_questions: 0,
                token_usage: TokenUsage::default(),
                latency_ms: 5,
                attempts: 1,
            }],
            failures: vec![GenerationFailure {
                spec_id: "history".into(),
                error: "no questions".into(),
            }],
            token_usage: TokenUsage::default(),
            duration_ms: 10,
        }
    }

    #[test]
    fn generation_report_json_roundtrip() {
        let report = make_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = GenerationReport::load_json(&path).unwrap();
        assert_eq!(loaded.documents.len(), 1);
        assert_eq!(loaded.failures[0].spec_id, "history");
        assert!((loaded.success_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn submission_record_roundtrip() {
        let doc = Document::from_raw("Math", SAMPLE);
        let mut session =
            TestSession::start(parse(&doc.content), InteractiveSettings::default()).unwrap();
        session.answer(0, "B").unwrap();
        let submission = session.submit(SubmitReason::Manual).unwrap().clone();

        let record = SubmissionRecord::new(&doc, submission);
        assert!(record.file_name().starts_with(&format!("submission-{}-attempt1-", doc.id)));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(record.file_name());
        record.save_json(&path).unwrap();

        let loaded = SubmissionRecord::load_json(&path).unwrap();
        assert_eq!(loaded.submission.score(), 100);
        assert_eq!(loaded.submission.answers.get(0), "B");
    }

    #[test]
    fn load_missing_file_fails() {
        assert!(GenerationReport::load_json(Path::new("/nonexistent/report.json")).is_err());
    }
}
