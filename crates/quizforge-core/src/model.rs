//! Core data model types for quizforge.
//!
//! Questions and options are what the content parser produces; the answer map
//! is what a learner fills in; documents are what the backend stores and
//! serves.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::parser;

/// A single parsed question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// The ordinal as printed in the source. Not renumbered, not used for keying.
    pub number: u32,
    /// The question prompt.
    pub text: String,
    /// Multiple-choice or essay.
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// Lettered options, empty for essays.
    #[serde(default)]
    pub options: Vec<QuizOption>,
    /// Free-text guidance for essays (e.g. word count).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl Question {
    /// Whether the scoring engine grades this question.
    pub fn is_gradable(&self) -> bool {
        self.question_type == QuestionType::MultipleChoice && !self.options.is_empty()
    }

    /// Look up the option with the given letter, if present.
    pub fn option(&self, letter: &str) -> Option<&QuizOption> {
        self.options.iter().find(|o| o.letter.as_str() == letter)
    }

    /// Letters of every option marked correct.
    pub fn correct_letters(&self) -> Vec<OptionLetter> {
        self.options
            .iter()
            .filter(|o| o.is_correct)
            .map(|o| o.letter)
            .collect()
    }
}

/// How a question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    MultipleChoice,
    Essay,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::MultipleChoice => write!(f, "multiple-choice"),
            QuestionType::Essay => write!(f, "essay"),
        }
    }
}

/// One lettered option of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub letter: OptionLetter,
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

/// Option labels recognised by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionLetter {
    A,
    B,
    C,
    D,
}

impl OptionLetter {
    pub const ALL: [OptionLetter; 4] = [
        OptionLetter::A,
        OptionLetter::B,
        OptionLetter::C,
        OptionLetter::D,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionLetter::A => "A",
            OptionLetter::B => "B",
            OptionLetter::C => "C",
            OptionLetter::D => "D",
        }
    }
}

impl fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionLetter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(OptionLetter::A),
            "B" => Ok(OptionLetter::B),
            "C" => Ok(OptionLetter::C),
            "D" => Ok(OptionLetter::D),
            other => Err(format!("unknown option letter: {other}")),
        }
    }
}

/// Learner answers keyed by question array index (not `Question::number`).
///
/// Missing entries and empty strings both mean "unanswered".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap(BTreeMap<usize, String>);

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A map with every index in `0..len` set to the empty string.
    pub fn empty_for(len: usize) -> Self {
        Self((0..len).map(|i| (i, String::new())).collect())
    }

    pub fn set(&mut self, index: usize, answer: impl Into<String>) {
        self.0.insert(index, answer.into());
    }

    /// The answer at `index`, or `""` when there is none.
    pub fn get(&self, index: usize) -> &str {
        self.0.get(&index).map(String::as_str).unwrap_or("")
    }

    pub fn is_answered(&self, index: usize) -> bool {
        !self.get(index).is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.0.iter().map(|(i, a)| (*i, a.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Load an answer map from a JSON object such as `{"0": "B", "1": "..."}`.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read answers from {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse answers JSON: {}", path.display()))
    }
}

impl<S: Into<String>> FromIterator<(usize, S)> for AnswerMap {
    fn from_iter<I: IntoIterator<Item = (usize, S)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(i, a)| (i, a.into())).collect())
    }
}

/// Settings that govern the interactive test built from a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractiveSettings {
    /// Time budget in minutes. `None` or `0` means untimed.
    #[serde(default)]
    pub time_limit: Option<u32>,
    /// Whether the learner may take the test again after submitting.
    #[serde(default)]
    pub allow_retry: bool,
}

impl InteractiveSettings {
    pub fn time_limit(&self) -> Option<Duration> {
        match self.time_limit {
            Some(minutes) if minutes > 0 => Some(Duration::from_secs(u64::from(minutes) * 60)),
            _ => None,
        }
    }
}

/// A stored document, in the shape the document API serves it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Raw LLM output.
    pub content: String,
    #[serde(default)]
    pub is_interactive: bool,
    #[serde(default)]
    pub interactive_settings: InteractiveSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Document {
    /// Wrap raw content in a fresh, non-interactive document.
    pub fn from_raw(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            content: content.into(),
            is_interactive: false,
            interactive_settings: InteractiveSettings::default(),
            created_at: Some(Utc::now()),
        }
    }

    /// Parse the document content into questions.
    pub fn questions(&self) -> Vec<Question> {
        parser::parse(&self.content)
    }

    /// Save the document as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize document")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write document to {}", path.display()))?;
        Ok(())
    }

    /// Load a document from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read document from {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse document JSON: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_letter_display_and_parse() {
        assert_eq!(OptionLetter::B.to_string(), "B");
        assert_eq!("C".parse::<OptionLetter>().unwrap(), OptionLetter::C);
        assert!("b".parse::<OptionLetter>().is_err());
        assert!("E".parse::<OptionLetter>().is_err());
    }

    #[test]
    fn question_type_serializes_kebab_case() {
        let json = serde_json::to_string(&QuestionType::MultipleChoice).unwrap();
        assert_eq!(json, "\"multiple-choice\"");
        let essay: QuestionType = serde_json::from_str("\"essay\"").unwrap();
        assert_eq!(essay, QuestionType::Essay);
    }

    #[test]
    fn answer_map_defaults_to_empty() {
        let mut answers = AnswerMap::empty_for(3);
        assert_eq!(answers.len(), 3);
        assert!(!answers.is_answered(0));
        assert_eq!(answers.get(42), "");

        answers.set(1, "B");
        assert!(answers.is_answered(1));
        assert_eq!(answers.get(1), "B");
    }

    #[test]
    fn answer_map_json_uses_index_keys() {
        let answers: AnswerMap = serde_json::from_str(r#"{"0": "B", "1": "Plants"}"#).unwrap();
        assert_eq!(answers.get(0), "B");
        assert_eq!(answers.get(1), "Plants");

        let json = serde_json::to_string(&answers).unwrap();
        assert_eq!(json, r#"{"0":"B","1":"Plants"}"#);
    }

    #[test]
    fn time_limit_zero_means_untimed() {
        let untimed = InteractiveSettings {
            time_limit: Some(0),
            allow_retry: false,
        };
        assert_eq!(untimed.time_limit(), None);

        let timed = InteractiveSettings {
            time_limit: Some(15),
            allow_retry: true,
        };
        assert_eq!(timed.time_limit(), Some(Duration::from_secs(900)));
    }

    #[test]
    fn document_accepts_backend_shape() {
        let json = r#"{
            "_id": "665f1c2e9b1e8a0012345678",
            "title": "Cell Biology",
            "content": "1. What is a cell?\nA. A unit [CORRECT]\nB. A planet",
            "isInteractive": true,
            "interactiveSettings": { "timeLimit": 20, "allowRetry": true },
            "createdAt": "2025-01-01T00:00:00Z"
        }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.id, "665f1c2e9b1e8a0012345678");
        assert!(doc.is_interactive);
        assert_eq!(doc.interactive_settings.time_limit, Some(20));
        assert!(doc.interactive_settings.allow_retry);
        assert_eq!(doc.questions().len(), 1);
    }

    #[test]
    fn document_tolerates_missing_settings() {
        let doc: Document = serde_json::from_str(r#"{"id": "x", "content": ""}"#).unwrap();
        assert_eq!(doc.interactive_settings, InteractiveSettings::default());
        assert!(doc.questions().is_empty());
    }

    #[test]
    fn document_json_file_roundtrip() {
        let doc = Document::from_raw("Sample", "1. Explain gravity in detail.\n");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");

        doc.save_json(&path).unwrap();
        let loaded = Document::load_json(&path).unwrap();
        assert_eq!(loaded.id, doc.id);
        assert_eq!(loaded.content, doc.content);
    }

    #[test]
    fn question_lookup_helpers() {
        let q = Question {
            number: 1,
            text: "Pick one".into(),
            question_type: QuestionType::MultipleChoice,
            options: vec![
                QuizOption {
                    letter: OptionLetter::A,
                    text: "x".into(),
                    is_correct: false,
                },
                QuizOption {
                    letter: OptionLetter::B,
                    text: "y".into(),
                    is_correct: true,
                },
            ],
            instructions: None,
        };
        assert!(q.is_gradable());
        assert_eq!(q.option("B").map(|o| o.is_correct), Some(true));
        assert!(q.option("E").is_none());
        assert_eq!(q.correct_letters(), vec![OptionLetter::B]);
    }
}
