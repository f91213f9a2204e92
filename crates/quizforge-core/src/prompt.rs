//! Generation prompts.
//!
//! Builds the instructions that ask an LLM to write a test in the markdown
//! convention the content parser understands.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Upper bound on questions requested in a single generation.
pub const MAX_QUESTIONS: u32 = 50;

/// Default system prompt for test generation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an assessment author. Respond ONLY with the test itself. Do not include introductions, explanations of your reasoning, closing remarks, or any other meta-commentary.";

/// Which kinds of questions to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionMix {
    MultipleChoice,
    Essay,
    Mixed,
}

impl fmt::Display for QuestionMix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionMix::MultipleChoice => write!(f, "multiple-choice"),
            QuestionMix::Essay => write!(f, "essay"),
            QuestionMix::Mixed => write!(f, "mixed"),
        }
    }
}

impl FromStr for QuestionMix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "multiple-choice" | "mcq" | "mc" => Ok(QuestionMix::MultipleChoice),
            "essay" => Ok(QuestionMix::Essay),
            "mixed" => Ok(QuestionMix::Mixed),
            other => Err(format!("unknown question mix: {other}")),
        }
    }
}

/// Requested difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// What to generate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSpec {
    /// Identifier used for file names and reports.
    pub id: String,
    /// Title of the resulting document.
    pub title: String,
    /// Subject matter of the questions.
    pub topic: String,
    pub question_count: u32,
    pub mix: QuestionMix,
    pub difficulty: Difficulty,
    /// Appended verbatim to the prompt.
    #[serde(default)]
    pub extra_instructions: Option<String>,
    /// Time limit in minutes for the interactive test.
    #[serde(default)]
    pub time_limit: Option<u32>,
    #[serde(default)]
    pub allow_retry: bool,
}

impl TestSpec {
    /// A spec with defaults for everything but the topic.
    pub fn new(topic: impl Into<String>) -> Self {
        let topic = topic.into();
        Self {
            id: slugify(&topic),
            title: topic.clone(),
            topic,
            question_count: 10,
            mix: QuestionMix::MultipleChoice,
            difficulty: Difficulty::Medium,
            extra_instructions: None,
            time_limit: None,
            allow_retry: false,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.topic.trim().is_empty(), "topic must not be empty");
        anyhow::ensure!(
            (1..=MAX_QUESTIONS).contains(&self.question_count),
            "question count must be between 1 and {MAX_QUESTIONS}, got {}",
            self.question_count
        );
        Ok(())
    }
}

/// Lowercase, dash-separated identifier derived from free text.
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        "test".to_string()
    } else {
        slug
    }
}

/// Build the user prompt for a test.
pub fn build_prompt(spec: &TestSpec) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "Create a {} test about \"{}\" with exactly {} questions.\n\n",
        spec.difficulty,
        spec.topic.trim(),
        spec.question_count
    ));

    match spec.mix {
        QuestionMix::MultipleChoice => {
            prompt.push_str("All questions must be multiple-choice.\n");
        }
        QuestionMix::Essay => {
            prompt.push_str("All questions must be open-ended essay questions.\n");
        }
        QuestionMix::Mixed => {
            prompt.push_str(
                "Mix multiple-choice questions and open-ended essay questions, \
                 with multiple-choice questions first.\n",
            );
        }
    }

    prompt.push_str("\nFormatting rules:\n");
    prompt.push_str("- Number the questions sequentially as \"1.\", \"2.\", \"3.\" and so on, each at the start of its own line.\n");
    if spec.mix != QuestionMix::Essay {
        prompt.push_str("- Give every multiple-choice question exactly four options on separate lines labelled \"A.\", \"B.\", \"C.\" and \"D.\".\n");
        prompt.push_str("- Mark the single correct option by ending its line with [CORRECT]. Do not mark any other option.\n");
    }
    if spec.mix != QuestionMix::MultipleChoice {
        prompt.push_str("- Follow each essay question with one line of guidance for the answer, for example \"Write at least 150 words explaining your reasoning.\"\n");
    }
    prompt.push_str("- Do not add a title, introduction, answer key, explanations or closing remarks.\n");

    if let Some(extra) = spec
        .extra_instructions
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        prompt.push_str("\nAdditional instructions:\n");
        prompt.push_str(extra);
        prompt.push('\n');
    }

    prompt
}
