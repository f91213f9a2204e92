//! Test content parser.
//!
//! Turns loosely structured LLM output (numbered questions, lettered options,
//! a `[CORRECT]` marker) into [`Question`]s. The parser never fails: anything
//! it cannot make sense of is skipped, and malformed questions are dropped.
//!
//! Each line is classified into a [`LineKind`] and fed to a three-state scan
//! (`AwaitingQuestion`, `InQuestionNoOptions`, `InQuestionWithOptions`).
//! Essay reclassification is a transition that only exists from
//! `InQuestionNoOptions`.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{OptionLetter, Question, QuestionType, QuizOption};

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid think regex"));
static FIRST_QUESTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[0-9]+\.").expect("valid first-question regex"));
static QUESTION_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)\.\s*(.+)").expect("valid question regex"));
static OPTION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-D]\.\s*").expect("valid option prefix regex"));
static OPTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-D])\.\s*(.+?)(\s*\[CORRECT\])?$").expect("valid option regex")
});

/// Freeform lines must be longer than this to turn a question into an essay.
const ESSAY_LINE_MIN_CHARS: usize = 10;
/// An option-less question whose prompt is longer than this closes as an essay.
const ESSAY_PROMPT_MIN_CHARS: usize = 10;
/// Essay prompts must be longer than this to be kept.
const MIN_TEXT_CHARS: usize = 5;
/// Case-sensitive markers that make an essay line worth keeping as instructions.
const INSTRUCTION_HINTS: [&str; 4] = ["word", "paragraph", "explain", "describe"];

/// What a single (trimmed, non-furniture) line of content is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// `N. text` opens a new question.
    QuestionStart { number: u32, text: &'a str },
    /// Starts with `A.`–`D.`. `None` when no option text could be extracted.
    OptionLine(Option<QuizOption>),
    /// Anything else.
    Freeform(&'a str),
}

/// Classify one trimmed line.
pub fn classify_line(line: &str) -> LineKind<'_> {
    if let Some(caps) = QUESTION_START.captures(line) {
        let text = caps.get(2).map_or("", |m| m.as_str());
        // An ordinal too large for u32 is not a question we can number.
        if let Ok(number) = caps[1].parse::<u32>() {
            return LineKind::QuestionStart { number, text };
        }
    }

    if OPTION_PREFIX.is_match(line) {
        let option = OPTION_LINE.captures(line).and_then(|caps| {
            let letter = caps[1].parse::<OptionLetter>().ok()?;
            Some(QuizOption {
                letter,
                text: caps[2].trim().to_string(),
                is_correct: caps.get(3).is_some(),
            })
        });
        return LineKind::OptionLine(option);
    }

    LineKind::Freeform(line)
}

/// Remove every `<think>…</think>` block.
pub fn strip_think_blocks(raw: &str) -> Cow<'_, str> {
    THINK_BLOCK.replace_all(raw, "")
}

/// Drop everything before the first line that starts with `N.`.
fn skip_preamble(text: &str) -> &str {
    match FIRST_QUESTION.find(text) {
        Some(m) => &text[m.start()..],
        None => text,
    }
}

/// Headers, branding and closing lines that are never question content.
pub fn is_furniture(line: &str) -> bool {
    let lower = line.to_lowercase();
    line.starts_with('#')
        || line.starts_with("**")
        || line.starts_with("---")
        || line.contains("Organization:")
        || line.contains("Date:")
        || lower.contains("quiz")
        || lower.contains("end of")
}

/// A question under construction.
#[derive(Debug, Clone)]
struct Draft {
    number: u32,
    text: String,
    question_type: QuestionType,
    options: Vec<QuizOption>,
    instructions: Option<String>,
}

impl Draft {
    fn open(number: u32, text: &str) -> Self {
        Self {
            number,
            text: text.to_string(),
            question_type: QuestionType::MultipleChoice,
            options: Vec::new(),
            instructions: None,
        }
    }

    fn absorb_freeform(&mut self, line: &str) {
        if line.chars().count() <= ESSAY_LINE_MIN_CHARS {
            return;
        }
        self.question_type = QuestionType::Essay;
        if INSTRUCTION_HINTS.iter().any(|hint| line.contains(hint)) {
            self.instructions = Some(line.to_string());
        }
    }

    /// Close the draft, or drop it if it is malformed.
    ///
    /// A multiple-choice draft that never saw an option is an open question
    /// when its prompt is substantial enough to answer in prose.
    fn finish(self) -> Option<Question> {
        let text_chars = self.text.chars().count();
        let mut question_type = self.question_type;
        if question_type == QuestionType::MultipleChoice
            && self.options.is_empty()
            && text_chars > ESSAY_PROMPT_MIN_CHARS
        {
            question_type = QuestionType::Essay;
        }

        let keep = match question_type {
            QuestionType::Essay => text_chars > MIN_TEXT_CHARS,
            QuestionType::MultipleChoice => text_chars > 0 && self.options.len() >= 2,
        };
        if !keep {
            tracing::debug!(
                number = self.number,
                options = self.options.len(),
                "dropping malformed question"
            );
            return None;
        }

        Some(Question {
            number: self.number,
            text: self.text,
            question_type,
            options: self.options,
            instructions: self.instructions,
        })
    }
}

/// Scan state threaded through the line fold.
#[derive(Debug)]
enum ScanState {
    AwaitingQuestion,
    InQuestionNoOptions(Draft),
    InQuestionWithOptions(Draft),
}

impl ScanState {
    /// Apply one line. Returns the next state and the draft it closed, if any.
    fn advance(self, kind: LineKind<'_>) -> (ScanState, Option<Draft>) {
        match (self, kind) {
            (state, LineKind::QuestionStart { number, text }) => (
                ScanState::InQuestionNoOptions(Draft::open(number, text)),
                state.into_draft(),
            ),
            (ScanState::InQuestionNoOptions(mut draft), LineKind::OptionLine(Some(option)))
            | (ScanState::InQuestionWithOptions(mut draft), LineKind::OptionLine(Some(option))) => {
                draft.options.push(option);
                (ScanState::InQuestionWithOptions(draft), None)
            }
            (ScanState::InQuestionNoOptions(mut draft), LineKind::Freeform(line)) => {
                draft.absorb_freeform(line);
                (ScanState::InQuestionNoOptions(draft), None)
            }
            // Stray options before any question, unparseable option lines and
            // prose after the options are all ignored.
            (state, _) => (state, None),
        }
    }

    fn into_draft(self) -> Option<Draft> {
        match self {
            ScanState::AwaitingQuestion => None,
            ScanState::InQuestionNoOptions(draft) | ScanState::InQuestionWithOptions(draft) => {
                Some(draft)
            }
        }
    }
}

/// Result of parsing with the list of dropped question numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    pub questions: Vec<Question>,
    /// Source numbers of questions that failed the post-filter.
    pub dropped: Vec<u32>,
}

/// Parse raw content into questions.
pub fn parse(raw: &str) -> Vec<Question> {
    parse_detailed(raw).questions
}

/// Parse raw content, also reporting which question numbers were dropped.
pub fn parse_detailed(raw: &str) -> ParseOutcome {
    let stripped = strip_think_blocks(raw);
    let body = skip_preamble(&stripped);

    let (state, mut drafts) = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_furniture(line))
        .map(classify_line)
        .fold(
            (ScanState::AwaitingQuestion, Vec::new()),
            |(state, mut drafts), kind| {
                let (next, closed) = state.advance(kind);
                drafts.extend(closed);
                (next, drafts)
            },
        );
    drafts.extend(state.into_draft());

    let mut outcome = ParseOutcome::default();
    for draft in drafts {
        let number = draft.number;
        match draft.finish() {
            Some(question) => outcome.questions.push(question),
            None => outcome.dropped.push(number),
        }
    }
    outcome
}
