//! Interactive test sessions.
//!
//! A session owns the parsed questions and the learner's answer map. It is
//! submitted exactly once (manually or because the time limit ran out) and is
//! terminal afterwards, unless the test settings allow a retry.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::model::{AnswerMap, Document, InteractiveSettings, Question};
use crate::scoring::{grade, GradeReport};

/// Why a session was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitReason {
    Manual,
    TimeExpired,
}

/// The frozen result of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub attempt: u32,
    pub reason: SubmitReason,
    pub started_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
    pub answers: AnswerMap,
    pub grade: GradeReport,
}

impl Submission {
    pub fn score(&self) -> u32 {
        self.grade.score
    }
}

#[derive(Debug, Clone)]
enum SessionState {
    InProgress,
    Submitted(Box<Submission>),
}

/// One learner taking one test.
#[derive(Debug, Clone)]
pub struct TestSession {
    questions: Vec<Question>,
    answers: AnswerMap,
    settings: InteractiveSettings,
    started_at: DateTime<Utc>,
    attempt: u32,
    state: SessionState,
}

impl TestSession {
    /// Start a session now.
    pub fn start(
        questions: Vec<Question>,
        settings: InteractiveSettings,
    ) -> Result<Self, SessionError> {
        Self::start_at(questions, settings, Utc::now())
    }

    /// Start a session at an explicit instant.
    pub fn start_at(
        questions: Vec<Question>,
        settings: InteractiveSettings,
        now: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::EmptyTest);
        }
        let answers = AnswerMap::empty_for(questions.len());
        Ok(Self {
            questions,
            answers,
            settings,
            started_at: now,
            attempt: 1,
            state: SessionState::InProgress,
        })
    }

    /// Parse a document and start a session with its settings.
    pub fn from_document(document: &Document) -> Result<Self, SessionError> {
        Self::start(document.questions(), document.interactive_settings.clone())
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn settings(&self) -> &InteractiveSettings {
        &self.settings
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.state, SessionState::Submitted(_))
    }

    pub fn submission(&self) -> Option<&Submission> {
        match &self.state {
            SessionState::Submitted(submission) => Some(submission.as_ref()),
            SessionState::InProgress => None,
        }
    }

    /// Record (or overwrite) the answer for the question at `index`.
    pub fn answer(&mut self, index: usize, value: impl Into<String>) -> Result<(), SessionError> {
        if self.is_submitted() {
            return Err(SessionError::AlreadySubmitted);
        }
        if index >= self.questions.len() {
            return Err(SessionError::IndexOutOfRange {
                index,
                len: self.questions.len(),
            });
        }
        self.answers.set(index, value);
        Ok(())
    }

    /// Indices of questions with no answer yet.
    pub fn unanswered(&self) -> Vec<usize> {
        (0..self.questions.len())
            .filter(|&i| !self.answers.is_answered(i))
            .collect()
    }

    /// When the time budget runs out, if the test is timed.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        let limit = chrono::Duration::from_std(self.settings.time_limit()?).ok()?;
        Some(self.started_at + limit)
    }

    /// Time left at `now`; zero once expired, `None` for untimed tests.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let deadline = self.deadline()?;
        Some((deadline - now).to_std().unwrap_or(Duration::ZERO))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.deadline().is_some_and(|deadline| now >= deadline)
    }

    /// Grade the answers now and freeze the session.
    pub fn submit(&mut self, reason: SubmitReason) -> Result<&Submission, SessionError> {
        self.submit_at(reason, Utc::now())
    }

    /// Grade the answers at an explicit instant and freeze the session.
    pub fn submit_at(
        &mut self,
        reason: SubmitReason,
        now: DateTime<Utc>,
    ) -> Result<&Submission, SessionError> {
        if self.is_submitted() {
            return Err(SessionError::AlreadySubmitted);
        }
        let submission = Submission {
            attempt: self.attempt,
            reason,
            started_at: self.started_at,
            submitted_at: now,
            answers: self.answers.clone(),
            grade: grade(&self.questions, &self.answers),
        };
        tracing::info!(
            attempt = submission.attempt,
            score = submission.grade.score,
            reason = ?reason,
            "test submitted"
        );
        self.state = SessionState::Submitted(Box::new(submission));
        self.submission().ok_or(SessionError::NotSubmitted)
    }

    /// Start another attempt, when the settings allow it.
    pub fn retry(&mut self) -> Result<(), SessionError> {
        self.retry_at(Utc::now())
    }

    pub fn retry_at(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        if !self.is_submitted() {
            return Err(SessionError::NotSubmitted);
        }
        if !self.settings.allow_retry {
            return Err(SessionError::RetryNotAllowed);
        }
        self.answers = AnswerMap::empty_for(self.questions.len());
        self.started_at = now;
        self.attempt += 1;
        self.state = SessionState::InProgress;
        Ok(())
    }
}
