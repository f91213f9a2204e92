//! Scoring engine.
//!
//! Only multiple-choice questions with options are graded. Essays are never
//! penalised and never required.

use serde::{Deserialize, Serialize};

use crate::model::{AnswerMap, OptionLetter, Question, QuestionType};

/// Percentage score (0–100) over the gradable questions.
///
/// Returns 0 when there is nothing to grade.
pub fn score(questions: &[Question], answers: &AnswerMap) -> u32 {
    let (correct, total) = questions
        .iter()
        .enumerate()
        .filter(|(_, q)| q.is_gradable())
        .fold((0u32, 0u32), |(correct, total), (index, q)| {
            let hit = q
                .option(answers.get(index))
                .is_some_and(|option| option.is_correct);
            (correct + u32::from(hit), total + 1)
        });
    percentage(correct, total)
}

/// `round(correct / total * 100)`, rounding halves up.
pub fn percentage(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let (correct, total) = (u64::from(correct), u64::from(total));
    ((correct * 200 + total) / (total * 2)) as u32
}

/// How a single question fared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionOutcome {
    Correct,
    Incorrect,
    Unanswered,
    /// Essays and multiple-choice questions without options.
    NotGraded,
}

/// Per-question grading detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionGrade {
    /// Array index, the key used in the answer map.
    pub index: usize,
    /// Number as printed in the source.
    pub number: u32,
    pub question_type: QuestionType,
    pub answer: String,
    pub correct_letters: Vec<OptionLetter>,
    pub outcome: QuestionOutcome,
}

/// Full grading result for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeReport {
    pub score: u32,
    pub correct: u32,
    pub total_gradable: u32,
    pub essays_answered: u32,
    pub questions: Vec<QuestionGrade>,
}

impl GradeReport {
    /// Indices of gradable questions that were answered wrongly or not at all.
    pub fn missed(&self) -> Vec<usize> {
        self.questions
            .iter()
            .filter(|g| {
                matches!(
                    g.outcome,
                    QuestionOutcome::Incorrect | QuestionOutcome::Unanswered
                )
            })
            .map(|g| g.index)
            .collect()
    }
}

/// Grade every question and compute the same score as [`score`].
pub fn grade(questions: &[Question], answers: &AnswerMap) -> GradeReport {
    let mut correct = 0u32;
    let mut total_gradable = 0u32;
    let mut essays_answered = 0u32;

    let grades: Vec<QuestionGrade> = questions
        .iter()
        .enumerate()
        .map(|(index, q)| {
            let answer = answers.get(index);
            let outcome = if !q.is_gradable() {
                if q.question_type == QuestionType::Essay && !answer.trim().is_empty() {
                    essays_answered += 1;
                }
                QuestionOutcome::NotGraded
            } else {
                total_gradable += 1;
                if answer.is_empty() {
                    QuestionOutcome::Unanswered
                } else if q.option(answer).is_some_and(|o| o.is_correct) {
                    correct += 1;
                    QuestionOutcome::Correct
                } else {
                    QuestionOutcome::Incorrect
                }
            };
            QuestionGrade {
                index,
                number: q.number,
                question_type: q.question_type,
                answer: answer.to_string(),
                correct_letters: q.correct_letters(),
                outcome,
            }
        })
        .collect();

    GradeReport {
        score: percentage(correct, total_gradable),
        correct,
        total_gradable,
        essays_answered,
        questions: grades,
    }
}
