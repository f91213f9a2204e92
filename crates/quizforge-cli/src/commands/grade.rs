//! The `quizforge grade` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizforge_core::model::{AnswerMap, Document};
use quizforge_core::scoring::{grade, GradeReport, QuestionOutcome};

pub fn execute(document_path: PathBuf, answers_path: PathBuf, format: String) -> Result<()> {
    let document = Document::load_json(&document_path)?;
    let answers = AnswerMap::load_json(&answers_path)?;
    let questions = document.questions();

    if questions.is_empty() {
        tracing::warn!(document = %document.id, "document has no parseable questions");
    }

    let report = grade(&questions, &answers);

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "text" => print_grade(&document.title, &report),
        other => anyhow::bail!("unknown format: {other} (expected text or json)"),
    }

    Ok(())
}

/// Print a per-question table followed by the score line.
pub fn print_grade(title: &str, report: &GradeReport) {
    let mut table = Table::new();
    table.set_header(vec!["#", "Type", "Answer", "Correct", "Result"]);

    for g in &report.questions {
        let correct: Vec<String> = g.correct_letters.iter().map(|l| l.to_string()).collect();
        let result = match g.outcome {
            QuestionOutcome::Correct => "correct",
            QuestionOutcome::Incorrect => "incorrect",
            QuestionOutcome::Unanswered => "unanswered",
            QuestionOutcome::NotGraded => "not graded",
        };
        table.add_row(vec![
            Cell::new(g.number),
            Cell::new(g.question_type),
            Cell::new(truncate(&g.answer, 40)),
            Cell::new(correct.join(",")),
            Cell::new(result),
        ]);
    }

    println!("{title}\n{table}");
    println!(
        "Score: {}% ({}/{} multiple-choice correct)",
        report.score, report.correct, report.total_gradable
    );
    if report.essays_answered > 0 {
        println!(
            "{} essay answer(s) recorded for manual review.",
            report.essays_answered
        );
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    short.push('…');
    short
}
