//! The `quizforge parse` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use quizforge_core::model::{Document, Question, QuestionType};
use quizforge_core::parser::parse_detailed;

pub fn execute(input: PathBuf, format: String) -> Result<()> {
    let content = read_content(&input)?;
    let outcome = parse_detailed(&content);

    if outcome.questions.is_empty() {
        anyhow::bail!(
            "no questions could be parsed from {}; the content may be malformed",
            input.display()
        );
    }

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&outcome.questions)?),
        "text" => {
            for question in &outcome.questions {
                print_question(question);
            }
            let essays = outcome
                .questions
                .iter()
                .filter(|q| q.question_type == QuestionType::Essay)
                .count();
            println!(
                "{} question(s): {} multiple-choice, {} essay",
                outcome.questions.len(),
                outcome.questions.len() - essays,
                essays
            );
            if !outcome.dropped.is_empty() {
                let numbers: Vec<String> = outcome.dropped.iter().map(u32::to_string).collect();
                println!("Dropped malformed question(s): {}", numbers.join(", "));
            }
        }
        other => anyhow::bail!("unknown format: {other} (expected text or json)"),
    }

    Ok(())
}

/// Raw content, taken from a document JSON when the file is one.
fn read_content(path: &Path) -> Result<String> {
    if path.extension().is_some_and(|ext| ext == "json") {
        return Ok(Document::load_json(path)?.content);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_question(question: &Question) {
    println!("{}. [{}] {}", question.number, question.question_type, question.text);
    for option in &question.options {
        let marker = if option.is_correct { "  (correct)" } else { "" };
        println!("   {}. {}{}", option.letter, option.text, marker);
    }
    if let Some(instructions) = &question.instructions {
        println!("   {instructions}");
    }
    println!();
}
