//! The `quizforge take` command: an interactive, optionally timed test.
//!
//! Answers are read line by line from stdin. A countdown started from the
//! document's time limit submits whatever has been answered when it runs
//! out, even in the middle of a prompt.

use std::io::Write;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::{Instant, Sleep};

use quizforge_core::model::{Document, Question, QuestionType};
use quizforge_core::report::SubmissionRecord;
use quizforge_core::session::{SubmitReason, TestSession};
use quizforge_providers::load_config_from;

use super::grade::print_grade;

type Input = Lines<BufReader<Stdin>>;

/// What came back from a prompt.
enum Reply {
    Line(String),
    /// Stdin closed.
    Closed,
    TimeUp,
}

/// How an answering pass ended.
enum PassEnd {
    Finished,
    Closed,
    TimeUp,
}

pub async fn execute(
    document_path: PathBuf,
    results: Option<PathBuf>,
    time_limit: Option<u32>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let results_dir = results.unwrap_or(config.results_dir);

    let mut document = Document::load_json(&document_path)?;
    if let Some(minutes) = time_limit {
        document.interactive_settings.time_limit = Some(minutes);
    }

    let mut session = TestSession::from_document(&document)
        .with_context(|| format!("cannot start test from {}", document_path.display()))?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print_header(&document, &session);
        let mut countdown = session
            .remaining(Utc::now())
            .map(|left| Box::pin(tokio::time::sleep_until(Instant::now() + left)));

        let reason = run_attempt(&mut session, &mut input, &mut countdown).await?;
        let submission = session.submit(reason)?.clone();

        if reason == SubmitReason::TimeExpired {
            println!("\nTime is up. Your answers have been submitted.");
        }
        println!();
        print_grade(&document.title, &submission.grade);

        let record = SubmissionRecord::new(&document, submission);
        let path = results_dir.join(record.file_name());
        record.save_json(&path)?;
        println!("Submission saved to: {}", path.display());

        if !session.settings().allow_retry {
            break;
        }
        match prompt(&mut input, &mut None, "\nTake the test again? [y/N] ").await? {
            Reply::Line(answer) if is_yes(&answer) => session.retry()?,
            _ => break,
        }
    }

    Ok(())
}

/// Collect answers until the learner submits, stdin closes or time runs out.
async fn run_attempt(
    session: &mut TestSession,
    input: &mut Input,
    countdown: &mut Option<Pin<Box<Sleep>>>,
) -> Result<SubmitReason> {
    let mut pending: Vec<usize> = (0..session.questions().len()).collect();

    loop {
        match answer_pass(session, input, countdown, &pending).await? {
            PassEnd::TimeUp => return Ok(SubmitReason::TimeExpired),
            PassEnd::Closed => return Ok(SubmitReason::Manual),
            PassEnd::Finished => {}
        }

        pending = session.unanswered();
        if pending.is_empty() {
            return Ok(SubmitReason::Manual);
        }

        let numbers: Vec<String> = pending
            .iter()
            .map(|&i| session.questions()[i].number.to_string())
            .collect();
        let question = format!(
            "\n{} question(s) unanswered ({}). Submit anyway? [y/N] ",
            pending.len(),
            numbers.join(", ")
        );
        match prompt(input, countdown, &question).await? {
            Reply::TimeUp => return Ok(SubmitReason::TimeExpired),
            Reply::Closed => return Ok(SubmitReason::Manual),
            Reply::Line(answer) if is_yes(&answer) => return Ok(SubmitReason::Manual),
            Reply::Line(_) => {}
        }
    }
}

/// Ask each pending question once.
async fn answer_pass(
    session: &mut TestSession,
    input: &mut Input,
    countdown: &mut Option<Pin<Box<Sleep>>>,
    pending: &[usize],
) -> Result<PassEnd> {
    for &index in pending {
        let question = session.questions()[index].clone();
        print_question(&question, session.remaining(Utc::now()));

        loop {
            let label = match question.question_type {
                QuestionType::MultipleChoice => {
                    let letters: Vec<&str> =
                        question.options.iter().map(|o| o.letter.as_str()).collect();
                    format!("Answer ({}, Enter to skip): ", letters.join("/"))
                }
                QuestionType::Essay => "Answer (one line, Enter to skip): ".to_string(),
            };

            let line = match prompt(input, countdown, &label).await? {
                Reply::Line(line) => line,
                Reply::Closed => return Ok(PassEnd::Closed),
                Reply::TimeUp => return Ok(PassEnd::TimeUp),
            };
            let line = line.trim();
            if line.is_empty() {
                break;
            }

            match question.question_type {
                QuestionType::MultipleChoice => {
                    let letter = line.to_uppercase();
                    if question.option(&letter).is_some() {
                        session.answer(index, letter)?;
                        break;
                    }
                    println!("'{line}' is not one of the options.");
                }
                QuestionType::Essay => {
                    session.answer(index, line)?;
                    break;
                }
            }
        }
    }
    Ok(PassEnd::Finished)
}

/// Print `label` and wait for a line, racing the countdown if there is one.
async fn prompt(
    input: &mut Input,
    countdown: &mut Option<Pin<Box<Sleep>>>,
    label: &str,
) -> Result<Reply> {
    print!("{label}");
    std::io::stdout().flush()?;

    let line = match countdown {
        Some(sleep) => tokio::select! {
            _ = sleep.as_mut() => return Ok(Reply::TimeUp),
            line = input.next_line() => line,
        },
        None => input.next_line().await,
    }
    .context("failed to read from stdin")?;

    Ok(match line {
        Some(line) => Reply::Line(line),
        None => Reply::Closed,
    })
}

fn print_header(document: &Document, session: &TestSession) {
    println!("\n{}", document.title);
    println!("{}", "=".repeat(document.title.chars().count().max(8)));
    let mut details = format!(
        "Attempt {}, {} question(s)",
        session.attempt(),
        session.questions().len()
    );
    if let Some(limit) = session.settings().time_limit() {
        details.push_str(&format!(", {} minute(s)", limit.as_secs() / 60));
    }
    println!("{details}");
}

fn print_question(question: &Question, remaining: Option<Duration>) {
    println!();
    if let Some(left) = remaining {
        println!("[{} left]", format_clock(left));
    }
    println!("{}. {}", question.number, question.text);
    for option in &question.options {
        println!("   {}. {}", option.letter, option.text);
    }
    if let Some(instructions) = &question.instructions {
        println!("   ({instructions})");
    }
}

fn format_clock(left: Duration) -> String {
    let secs = left.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
