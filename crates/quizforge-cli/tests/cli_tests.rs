//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn quizforge(home: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("quizforge").unwrap();
    // Keep a user-level config out of the tests.
    cmd.env("HOME", home)
        .env_remove("QUIZFORGE_GROQ_KEY")
        .env_remove("QUIZFORGE_OPENAI_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn samples() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../samples")
}

/// Config whose default provider replays `fixture` without network access.
fn mock_config(dir: &Path, fixture: &Path) -> PathBuf {
    let path = dir.join("quizforge.toml");
    let config = format!(
        "default_provider = \"offline\"\n\
         default_model = \"mock-model\"\n\
         retry_delay_ms = 1\n\
         \n\
         [providers.offline]\n\
         type = \"mock\"\n\
         fixture = '{}'\n",
        fixture.display()
    );
    std::fs::write(&path, config).unwrap();
    path
}

fn retryable_document(dir: &Path) -> PathBuf {
    let content = std::fs::read_to_string(samples().join("algebra-document.json")).unwrap();
    let mut doc: serde_json::Value = serde_json::from_str(&content).unwrap();
    doc["interactiveSettings"]["allowRetry"] = serde_json::Value::Bool(true);
    let path = dir.join("retry.json");
    std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();
    path
}

fn json_files(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[test]
fn help_output() {
    let home = TempDir::new().unwrap();
    quizforge(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("LLM test generator"));
}

#[test]
fn version_output() {
    let home = TempDir::new().unwrap();
    quizforge(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("quizforge"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    quizforge(dir.path())
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created quizforge.toml"))
        .stdout(predicate::str::contains("Created plans/example.toml"));

    assert!(dir.path().join("quizforge.toml").exists());
    assert!(dir.path().join("plans/example.toml").exists());

    quizforge(dir.path())
        .current_dir(dir.path())
        .arg("validate")
        .arg("--plan")
        .arg("plans/example.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("All plans valid"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    quizforge(dir.path())
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    quizforge(dir.path())
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn validate_sample_plan() {
    let home = TempDir::new().unwrap();
    quizforge(home.path())
        .arg("validate")
        .arg("--plan")
        .arg(samples().join("plan.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Math Unit 1 (2 tests)"))
        .stdout(predicate::str::contains("All plans valid"));
}

#[test]
fn validate_nonexistent_file() {
    let home = TempDir::new().unwrap();
    quizforge(home.path())
        .arg("validate")
        .arg("--plan")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn parse_raw_content() {
    let home = TempDir::new().unwrap();
    quizforge(home.path())
        .arg("parse")
        .arg(samples().join("algebra.md"))
        .assert()
        .success()
        .stdout(predicate::str::contains("1. [multiple-choice] Solve for x"))
        .stdout(predicate::str::contains("4. [essay] Explain"))
        .stdout(predicate::str::contains(
            "4 question(s): 3 multiple-choice, 1 essay",
        ))
        .stdout(predicate::str::contains("<think>").not());
}

#[test]
fn parse_document_as_json() {
    let home = TempDir::new().unwrap();
    let output = quizforge(home.path())
        .arg("parse")
        .arg(samples().join("algebra-document.json"))
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let questions: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let questions = questions.as_array().unwrap();
    assert_eq!(questions.len(), 4);
    assert_eq!(questions[0]["type"], "multiple-choice");
    assert_eq!(questions[0]["options"][1]["is_correct"], true);
    assert_eq!(questions[3]["type"], "essay");
}

#[test]
fn parse_unparseable_content_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prose.md");
    std::fs::write(&path, "Sorry, I can't write that test right now.").unwrap();

    quizforge(dir.path())
        .arg("parse")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no questions could be parsed"));
}

#[test]
fn grade_text_output() {
    let home = TempDir::new().unwrap();
    quizforge(home.path())
        .arg("grade")
        .arg("--document")
        .arg(samples().join("algebra-document.json"))
        .arg("--answers")
        .arg(samples().join("answers.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 67% (2/3 multiple-choice correct)"))
        .stdout(predicate::str::contains("1 essay answer(s) recorded"));
}

#[test]
fn grade_json_output() {
    let home = TempDir::new().unwrap();
    let output = quizforge(home.path())
        .arg("grade")
        .arg("--document")
        .arg(samples().join("algebra-document.json"))
        .arg("--answers")
        .arg(samples().join("answers.json"))
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["score"], 67);
    assert_eq!(report["questions"][1]["outcome"], "incorrect");
    assert_eq!(report["questions"][3]["outcome"], "not_graded");
}

#[test]
fn take_with_piped_answers() {
    let dir = TempDir::new().unwrap();
    let results = dir.path().join("results");

    quizforge(dir.path())
        .arg("take")
        .arg(samples().join("algebra-document.json"))
        .arg("--results")
        .arg(&results)
        .write_stdin("b\nA\nC\nSubstitute and compare both sides.\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 100%"))
        .stdout(predicate::str::contains("Submission saved to"));

    let files = json_files(&results);
    assert_eq!(files.len(), 1);
    let record: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&files[0]).unwrap()).unwrap();
    assert_eq!(record["document_id"], "algebra-basics");
    assert_eq!(record["submission"]["answers"]["0"], "B");
    assert_eq!(record["submission"]["reason"], "manual");
}

#[test]
fn take_rejects_unknown_letters() {
    let dir = TempDir::new().unwrap();

    quizforge(dir.path())
        .arg("take")
        .arg(samples().join("algebra-document.json"))
        .arg("--results")
        .arg(dir.path().join("results"))
        .write_stdin("E\nB\nA\nC\nessay\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("'E' is not one of the options"))
        .stdout(predicate::str::contains("Score: 100%"));
}

#[test]
fn take_confirms_unanswered_questions() {
    let dir = TempDir::new().unwrap();

    quizforge(dir.path())
        .arg("take")
        .arg(samples().join("algebra-document.json"))
        .arg("--results")
        .arg(dir.path().join("results"))
        .write_stdin("B\n\n\n\ny\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "3 question(s) unanswered (2, 3, 4). Submit anyway?",
        ))
        .stdout(predicate::str::contains("Score: 33%"));
}

#[test]
fn take_returns_to_unanswered_questions() {
    let dir = TempDir::new().unwrap();

    quizforge(dir.path())
        .arg("take")
        .arg(samples().join("algebra-document.json"))
        .arg("--results")
        .arg(dir.path().join("results"))
        .write_stdin("B\n\n\n\nn\nA\nC\nMy essay answer\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 100%"));
}

#[test]
fn take_submits_when_input_ends() {
    let dir = TempDir::new().unwrap();
    let results = dir.path().join("results");

    quizforge(dir.path())
        .arg("take")
        .arg(samples().join("algebra-document.json"))
        .arg("--results")
        .arg(&results)
        .write_stdin("B\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 33%"));

    assert_eq!(json_files(&results).len(), 1);
}

#[test]
fn take_retry_starts_second_attempt() {
    let dir = TempDir::new().unwrap();
    let results = dir.path().join("results");
    let document = retryable_document(dir.path());

    quizforge(dir.path())
        .arg("take")
        .arg(&document)
        .arg("--results")
        .arg(&results)
        .write_stdin("A\nA\nA\nfirst try\ny\nB\nA\nC\nsecond try\nn\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Attempt 2"))
        .stdout(predicate::str::contains("Score: 33%"))
        .stdout(predicate::str::contains("Score: 100%"));

    assert_eq!(json_files(&results).len(), 2);
}

#[test]
fn take_empty_document_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.json");
    std::fs::write(
        &path,
        r#"{"_id": "empty", "title": "Empty", "content": "No questions here."}"#,
    )
    .unwrap();

    quizforge(dir.path())
        .arg("take")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no questions"));
}

#[test]
fn generate_single_topic_with_mock() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(dir.path(), &samples().join("algebra.md"));
    let output = dir.path().join("out");

    quizforge(dir.path())
        .arg("generate")
        .arg("--topic")
        .arg("Linear equations")
        .arg("--count")
        .arg("4")
        .arg("--time-limit")
        .arg("20")
        .arg("--config")
        .arg(&config)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("generating 1 test(s) with offline/mock-model"))
        .stderr(predicate::str::contains("Complete: 1/1 generated"));

    let document: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(output.join("linear-equations.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(document["title"], "Linear equations");
    assert_eq!(document["isInteractive"], true);
    assert_eq!(document["interactiveSettings"]["timeLimit"], 20);

    let files = json_files(&output);
    assert!(files
        .iter()
        .any(|p| p.file_name().unwrap().to_string_lossy().starts_with("generation-")));
}

#[test]
fn generate_from_plan_with_mock() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(dir.path(), &samples().join("algebra.md"));
    let output = dir.path().join("out");

    quizforge(dir.path())
        .arg("generate")
        .arg("--plan")
        .arg(samples().join("plan.toml"))
        .arg("--config")
        .arg(&config)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("Complete: 2/2 generated"));

    assert!(output.join("algebra-basics.json").exists());
    assert!(output.join("geometry.json").exists());

    quizforge(dir.path())
        .arg("parse")
        .arg(output.join("geometry.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("4 question(s)"));
}

#[test]
fn generate_fails_when_nothing_parses() {
    let dir = TempDir::new().unwrap();
    let fixture = dir.path().join("refusal.md");
    std::fs::write(&fixture, "I'm sorry, I can't help with that.").unwrap();
    let config = mock_config(dir.path(), &fixture);

    quizforge(dir.path())
        .arg("generate")
        .arg("--topic")
        .arg("Anything")
        .arg("--config")
        .arg(&config)
        .arg("--output")
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no parseable questions"))
        .stderr(predicate::str::contains("no test could be generated"));
}

#[test]
fn generate_unknown_provider_fails() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(dir.path(), &samples().join("algebra.md"));

    quizforge(dir.path())
        .arg("generate")
        .arg("--topic")
        .arg("Anything")
        .arg("--provider")
        .arg("nope")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("provider 'nope' not found"));
}

#[test]
fn fetch_without_api_fails() {
    let dir = TempDir::new().unwrap();

    quizforge(dir.path())
        .current_dir(dir.path())
        .arg("fetch")
        .arg("abc123")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no document API configured"));
}

#[test]
fn list_models_from_config() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(dir.path(), &samples().join("algebra.md"));

    quizforge(dir.path())
        .arg("list-models")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Provider: offline (default)"))
        .stdout(predicate::str::contains("mock-model"));
}
