//! The `quizforge init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("quizforge.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("plans").context("failed to create plans directory")?;
    write_if_missing(Path::new("plans/example.toml"), EXAMPLE_PLAN)?;

    println!("\nNext steps:");
    println!("  1. Export GROQ_API_KEY or edit quizforge.toml");
    println!("  2. Run: quizforge validate --plan plans/example.toml");
    println!("  3. Run: quizforge generate --plan plans/example.toml");
    println!("  4. Run: quizforge take quizforge-output/<test>.json");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizforge configuration

default_provider = "groq"
default_model = "llama-3.3-70b-versatile"
default_temperature = 0.7
parallelism = 4
output_dir = "./quizforge-output"

# Base URL of the document API used by `quizforge fetch`.
# document_api = "https://example.com/api"
# api_token = "${QUIZFORGE_API_TOKEN}"

[providers.groq]
type = "groq"
api_key = "${GROQ_API_KEY}"

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"

# Offline provider, handy for trying the workflow without an API key.
[providers.mock]
type = "mock"
"#;

const EXAMPLE_PLAN: &str = r#"[plan]
id = "example"
name = "Example Test Plan"
description = "Two short tests to get started"
default_question_count = 5
default_mix = "multiple-choice"
default_difficulty = "easy"

[[tests]]
id = "solar-system"
title = "The Solar System"
topic = "the planets of the solar system"
time_limit = 10

[[tests]]
id = "photosynthesis"
topic = "photosynthesis"
mix = "mixed"
question_count = 4
instructions = "End with one essay question about why plants need light."
allow_retry = true
"#;
