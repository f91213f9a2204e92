//! The `quizforge fetch` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use quizforge_providers::{load_config_from, DocumentClient};

pub async fn execute(
    id: String,
    output: Option<PathBuf>,
    api: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let base_url = api.or(config.document_api.clone()).context(
        "no document API configured; pass --api or set document_api in quizforge.toml",
    )?;

    let client = DocumentClient::new(&base_url, config.api_token.clone())?;
    let document = client
        .fetch(&id)
        .await
        .with_context(|| format!("failed to fetch document {id}"))?;

    let question_count = document.questions().len();
    if question_count == 0 {
        eprintln!("Warning: document {id} contains no parseable questions.");
    }

    let path = output.unwrap_or_else(|| config.output_dir.join(format!("{id}.json")));
    document.save_json(&path)?;

    println!(
        "Saved \"{}\" ({} question(s)) to {}",
        document.title,
        question_count,
        path.display()
    );

    Ok(())
}
