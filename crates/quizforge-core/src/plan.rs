//! TOML test plan parser.
//!
//! A plan lists the tests to generate in one batch, with plan-wide defaults.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::prompt::{slugify, Difficulty, QuestionMix, TestSpec, MAX_QUESTIONS};

/// A named batch of test specs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestPlan {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub tests: Vec<TestSpec>,
}

/// Intermediate TOML structure for parsing plan files.
#[derive(Debug, Deserialize)]
struct TomlPlanFile {
    plan: TomlPlanHeader,
    #[serde(default)]
    tests: Vec<TomlTest>,
}

#[derive(Debug, Deserialize)]
struct TomlPlanHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_count")]
    default_question_count: u32,
    #[serde(default = "default_mix_str")]
    default_mix: String,
    #[serde(default = "default_difficulty_str")]
    default_difficulty: String,
    #[serde(default)]
    default_time_limit: Option<u32>,
    #[serde(default)]
    allow_retry: bool,
}

fn default_count() -> u32 {
    10
}

fn default_mix_str() -> String {
    "multiple-choice".to_string()
}

fn default_difficulty_str() -> String {
    "medium".to_string()
}

#[derive(Debug, Deserialize)]
struct TomlTest {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    topic: String,
    #[serde(default)]
    question_count: Option<u32>,
    #[serde(default)]
    mix: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    instructions: Option<String>,
    #[serde(default)]
    time_limit: Option<u32>,
    #[serde(default)]
    allow_retry: Option<bool>,
}

/// Parse a single TOML file into a `TestPlan`.
pub fn parse_test_plan(path: &Path) -> Result<TestPlan> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read test plan file: {}", path.display()))?;

    parse_test_plan_str(&content, path)
}

/// Parse a TOML string into a `TestPlan` (useful for testing).
pub fn parse_test_plan_str(content: &str, source_path: &Path) -> Result<TestPlan> {
    let parsed: TomlPlanFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let header = parsed.plan;
    let default_mix: QuestionMix = header
        .default_mix
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{}", e))?;
    let default_difficulty: Difficulty = header
        .default_difficulty
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{}", e))?;

    let tests = parsed
        .tests
        .into_iter()
        .map(|t| {
            let mix = t
                .mix
                .map(|m| m.parse().map_err(|e: String| anyhow::anyhow!("{}", e)))
                .transpose()?
                .unwrap_or(default_mix);
            let difficulty = t
                .difficulty
                .map(|d| d.parse().map_err(|e: String| anyhow::anyhow!("{}", e)))
                .transpose()?
                .unwrap_or(default_difficulty);

            Ok(TestSpec {
                id: t.id.unwrap_or_else(|| slugify(&t.topic)),
                title: t.title.unwrap_or_else(|| t.topic.clone()),
                topic: t.topic,
                question_count: t.question_count.unwrap_or(header.default_question_count),
                mix,
                difficulty,
                extra_instructions: t.instructions,
                time_limit: t.time_limit.or(header.default_time_limit),
                allow_retry: t.allow_retry.unwrap_or(header.allow_retry),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TestPlan {
        id: header.id,
        name: header.name,
        description: header.description,
        tests,
    })
}

/// Recursively load all `.toml` plan files from a directory.
pub fn load_plan_directory(dir: &Path) -> Result<Vec<TestPlan>> {
    let mut plans = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            plans.extend(load_plan_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_test_plan(&path) {
                Ok(plan) => plans.push(plan),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(plans)
}

/// A warning from plan validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The test ID (if applicable).
    pub test_id: Option<String>,
    pub message: String,
}

/// Validate a test plan for common issues.
pub fn validate_test_plan(plan: &TestPlan) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if plan.tests.is_empty() {
        warnings.push(ValidationWarning {
            test_id: None,
            message: "plan has no tests".into(),
        });
    }

    let mut seen_ids = std::collections::HashSet::new();
    for test in &plan.tests {
        if !seen_ids.insert(&test.id) {
            warnings.push(ValidationWarning {
                test_id: Some(test.id.clone()),
                message: format!("duplicate test ID: {}", test.id),
            });
        }
    }

    for test in &plan.tests {
        if test.topic.trim().is_empty() {
            warnings.push(ValidationWarning {
                test_id: Some(test.id.clone()),
                message: "topic is empty".into(),
            });
        }
        if !(1..=MAX_QUESTIONS).contains(&test.question_count) {
            warnings.push(ValidationWarning {
                test_id: Some(test.id.clone()),
                message: format!(
                    "question_count {} is outside 1..={MAX_QUESTIONS}",
                    test.question_count
                ),
            });
        }
        if test.time_limit == Some(0) {
            warnings.push(ValidationWarning {
                test_id: Some(test.id.clone()),
                message: "time_limit of 0 means the test is untimed".into(),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[plan]
id = "biology-unit-1"
name = "Biology Unit 1"
description = "Intro biology tests"
default_question_count = 8
default_mix = "mixed"
default_time_limit = 20

[[tests]]
id = "cells"
title = "Cells and Organelles"
topic = "cell structure and organelles"
difficulty = "easy"

[[tests]]
topic = "Photosynthesis"
question_count = 4
mix = "essay"
instructions = "Focus on the light-dependent reactions."
allow_retry = true
"#;

    #[test]
    fn parse_valid_toml() {
        let plan = parse_test_plan_str(VALID_TOML, &PathBuf::from("plan.toml")).unwrap();
        assert_eq!(plan.id, "biology-unit-1");
        assert_eq!(plan.tests.len(), 2);

        let cells = &plan.tests[0];
        assert_eq!(cells.id, "cells");
        assert_eq!(cells.title, "Cells and Organelles");
        assert_eq!(cells.question_count, 8);
        assert_eq!(cells.mix, QuestionMix::Mixed);
        assert_eq!(cells.difficulty, Difficulty::Easy);
        assert_eq!(cells.time_limit, Some(20));
        assert!(!cells.allow_retry);

        let photo = &plan.tests[1];
        assert_eq!(photo.id, "photosynthesis");
        assert_eq!(photo.title, "Photosynthesis");
        assert_eq!(photo.mix, QuestionMix::Essay);
        assert_eq!(photo.difficulty, Difficulty::Medium);
        assert!(photo.allow_retry);
        assert!(photo.extra_instructions.is_some());
    }

    #[test]
    fn parse_minimal_plan() {
        let toml = r#"
[plan]
id = "minimal"
name = "Minimal"

[[tests]]
topic = "Fractions"
"#;
        let plan = parse_test_plan_str(toml, &PathBuf::from("plan.toml")).unwrap();
        assert_eq!(plan.tests[0].question_count, 10);
        assert_eq!(plan.tests[0].mix, QuestionMix::MultipleChoice);
        assert_eq!(plan.tests[0].time_limit, None);
    }

    #[test]
    fn parse_unknown_mix_fails() {
        let toml = r#"
[plan]
id = "bad"
name = "Bad"

[[tests]]
topic = "Fractions"
mix = "oral"
"#;
        assert!(parse_test_plan_str(toml, &PathBuf::from("plan.toml")).is_err());
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_test_plan_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn validate_duplicates_and_ranges() {
        let toml = r#"
[plan]
id = "dupes"
name = "Dupes"

[[tests]]
id = "same"
topic = "One"

[[tests]]
id = "same"
topic = "Two"
question_count = 80
time_limit = 0
"#;
        let plan = parse_test_plan_str(toml, &PathBuf::from("plan.toml")).unwrap();
        let warnings = validate_test_plan(&plan);
        assert!(warnings.iter().any(|w| w.message.contains("duplicate")));
        assert!(warnings.iter().any(|w| w.message.contains("outside")));
        assert!(warnings.iter().any(|w| w.message.contains("untimed")));
    }

    #[test]
    fn validate_empty_plan() {
        let plan = parse_test_plan_str(
            "[plan]\nid = \"empty\"\nname = \"Empty\"\n",
            &PathBuf::from("plan.toml"),
        )
        .unwrap();
        let warnings = validate_test_plan(&plan);
        assert!(warnings.iter().any(|w| w.message.contains("no tests")));
    }

    #[test]
    fn load_directory_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("bad.toml"), "not toml ][").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let plans = load_plan_directory(dir.path()).unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].id, "biology-unit-1");
    }
}
