//! The `quizforge validate` command.

use std::path::PathBuf;

use anyhow::Result;

use quizforge_core::plan::{load_plan_directory, parse_test_plan, validate_test_plan};

pub fn execute(plan_path: PathBuf) -> Result<()> {
    let plans = if plan_path.is_dir() {
        load_plan_directory(&plan_path)?
    } else {
        vec![parse_test_plan(&plan_path)?]
    };

    let mut total_warnings = 0;

    for plan in &plans {
        println!("Plan: {} ({} tests)", plan.name, plan.tests.len());

        let warnings = validate_test_plan(plan);
        for w in &warnings {
            let prefix = w
                .test_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All plans valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
