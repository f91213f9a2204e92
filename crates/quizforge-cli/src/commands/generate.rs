//! The `quizforge generate` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizforge_core::engine::{GenerationEngine, GenerationEngineConfig, ProgressReporter};
use quizforge_core::plan::{load_plan_directory, parse_test_plan, validate_test_plan};
use quizforge_core::prompt::{slugify, TestSpec};
use quizforge_core::report::{GeneratedDocument, GenerationReport};
use quizforge_core::traits::LlmProvider;
use quizforge_providers::{create_provider, load_config_from};

/// Where the specs come from.
pub enum Source {
    Plan(PathBuf),
    Single {
        topic: String,
        title: Option<String>,
        count: u32,
        mix: String,
        difficulty: String,
        instructions: Option<String>,
        time_limit: Option<u32>,
        allow_retry: bool,
    },
}

pub struct Options {
    pub source: Source,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub parallelism: Option<usize>,
    pub temperature: Option<f64>,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_generation_start(&self, spec_id: &str) {
        eprintln!("  Starting: {spec_id}");
    }

    fn on_generation_complete(&self, generated: &GeneratedDocument) {
        let dropped = if generated.dropped_questions > 0 {
            format!(", {} dropped", generated.dropped_questions)
        } else {
            String::new()
        };
        eprintln!(
            "  Done: {} [{} question(s){}] ({}ms, {} attempt(s))",
            generated.spec_id,
            generated.question_count,
            dropped,
            generated.latency_ms,
            generated.attempts,
        );
    }

    fn on_generation_error(&self, spec_id: &str, error: &str) {
        eprintln!("  ERROR: {spec_id}: {error}");
    }

    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {completed}/{total} generated, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(options: Options) -> Result<()> {
    let config = load_config_from(options.config.as_deref())?;

    let parallelism = options.parallelism.unwrap_or(config.parallelism);
    let temperature = options.temperature.unwrap_or(config.default_temperature);
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");
    anyhow::ensure!(
        (0.0..=2.0).contains(&temperature),
        "temperature must be between 0.0 and 2.0"
    );

    let specs = load_specs(options.source)?;
    anyhow::ensure!(!specs.is_empty(), "nothing to generate");

    let provider_name = options
        .provider
        .unwrap_or_else(|| config.default_provider.clone());
    let provider_config = config.providers.get(&provider_name).ok_or_else(|| {
        let mut available: Vec<&String> = config.providers.keys().collect();
        available.sort();
        anyhow::anyhow!(
            "provider '{provider_name}' not found in config. Available: {available:?}"
        )
    })?;
    let provider: Arc<dyn LlmProvider> =
        Arc::from(create_provider(&provider_name, provider_config)?);
    let model = options
        .model
        .unwrap_or_else(|| config.default_model.clone());

    let engine_config = GenerationEngineConfig {
        parallelism,
        temperature,
        max_retries: config.max_retries,
        retry_delay: Duration::from_millis(config.retry_delay_ms),
        ..GenerationEngineConfig::default()
    };
    let engine = GenerationEngine::new(provider, model.clone(), engine_config);

    eprintln!(
        "quizforge v{}: generating {} test(s) with {provider_name}/{model}",
        env!("CARGO_PKG_VERSION"),
        specs.len()
    );
    eprintln!();

    let report = engine.generate_batch(&specs, &ConsoleReporter).await?;

    let output = options.output.unwrap_or(config.output_dir);
    std::fs::create_dir_all(&output)?;

    for generated in &report.documents {
        let path = output.join(format!("{}.json", generated.spec_id));
        generated.document.save_json(&path)?;
        eprintln!("Document saved to: {}", path.display());
    }

    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    let report_path = output.join(format!("generation-{timestamp}.json"));
    report.save_json(&report_path)?;
    eprintln!("Report saved to: {}", report_path.display());

    print_summary(&report);

    if report.documents.is_empty() {
        anyhow::bail!("no test could be generated");
    }

    Ok(())
}

fn load_specs(source: Source) -> Result<Vec<TestSpec>> {
    match source {
        Source::Plan(path) => {
            let plans = if path.is_dir() {
                load_plan_directory(&path)?
            } else {
                vec![parse_test_plan(&path)?]
            };
            let mut specs = Vec::new();
            for plan in plans {
                for warning in validate_test_plan(&plan) {
                    let id = warning.test_id.as_deref().unwrap_or(&plan.id);
                    eprintln!("Warning: [{id}] {}", warning.message);
                }
                specs.extend(plan.tests);
            }
            Ok(specs)
        }
        Source::Single {
            topic,
            title,
            count,
            mix,
            difficulty,
            instructions,
            time_limit,
            allow_retry,
        } => {
            let mut spec = TestSpec::new(topic);
            if let Some(title) = title {
                spec.id = slugify(&title);
                spec.title = title;
            }
            spec.question_count = count;
            spec.mix = mix.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            spec.difficulty = difficulty.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            spec.extra_instructions = instructions;
            spec.time_limit = time_limit;
            spec.allow_retry = allow_retry;
            Ok(vec![spec])
        }
    }
}

fn print_summary(report: &GenerationReport) {
    let mut table = Table::new();
    table.set_header(vec!["Test", "Questions", "Dropped", "Tokens", "Cost", "Latency"]);

    for generated in &report.documents {
        table.add_row(vec![
            Cell::new(&generated.spec_id),
            Cell::new(generated.question_count),
            Cell::new(generated.dropped_questions),
            Cell::new(generated.token_usage.total_tokens),
            Cell::new(format!("${:.4}", generated.token_usage.estimated_cost_usd)),
            Cell::new(format!("{}ms", generated.latency_ms)),
        ]);
    }
    for failure in &report.failures {
        table.add_row(vec![
            Cell::new(&failure.spec_id),
            Cell::new("FAILED"),
            Cell::new(""),
            Cell::new(""),
            Cell::new(""),
            Cell::new(""),
        ]);
    }

    eprintln!("\n{table}");
    eprintln!(
        "Success rate: {:.0}%, total cost ${:.4}",
        report.success_rate() * 100.0,
        report.token_usage.estimated_cost_usd
    );
}
