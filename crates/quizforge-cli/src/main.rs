//! quizforge CLI: generate tests with an LLM, then take and grade them.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "quizforge",
    version,
    about = "LLM test generator and interactive quiz runner"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate test documents with an LLM
    Generate {
        /// Path to a .toml test plan or a directory of plans
        #[arg(long, conflicts_with = "topic")]
        plan: Option<PathBuf>,

        /// Topic for a single test
        #[arg(long, required_unless_present = "plan")]
        topic: Option<String>,

        /// Title for a single test (defaults to the topic)
        #[arg(long)]
        title: Option<String>,

        /// Number of questions
        #[arg(long, default_value = "10")]
        count: u32,

        /// Question mix: multiple-choice, essay, mixed
        #[arg(long, default_value = "multiple-choice")]
        mix: String,

        /// Difficulty: easy, medium, hard
        #[arg(long, default_value = "medium")]
        difficulty: String,

        /// Extra instructions appended to the prompt
        #[arg(long)]
        instructions: Option<String>,

        /// Time limit in minutes for the interactive test
        #[arg(long)]
        time_limit: Option<u32>,

        /// Allow learners to retake the test
        #[arg(long)]
        allow_retry: bool,

        /// Provider name from the config (defaults to default_provider)
        #[arg(long)]
        provider: Option<String>,

        /// Model id (defaults to default_model)
        #[arg(long)]
        model: Option<String>,

        /// Max concurrent generations
        #[arg(long)]
        parallelism: Option<usize>,

        /// Generation temperature
        #[arg(long)]
        temperature: Option<f64>,

        /// Output directory
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate test plan TOML files
    Validate {
        /// Path to a plan file or directory
        #[arg(long)]
        plan: PathBuf,
    },

    /// Parse raw test content and print the questions
    Parse {
        /// Raw content file or document JSON
        input: PathBuf,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Take a test interactively
    Take {
        /// Document JSON file
        document: PathBuf,

        /// Directory for submission records
        #[arg(long)]
        results: Option<PathBuf>,

        /// Override the document's time limit (minutes, 0 = untimed)
        #[arg(long)]
        time_limit: Option<u32>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Grade a set of answers against a document
    Grade {
        /// Document JSON file
        #[arg(long)]
        document: PathBuf,

        /// Answers JSON: an object mapping question index to answer
        #[arg(long)]
        answers: PathBuf,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Download a document from the document API
    Fetch {
        /// Document id
        id: String,

        /// Output file (defaults to <output_dir>/<id>.json)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Document API base URL (overrides document_api)
        #[arg(long)]
        api: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List available models
    ListModels {
        /// Filter to specific provider
        #[arg(long)]
        provider: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example test plan
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("quizforge=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            plan,
            topic,
            title,
            count,
            mix,
            difficulty,
            instructions,
            time_limit,
            allow_retry,
            provider,
            model,
            parallelism,
            temperature,
            output,
            config,
        } => {
            let source = match (plan, topic) {
                (Some(plan), _) => commands::generate::Source::Plan(plan),
                (None, Some(topic)) => commands::generate::Source::Single {
                    topic,
                    title,
                    count,
                    mix,
                    difficulty,
                    instructions,
                    time_limit,
                    allow_retry,
                },
                (None, None) => {
                    eprintln!("Error: either --plan or --topic is required");
                    process::exit(2);
                }
            };
            commands::generate::execute(commands::generate::Options {
                source,
                provider,
                model,
                parallelism,
                temperature,
                output,
                config,
            })
            .await
        }
        Commands::Validate { plan } => commands::validate::execute(plan),
        Commands::Parse { input, format } => commands::parse::execute(input, format),
        Commands::Take {
            document,
            results,
            time_limit,
            config,
        } => commands::take::execute(document, results, time_limit, config).await,
        Commands::Grade {
            document,
            answers,
            format,
        } => commands::grade::execute(document, answers, format),
        Commands::Fetch {
            id,
            output,
            api,
            config,
        } => commands::fetch::execute(id, output, api, config).await,
        Commands::ListModels { provider, config } => {
            commands::list_models::execute(provider, config)
        }
        Commands::Init => commands::init::execute(),
    };

    // Exit explicitly: a pending stdin read from `take` would otherwise hold
    // the runtime open until the next newline.
    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}
