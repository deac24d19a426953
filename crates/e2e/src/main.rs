//! steplog - scenario runner entry point
//!
//! Runs YAML scenarios through the step engine and writes the report.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use steplog_core::EngineConfig;
use steplog_e2e::{RunnerConfig, ScenarioRunner, ScenarioSpec};

/// steplog - step buffering and report commit engine
#[derive(Parser)]
#[command(name = "steplog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenarios and write the report
    Run(RunArgs),

    /// Parse scenarios and list them without running
    Check {
        /// Path to scenario directory
        #[arg(short, long, default_value = "scenarios")]
        specs: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Path to scenario directory
    #[arg(short, long, default_value = "scenarios")]
    specs: PathBuf,

    /// Run only scenarios matching this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Run only a specific scenario by name
    #[arg(short, long)]
    name: Option<String>,

    /// Output directory for the report and results
    #[arg(short, long, default_value = "test-results")]
    output: PathBuf,

    /// Engine configuration file (TOML)
    #[arg(short, long, env = "STEPLOG_CONFIG")]
    config: Option<PathBuf>,

    /// Maximum number of scenarios running at once
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Report title
    #[arg(long, default_value = "steplog scenarios")]
    title: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let outcome = match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Check { specs } => check(&specs),
    };

    let code = match outcome {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };
    std::process::exit(code);
}

fn check(specs: &Path) -> anyhow::Result<bool> {
    let specs = ScenarioSpec::load_all(specs)?;
    for spec in &specs {
        let tags = if spec.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", spec.tags.join(", "))
        };
        println!("{} ({} op(s)){}", spec.name, spec.steps.len(), tags);
    }
    println!("{} scenario(s) OK", specs.len());
    Ok(true)
}

async fn run(args: RunArgs) -> anyhow::Result<bool> {
    let engine = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    let mut config = RunnerConfig {
        specs_dir: args.specs,
        output_dir: args.output,
        engine,
        report_title: args.title,
        ..Default::default()
    };
    if let Some(jobs) = args.jobs {
        config.jobs = jobs;
    }

    let runner = ScenarioRunner::with_config(config);
    let results = match (&args.name, &args.tag) {
        (Some(name), _) => runner.run_named(name).await?,
        (None, Some(tag)) => runner.run_tagged(tag).await?,
        (None, None) => runner.run_all().await?,
    };
    runner.write_results(&results)?;

    Ok(results.success())
}
