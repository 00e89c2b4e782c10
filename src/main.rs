//! PAN validation harness binary.
//!
//! Run with: `pan-validation-harness --responses responses.yaml`
//!
//! Replays captured PAN validation responses against the smoke battery or
//! a regression suite and exits non-zero when any case fails.

use anyhow::{Context, Result};
use clap::Parser;
use pan_validation_harness::cases::today_request_date;
use pan_validation_harness::{Environment, Harness, HarnessConfig, Profile, ResponseSet, TestSuite};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Response validation harness for the SOAP PAN validation service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Captured responses (YAML): password response plus one entry per request
    #[arg(short, long)]
    responses: PathBuf,

    /// Test suite (YAML). Defaults to the built-in smoke battery
    #[arg(long)]
    cases: Option<PathBuf>,

    /// Suite rows to run, 1-based (2 | 2-5 | 1,3,5)
    #[arg(short = 'R', long)]
    rows: Option<String>,

    /// Run only this test case id (repeatable)
    #[arg(long = "case", value_name = "TEST_ID")]
    only: Vec<String>,

    /// Profile: smoke or regression
    #[arg(short, long, default_value = "smoke")]
    profile: Profile,

    /// Environment file (JSON), read before the run and written after it
    #[arg(short, long, default_value = "environment.json")]
    env: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = args.log_level.parse().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Starting PAN validation harness v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config: HarnessConfig = if args.config.exists() {
        let content = tokio::fs::read_to_string(&args.config)
            .await
            .context("Failed to read config file")?;
        serde_yaml::from_str(&content).context("Failed to parse config file")?
    } else {
        info!("Config file not found, using defaults");
        HarnessConfig::default()
    };

    info!(
        profile = ?args.profile,
        max_response_time_ms = config.max_response_time_ms(args.profile),
        app_status_field = config.checks.app_status_field,
        "Configuration loaded"
    );

    let suite = match &args.cases {
        Some(path) => {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read test suite {}", path.display()))?;
            TestSuite::from_yaml(&content)?
        }
        None => TestSuite::smoke(&today_request_date()),
    };
    let suite = match &args.rows {
        Some(rows) => suite.select_rows(rows)?,
        None => suite,
    };
    let suite = if args.only.is_empty() {
        suite
    } else {
        suite.select_cases(args.only.as_slice())?
    };
    info!(cases = suite.cases.len(), "Test suite loaded");

    let content = tokio::fs::read_to_string(&args.responses)
        .await
        .with_context(|| format!("Failed to read responses {}", args.responses.display()))?;
    let responses = ResponseSet::from_yaml(&content)?;

    let mut env = if args.env.exists() {
        let content = tokio::fs::read_to_string(&args.env)
            .await
            .context("Failed to read environment file")?;
        Environment::from_json(&content)?
    } else {
        Environment::new()
    };
    info!(entries = env.len(), "Environment loaded");

    let harness = Harness::new(config, args.profile);
    let report = harness
        .run(&suite, &responses, &mut env)
        .context("Password step failed, no test cases were run")?;

    tokio::fs::write(&args.env, env.to_json()?)
        .await
        .context("Failed to write environment file")?;

    if !report.passed() {
        warn!(
            failed = report.failed_cases(),
            missing = report.missing.len(),
            "Test run failed"
        );
        anyhow::bail!(
            "{} of {} test cases failed, {} without a captured response",
            report.failed_cases(),
            suite.cases.len(),
            report.missing.len()
        );
    }

    info!(passed = report.passed_cases(), "All test cases passed");
    Ok(())
}
