//! Prompt A/B evaluation CLI
//!
//! Runs a baseline and an optimized analyst over A-share test cases (the ten
//! built-in ones, or a JSON fixture with reference values) against an
//! OpenAI-compatible endpoint and prints the comparison. With a returns file
//! the extracted recommendations are backtested.
//!
//! # Usage
//!
//! ```bash
//! export OPENAI_API_BASE="https://dashscope.aliyuncs.com/compatible-mode/v1"
//! export OPENAI_API_KEY="sk-..."
//! export OPENAI_MODEL="qwen-plus"
//!
//! # deep (baseline) vs quick (optimized) on two tickers
//! cargo run --bin prompt-eval -p prompt-eval -- \
//!     --baseline-mode deep --optimized-mode quick \
//!     --ticker 600519.SH --ticker 300750.SZ --date 2025-01-10
//!
//! # same mode, candidate template loaded from a file
//! cargo run --bin prompt-eval -p prompt-eval -- \
//!     --baseline-mode quick --optimized-mode quick \
//!     --optimized-template prompts/quick_v2.md --format json
//!
//! # fixture cases with reference values, backtested against known returns
//! cargo run --bin prompt-eval -p prompt-eval -- \
//!     --cases fixtures/cases.json --returns fixtures/returns_2025-01-10.json
//! ```
//!
//! `cases.json` is an array of `{"ticker", "name", "category",
//! "reference_values"}` objects; `returns.json` maps tickers to holding-period
//! returns, e.g. `{"600519.SH": 0.05}`.

use analyst_llm::LanguageModel;
use analyst_llm::providers::{OpenAIConfig, OpenAIProvider};
use analyst_tools::Toolset;
use analyst_utils::{LogFormat, init_tracing_with};
use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use market_analyst::{AnalysisMode, AnalystConfig, MarketAnalyst, PromptProfile};
use prompt_eval::{
    EvalConfig, Evaluator, StaticReturns, TestCase, default_test_cases, filter_cases,
    parse_test_cases,
};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "prompt-eval", version, about = "A/B evaluation of market analyst prompts")]
struct Cli {
    /// Mode of the baseline analyst (quick or deep)
    #[arg(long, default_value = "deep")]
    baseline_mode: String,

    /// Mode of the optimized analyst (quick or deep)
    #[arg(long, default_value = "quick")]
    optimized_mode: String,

    /// Replace the baseline's built-in template with this file
    #[arg(long)]
    baseline_template: Option<PathBuf>,

    /// Replace the optimized analyst's built-in template with this file
    #[arg(long)]
    optimized_template: Option<PathBuf>,

    /// Model of the baseline analyst [default: $OPENAI_MODEL]
    #[arg(long)]
    baseline_model: Option<String>,

    /// Model of the optimized analyst [default: $OPENAI_MODEL]
    #[arg(long)]
    optimized_model: Option<String>,

    /// Trade date, YYYY-MM-DD [default: today]
    #[arg(long)]
    date: Option<NaiveDate>,

    /// JSON file of test cases [default: built-in cases]
    #[arg(long)]
    cases: Option<PathBuf>,

    /// JSON file of ticker → actual return, enables backtest scoring
    #[arg(long)]
    returns: Option<PathBuf>,

    /// Holding period of the backtest, in trading days
    #[arg(long, default_value_t = 5)]
    hold_days: u32,

    /// Only evaluate these tickers (repeatable)
    #[arg(long = "ticker")]
    tickers: Vec<String>,

    /// Test cases evaluated at once
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Report output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn get_provider_config() -> (OpenAIConfig, String) {
    let api_base = env::var("OPENAI_API_BASE").unwrap_or_else(|_| {
        eprintln!("Warning: OPENAI_API_BASE not set, using http://localhost:1234/v1");
        "http://localhost:1234/v1".to_string()
    });

    let model = env::var("OPENAI_MODEL").unwrap_or_else(|_| {
        let fallback = AnalystConfig::default().model;
        eprintln!("Warning: OPENAI_MODEL not set, using {fallback}");
        fallback
    });

    let api_key = env::var("OPENAI_API_KEY").unwrap_or_else(|_| "not-needed".to_string());

    let config = OpenAIConfig::new(api_key)
        .with_api_base(api_base)
        .with_timeout(180);

    (config, model)
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn load_cases(path: Option<&Path>) -> anyhow::Result<Vec<TestCase>> {
    match path {
        Some(path) => parse_test_cases(&read_file(path)?)
            .with_context(|| format!("parsing test cases {}", path.display())),
        None => Ok(default_test_cases()),
    }
}

fn build_analyst(
    provider: Arc<dyn LanguageModel>,
    mode: &str,
    template: Option<&PathBuf>,
    model: String,
) -> anyhow::Result<MarketAnalyst> {
    let mode: AnalysisMode = mode.parse()?;
    let profile = match template {
        Some(path) => {
            PromptProfile::custom(mode, read_file(path)?)
        }
        None => PromptProfile::for_mode(mode),
    };
    let config = AnalystConfig::builder().model(model).build()?;

    Ok(MarketAnalyst::with_profile(
        provider,
        Toolset::empty(),
        profile,
        &config,
    )?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing_with(log_format, "warn,prompt_eval=info,market_analyst=info");

    let (openai_config, default_model) = get_provider_config();
    eprintln!("Configuration:");
    eprintln!("  API Base: {}", openai_config.api_base);
    eprintln!("  Model: {default_model}");

    let provider: Arc<dyn LanguageModel> = Arc::new(OpenAIProvider::with_config(openai_config)?);

    let baseline = build_analyst(
        provider.clone(),
        &cli.baseline_mode,
        cli.baseline_template.as_ref(),
        cli.baseline_model.unwrap_or_else(|| default_model.clone()),
    )
    .context("building baseline analyst")?;
    let optimized = build_analyst(
        provider,
        &cli.optimized_mode,
        cli.optimized_template.as_ref(),
        cli.optimized_model.unwrap_or(default_model),
    )
    .context("building optimized analyst")?;

    let mut config = EvalConfig::builder()
        .concurrency(cli.concurrency)
        .hold_days(cli.hold_days);
    if let Some(date) = cli.date {
        config = config.trade_date(date);
    }
    let mut evaluator = Evaluator::new(config.build()?)?;

    if let Some(path) = &cli.returns {
        let returns = StaticReturns::from_json(&read_file(path)?)
            .with_context(|| format!("parsing returns {}", path.display()))?;
        eprintln!("  Backtest: {} returns from {}", returns.len(), path.display());
        evaluator = evaluator.with_return_source(Arc::new(returns));
    }

    let cases = filter_cases(load_cases(cli.cases.as_deref())?, &cli.tickers);
    if cases.is_empty() {
        anyhow::bail!("no test case matches {:?}", cli.tickers);
    }

    let report = evaluator
        .run_comparison(&cases, &baseline, &optimized)
        .await?;

    match cli.format {
        OutputFormat::Table => println!("{}", report.render_table()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    Ok(())
}
