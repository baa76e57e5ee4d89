//! A/B comparison runner
//!
//! Each test case becomes a fresh [`ConversationState`]; the baseline analyst
//! runs first, then the optimized one. A failing run is recorded as a failed
//! [`MetricRecord`] and the comparison moves on.

use crate::backtest::ReturnSource;
use crate::cases::TestCase;
use crate::config::EvalConfig;
use crate::error::{EvalError, Result};
use crate::metrics::{MetricRecord, TokenCount, Variant};
use crate::report::ComparisonReport;
use crate::scoring::estimate_tokens;
use analyst_llm::{Message, TokenUsage};
use analyst_tools::Toolset;
use futures::stream::{self, StreamExt};
use market_analyst::{AnalysisMode, Analyst, ConversationState};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Report text and usage of one run, after the optional tool follow-up
struct RunOutput {
    report: String,
    mode: AnalysisMode,
    usage: TokenUsage,
}

/// Runs prompt variants over test cases and scores them
pub struct Evaluator {
    config: EvalConfig,
    toolset: Option<Toolset>,
    returns: Option<Arc<dyn ReturnSource>>,
}

impl Evaluator {
    /// Create an evaluator
    pub fn new(config: EvalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            toolset: None,
            returns: None,
        })
    }

    /// Tools used to answer tool calls in the follow-up invocation
    pub fn with_toolset(mut self, toolset: Toolset) -> Self {
        self.toolset = Some(toolset);
        self
    }

    /// Source of actual returns for backtest scoring
    pub fn with_return_source(mut self, source: Arc<dyn ReturnSource>) -> Self {
        self.returns = Some(source);
        self
    }

    /// Configuration
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Run both variants over `cases`
    ///
    /// Records come back in case order, baseline before optimized, whatever
    /// the concurrency.
    pub async fn run_comparison(
        &self,
        cases: &[TestCase],
        baseline: &dyn Analyst,
        optimized: &dyn Analyst,
    ) -> Result<ComparisonReport> {
        if cases.is_empty() {
            return Err(EvalError::InvalidConfiguration(
                "no test cases to evaluate".to_string(),
            ));
        }

        let total = cases.len();
        info!(
            cases = total,
            baseline = baseline.name(),
            optimized = optimized.name(),
            trade_date = %self.config.trade_date,
            concurrency = self.config.concurrency,
            "Starting A/B comparison"
        );

        let pairs: Vec<[MetricRecord; 2]> = stream::iter(cases.iter().enumerate())
            .map(|(index, case)| async move {
                info!(
                    case = index + 1,
                    total,
                    ticker = %case.ticker,
                    name = %case.name,
                    "Evaluating test case"
                );
                let b = self.evaluate(case, Variant::Baseline, baseline).await;
                let o = self.evaluate(case, Variant::Optimized, optimized).await;
                [b, o]
            })
            .buffered(self.config.concurrency)
            .collect()
            .await;

        let report = ComparisonReport::from_records(
            self.config.trade_date,
            baseline.name(),
            optimized.name(),
            pairs.into_iter().flatten().collect(),
        );

        info!(
            run_id = %report.run_id,
            baseline_failures = report.failures.baseline,
            optimized_failures = report.failures.optimized,
            "A/B comparison finished"
        );
        Ok(report)
    }

    /// Run one variant on one case and score it
    pub async fn evaluate(
        &self,
        case: &TestCase,
        variant: Variant,
        analyst: &dyn Analyst,
    ) -> MetricRecord {
        let trade_date = self.config.trade_date;
        let state = case.to_state(trade_date);

        let started = Instant::now();
        let outcome = self.run_analyst(analyst, &state).await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let record = match outcome {
            Ok(run) => {
                let tokens = if run.usage.is_empty() {
                    TokenCount {
                        input: estimate_tokens(&prompt_text(&state)),
                        output: estimate_tokens(&run.report),
                        estimated: true,
                    }
                } else {
                    TokenCount::reported(run.usage)
                };
                MetricRecord::scored(
                    case,
                    variant,
                    trade_date,
                    run.mode,
                    &run.report,
                    tokens,
                    latency_ms,
                )
            }
            Err(e) => {
                warn!(ticker = %case.ticker, %variant, error = %e, "Analyst run failed");
                MetricRecord::failed(case, variant, trade_date, &e, latency_ms)
            }
        };

        info!(
            ticker = %record.ticker,
            %variant,
            ok = record.is_ok(),
            latency_ms,
            completeness = record.completeness,
            format_compliance = record.format_compliance,
            input_tokens = record.tokens.input,
            output_tokens = record.tokens.output,
            "Run scored"
        );

        self.attach_return(record).await
    }

    async fn run_analyst(
        &self,
        analyst: &dyn Analyst,
        state: &ConversationState,
    ) -> market_analyst::Result<RunOutput> {
        let first = analyst.invoke(state).await?;
        let mut usage = first.usage();

        let follow_up_tools = self
            .toolset
            .as_ref()
            .filter(|_| self.config.tool_follow_up);
        let (Some(toolset), true) = (
            follow_up_tools,
            first.report().is_empty() && !first.tool_calls().is_empty(),
        ) else {
            return Ok(RunOutput {
                report: first.report().to_string(),
                mode: first.analysis_mode(),
                usage,
            });
        };

        debug!(
            ticker = %state.ticker,
            tool_calls = first.tool_calls().len(),
            "Executing requested tool calls"
        );
        let tool_messages = toolset
            .execute_calls(first.tool_calls(), self.config.max_tool_output_chars)
            .await;

        let mut follow_up = state.clone();
        first.append_to(&mut follow_up);
        follow_up.messages.extend(tool_messages);

        let second = analyst.invoke(&follow_up).await?;
        usage += second.usage();

        let report = if second.report().is_empty() {
            second
                .messages()
                .iter()
                .map(Message::text)
                .find(|text| !text.is_empty())
                .unwrap_or_default()
                .to_string()
        } else {
            second.report().to_string()
        };

        Ok(RunOutput {
            report,
            mode: second.analysis_mode(),
            usage,
        })
    }

    async fn attach_return(&self, record: MetricRecord) -> MetricRecord {
        let Some(source) = &self.returns else {
            return record;
        };
        if !record.is_ok() {
            return record;
        }

        match source
            .actual_return(&record.ticker, record.trade_date, self.config.hold_days)
            .await
        {
            Ok(actual) => record.with_actual_return(actual),
            Err(e) => {
                warn!(ticker = %record.ticker, error = %e, "Actual return unavailable");
                record
            }
        }
    }
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("config", &self.config)
            .field("toolset", &self.toolset)
            .field("has_return_source", &self.returns.is_some())
            .finish()
    }
}

/// Text the analyst was given, for token estimates
fn prompt_text(state: &ConversationState) -> String {
    state.messages.iter().map(Message::text).collect()
}

/// Compare two analysts with default settings
pub async fn run_comparison(
    cases: &[TestCase],
    baseline: &dyn Analyst,
    optimized: &dyn Analyst,
) -> Result<ComparisonReport> {
    Evaluator::new(EvalConfig::default())?
        .run_comparison(cases, baseline, optimized)
        .await
}
