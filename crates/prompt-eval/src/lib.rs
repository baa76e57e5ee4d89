//! Offline A/B evaluation of market analyst prompt variants
//!
//! Runs a baseline and an optimized [`Analyst`](market_analyst::Analyst)
//! over a list of [`TestCase`]s and aggregates per-run [`MetricRecord`]s into
//! a [`ComparisonReport`]:
//!
//! - completeness and format compliance against the mode's shape contract
//! - input/output tokens (reported, or estimated at two chars per token)
//! - wall-clock latency
//! - data accuracy against reference values, when supplied
//! - extracted recommendation and, with a [`ReturnSource`], backtest returns
//!
//! Means are taken over successful runs only; failures are counted per
//! variant.

pub mod backtest;
pub mod cases;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod metrics;
pub mod report;
pub mod scoring;

pub use backtest::{BacktestSummary, ReturnSource, StaticReturns};
pub use cases::{TestCase, default_test_cases, filter_cases, parse_test_cases};
pub use config::{EvalConfig, EvalConfigBuilder};
pub use error::{EvalError, Result};
pub use evaluator::{Evaluator, run_comparison};
pub use metrics::{MetricRecord, RunStatus, TokenCount, Variant};
pub use report::{ComparisonReport, FailureCounts, MetricSummary};
pub use scoring::{Recommendation, data_accuracy, estimate_tokens, extract_recommendation};
