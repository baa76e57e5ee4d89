//! Per-run metric records

use crate::cases::TestCase;
use crate::scoring::{Recommendation, data_accuracy, extract_recommendation};
use analyst_llm::TokenUsage;
use chrono::NaiveDate;
use market_analyst::{AnalysisMode, ShapeContract};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the comparison a run belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Current prompt
    Baseline,
    /// Candidate prompt
    Optimized,
}

impl Variant {
    /// Both variants, in run order
    pub const ALL: [Self; 2] = [Self::Baseline, Self::Optimized];

    /// Lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Optimized => "optimized",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one analyst run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunStatus {
    /// The analyst returned a result
    Ok,
    /// The analyst failed; the message is the error text
    Failed { error: String },
}

/// Token counts of a run and whether they were estimated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCount {
    /// Input tokens
    pub input: usize,
    /// Output tokens
    pub output: usize,
    /// Derived from text length because the model reported nothing
    pub estimated: bool,
}

impl TokenCount {
    /// Counts reported by the model
    pub fn reported(usage: TokenUsage) -> Self {
        Self {
            input: usage.input_tokens,
            output: usage.output_tokens,
            estimated: false,
        }
    }
}

/// Metrics of one (test case, variant) run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub ticker: String,
    pub name: String,
    pub variant: Variant,
    pub trade_date: NaiveDate,
    #[serde(flatten)]
    pub status: RunStatus,
    /// Mode of the result, absent for failed runs
    pub mode: Option<AnalysisMode>,
    /// Share of required fields present
    pub completeness: f64,
    /// All fields present and within the length bound
    pub format_compliance: bool,
    pub missing_fields: Vec<String>,
    /// Rendered report length in chars
    pub char_len: usize,
    pub tokens: TokenCount,
    pub latency_ms: u64,
    pub data_accuracy: Option<f64>,
    pub recommendation: Recommendation,
    pub confidence: f64,
    pub actual_return: Option<f64>,
    pub strategy_return: Option<f64>,
}

impl MetricRecord {
    /// Score a successful run's report
    pub fn scored(
        case: &TestCase,
        variant: Variant,
        trade_date: NaiveDate,
        mode: AnalysisMode,
        report: &str,
        tokens: TokenCount,
        latency_ms: u64,
    ) -> Self {
        let shape = ShapeContract::for_mode(mode).check(report);
        let (recommendation, confidence) = extract_recommendation(report);

        Self {
            ticker: case.ticker.clone(),
            name: case.name.clone(),
            variant,
            trade_date,
            status: RunStatus::Ok,
            mode: Some(mode),
            completeness: shape.completeness(),
            format_compliance: shape.is_compliant(),
            missing_fields: shape.missing.iter().map(ToString::to_string).collect(),
            char_len: shape.char_len,
            tokens,
            latency_ms,
            data_accuracy: data_accuracy(report, &case.reference_values),
            recommendation,
            confidence,
            actual_return: None,
            strategy_return: None,
        }
    }

    /// Record a failed run
    pub fn failed(
        case: &TestCase,
        variant: Variant,
        trade_date: NaiveDate,
        error: impl fmt::Display,
        latency_ms: u64,
    ) -> Self {
        Self {
            ticker: case.ticker.clone(),
            name: case.name.clone(),
            variant,
            trade_date,
            status: RunStatus::Failed {
                error: error.to_string(),
            },
            mode: None,
            completeness: 0.0,
            format_compliance: false,
            missing_fields: Vec::new(),
            char_len: 0,
            tokens: TokenCount::default(),
            latency_ms,
            data_accuracy: None,
            recommendation: Recommendation::Hold,
            confidence: 0.0,
            actual_return: None,
            strategy_return: None,
        }
    }

    /// Whether the run succeeded
    pub fn is_ok(&self) -> bool {
        self.status == RunStatus::Ok
    }

    /// Attach the stock's actual return over the holding period
    pub fn with_actual_return(mut self, actual: f64) -> Self {
        self.actual_return = Some(actual);
        self.strategy_return = Some(self.recommendation.strategy_return(actual));
        self
    }
}
