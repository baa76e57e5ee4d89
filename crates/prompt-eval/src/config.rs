//! Evaluator configuration

use crate::error::{EvalError, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Default cut-off for tool output fed back to the model, in chars
pub const DEFAULT_MAX_TOOL_OUTPUT_CHARS: usize = 5000;

/// Settings for one comparison run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Trade date written into every synthesized state
    pub trade_date: NaiveDate,

    /// Cases evaluated at once; 1 runs strictly sequentially
    pub concurrency: usize,

    /// Execute requested tool calls and invoke the analyst once more
    pub tool_follow_up: bool,

    /// Tool output cut-off, in chars
    pub max_tool_output_chars: usize,

    /// Holding period for backtest returns, in trading days
    pub hold_days: u32,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            trade_date: Local::now().date_naive(),
            concurrency: 1,
            tool_follow_up: true,
            max_tool_output_chars: DEFAULT_MAX_TOOL_OUTPUT_CHARS,
            hold_days: 5,
        }
    }
}

impl EvalConfig {
    /// Create a new configuration builder
    pub fn builder() -> EvalConfigBuilder {
        EvalConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(EvalError::InvalidConfiguration(
                "concurrency must be greater than 0".to_string(),
            ));
        }

        if self.max_tool_output_chars == 0 {
            return Err(EvalError::InvalidConfiguration(
                "max_tool_output_chars must be greater than 0".to_string(),
            ));
        }

        if self.hold_days == 0 {
            return Err(EvalError::InvalidConfiguration(
                "hold_days must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for EvalConfig
#[derive(Debug, Default)]
pub struct EvalConfigBuilder {
    trade_date: Option<NaiveDate>,
    concurrency: Option<usize>,
    tool_follow_up: Option<bool>,
    max_tool_output_chars: Option<usize>,
    hold_days: Option<u32>,
}

impl EvalConfigBuilder {
    /// Set the trade date
    pub fn trade_date(mut self, trade_date: NaiveDate) -> Self {
        self.trade_date = Some(trade_date);
        self
    }

    /// Set the number of cases run at once
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    /// Enable or disable the tool follow-up call
    pub fn tool_follow_up(mut self, enabled: bool) -> Self {
        self.tool_follow_up = Some(enabled);
        self
    }

    /// Set the tool output cut-off
    pub fn max_tool_output_chars(mut self, max_chars: usize) -> Self {
        self.max_tool_output_chars = Some(max_chars);
        self
    }

    /// Set the backtest holding period
    pub fn hold_days(mut self, hold_days: u32) -> Self {
        self.hold_days = Some(hold_days);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<EvalConfig> {
        let defaults = EvalConfig::default();

        let config = EvalConfig {
            trade_date: self.trade_date.unwrap_or(defaults.trade_date),
            concurrency: self.concurrency.unwrap_or(defaults.concurrency),
            tool_follow_up: self.tool_follow_up.unwrap_or(defaults.tool_follow_up),
            max_tool_output_chars: self
                .max_tool_output_chars
                .unwrap_or(defaults.max_tool_output_chars),
            hold_days: self.hold_days.unwrap_or(defaults.hold_days),
        };

        config.validate()?;
        Ok(config)
    }
}
