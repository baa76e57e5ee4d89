//! Prompt profiles and system-prompt rendering
//!
//! A [`PromptProfile`] is resolved once, when an analyst is built, and holds
//! the single template for its mode. Rendering appends a fixed context
//! footer; there is no other instruction layer.
//!
//! Templates are MiniJinja sources. The built-in ones are plain text, while
//! replacement templates may reference the same variables as the footer:
//! `{{ trade_date }}`, `{{ ticker }}`, `{{ company }}` and `{{ tool_names }}`.

mod templates;

pub use templates::{DEEP_ANALYSIS, QUICK_SCREENING, STOCK_SCREENER};

use crate::error::{AnalystError, Result};
use crate::mode::AnalysisMode;
use chrono::NaiveDate;
use minijinja::{Environment, context};
use std::borrow::Cow;

/// Closing line of analyst prompts
const ANALYSIS_CLOSING: &str = "请用中文输出分析结果。";
/// Closing line of the screener prompt
pub(crate) const SCREENING_CLOSING: &str = "请用中文输出筛选结果。";

const CONTEXT_FOOTER: &str = "\n\n---\n当前日期: {{ trade_date }}\n\
{% if ticker %}分析标的: {{ ticker }} ({{ company }})\n{% endif %}\
可用工具: {% if tool_names %}{{ tool_names }}{% else %}无{% endif %}\n\
---\n{{ closing }}";

/// The resolved instruction template of an analyst, tagged by mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptProfile {
    /// Quick screening template
    Quick(Cow<'static, str>),
    /// Deep analysis template
    Deep(Cow<'static, str>),
}

impl PromptProfile {
    /// Built-in template for `mode`
    pub fn for_mode(mode: AnalysisMode) -> Self {
        match mode {
            AnalysisMode::Quick => Self::Quick(Cow::Borrowed(QUICK_SCREENING)),
            AnalysisMode::Deep => Self::Deep(Cow::Borrowed(DEEP_ANALYSIS)),
        }
    }

    /// Replacement template for `mode`, e.g. a prompt variant under evaluation
    pub fn custom(mode: AnalysisMode, template: impl Into<Cow<'static, str>>) -> Self {
        match mode {
            AnalysisMode::Quick => Self::Quick(template.into()),
            AnalysisMode::Deep => Self::Deep(template.into()),
        }
    }

    /// Mode this profile belongs to
    pub fn mode(&self) -> AnalysisMode {
        match self {
            Self::Quick(_) => AnalysisMode::Quick,
            Self::Deep(_) => AnalysisMode::Deep,
        }
    }

    /// Template text
    pub fn template(&self) -> &str {
        match self {
            Self::Quick(t) | Self::Deep(t) => t,
        }
    }

    /// Display name used in logs
    pub fn analyst_name(&self) -> &'static str {
        match self {
            Self::Quick(_) => "中国市场快速评估师",
            Self::Deep(_) => "中国市场深度分析师",
        }
    }

    /// Reject templates MiniJinja cannot parse
    pub fn validate(&self) -> Result<()> {
        let env = Environment::new();
        env.template_from_str(self.template()).map_err(|e| {
            AnalystError::InvalidConfiguration(format!(
                "invalid {} prompt template: {e}",
                self.mode()
            ))
        })?;
        Ok(())
    }

    /// System prompt for one invocation
    pub fn render(&self, context: &PromptContext<'_>) -> Result<String> {
        render_system_prompt(self.template(), context, ANALYSIS_CLOSING)
    }
}

/// Per-invocation values shown in the prompt footer
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    /// Analysis date
    pub trade_date: NaiveDate,
    /// Ticker and company display name, absent for the screener
    pub subject: Option<(&'a str, &'a str)>,
    /// Comma-joined tool names
    pub tool_names: &'a str,
}

pub(crate) fn render_system_prompt(
    template: &str,
    context: &PromptContext<'_>,
    closing: &str,
) -> Result<String> {
    let source = format!("{template}{CONTEXT_FOOTER}");
    let (ticker, company) = context.subject.unzip();

    let env = Environment::new();
    let prompt = env.render_str(
        &source,
        context! {
            trade_date => context.trade_date.format("%Y-%m-%d").to_string(),
            ticker => ticker,
            company => company,
            tool_names => context.tool_names,
            closing => closing,
        },
    )?;
    Ok(prompt)
}
