//! Condition-based stock screener
//!
//! Shares the analyst plumbing (bound model, single system prompt) but has no
//! analysis subject: the user's conditions arrive as conversation messages.

use crate::config::AnalystConfig;
use crate::error::Result;
use crate::prompts::{PromptContext, SCREENING_CLOSING, STOCK_SCREENER, render_system_prompt};
use analyst_llm::{BoundModel, LanguageModel, Message, TokenUsage};
use analyst_tools::Toolset;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

/// Sender tag of screening results
pub const SCREENER_SENDER: &str = "ChinaStockScreener";

/// State key of the screening report
pub const SCREENING_REPORT_KEY: &str = "stock_screening_report";

/// Output of one screening run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreeningResult {
    messages: Vec<Message>,
    #[serde(rename = "stock_screening_report")]
    report: String,
    sender: &'static str,
    usage: TokenUsage,
}

impl ScreeningResult {
    fn new(message: Message, usage: TokenUsage) -> Self {
        let report = if message.has_tool_calls() {
            String::new()
        } else {
            message.text().to_string()
        };
        Self {
            messages: vec![message],
            report,
            sender: SCREENER_SENDER,
            usage,
        }
    }

    /// Produced messages
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Screening report, empty if the model requested tools
    pub fn report(&self) -> &str {
        &self.report
    }

    /// Sender tag
    pub fn sender(&self) -> &str {
        self.sender
    }

    /// Token usage
    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    /// Fields merged into the orchestration state
    pub fn state_update(&self) -> Value {
        json!({
            "messages": self.messages,
            SCREENING_REPORT_KEY: self.report,
            "sender": self.sender,
        })
    }
}

/// Screener bound to a model and toolset
#[derive(Debug, Clone)]
pub struct StockScreener {
    toolset: Toolset,
    model: BoundModel,
}

impl StockScreener {
    /// Build a screener
    pub fn new(
        model: Arc<dyn LanguageModel>,
        toolset: Toolset,
        config: &AnalystConfig,
    ) -> Result<Self> {
        config.validate()?;
        let model = BoundModel::new(model, toolset.definitions(), config.generation_settings());
        Ok(Self { toolset, model })
    }

    /// System prompt for `trade_date`
    pub fn system_prompt(&self, trade_date: NaiveDate) -> Result<String> {
        let tool_names = self.toolset.joined_names();
        render_system_prompt(
            STOCK_SCREENER,
            &PromptContext {
                trade_date,
                subject: None,
                tool_names: &tool_names,
            },
            SCREENING_CLOSING,
        )
    }

    /// Run one screening turn over `messages`
    pub async fn screen(
        &self,
        trade_date: NaiveDate,
        messages: &[Message],
    ) -> Result<ScreeningResult> {
        info!(%trade_date, message_count = messages.len(), "Running stock screening");

        let system = self.system_prompt(trade_date)?;
        let response = self.model.invoke(&system, messages).await?;
        let result = ScreeningResult::new(response.message, response.usage);

        info!(
            report_chars = result.report().chars().count(),
            output_tokens = result.usage().output_tokens,
            "Stock screening completed"
        );
        Ok(result)
    }
}

/// Screener with default model settings
pub fn create_stock_screener(
    model: Arc<dyn LanguageModel>,
    toolset: Toolset,
) -> Result<StockScreener> {
    StockScreener::new(model, toolset, &AnalystConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyst_llm::{CompletionResponse, MockLanguageModel};

    #[tokio::test]
    async fn test_screen_uses_screener_prompt() {
        let mut mock = MockLanguageModel::new();
        mock.expect_complete()
            .withf(|req| {
                let system = req.system.as_deref().unwrap_or_default();
                system.starts_with(STOCK_SCREENER)
                    && system.contains("当前日期: 2025-02-14")
                    && !system.contains("分析标的")
                    && system.ends_with("请用中文输出筛选结果。")
            })
            .times(1)
            .returning(|_| {
                Ok(CompletionResponse::text(
                    "1. 600519.SH 贵州茅台 匹配度 90%",
                    TokenUsage::new(1200, 80),
                ))
            });

        let screener = create_stock_screener(Arc::new(mock), Toolset::empty()).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 2, 14).unwrap();
        let result = screener
            .screen(date, &[Message::user("筛选 PE<30 且 ROE>15% 的白酒股")])
            .await
            .unwrap();

        assert_eq!(result.sender(), SCREENER_SENDER);
        assert!(result.report().contains("贵州茅台"));
        let update = result.state_update();
        assert_eq!(update[SCREENING_REPORT_KEY], result.report());
        assert!(update.get("analysis_mode").is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnalystConfig {
            max_tokens: 0,
            ..AnalystConfig::default()
        };
        let err = StockScreener::new(Arc::new(MockLanguageModel::new()), Toolset::empty(), &config)
            .unwrap_err();
        assert!(!err.is_service());
    }
}
