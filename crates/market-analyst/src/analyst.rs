//! Analyst factory and analysis results

use crate::config::AnalystConfig;
use crate::error::Result;
use crate::mode::AnalysisMode;
use crate::prompts::{PromptContext, PromptProfile};
use crate::state::ConversationState;
use analyst_llm::{BoundModel, LanguageModel, Message, TokenUsage, ToolCall};
use analyst_tools::Toolset;
use analyst_utils::preview;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info};

/// Sender tag written into the orchestration state
pub const ANALYST_SENDER: &str = "ChinaMarketAnalyst";

/// State key of the report
pub const REPORT_KEY: &str = "china_market_report";

/// Something that turns conversation state into one analysis result
///
/// [`MarketAnalyst`] is the production implementation; the evaluator accepts
/// any implementation so that prompt variants can be compared.
#[async_trait]
pub trait Analyst: Send + Sync {
    /// Produce exactly one result for `state`
    async fn invoke(&self, state: &ConversationState) -> Result<AnalysisResult>;

    /// Name used in logs and reports
    fn name(&self) -> &str;
}

/// One analyst invocation's output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    messages: Vec<Message>,
    #[serde(rename = "china_market_report")]
    report: String,
    sender: &'static str,
    analysis_mode: AnalysisMode,
    usage: TokenUsage,
}

impl AnalysisResult {
    /// Wrap a model reply
    ///
    /// The report is the reply text, or empty when the reply asks for tool
    /// calls; running those belongs to the caller.
    pub fn new(message: Message, analysis_mode: AnalysisMode, usage: TokenUsage) -> Self {
        let report = if message.has_tool_calls() {
            String::new()
        } else {
            message.text().to_string()
        };

        Self {
            messages: vec![message],
            report,
            sender: ANALYST_SENDER,
            analysis_mode,
            usage,
        }
    }

    /// Produced messages
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Report text, empty if the model requested tools
    pub fn report(&self) -> &str {
        &self.report
    }

    /// Sender tag
    pub fn sender(&self) -> &str {
        self.sender
    }

    /// Mode the analyst was built with
    pub fn analysis_mode(&self) -> AnalysisMode {
        self.analysis_mode
    }

    /// Token usage reported by the model
    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    /// Tool calls requested by the model
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.messages
            .first()
            .map_or(&[][..], |m| m.tool_calls.as_slice())
    }

    /// Fields merged into the orchestration state
    pub fn state_update(&self) -> Value {
        json!({
            "messages": self.messages,
            REPORT_KEY: self.report,
            "sender": self.sender,
            "analysis_mode": self.analysis_mode,
        })
    }

    /// Append the produced messages to `state`
    pub fn append_to(&self, state: &mut ConversationState) {
        state.messages.extend(self.messages.iter().cloned());
    }
}

/// Analyst with one resolved prompt profile and a bound model
#[derive(Debug, Clone)]
pub struct MarketAnalyst {
    profile: PromptProfile,
    toolset: Toolset,
    model: BoundModel,
}

impl MarketAnalyst {
    /// Build an analyst for `mode` with the built-in template
    pub fn new(
        model: Arc<dyn LanguageModel>,
        toolset: Toolset,
        mode: AnalysisMode,
        config: &AnalystConfig,
    ) -> Result<Self> {
        Self::with_profile(model, toolset, PromptProfile::for_mode(mode), config)
    }

    /// Build an analyst with an explicit prompt profile
    pub fn with_profile(
        model: Arc<dyn LanguageModel>,
        toolset: Toolset,
        profile: PromptProfile,
        config: &AnalystConfig,
    ) -> Result<Self> {
        config.validate()?;
        profile.validate()?;
        let model = BoundModel::new(model, toolset.definitions(), config.generation_settings());
        debug!(
            mode = %profile.mode(),
            tools = %toolset.joined_names(),
            "Analyst created"
        );

        Ok(Self {
            profile,
            toolset,
            model,
        })
    }

    /// Mode fixed at construction
    pub fn mode(&self) -> AnalysisMode {
        self.profile.mode()
    }

    /// Prompt profile
    pub fn profile(&self) -> &PromptProfile {
        &self.profile
    }

    /// Bound toolset
    pub fn toolset(&self) -> &Toolset {
        &self.toolset
    }

    /// System prompt for `state`
    pub fn system_prompt(&self, state: &ConversationState) -> Result<String> {
        let tool_names = self.toolset.joined_names();
        self.profile.render(&PromptContext {
            trade_date: state.trade_date,
            subject: Some((state.ticker.as_str(), state.company_name())),
            tool_names: &tool_names,
        })
    }
}

#[async_trait]
impl Analyst for MarketAnalyst {
    async fn invoke(&self, state: &ConversationState) -> Result<AnalysisResult> {
        let analyst_name = self.profile.analyst_name();
        info!(
            analyst = analyst_name,
            ticker = %state.ticker,
            company = %state.company_name(),
            mode = %self.mode(),
            "Running analysis"
        );

        let system = self.system_prompt(state)?;
        let response = self.model.invoke(&system, &state.messages).await?;
        let result = AnalysisResult::new(response.message, self.mode(), response.usage);

        info!(
            analyst = analyst_name,
            ticker = %state.ticker,
            report_chars = result.report().chars().count(),
            tool_calls = result.tool_calls().len(),
            input_tokens = result.usage().input_tokens,
            output_tokens = result.usage().output_tokens,
            "Analysis completed"
        );
        debug!(report_preview = %preview(result.report(), 200), "Report preview");

        Ok(result)
    }

    fn name(&self) -> &str {
        self.profile.analyst_name()
    }
}

/// Build an analyst from a mode name, with default model settings
///
/// Unknown mode names fail with
/// [`InvalidConfiguration`](crate::AnalystError::InvalidConfiguration)
/// before the model is touched.
pub fn create_analyst(
    model: Arc<dyn LanguageModel>,
    toolset: Toolset,
    mode: &str,
) -> Result<MarketAnalyst> {
    let mode: AnalysisMode = mode.parse()?;
    MarketAnalyst::new(model, toolset, mode, &AnalystConfig::default())
}

/// Quick screening analyst
pub fn create_quick_analyst(
    model: Arc<dyn LanguageModel>,
    toolset: Toolset,
    config: &AnalystConfig,
) -> Result<MarketAnalyst> {
    MarketAnalyst::new(model, toolset, AnalysisMode::Quick, config)
}

/// Deep analysis analyst
pub fn create_deep_analyst(
    model: Arc<dyn LanguageModel>,
    toolset: Toolset,
    config: &AnalystConfig,
) -> Result<MarketAnalyst> {
    MarketAnalyst::new(model, toolset, AnalysisMode::Deep, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AnalystError;
    use crate::market::MarketInfo;
    use crate::test_support::{ScriptedModel, sample_deep_report, sample_quick_report};
    use analyst_llm::{CompletionResponse, LlmError, MockLanguageModel, StopReason};
    use chrono::NaiveDate;
    use serde_json::json;

    fn state() -> ConversationState {
        ConversationState::new(
            "600519.SH",
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            MarketInfo::with_name("600519.SH", "贵州茅台"),
        )
        .with_analysis_request()
    }

    #[tokio::test]
    async fn test_invocation_is_deterministic_per_mode() {
        for mode in AnalysisMode::ALL {
            let reply = match mode {
                AnalysisMode::Quick => sample_quick_report("600519.SH", "贵州茅台"),
                AnalysisMode::Deep => sample_deep_report("600519.SH", "贵州茅台"),
            };
            let model = Arc::new(ScriptedModel::replying(reply, TokenUsage::new(900, 150)));
            let analyst =
                MarketAnalyst::new(model.clone(), Toolset::empty(), mode, &AnalystConfig::default())
                    .unwrap();

            let first = analyst.invoke(&state()).await.unwrap();
            let second = analyst.invoke(&state()).await.unwrap();

            assert_eq!(first, second);
            assert_eq!(first.analysis_mode(), mode);
            assert_eq!(first.state_update()["analysis_mode"], mode.as_str());
            assert_eq!(model.call_count(), 2);
        }
    }

    #[test]
    fn test_invalid_mode_never_calls_model() {
        let mut mock = MockLanguageModel::new();
        mock.expect_complete().times(0);

        let err = create_analyst(Arc::new(mock), Toolset::empty(), "medium").unwrap_err();
        assert!(matches!(err, AnalystError::InvalidConfiguration(_)));
    }

    #[tokio::test]
    async fn test_request_carries_single_system_prompt_and_history() {
        let mut mock = MockLanguageModel::new();
        mock.expect_complete()
            .withf(|req| {
                let system = req.system.as_deref().unwrap_or_default();
                system.contains("快速评估专家")
                    && system.matches("【输出格式】").count() == 1
                    && system.contains("分析标的: 600519.SH (贵州茅台)")
                    && req.messages.len() == 1
                    && req.messages[0].text() == "请分析股票 600519.SH"
            })
            .times(1)
            .returning(|_| Ok(CompletionResponse::text("ok", TokenUsage::new(1, 1))));

        let analyst = create_analyst(Arc::new(mock), Toolset::empty(), "quick").unwrap();
        let result = analyst.invoke(&state()).await.unwrap();
        assert_eq!(result.report(), "ok");
        assert_eq!(result.sender(), ANALYST_SENDER);
    }

    #[tokio::test]
    async fn test_custom_template_renders_subject() {
        let mut mock = MockLanguageModel::new();
        mock.expect_complete()
            .withf(|req| {
                let system = req.system.as_deref().unwrap_or_default();
                system.starts_with("只评估贵州茅台(600519.SH)")
                    && system.matches("分析标的").count() == 1
            })
            .times(1)
            .returning(|_| Ok(CompletionResponse::text("ok", TokenUsage::new(1, 1))));

        let profile =
            PromptProfile::custom(AnalysisMode::Quick, "只评估{{ company }}({{ ticker }})");
        let analyst = MarketAnalyst::with_profile(
            Arc::new(mock),
            Toolset::empty(),
            profile,
            &AnalystConfig::default(),
        )
        .unwrap();
        analyst.invoke(&state()).await.unwrap();
    }

    #[test]
    fn test_unparsable_template_never_calls_model() {
        let mut mock = MockLanguageModel::new();
        mock.expect_complete().times(0);

        let profile = PromptProfile::custom(AnalysisMode::Quick, "{{ ticker");
        let err = MarketAnalyst::with_profile(
            Arc::new(mock),
            Toolset::empty(),
            profile,
            &AnalystConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalystError::InvalidConfiguration(_)));
    }

    #[tokio::test]
    async fn test_service_error_propagates_without_retry() {
        let mut mock = MockLanguageModel::new();
        mock.expect_complete()
            .times(1)
            .returning(|_| Err(LlmError::RequestFailed("connection reset".to_string())));

        let analyst = create_analyst(Arc::new(mock), Toolset::empty(), "deep").unwrap();
        let err = analyst.invoke(&state()).await.unwrap_err();
        assert!(err.is_service());
    }

    #[tokio::test]
    async fn test_tool_call_reply_has_empty_report() {
        let mut mock = MockLanguageModel::new();
        mock.expect_complete().returning(|_| {
            Ok(CompletionResponse {
                message: Message::assistant_tool_calls(
                    "",
                    vec![ToolCall::new("c1", "get_china_stock_data", json!({"ticker": "600519"}))],
                ),
                stop_reason: StopReason::ToolUse,
                usage: TokenUsage::new(500, 20),
            })
        });

        let analyst = create_analyst(Arc::new(mock), Toolset::empty(), "quick").unwrap();
        let result = analyst.invoke(&state()).await.unwrap();
        assert!(result.report().is_empty());
        assert_eq!(result.tool_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_append_to_state_only_appends() {
        let model = Arc::new(ScriptedModel::replying("分析完成", TokenUsage::default()));
        let analyst = create_quick_analyst(model, Toolset::empty(), &AnalystConfig::default()).unwrap();

        let mut state = state();
        let before = state.clone();
        let result = analyst.invoke(&state).await.unwrap();
        result.append_to(&mut state);

        assert_eq!(state.messages.len(), before.messages.len() + 1);
        assert_eq!(state.messages[..1], before.messages[..]);
        assert_eq!(state.ticker, before.ticker);
        assert_eq!(state.messages[1].text(), "分析完成");
    }

    #[test]
    fn test_state_update_keys() {
        let result = AnalysisResult::new(
            Message::assistant("报告"),
            AnalysisMode::Deep,
            TokenUsage::default(),
        );
        let update = result.state_update();
        assert_eq!(update[REPORT_KEY], "报告");
        assert_eq!(update["sender"], "ChinaMarketAnalyst");
        assert_eq!(update["analysis_mode"], "deep");
        assert_eq!(update["messages"].as_array().map(Vec::len), Some(1));
    }
}
