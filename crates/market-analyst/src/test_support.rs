//! Deterministic model stubs and sample reports for tests.
//!
//! `ScriptedModel` plays back fixed replies in order (repeating the last one)
//! and counts calls, so callers can assert how many completions were issued
//! without a network.

use analyst_llm::{
    CompletionRequest, CompletionResponse, LanguageModel, LlmError, Message, Result, TokenUsage,
    ToolCall,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// One scripted turn
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Assistant text with usage
    Text(String, TokenUsage),
    /// Assistant tool calls with usage
    ToolCalls(Vec<ToolCall>, TokenUsage),
    /// Service failure, surfaced as [`LlmError::RequestFailed`]
    Fail(String),
}

/// A language model that replays a script
#[derive(Debug)]
pub struct ScriptedModel {
    name: String,
    script: Vec<ScriptedReply>,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    /// Play `script` in order; the last reply repeats
    pub fn new(script: Vec<ScriptedReply>) -> Self {
        Self {
            name: "scripted".to_string(),
            script,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `text`
    pub fn replying(text: impl Into<String>, usage: TokenUsage) -> Self {
        Self::new(vec![ScriptedReply::Text(text.into(), usage)])
    }

    /// Always fail with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(vec![ScriptedReply::Fail(message.into())])
    }

    /// Set the model name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Completions issued so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        let Some(reply) = self.script.get(index).or_else(|| self.script.last()) else {
            return Err(LlmError::UnexpectedResponse("empty script".to_string()));
        };

        match reply {
            ScriptedReply::Text(text, usage) => Ok(CompletionResponse::text(text.clone(), *usage)),
            ScriptedReply::ToolCalls(calls, usage) => Ok(CompletionResponse {
                message: Message::assistant_tool_calls("", calls.clone()),
                stop_reason: analyst_llm::StopReason::ToolUse,
                usage: *usage,
            }),
            ScriptedReply::Fail(message) => Err(LlmError::RequestFailed(message.clone())),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A quick report that satisfies the quick shape contract
pub fn sample_quick_report(ticker: &str, company: &str) -> String {
    format!(
        "## {ticker} {company} 快速评估

**投资评级**: ⭐⭐⭐⭐☆ (4星)

**核心逻辑**: 行业龙头，盈利稳定，估值处于合理区间。

**关键数据**:
| 指标 | 数值 | 行业对比 |
|------|------|----------|
| PE(TTM) | 28.5 | 行业中位数32.1 |
| ROE | 24.3% | 行业中位数15.2% |

**主要风险**: 需求复苏不及预期。

**操作建议**: 中期持有，建议仓位15%"
    )
}

/// A deep report that satisfies the deep shape contract
pub fn sample_deep_report(ticker: &str, company: &str) -> String {
    format!(
        "# {ticker} {company} 深度分析报告

## 一、市场环境（7/10）
货币政策偏宽松，板块处于轮动中段，市场风险偏好中性。

## 二、公司基本面（8/10）
ROE连续三年高于20%，经营性现金流/净利润 1.1，商誉占比低。

## 三、技术面（6/10）
均线多头排列，近期缩量回调，支撑位在60日均线附近。

## 四、资金面（7/10）
北向资金小幅增持，融资余额平稳，未见大额大宗交易折价。

## 综合评分与建议
综合评分 7.2/10，建议买入。止损位设在前低下方5%，止盈位设在前高附近。

数据来源: 公开财报与行情数据"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_repeats_last_reply() {
        let model = ScriptedModel::new(vec![
            ScriptedReply::Fail("boom".to_string()),
            ScriptedReply::Text("ok".to_string(), TokenUsage::new(3, 1)),
        ]);
        let request = CompletionRequest::builder("m").build();

        assert!(model.complete(request.clone()).await.is_err());
        assert_eq!(model.complete(request.clone()).await.unwrap().message.text(), "ok");
        assert_eq!(model.complete(request).await.unwrap().message.text(), "ok");
        assert_eq!(model.call_count(), 3);
        assert_eq!(model.requests().len(), 3);
    }
}
