//! Conversation state read by analysts

use crate::market::{CompanyNameResolver, MarketInfo};
use analyst_llm::Message;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The slice of orchestration state an analyst needs
///
/// Owned by the caller. Analysts only read it; results are merged back with
/// [`AnalysisResult::append_to`](crate::AnalysisResult::append_to).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Analysis date
    pub trade_date: NaiveDate,
    /// Ticker under analysis
    pub ticker: String,
    /// Market lookup result for `ticker`
    pub market_info: MarketInfo,
    /// Prior messages, oldest first
    pub messages: Vec<Message>,
}

impl ConversationState {
    /// State for `ticker` with a resolved company name and no messages
    pub fn new(ticker: impl Into<String>, trade_date: NaiveDate, market_info: MarketInfo) -> Self {
        Self {
            trade_date,
            ticker: ticker.into(),
            market_info,
            messages: Vec::new(),
        }
    }

    /// State for `ticker`, resolving market info with `resolver`
    pub fn lookup(
        ticker: impl Into<String>,
        trade_date: NaiveDate,
        resolver: &dyn CompanyNameResolver,
    ) -> Self {
        let ticker = ticker.into();
        let market_info = MarketInfo::lookup(&ticker, resolver);
        Self::new(ticker, trade_date, market_info)
    }

    /// Append a message
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Standard opening request, `请分析股票 {ticker}`
    pub fn with_analysis_request(self) -> Self {
        let request = format!("请分析股票 {}", self.ticker);
        self.with_message(Message::user(request))
    }

    /// Company display name
    pub fn company_name(&self) -> &str {
        &self.market_info.company_name
    }
}
