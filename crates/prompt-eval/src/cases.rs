//! Evaluation test cases

use crate::error::Result;
use chrono::NaiveDate;
use market_analyst::{ConversationState, MarketInfo};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One stock to run both prompt variants on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Ticker, e.g. `600519.SH`
    pub ticker: String,
    /// Company display name
    pub name: String,
    /// Free-form category label
    #[serde(default)]
    pub category: String,
    /// Known metric values for data-accuracy scoring, e.g. `PE` → `28.5`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub reference_values: BTreeMap<String, String>,
}

impl TestCase {
    /// Create a test case
    pub fn new(
        ticker: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            name: name.into(),
            category: category.into(),
            reference_values: BTreeMap::new(),
        }
    }

    /// Add a reference value
    pub fn with_reference(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.reference_values.insert(key.into(), value.to_string());
        self
    }

    /// Input state: the case's ticker and name plus `请分析股票 {ticker}`
    pub fn to_state(&self, trade_date: NaiveDate) -> ConversationState {
        ConversationState::new(
            self.ticker.clone(),
            trade_date,
            MarketInfo::with_name(&self.ticker, self.name.clone()),
        )
        .with_analysis_request()
    }
}

/// Ten A-share names across large caps, growth, cyclicals and financials
pub fn default_test_cases() -> Vec<TestCase> {
    [
        ("600519.SH", "贵州茅台", "白酒龙头"),
        ("601318.SH", "中国平安", "保险龙头"),
        ("000858.SZ", "五粮液", "白酒"),
        ("300750.SZ", "宁德时代", "新能源"),
        ("002415.SZ", "海康威视", "安防"),
        ("601899.SH", "紫金矿业", "有色金属"),
        ("600028.SH", "中国石化", "石油"),
        ("300059.SZ", "东方财富", "券商互联网"),
        ("002594.SZ", "比亚迪", "新能源汽车"),
        ("000001.SZ", "平安银行", "银行"),
    ]
    .into_iter()
    .map(|(ticker, name, category)| TestCase::new(ticker, name, category))
    .collect()
}

/// Parse a JSON array of test cases, e.g. a fixture file with reference values
///
/// `category` and `reference_values` may be omitted.
pub fn parse_test_cases(json: &str) -> Result<Vec<TestCase>> {
    Ok(serde_json::from_str(json)?)
}

/// Keep only cases whose ticker is in `tickers`, matching case-insensitively
///
/// An empty filter keeps everything.
pub fn filter_cases(cases: Vec<TestCase>, tickers: &[String]) -> Vec<TestCase> {
    if tickers.is_empty() {
        return cases;
    }
    cases
        .into_iter()
        .filter(|case| tickers.iter().any(|t| t.eq_ignore_ascii_case(&case.ticker)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_analyst::Market;

    #[test]
    fn test_default_cases() {
        let cases = default_test_cases();
        assert_eq!(cases.len(), 10);
        assert_eq!(cases[0].ticker, "600519.SH");
        assert_eq!(cases[0].name, "贵州茅台");
        assert!(cases.iter().all(|c| Market::classify(&c.ticker) == Market::ChinaA));
    }

    #[test]
    fn test_to_state() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let state = default_test_cases()[3].to_state(date);

        assert_eq!(state.ticker, "300750.SZ");
        assert_eq!(state.company_name(), "宁德时代");
        assert_eq!(state.trade_date, date);
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].text(), "请分析股票 300750.SZ");
    }

    #[test]
    fn test_filter_cases() {
        let kept = filter_cases(
            default_test_cases(),
            &["600519.sh".to_string(), "002594.SZ".to_string()],
        );
        let tickers: Vec<_> = kept.iter().map(|c| c.ticker.as_str()).collect();
        assert_eq!(tickers, ["600519.SH", "002594.SZ"]);

        assert_eq!(filter_cases(default_test_cases(), &[]).len(), 10);
    }

    #[test]
    fn test_reference_values() {
        let case = TestCase::new("600519.SH", "贵州茅台", "白酒龙头")
            .with_reference("PE", 28.5)
            .with_reference("ROE", "31.2%");
        assert_eq!(case.reference_values["PE"], "28.5");
        assert_eq!(case.reference_values.len(), 2);
    }

    #[test]
    fn test_parse_cases_with_references() {
        let json = r#"[
            {"ticker": "600519.SH", "name": "贵州茅台", "category": "白酒龙头",
             "reference_values": {"PE": "28.5", "ROE": "31.2%"}},
            {"ticker": "000001.SZ", "name": "平安银行"}
        ]"#;

        let cases = parse_test_cases(json).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].reference_values["PE"], "28.5");
        assert_eq!(
            cases[0],
            TestCase::new("600519.SH", "贵州茅台", "白酒龙头")
                .with_reference("PE", 28.5)
                .with_reference("ROE", "31.2%")
        );
        assert!(cases[1].category.is_empty());
        assert!(cases[1].reference_values.is_empty());
    }

    #[test]
    fn test_parse_cases_rejects_missing_ticker() {
        let err = parse_test_cases(r#"[{"name": "贵州茅台"}]"#).unwrap_err();
        assert!(matches!(err, crate::EvalError::Serialization(_)));
    }
}
