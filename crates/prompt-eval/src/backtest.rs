//! Backtest scoring of extracted recommendations
//!
//! A [`ReturnSource`] supplies the stock's actual return over the holding
//! period after the trade date. Following a buy earns that return, a sell
//! earns its negation and a hold earns nothing.

use crate::error::{EvalError, Result};
use crate::metrics::{MetricRecord, Variant};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

/// Supplies actual holding-period returns, e.g. `0.05` for +5%
#[async_trait]
pub trait ReturnSource: Send + Sync {
    /// Return of `ticker` bought at the close of `trade_date` and held for
    /// `hold_days` trading days
    async fn actual_return(&self, ticker: &str, trade_date: NaiveDate, hold_days: u32)
    -> Result<f64>;
}

/// Fixed returns keyed by ticker
#[derive(Debug, Clone, Default)]
pub struct StaticReturns {
    returns: HashMap<String, f64>,
}

impl StaticReturns {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a ticker's return
    pub fn with_return(mut self, ticker: impl Into<String>, actual: f64) -> Self {
        self.returns.insert(ticker.into().to_ascii_uppercase(), actual);
        self
    }

    /// Parse a JSON object of ticker → return, e.g. `{"600519.SH": 0.05}`
    pub fn from_json(json: &str) -> Result<Self> {
        let returns: HashMap<String, f64> = serde_json::from_str(json)?;
        Ok(returns
            .into_iter()
            .fold(Self::new(), |table, (ticker, actual)| table.with_return(ticker, actual)))
    }

    /// Number of tickers with a return
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    /// Whether no return is recorded
    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }
}

#[async_trait]
impl ReturnSource for StaticReturns {
    async fn actual_return(
        &self,
        ticker: &str,
        _trade_date: NaiveDate,
        _hold_days: u32,
    ) -> Result<f64> {
        self.returns
            .get(&ticker.to_ascii_uppercase())
            .copied()
            .ok_or_else(|| EvalError::ReturnSource {
                ticker: ticker.to_string(),
                reason: "no return recorded".to_string(),
            })
    }
}

/// Strategy-return statistics of one variant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestSummary {
    pub variant: Variant,
    /// Records with a strategy return
    pub count: usize,
    pub mean_strategy_return: f64,
    /// Sample standard deviation, absent below two records
    pub std_strategy_return: Option<f64>,
    pub mean_actual_return: f64,
    /// Share of records with a positive strategy return
    pub win_rate: f64,
}

/// Summarize `variant`'s records that carry a strategy return
///
/// `None` when no record of the variant has one.
pub fn summarize(records: &[MetricRecord], variant: Variant) -> Option<BacktestSummary> {
    let pairs: Vec<(f64, f64)> = records
        .iter()
        .filter(|r| r.variant == variant)
        .filter_map(|r| Some((r.strategy_return?, r.actual_return?)))
        .collect();
    if pairs.is_empty() {
        return None;
    }

    let count = pairs.len();
    let n = count as f64;
    let mean = pairs.iter().map(|(s, _)| s).sum::<f64>() / n;
    let std = (count > 1).then(|| {
        let var = pairs.iter().map(|(s, _)| (s - mean).powi(2)).sum::<f64>() / (n - 1.0);
        var.sqrt()
    });
    let wins = pairs.iter().filter(|(s, _)| *s > 0.0).count();

    Some(BacktestSummary {
        variant,
        count,
        mean_strategy_return: mean,
        std_strategy_return: std,
        mean_actual_return: pairs.iter().map(|(_, a)| a).sum::<f64>() / n,
        win_rate: wins as f64 / n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cases::TestCase;
    use crate::metrics::TokenCount;
    use market_analyst::AnalysisMode;

    fn record(variant: Variant, report: &str, actual: Option<f64>) -> MetricRecord {
        let record = MetricRecord::scored(
            &TestCase::new("600519.SH", "贵州茅台", "白酒龙头"),
            variant,
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            AnalysisMode::Deep,
            report,
            TokenCount::default(),
            0,
        );
        match actual {
            Some(a) => record.with_actual_return(a),
            None => record,
        }
    }

    #[tokio::test]
    async fn test_static_returns() {
        let source = StaticReturns::new().with_return("600519.sh", 0.03);
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();

        let r = source.actual_return("600519.SH", date, 5).await.unwrap();
        assert!((r - 0.03).abs() < 1e-12);
        assert!(matches!(
            source.actual_return("000001.SZ", date, 5).await,
            Err(EvalError::ReturnSource { .. })
        ));
    }

    #[test]
    fn test_summarize() {
        let records = vec![
            record(Variant::Baseline, "建议买入", Some(0.04)),
            record(Variant::Baseline, "建议回避", Some(0.02)),
            record(Variant::Baseline, "观望", Some(-0.01)),
            record(Variant::Baseline, "建议买入", None),
            record(Variant::Optimized, "建议买入", Some(0.04)),
        ];

        let baseline = summarize(&records, Variant::Baseline).unwrap();
        assert_eq!(baseline.count, 3);
        // strategy returns: 0.04, -0.02, 0.0
        assert!((baseline.mean_strategy_return - 0.02 / 3.0).abs() < 1e-12);
        assert!((baseline.win_rate - 1.0 / 3.0).abs() < 1e-12);
        assert!((baseline.mean_actual_return - 0.05 / 3.0).abs() < 1e-12);
        assert!(baseline.std_strategy_return.unwrap() > 0.0);

        let optimized = summarize(&records, Variant::Optimized).unwrap();
        assert_eq!(optimized.count, 1);
        assert_eq!(optimized.std_strategy_return, None);
    }

    #[test]
    fn test_summarize_without_returns() {
        let records = vec![record(Variant::Baseline, "建议买入", None)];
        assert_eq!(summarize(&records, Variant::Baseline), None);
    }

    #[tokio::test]
    async fn test_returns_from_json() {
        let source = StaticReturns::from_json(r#"{"600519.sh": 0.05, "000001.SZ": -0.02}"#).unwrap();
        assert_eq!(source.len(), 2);

        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let r = source.actual_return("600519.SH", date, 5).await.unwrap();
        assert!((r - 0.05).abs() < 1e-12);

        let err = StaticReturns::from_json(r#"{"600519.SH": "5%"}"#).unwrap_err();
        assert!(matches!(err, EvalError::Serialization(_)));
    }
}
