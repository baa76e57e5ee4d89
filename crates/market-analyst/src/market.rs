//! Market classification and company-name lookup

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Exchange group a ticker trades on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    /// Shanghai, Shenzhen or Beijing A-shares
    ChinaA,
    /// Hong Kong
    HongKong,
    /// US listings
    Us,
    /// Not recognised
    Unknown,
}

impl Market {
    /// Classify a ticker by its shape
    ///
    /// - `600519`, `600519.SH`, `000001.SZ`, `430047.BJ` → China A
    /// - `0700.HK`, `00700`, `9988` → Hong Kong
    /// - `AAPL`, `BRK.B` → US
    pub fn classify(ticker: &str) -> Self {
        let ticker = ticker.trim().to_ascii_uppercase();
        let (code, suffix) = match ticker.split_once('.') {
            Some((code, suffix)) => (code, Some(suffix)),
            None => (ticker.as_str(), None),
        };
        let all_digits = !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit());

        match suffix {
            Some("SH" | "SZ" | "SS" | "BJ") if all_digits && code.len() == 6 => Self::ChinaA,
            Some("HK") if all_digits => Self::HongKong,
            None if all_digits && code.len() == 6 => Self::ChinaA,
            None if all_digits && (4..=5).contains(&code.len()) => Self::HongKong,
            _ if !code.is_empty() && code.bytes().all(|b| b.is_ascii_alphabetic()) => Self::Us,
            _ => Self::Unknown,
        }
    }

    /// Trading currency
    pub fn currency(self) -> &'static str {
        match self {
            Self::ChinaA => "人民币",
            Self::HongKong => "港币",
            Self::Us => "美元",
            Self::Unknown => "未知",
        }
    }
}

/// Market lookup result carried in the conversation state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketInfo {
    /// Exchange group
    pub market: Market,
    /// Company display name
    pub company_name: String,
}

impl MarketInfo {
    /// Classify `ticker` and resolve its name with `resolver`
    pub fn lookup(ticker: &str, resolver: &dyn CompanyNameResolver) -> Self {
        let market = Market::classify(ticker);
        let company_name = resolver.resolve(ticker, market);
        debug!(ticker, ?market, company_name = %company_name, "Resolved market info");
        Self {
            market,
            company_name,
        }
    }

    /// Market info with a known company name
    pub fn with_name(ticker: &str, company_name: impl Into<String>) -> Self {
        Self {
            market: Market::classify(ticker),
            company_name: company_name.into(),
        }
    }

    /// Trading currency
    pub fn currency(&self) -> &'static str {
        self.market.currency()
    }
}

/// Resolves a ticker to a company display name
///
/// Implementations backed by a data source live in the surrounding
/// application; they must always return some name, falling back to a
/// code-based label.
pub trait CompanyNameResolver: Send + Sync {
    /// Display name for `ticker`
    fn resolve(&self, ticker: &str, market: Market) -> String;
}

/// Table-driven resolver with code-based fallbacks
#[derive(Debug, Clone)]
pub struct StaticNameResolver {
    names: HashMap<String, String>,
}

impl Default for StaticNameResolver {
    fn default() -> Self {
        let us = [
            ("AAPL", "苹果公司"),
            ("TSLA", "特斯拉"),
            ("NVDA", "英伟达"),
            ("MSFT", "微软"),
            ("GOOGL", "谷歌"),
            ("AMZN", "亚马逊"),
            ("META", "Meta"),
            ("NFLX", "奈飞"),
        ];
        Self {
            names: us
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl StaticNameResolver {
    /// Resolver with the built-in US name table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a known name
    pub fn with_name(mut self, ticker: impl Into<String>, name: impl Into<String>) -> Self {
        self.names
            .insert(ticker.into().to_ascii_uppercase(), name.into());
        self
    }
}

impl CompanyNameResolver for StaticNameResolver {
    fn resolve(&self, ticker: &str, market: Market) -> String {
        let key = ticker.trim().to_ascii_uppercase();
        if let Some(name) = self.names.get(&key) {
            return name.clone();
        }

        match market {
            Market::ChinaA => format!("股票代码{ticker}"),
            Market::HongKong => {
                let code = key.strip_suffix(".HK").unwrap_or(&key);
                format!("港股{code}")
            }
            Market::Us => format!("美股{ticker}"),
            Market::Unknown => format!("股票{ticker}"),
        }
    }
}
