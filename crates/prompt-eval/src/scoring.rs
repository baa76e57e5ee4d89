//! Text scoring helpers: recommendation, data accuracy, token estimates

use analyst_utils::char_len;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Investment call extracted from a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    /// Go long
    Buy,
    /// No position
    #[default]
    Hold,
    /// Go short / avoid
    Sell,
}

impl Recommendation {
    /// Chinese label
    pub fn label(self) -> &'static str {
        match self {
            Self::Buy => "买入",
            Self::Hold => "持有",
            Self::Sell => "卖出",
        }
    }

    /// Return earned by following this call when the stock returned `actual`
    pub fn strategy_return(self, actual: f64) -> f64 {
        match self {
            Self::Buy => actual,
            Self::Sell => -actual,
            Self::Hold => 0.0,
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const STAR: char = '⭐';

/// Extract the call and a confidence in 0..=1
///
/// A star rating, when present, decides: 5 → buy 0.8, 4 → buy 0.6,
/// 3 → hold 0.5, 1–2 → sell 0.7. Otherwise keywords are tried in order:
/// 强烈推荐/买入 → buy 0.8, 卖出/回避 → sell 0.7, 推荐 → buy 0.6.
/// Anything else (中性, 观望, no call at all) is hold 0.5.
pub fn extract_recommendation(output: &str) -> (Recommendation, f64) {
    if let Some(stars) = star_rating(output) {
        return match stars {
            5.. => (Recommendation::Buy, 0.8),
            4 => (Recommendation::Buy, 0.6),
            3 => (Recommendation::Hold, 0.5),
            _ => (Recommendation::Sell, 0.7),
        };
    }

    let has = |words: &[&str]| words.iter().any(|w| output.contains(w));
    if has(&["强烈推荐", "买入"]) {
        (Recommendation::Buy, 0.8)
    } else if has(&["卖出", "回避"]) {
        (Recommendation::Sell, 0.7)
    } else if has(&["推荐"]) {
        (Recommendation::Buy, 0.6)
    } else {
        (Recommendation::Hold, 0.5)
    }
}

/// Filled stars on the first line that has any
fn star_rating(output: &str) -> Option<usize> {
    output
        .lines()
        .map(|line| line.chars().filter(|&c| c == STAR).count())
        .find(|&count| count > 0)
}

/// Share of reference values found in `output`
///
/// Each entry scores 1 when its value appears, 0.5 when only its key does.
/// `None` without references, so such runs stay out of the averages.
pub fn data_accuracy(output: &str, references: &BTreeMap<String, String>) -> Option<f64> {
    if references.is_empty() {
        return None;
    }

    let score: f64 = references
        .iter()
        .map(|(key, value)| {
            if output.contains(value.as_str()) {
                1.0
            } else if output.contains(key.as_str()) {
                0.5
            } else {
                0.0
            }
        })
        .sum();

    Some(score / references.len() as f64)
}

/// Rough token count for Chinese text, two chars per token
pub fn estimate_tokens(text: &str) -> usize {
    char_len(text) / 2
}
