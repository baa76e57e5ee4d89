//! Analysis mode selector

use crate::error::AnalystError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which instruction template and output-shape contract an analyst uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Short screening verdict for the stock screener page
    #[default]
    Quick,
    /// Full sectioned report
    Deep,
}

impl AnalysisMode {
    /// All modes
    pub const ALL: [Self; 2] = [Self::Quick, Self::Deep];

    /// Lowercase name, as stored in `analysis_mode`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Deep => "deep",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisMode {
    type Err = AnalystError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick" => Ok(Self::Quick),
            "deep" => Ok(Self::Deep),
            other => Err(AnalystError::InvalidConfiguration(format!(
                "unknown analysis mode '{other}', expected 'quick' or 'deep'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modes() {
        assert_eq!("quick".parse::<AnalysisMode>().unwrap(), AnalysisMode::Quick);
        assert_eq!(" Deep ".parse::<AnalysisMode>().unwrap(), AnalysisMode::Deep);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        for bad in ["", "fast", "screener", "quick-ish"] {
            let err = bad.parse::<AnalysisMode>().unwrap_err();
            assert!(matches!(err, AnalystError::InvalidConfiguration(_)), "{bad}");
        }
    }

    #[test]
    fn test_display_and_serde_agree() {
        for mode in AnalysisMode::ALL {
            let json = serde_json::to_value(mode).unwrap();
            assert_eq!(json, mode.to_string());
        }
    }
}
