//! Output-shape contract per analysis mode
//!
//! The analyst does not enforce these; the evaluator (or any caller that
//! wants to reject non-conforming output) runs [`ShapeContract::check`].
//! Checks are structural: a field is present when its label appears, and the
//! key-metric table must be a markdown table with at least one data row.
//! Nothing here judges whether the content is right.

use crate::mode::AnalysisMode;
use analyst_utils::char_len;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Length bound for quick output, in chars of rendered content
pub const QUICK_MAX_CHARS: usize = 300;

static TABLE_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\|?\s*:?-{3,}:?\s*(\|\s*:?-{3,}:?\s*)*\|?$")
        .expect("table separator pattern is valid")
});

/// How a required field is detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCheck {
    /// Any of the labels appears
    AnyLabel(&'static [&'static str]),
    /// Every label appears
    AllLabels(&'static [&'static str]),
    /// Label followed by a markdown table with at least `min_rows` data rows
    Table {
        label: &'static str,
        min_rows: usize,
    },
}

/// A field the output of a mode must contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredField {
    /// Stable field name, used in metric records
    pub name: &'static str,
    /// Detection rule
    pub check: FieldCheck,
}

impl RequiredField {
    /// Whether `output` contains this field
    pub fn is_present(&self, output: &str) -> bool {
        match self.check {
            FieldCheck::AnyLabel(labels) => labels.iter().any(|l| output.contains(l)),
            FieldCheck::AllLabels(labels) => labels.iter().all(|l| output.contains(l)),
            FieldCheck::Table { label, min_rows } => table_rows_after(output, label) >= min_rows,
        }
    }
}

const QUICK_FIELDS: &[RequiredField] = &[
    RequiredField {
        name: "rating",
        check: FieldCheck::AnyLabel(&["投资评级"]),
    },
    RequiredField {
        name: "thesis",
        check: FieldCheck::AnyLabel(&["核心逻辑"]),
    },
    RequiredField {
        name: "key_metrics",
        check: FieldCheck::Table {
            label: "关键数据",
            min_rows: 1,
        },
    },
    RequiredField {
        name: "risk",
        check: FieldCheck::AnyLabel(&["主要风险", "风险提示"]),
    },
    RequiredField {
        name: "action",
        check: FieldCheck::AnyLabel(&["操作建议"]),
    },
];

const DEEP_FIELDS: &[RequiredField] = &[
    RequiredField {
        name: "market_context",
        check: FieldCheck::AnyLabel(&["市场环境"]),
    },
    RequiredField {
        name: "fundamentals",
        check: FieldCheck::AnyLabel(&["基本面"]),
    },
    RequiredField {
        name: "technicals",
        check: FieldCheck::AnyLabel(&["技术面"]),
    },
    RequiredField {
        name: "capital_flow",
        check: FieldCheck::AnyLabel(&["资金面"]),
    },
    RequiredField {
        name: "exit_levels",
        check: FieldCheck::AllLabels(&["止损", "止盈"]),
    },
];

/// Required fields and length bound of one mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeContract {
    mode: AnalysisMode,
    fields: &'static [RequiredField],
    max_chars: Option<usize>,
}

impl ShapeContract {
    /// Contract of `mode`
    pub fn for_mode(mode: AnalysisMode) -> Self {
        match mode {
            AnalysisMode::Quick => Self {
                mode,
                fields: QUICK_FIELDS,
                max_chars: Some(QUICK_MAX_CHARS),
            },
            AnalysisMode::Deep => Self {
                mode,
                fields: DEEP_FIELDS,
                max_chars: None,
            },
        }
    }

    /// Override the length bound
    pub fn with_max_chars(mut self, max_chars: Option<usize>) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Mode of this contract
    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    /// Required fields
    pub fn fields(&self) -> &'static [RequiredField] {
        self.fields
    }

    /// Length bound in chars, if any
    pub fn max_chars(&self) -> Option<usize> {
        self.max_chars
    }

    /// Check `output` against the contract
    pub fn check(&self, output: &str) -> ShapeReport {
        let rendered = output.trim();
        let (present, missing): (Vec<&RequiredField>, Vec<&RequiredField>) =
            self.fields.iter().partition(|f| f.is_present(rendered));

        ShapeReport {
            mode: self.mode,
            present: present.into_iter().map(|f| f.name).collect(),
            missing: missing.into_iter().map(|f| f.name).collect(),
            char_len: char_len(rendered),
            max_chars: self.max_chars,
        }
    }
}

/// Result of a shape check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapeReport {
    /// Mode checked against
    pub mode: AnalysisMode,
    /// Fields found
    pub present: Vec<&'static str>,
    /// Fields not found
    pub missing: Vec<&'static str>,
    /// Rendered length in chars
    pub char_len: usize,
    /// Bound applied, if any
    pub max_chars: Option<usize>,
}

impl ShapeReport {
    /// Share of required fields present, 0.0..=1.0
    pub fn completeness(&self) -> f64 {
        let total = self.present.len() + self.missing.len();
        if total == 0 {
            return 1.0;
        }
        self.present.len() as f64 / total as f64
    }

    /// Whether the output fits the length bound
    pub fn within_length_bound(&self) -> bool {
        self.max_chars.is_none_or(|max| self.char_len <= max)
    }

    /// All fields present and within the bound
    pub fn is_compliant(&self) -> bool {
        self.missing.is_empty() && self.within_length_bound()
    }
}

/// Data rows of the markdown table that follows `label`, 0 if none
fn table_rows_after(output: &str, label: &str) -> usize {
    let Some(pos) = output.find(label) else {
        return 0;
    };

    // Skip the remainder of the label's own line
    let mut lines = output[pos + label.len()..]
        .lines()
        .skip(1)
        .map(str::trim)
        .skip_while(|line| line.is_empty());

    let header_ok = lines.next().is_some_and(is_table_row);
    let separator_ok = lines
        .next()
        .is_some_and(|line| TABLE_SEPARATOR.is_match(line));
    if !header_ok || !separator_ok {
        return 0;
    }

    lines.take_while(|line| is_table_row(line)).count()
}

/// A table row, with or without outer pipes
fn is_table_row(line: &str) -> bool {
    line.contains('|')
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUICK_OK: &str = "## 600519.SH 贵州茅台 快速评估

**投资评级**: ⭐⭐⭐⭐☆ (4星)

**核心逻辑**: 高端白酒龙头，提价能力强，现金流充沛。

**关键数据**:
| 指标 | 数值 | 行业对比 |
|------|------|----------|
| PE(TTM) | 28.5 | 行业中位数32.1 |
| ROE | 31.2% | 行业中位数18.5% |

**主要风险**: 消费复苏不及预期。

**操作建议**: 中期持有，建议仓位20%";

    #[test]
    fn test_quick_output_compliant() {
        let report = ShapeContract::for_mode(AnalysisMode::Quick).check(QUICK_OK);
        assert!(report.missing.is_empty(), "{:?}", report.missing);
        assert!((report.completeness() - 1.0).abs() < f64::EPSILON);
        assert!(report.within_length_bound());
        assert!(report.is_compliant());
    }

    #[test]
    fn test_quick_output_over_length_is_not_compliant() {
        let long = format!("{QUICK_OK}\n\n{}", "补充说明。".repeat(60));
        let report = ShapeContract::for_mode(AnalysisMode::Quick).check(&long);
        assert!(report.missing.is_empty());
        assert!(!report.within_length_bound());
        assert!(!report.is_compliant());
    }

    #[test]
    fn test_table_label_without_table() {
        let text = "**投资评级**: 3星\n**核心逻辑**: 估值合理\n**关键数据**: PE 20, ROE 15%\n**主要风险**: 无\n**操作建议**: 观望";
        let report = ShapeContract::for_mode(AnalysisMode::Quick).check(text);
        assert_eq!(report.missing, vec!["key_metrics"]);
        assert!((report.completeness() - 0.8).abs() < 1e-9);
        assert!(!report.is_compliant());
    }

    #[test]
    fn test_table_with_header_only() {
        let text = "**关键数据**:\n| 指标 | 数值 |\n|---|---|\n\n后续文字";
        assert_eq!(table_rows_after(text, "关键数据"), 0);

        let text = "**关键数据**:\n\n| 指标 | 数值 |\n| :--- | ---: |\n| PE | 20 |\n| ROE | 15% |";
        assert_eq!(table_rows_after(text, "关键数据"), 2);
    }

    #[test]
    fn test_table_without_outer_pipes() {
        let text = "**关键数据**:\n指标 | 数值\n--- | ---\nPE | 28.5\nROE | 31.2%\n";
        assert_eq!(table_rows_after(text, "关键数据"), 2);

        let text = "**关键数据**:\n指标 | 数值\n:--- | ---:\nPE | 28.5\n\n**主要风险**: 无";
        assert_eq!(table_rows_after(text, "关键数据"), 1);
    }

    #[test]
    fn test_separator_needs_dashes() {
        let text = "**关键数据**:\n指标 | 数值\n| | |\nPE | 28.5";
        assert_eq!(table_rows_after(text, "关键数据"), 0);
    }

    #[test]
    fn test_risk_mentioned_in_passing_is_not_a_risk_field() {
        let text = "**投资评级**: ⭐⭐⭐⭐☆ (4星)\n\n**核心逻辑**: 龙头地位稳固，风险可控。\n\n**关键数据**:\n| 指标 | 数值 |\n|---|---|\n| PE | 28.5 |\n\n**操作建议**: 逢低布局";
        let report = ShapeContract::for_mode(AnalysisMode::Quick).check(text);
        assert_eq!(report.missing, vec!["risk"]);
        assert!(!report.is_compliant());

        let text = text.replace("**操作建议**", "**风险提示**: 估值偏高\n\n**操作建议**");
        let report = ShapeContract::for_mode(AnalysisMode::Quick).check(&text);
        assert!(report.is_compliant(), "{:?}", report.missing);
    }

    #[test]
    fn test_quick_length_bound_is_inclusive() {
        let head = "**投资评级**: 4星\n**核心逻辑**: 龙头\n**关键数据**:\n| 指标 | 数值 |\n|---|---|\n| PE | 28 |\n**主要风险**: 需求\n**操作建议**: ";
        let pad = QUICK_MAX_CHARS - char_len(head);
        let at_bound = format!("\n  {head}{}  \n", "持".repeat(pad));
        let report = ShapeContract::for_mode(AnalysisMode::Quick).check(&at_bound);
        assert_eq!(report.char_len, QUICK_MAX_CHARS);
        assert!(report.within_length_bound());
        assert!(report.is_compliant());

        let over = format!("{head}{}", "持".repeat(pad + 1));
        let report = ShapeContract::for_mode(AnalysisMode::Quick).check(&over);
        assert_eq!(report.char_len, QUICK_MAX_CHARS + 1);
        assert!(!report.within_length_bound());
        assert!(!report.is_compliant());
    }

    #[test]
    fn test_deep_requires_both_exit_levels() {
        let text = "## 市场环境\n…\n## 基本面\n…\n## 技术面\n…\n## 资金面\n…\n止损位: 1450元";
        let report = ShapeContract::for_mode(AnalysisMode::Deep).check(text);
        assert_eq!(report.missing, vec!["exit_levels"]);

        let text = format!("{text}，止盈位: 1800元");
        let report = ShapeContract::for_mode(AnalysisMode::Deep).check(&text);
        assert!(report.is_compliant());
        assert_eq!(report.max_chars, None);
    }

    #[test]
    fn test_empty_output() {
        let report = ShapeContract::for_mode(AnalysisMode::Deep).check("");
        assert_eq!(report.present.len(), 0);
        assert!(report.completeness().abs() < f64::EPSILON);
        assert!(!report.is_compliant());
    }

    #[test]
    fn test_max_chars_override() {
        let contract = ShapeContract::for_mode(AnalysisMode::Quick).with_max_chars(Some(1500));
        let long = format!("{QUICK_OK}\n\n{}", "补充说明。".repeat(60));
        assert!(contract.check(&long).is_compliant());
    }
}
