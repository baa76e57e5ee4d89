//! Comparison report: aggregation and rendering

use crate::backtest::{BacktestSummary, summarize};
use crate::error::Result;
use crate::metrics::{MetricRecord, Variant};
use chrono::{DateTime, NaiveDate, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use serde::Serialize;
use uuid::Uuid;

/// Numeric metrics aggregated per variant, in report order
pub const SUMMARY_METRICS: [&str; 7] = [
    "completeness",
    "format_compliance",
    "data_accuracy",
    "input_tokens",
    "output_tokens",
    "char_len",
    "latency_ms",
];

fn metric_value(record: &MetricRecord, metric: &str) -> Option<f64> {
    match metric {
        "completeness" => Some(record.completeness),
        "format_compliance" => Some(if record.format_compliance { 1.0 } else { 0.0 }),
        "data_accuracy" => record.data_accuracy,
        "input_tokens" => Some(record.tokens.input as f64),
        "output_tokens" => Some(record.tokens.output as f64),
        "char_len" => Some(record.char_len as f64),
        "latency_ms" => Some(record.latency_ms as f64),
        _ => None,
    }
}

/// Baseline and optimized means of one metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub metric: &'static str,
    pub baseline: Option<f64>,
    pub optimized: Option<f64>,
    /// `optimized - baseline`
    pub delta: Option<f64>,
    /// Delta as a percentage of baseline, absent when baseline is 0
    pub pct_change: Option<f64>,
}

impl MetricSummary {
    fn compute(metric: &'static str, records: &[MetricRecord]) -> Self {
        let baseline = mean_of(records, Variant::Baseline, metric);
        let optimized = mean_of(records, Variant::Optimized, metric);
        let delta = baseline.zip(optimized).map(|(b, o)| o - b);
        let pct_change = baseline
            .zip(delta)
            .filter(|(b, _)| *b != 0.0)
            .map(|(b, d)| d / b * 100.0);

        Self {
            metric,
            baseline,
            optimized,
            delta,
            pct_change,
        }
    }
}

/// Mean over successful records of `variant` that have a value
fn mean_of(records: &[MetricRecord], variant: Variant, metric: &str) -> Option<f64> {
    let values: Vec<f64> = records
        .iter()
        .filter(|r| r.variant == variant && r.is_ok())
        .filter_map(|r| metric_value(r, metric))
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Failed runs per variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FailureCounts {
    pub baseline: usize,
    pub optimized: usize,
}

/// Result of one A/B comparison
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub trade_date: NaiveDate,
    pub baseline_name: String,
    pub optimized_name: String,
    /// One metric row per `SUMMARY_METRICS` entry
    pub summary: Vec<MetricSummary>,
    pub failures: FailureCounts,
    pub backtest: Vec<BacktestSummary>,
    /// Baseline then optimized record for each case, in case order
    pub records: Vec<MetricRecord>,
}

impl ComparisonReport {
    /// Aggregate `records`
    pub fn from_records(
        trade_date: NaiveDate,
        baseline_name: impl Into<String>,
        optimized_name: impl Into<String>,
        records: Vec<MetricRecord>,
    ) -> Self {
        let summary = SUMMARY_METRICS
            .iter()
            .map(|metric| MetricSummary::compute(metric, &records))
            .collect();

        let failed = |variant: Variant| {
            records
                .iter()
                .filter(|r| r.variant == variant && !r.is_ok())
                .count()
        };
        let failures = FailureCounts {
            baseline: failed(Variant::Baseline),
            optimized: failed(Variant::Optimized),
        };

        let backtest = Variant::ALL
            .iter()
            .filter_map(|&variant| summarize(&records, variant))
            .collect();

        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            trade_date,
            baseline_name: baseline_name.into(),
            optimized_name: optimized_name.into(),
            summary,
            failures,
            backtest,
            records,
        }
    }

    /// Summary row of `metric`
    pub fn metric(&self, metric: &str) -> Option<&MetricSummary> {
        self.summary.iter().find(|s| s.metric == metric)
    }

    /// Records of one variant, in case order
    pub fn records_for(&self, variant: Variant) -> impl Iterator<Item = &MetricRecord> {
        self.records.iter().filter(move |r| r.variant == variant)
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Summary and backtest tables
    pub fn render_table(&self) -> String {
        let mut summary = Table::new();
        summary
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                "指标".to_string(),
                format!("基线 ({})", self.baseline_name),
                format!("优化 ({})", self.optimized_name),
                "差值".to_string(),
                "变化%".to_string(),
            ]);

        for row in &self.summary {
            summary.add_row(vec![
                Cell::new(row.metric),
                number_cell(row.baseline, 3),
                number_cell(row.optimized, 3),
                number_cell(row.delta, 3),
                match row.pct_change {
                    Some(p) => Cell::new(format!("{p:+.1}%")).set_alignment(CellAlignment::Right),
                    None => Cell::new("-").set_alignment(CellAlignment::Right),
                },
            ]);
        }
        summary.add_row(vec![
            Cell::new("failures"),
            Cell::new(self.failures.baseline).set_alignment(CellAlignment::Right),
            Cell::new(self.failures.optimized).set_alignment(CellAlignment::Right),
            Cell::new(""),
            Cell::new(""),
        ]);

        let mut out = format!(
            "A/B 测试结果 {} (交易日 {})\n{summary}",
            self.run_id, self.trade_date
        );

        if !self.backtest.is_empty() {
            let mut backtest = Table::new();
            backtest
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["版本", "样本数", "策略收益均值", "策略收益标准差", "实际收益均值", "胜率"]);
            for b in &self.backtest {
                backtest.add_row(vec![
                    Cell::new(b.variant),
                    Cell::new(b.count).set_alignment(CellAlignment::Right),
                    number_cell(Some(b.mean_strategy_return), 4),
                    number_cell(b.std_strategy_return, 4),
                    number_cell(Some(b.mean_actual_return), 4),
                    Cell::new(format!("{:.1}%", b.win_rate * 100.0))
                        .set_alignment(CellAlignment::Right),
                ]);
            }
            out.push_str(&format!("\n回测结果\n{backtest}"));
        }

        out
    }
}

fn number_cell(value: Option<f64>, precision: usize) -> Cell {
    let text = value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"));
    Cell::new(text).set_alignment(CellAlignment::Right)
}
