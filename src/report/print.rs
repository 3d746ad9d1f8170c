//! 文本输出

use std::fmt::Write;

use crate::stats::MetricAggregate;

fn fmt_series(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().map(|v| format!("{v:.3}")).collect();
    format!("[{}]", items.join(", "))
}

/// 按测试维度列出 Sum / Average / Standard Deviation
pub fn render(report: &[MetricAggregate]) -> String {
    let mut out = String::new();
    for entry in report {
        let a = &entry.aggregate;
        let _ = writeln!(out, "!! Data Collected from the {} Test !!", entry.metric);
        let _ = writeln!(out, "!! Sum !!");
        let _ = writeln!(out, "{}", fmt_series(&a.sum));
        let _ = writeln!(out, "!! Average !!");
        let _ = writeln!(out, "{}", fmt_series(&a.mean));
        let _ = writeln!(out, "!! Standard Deviation !!");
        let _ = writeln!(out, "{}", fmt_series(&a.stddev));
    }
    out
}
