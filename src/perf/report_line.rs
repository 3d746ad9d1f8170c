//! iperf 报告行解析
//!
//! 一行同时包含 `MBytes` 与 `Mbits/sec` 才算测量样本，样本值取倒数第二个
//! 空白分隔的字段，例如：
//!
//! ```text
//! [  3]  0.0-10.0 sec  1100 MBytes   920 Mbits/sec
//! ```
//!
//! 残缺或格式不对的行直接跳过。

const BYTES_MARKER: &str = "MBytes";
const RATE_MARKER: &str = "Mbits/sec";

/// 单行分类结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReportLine {
    /// 带宽样本（Mbps）
    Sample(f64),
    /// 含两个标记但数值解析失败
    Malformed,
    /// 与测量无关的行
    Other,
}

impl ReportLine {
    pub fn classify(line: &str) -> Self {
        if !(line.contains(BYTES_MARKER) && line.contains(RATE_MARKER)) {
            return ReportLine::Other;
        }
        let mut tokens = line.split_whitespace().rev();
        let _unit = tokens.next();
        match tokens.next().map(str::parse::<f64>) {
            Some(Ok(v)) if v.is_finite() => ReportLine::Sample(v),
            _ => ReportLine::Malformed,
        }
    }

    pub fn sample(self) -> Option<f64> {
        match self {
            ReportLine::Sample(v) => Some(v),
            _ => None,
        }
    }
}

/// 解析单行
pub fn parse_sample_line(line: &str) -> Option<f64> {
    ReportLine::classify(line).sample()
}

/// 按出现顺序提取全部样本
pub fn extract_samples(report: &str) -> Vec<f64> {
    report.lines().filter_map(parse_sample_line).collect()
}

/// 最后一个样本（iperf 的汇总行总在最后）
pub fn last_sample(report: &str) -> Option<f64> {
    report.lines().rev().find_map(parse_sample_line)
}
