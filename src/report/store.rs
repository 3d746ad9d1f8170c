//! 汇总结果的持久化
//!
//! 二进制格式（bincode）：外层按测试维度排列（文件大小、时延、丢包率），
//! 每个维度内层固定三条序列 `[sum, mean, stddev]`。维度按位置确定，不落盘。

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::error::{PerfError, Result};
use crate::perf::Metric;
use crate::stats::{Aggregate, MetricAggregate};

type Nested = Vec<Vec<Vec<f64>>>;

fn to_nested(report: &[MetricAggregate]) -> Nested {
    report
        .iter()
        .map(|m| {
            let a = &m.aggregate;
            vec![a.sum.clone(), a.mean.clone(), a.stddev.clone()]
        })
        .collect()
}

fn from_nested(nested: Nested) -> Result<Vec<MetricAggregate>> {
    nested
        .into_iter()
        .enumerate()
        .map(|(idx, inner)| {
            let metric = Metric::from_index(idx).ok_or_else(|| {
                PerfError::InvalidArgument(format!("unexpected metric at position {idx}"))
            })?;
            let [sum, mean, stddev]: [Vec<f64>; 3] = inner.try_into().map_err(|v: Vec<_>| {
                PerfError::InvalidArgument(format!(
                    "{metric} entry holds {} sequences, expected 3",
                    v.len()
                ))
            })?;
            Ok(MetricAggregate {
                metric,
                aggregate: Aggregate { sum, mean, stddev },
            })
        })
        .collect()
}

/// 写出二进制报告；空报告直接拒绝
pub fn save(path: &Path, report: &[MetricAggregate]) -> Result<()> {
    if report.is_empty() {
        return Err(PerfError::InvalidArgument(
            "refusing to export an empty report".into(),
        ));
    }
    let mut writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut writer, &to_nested(report))?;
    writer.flush()?;
    info!(path = %path.display(), metrics = report.len(), "💾 报告已保存");
    Ok(())
}

pub fn load(path: &Path) -> Result<Vec<MetricAggregate>> {
    let reader = BufReader::new(File::open(path)?);
    let nested: Nested = bincode::deserialize_from(reader)?;
    let report = from_nested(nested)?;
    info!(path = %path.display(), metrics = report.len(), "📂 报告已加载");
    Ok(report)
}

/// 带维度标签的 JSON 导出
pub fn export_json(path: &Path, report: &[MetricAggregate]) -> Result<()> {
    if report.is_empty() {
        return Err(PerfError::InvalidArgument(
            "refusing to export an empty report".into(),
        ));
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()?;
    Ok(())
}
