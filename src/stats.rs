//! 多次运行的统计汇总
//!
//! 对同一扫描重复 R 次，按位置求和、均值和样本标准差
//! （除数 R - 1；R == 1 时退化为 R，避免除零）。

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::emu::Emulator;
use crate::error::{PerfError, Result};
use crate::perf::{Metric, Record, TrialRunner};
use crate::sweep::sweep;
use crate::topo::BuildOptionState;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub sum: Vec<f64>,
    pub mean: Vec<f64>,
    pub stddev: Vec<f64>,
}

impl Aggregate {
    /// 扫描点个数
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// 由已收集的记录计算汇总；记录不能为空且长度必须一致
    pub fn from_records(records: &[Record]) -> Result<Self> {
        let Some(first) = records.first() else {
            return Err(PerfError::InvalidArgument(
                "cannot aggregate zero records".into(),
            ));
        };
        let width = first.len();
        if let Some((run, bad)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != width)
        {
            return Err(PerfError::InvalidArgument(format!(
                "{} run {run} produced {} samples, run 0 produced {width}",
                bad.metric,
                bad.len()
            )));
        }

        let runs = records.len() as f64;
        let mut sum = vec![0.0; width];
        for record in records {
            for (acc, v) in sum.iter_mut().zip(&record.samples) {
                *acc += v;
            }
        }
        let mean: Vec<f64> = sum.iter().map(|s| s / runs).collect();

        let divisor = if records.len() == 1 { runs } else { runs - 1.0 };
        let stddev = (0..width)
            .map(|i| {
                let sq: f64 = records
                    .iter()
                    .map(|r| (r.samples[i] - mean[i]).powi(2))
                    .sum();
                (sq / divisor).sqrt()
            })
            .collect();

        Ok(Self { sum, mean, stddev })
    }
}

/// 一个测试维度的汇总结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricAggregate {
    pub metric: Metric,
    #[serde(flatten)]
    pub aggregate: Aggregate,
}

/// 执行 `sweep_fn` 共 `runs` 次（串行）并汇总
pub fn aggregate<F>(mut sweep_fn: F, runs: usize) -> Result<Aggregate>
where
    F: FnMut() -> Result<Record>,
{
    if runs == 0 {
        return Err(PerfError::InvalidArgument("runs must be positive".into()));
    }
    let mut records = Vec::with_capacity(runs);
    for run in 0..runs {
        let record = sweep_fn()?;
        debug!(run, samples = record.len(), "收集一次运行");
        records.push(record);
    }
    Aggregate::from_records(&records)
}

/// 依次对每个测试做 `runs` 次扫描并汇总；一个测试的全部运行结束后才开始下一个
pub fn aggregate_all(
    runners: &[Box<dyn TrialRunner>],
    runs: usize,
    emu: &mut dyn Emulator,
    options: &mut BuildOptionState,
) -> Result<Vec<MetricAggregate>> {
    if runners.is_empty() {
        return Err(PerfError::InvalidArgument(
            "runner list must not be empty".into(),
        ));
    }
    if runs == 0 {
        return Err(PerfError::InvalidArgument("runs must be positive".into()));
    }
    for runner in runners {
        runner.validate()?;
    }

    let mut report = Vec::with_capacity(runners.len());
    for runner in runners {
        info!(metric = %runner.metric(), runs, "🔬 开始多次运行");
        let agg = aggregate(|| sweep(runner.as_ref(), emu, options), runs)?;
        report.push(MetricAggregate {
            metric: runner.metric(),
            aggregate: agg,
        });
    }
    Ok(report)
}
