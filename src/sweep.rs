//! 参数扫描
//!
//! 每次扫描前把构建选项重置为 default，避免上一个测试的损伤泄漏到下一个拓扑。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::emu::Emulator;
use crate::error::Result;
use crate::perf::{FileSizeTrial, LatencyTrial, LossTrial, Record, TrialRunner};
use crate::topo::BuildOptionState;

/// 三种测试的参数，可从 JSON 文件加载，缺省字段取默认值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub file_size: FileSizeTrial,
    pub latency: LatencyTrial,
    pub loss: LossTrial,
}

impl SweepConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// 标准测试列表：文件大小、时延、丢包率
    pub fn runners(&self) -> Vec<Box<dyn TrialRunner>> {
        vec![
            Box::new(self.file_size.clone()),
            Box::new(self.latency),
            Box::new(self.loss),
        ]
    }
}

/// 执行一次扫描
pub fn sweep(
    runner: &dyn TrialRunner,
    emu: &mut dyn Emulator,
    options: &mut BuildOptionState,
) -> Result<Record> {
    options.reset();
    let record = runner.run(emu, options)?;
    info!(
        metric = %record.metric,
        samples = record.len(),
        expected = record.expected,
        "✅ 扫描完成"
    );
    Ok(record)
}

/// 每个测试各执行一次，按顺序返回
pub fn sweep_all(
    runners: &[Box<dyn TrialRunner>],
    emu: &mut dyn Emulator,
    options: &mut BuildOptionState,
) -> Result<Vec<Record>> {
    runners
        .iter()
        .map(|runner| sweep(runner.as_ref(), emu, options))
        .collect()
}
