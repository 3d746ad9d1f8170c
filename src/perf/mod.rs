//! 吞吐量测试
//!
//! 三种测试（文件大小 / 时延 / 丢包率）共用的类型：
//! - [`Metric`]：测试维度
//! - [`Record`]：一次扫描得到的有序样本
//! - [`TrialRunner`]：在仿真器上执行一次完整扫描

mod file_size;
mod latency;
mod loss;
pub mod report_line;
mod retry;

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use crate::emu::{EmuNet, Emulator};
use crate::error::{PerfError, Result};
use crate::topo::{BuildOptionState, TopologySpec};

pub use file_size::FileSizeTrial;
pub use latency::LatencyTrial;
pub use loss::LossTrial;
pub use report_line::{ReportLine, extract_samples, last_sample, parse_sample_line};
pub use retry::{DEFAULT_MAX_ATTEMPTS, RetryPolicy};

/// iperf 服务端主机
pub const SERVER_HOST: &str = "h1";
/// iperf 客户端主机
pub const CLIENT_HOST: &str = "h2";

/// 测试维度，顺序即报告中的顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    FileSize,
    Latency,
    Loss,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::FileSize, Metric::Latency, Metric::Loss];

    pub fn title(self) -> &'static str {
        match self {
            Metric::FileSize => "File Size",
            Metric::Latency => "Latency",
            Metric::Loss => "Loss Rate",
        }
    }

    pub fn from_index(idx: usize) -> Option<Metric> {
        Metric::ALL.get(idx).copied()
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// 一次扫描的结果。
///
/// `expected` 是扫描点数；外部工具偶尔丢行，`samples` 可能更短，
/// 通过 [`Record::missing`] 可以看到缺了多少。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub metric: Metric,
    pub samples: Vec<f64>,
    pub expected: usize,
}

impl Record {
    pub fn new(metric: Metric, expected: usize) -> Self {
        Self {
            metric,
            samples: Vec::with_capacity(expected),
            expected,
        }
    }

    pub fn from_samples(metric: Metric, samples: Vec<f64>) -> Self {
        let expected = samples.len();
        Self {
            metric,
            samples,
            expected,
        }
    }

    pub fn push(&mut self, sample: f64) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn missing(&self) -> usize {
        self.expected.saturating_sub(self.samples.len())
    }

    pub fn is_complete(&self) -> bool {
        self.missing() == 0
    }
}

/// 一种吞吐量测试：扫描自己的参数范围，每个参数点产出一个样本
pub trait TrialRunner {
    fn metric(&self) -> Metric;

    /// 扫描点个数
    fn points(&self) -> usize;

    /// 参数合法性检查，在启动任何拓扑之前调用
    fn validate(&self) -> Result<()>;

    fn run(&self, emu: &mut dyn Emulator, options: &mut BuildOptionState) -> Result<Record>;
}

pub(crate) fn check_range(what: &str, min: u32, max: u32) -> Result<()> {
    if min >= max {
        return Err(PerfError::InvalidArgument(format!(
            "{what} range must satisfy min < max (got [{min}, {max}))"
        )));
    }
    Ok(())
}

/// 启动拓扑，打印链路并做一次连通性检查
pub(crate) fn provision(emu: &mut dyn Emulator, topo: &TopologySpec) -> Result<Box<dyn EmuNet>> {
    for name in [SERVER_HOST, CLIENT_HOST] {
        if topo.node_by_name(name).is_none() {
            return Err(PerfError::UnknownNode(name.to_string()));
        }
    }
    let net = emu.start(topo)?;
    for link in topo.links() {
        info!(
            a = %topo.node(link.a).name,
            b = %topo.node(link.b).name,
            bandwidth_mbps = link.bandwidth_mbps,
            delay_ms = ?link.delay_ms,
            loss_percent = ?link.loss_percent,
            "🔗 链路"
        );
    }
    let drop_pct = net.ping_all()?;
    if drop_pct > 0.0 {
        warn!(drop_pct, "连通性检查有丢包");
    }
    Ok(net)
}

/// 记录一个参数点的结果，缺失时只告警
pub(crate) fn record_point(record: &mut Record, point: u64, sample: Option<f64>) {
    match sample {
        Some(mbps) => {
            info!(metric = %record.metric, point, mbps, "📈 样本");
            record.push(mbps);
        }
        None => warn!(metric = %record.metric, point, "报告中没有样本行"),
    }
}
