//! 时延测试
//!
//! 仿真器不支持修改运行中链路的参数，所以每个时延点都重新建一次拓扑。
//! 只有第一条链路带时延，RTT 约为 2 × delay。

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{
    CLIENT_HOST, Metric, Record, SERVER_HOST, TrialRunner, check_range,
    last_sample, provision, record_point,
};
use crate::emu::Emulator;
use crate::error::{PerfError, Result};
use crate::topo::{BuildOption, BuildOptionState, DEFAULT_HOST_COUNT, build_single_switch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyTrial {
    /// 单向时延范围 [min_ms, max_ms)，步长 step_ms
    pub min_ms: u32,
    pub max_ms: u32,
    pub step_ms: u32,
    /// 每个点 iperf 的测量时长（秒）
    pub seconds: u32,
}

impl Default for LatencyTrial {
    fn default() -> Self {
        Self {
            min_ms: 1,
            max_ms: 182,
            step_ms: 20,
            seconds: 10,
        }
    }
}

impl LatencyTrial {
    pub fn new(min_ms: u32, max_ms: u32, step_ms: u32) -> Self {
        Self {
            min_ms,
            max_ms,
            step_ms,
            ..Self::default()
        }
    }

    pub fn delays(&self) -> impl Iterator<Item = u32> {
        (self.min_ms..self.max_ms).step_by(self.step_ms.max(1) as usize)
    }
}

impl TrialRunner for LatencyTrial {
    fn metric(&self) -> Metric {
        Metric::Latency
    }

    fn points(&self) -> usize {
        self.delays().count()
    }

    fn validate(&self) -> Result<()> {
        check_range("latency", self.min_ms, self.max_ms)?;
        if self.step_ms == 0 {
            return Err(PerfError::InvalidArgument(
                "latency step must be positive".into(),
            ));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, emu, options), fields(min_ms = self.min_ms, max_ms = self.max_ms, step_ms = self.step_ms))]
    fn run(&self, emu: &mut dyn Emulator, options: &mut BuildOptionState) -> Result<Record> {
        self.validate()?;
        info!("⏱️  时延测试开始");

        let mut record = Record::new(Metric::Latency, self.points());
        for delay in self.delays() {
            options.select(BuildOption::Delay(delay));
            let topo = build_single_switch(DEFAULT_HOST_COUNT, options)?;
            let net = provision(emu, &topo)?;
            {
                let server = net.node(SERVER_HOST)?;
                let client = net.node(CLIENT_HOST)?;
                info!(delay_ms = delay, "时延");
                net.start_server(SERVER_HOST)?;
                let report = client.cmd(&format!(
                    "iperf -f m -c {} -t {}",
                    server.ip(),
                    self.seconds
                ))?;
                client.cmd("sync")?;
                record_point(&mut record, u64::from(delay), last_sample(&report));
            }
            net.stop()?;
        }
        Ok(record)
    }
}
