//! 丢包率测试
//!
//! 丢包注入后 iperf 有时根本建不起连接，测量返回空结果；
//! 此时在同一个运行中的拓扑上按 [`RetryPolicy`] 原样重试。
//! 丢包率只能是整数百分比。

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{
    CLIENT_HOST, Metric, Record, RetryPolicy, SERVER_HOST, TrialRunner, check_range, provision,
    record_point,
};
use crate::emu::Emulator;
use crate::error::{PerfError, Result};
use crate::topo::{BuildOption, BuildOptionState, DEFAULT_HOST_COUNT, build_single_switch};

/// netem 接受的最大丢包率
const MAX_PERCENT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LossTrial {
    /// 丢包率范围 [min_percent, max_percent)
    pub min_percent: u32,
    pub max_percent: u32,
    pub seconds: u32,
    pub retry: RetryPolicy,
}

impl Default for LossTrial {
    fn default() -> Self {
        Self {
            min_percent: 0,
            max_percent: 5,
            seconds: 10,
            retry: RetryPolicy::default(),
        }
    }
}

impl LossTrial {
    pub fn new(min_percent: u32, max_percent: u32) -> Self {
        Self {
            min_percent,
            max_percent,
            ..Self::default()
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl TrialRunner for LossTrial {
    fn metric(&self) -> Metric {
        Metric::Loss
    }

    fn points(&self) -> usize {
        self.max_percent.saturating_sub(self.min_percent) as usize
    }

    fn validate(&self) -> Result<()> {
        check_range("loss", self.min_percent, self.max_percent)?;
        if self.max_percent > MAX_PERCENT + 1 {
            return Err(PerfError::InvalidArgument(format!(
                "loss range [{}, {}) goes above {MAX_PERCENT}%",
                self.min_percent, self.max_percent
            )));
        }
        self.retry.validate()
    }

    #[tracing::instrument(skip(self, emu, options), fields(min_percent = self.min_percent, max_percent = self.max_percent))]
    fn run(&self, emu: &mut dyn Emulator, options: &mut BuildOptionState) -> Result<Record> {
        self.validate()?;
        info!("📉 丢包率测试开始");

        let mut record = Record::new(Metric::Loss, self.points());
        for loss in self.min_percent..self.max_percent {
            options.select(BuildOption::Loss(loss));
            let topo = build_single_switch(DEFAULT_HOST_COUNT, options)?;
            let net = provision(emu, &topo)?;
            info!(loss_percent = loss, "丢包率");

            // h2 为客户端，h1 为服务端
            let pair = self.retry.run("iperf", |_attempt| {
                net.iperf(CLIENT_HOST, SERVER_HOST, self.seconds)
            })?;
            record_point(&mut record, u64::from(loss), Some(pair.client_mbps));
            net.stop()?;
        }
        Ok(record)
    }
}
