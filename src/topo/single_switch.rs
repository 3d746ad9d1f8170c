//! 单交换机拓扑构建
//!
//! 拓扑结构：h1..hN 各自通过一条 1Gbps 链路连到 s1。
//!
//! 注意：只有第一条链路（h1 <-> s1）会带上时延/丢包损伤，所以带损伤时
//! 只支持 2 台主机；其他主机数会直接返回错误，而不是悄悄只损伤一条链路。
//! 仿真器在链路两端施加相同参数，因此经过第一条链路的 RTT 约为 2 × delay。

use tracing::{debug, info};

use super::build_option::{BuildOption, BuildOptionState};
use super::spec::{LinkSpec, TopologySpec};
use crate::error::{PerfError, Result};

pub const SWITCH_NAME: &str = "s1";
pub const DEFAULT_HOST_COUNT: usize = 2;
pub const LINK_BANDWIDTH_MBPS: u32 = 1000;

/// 主机命名沿用 1 起始的编号：h1, h2, ...
pub fn host_name(index: usize) -> String {
    format!("h{}", index + 1)
}

/// 构建单交换机拓扑
pub fn build_single_switch(host_count: usize, options: &BuildOptionState) -> Result<TopologySpec> {
    if host_count == 0 {
        return Err(PerfError::InvalidArgument(
            "single switch topology needs at least one host".into(),
        ));
    }
    let option = options.option();
    if !matches!(option, BuildOption::Default(_)) && host_count != DEFAULT_HOST_COUNT {
        return Err(PerfError::InvalidArgument(format!(
            "{} impairment only reaches the first link, host_count must be {DEFAULT_HOST_COUNT} (got {host_count})",
            option.kind()
        )));
    }

    let mut topo = TopologySpec::default();
    let switch = topo.add_switch(SWITCH_NAME);
    for idx in 0..host_count {
        let host = topo.add_host(host_name(idx));
        let mut link = LinkSpec::new(host, switch, LINK_BANDWIDTH_MBPS);
        if idx == 0 {
            match option {
                BuildOption::Delay(ms) if ms != 0 => link.delay_ms = Some(ms),
                BuildOption::Loss(pct) if pct != 0 => link.loss_percent = Some(pct),
                _ => {}
            }
        }
        let id = topo.add_link(link);
        debug!(host = %host_name(idx), link = ?topo.link(id), "添加链路");
    }

    info!(host_count, ?option, "🧱 构建单交换机拓扑");
    Ok(topo)
}
