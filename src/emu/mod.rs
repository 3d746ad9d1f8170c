//! 仿真器接口
//!
//! 扫描引擎只通过这里的 trait 使用外部网络仿真器：
//! - [`Emulator`]：把 [`TopologySpec`] 实例化为一个正在运行的网络
//! - [`EmuNet`]：运行中的网络，按名字查节点、连通性检查、iperf 测量、拆除
//! - [`EmuNode`]：在节点上执行 shell 命令并拿回输出
//!
//! [`netns`] 提供基于 Linux network namespace + `tc` 的实现。

pub mod netns;
mod shell;

use crate::error::Result;
use crate::topo::TopologySpec;

pub use netns::NetnsEmulator;

/// iperf 2 默认端口
pub const IPERF_PORT: u16 = 5001;

pub(crate) const IPERF_SERVER_CMD: &str = "iperf -f m -s > /dev/null 2>&1 &";
pub use shell::check_privileges;

/// 一次 iperf 测量的服务端/客户端带宽（Mbps）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThroughputPair {
    pub server_mbps: f64,
    pub client_mbps: f64,
}

/// 拓扑实例化入口
pub trait Emulator {
    fn start(&mut self, topo: &TopologySpec) -> Result<Box<dyn EmuNet>>;
}

/// 运行中的网络
pub trait EmuNet {
    fn node(&self, name: &str) -> Result<&dyn EmuNode>;

    /// 所有主机两两 ping 一次，返回丢包百分比
    fn ping_all(&self) -> Result<f64>;

    /// 在 `server` 上后台启动 iperf 服务端，返回时端口已在监听
    fn start_server(&self, server: &str) -> Result<()>;

    /// 在 `server` 上起 iperf 服务端，从 `client` 发起固定时长测量。
    ///
    /// 连接建立失败时返回 `Ok(None)`（空结果），由调用方决定是否重试。
    fn iperf(&self, client: &str, server: &str, seconds: u32) -> Result<Option<ThroughputPair>>;

    /// 拆除网络
    fn stop(self: Box<Self>) -> Result<()>;
}

/// 网络中的一个节点
pub trait EmuNode {
    fn name(&self) -> &str;

    fn ip(&self) -> &str;

    /// 在节点上执行 shell 命令，返回合并后的 stdout/stderr
    fn cmd(&self, command: &str) -> Result<String>;
}
