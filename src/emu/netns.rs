//! 基于 Linux network namespace 的仿真器
//!
//! 每个节点一个 namespace：交换机 namespace 内建一个 `br0` 网桥，每条链路是一对
//! veth，主机端配 `10.0.0.<i>/24` 地址。链路整形用 `tbf`（带宽）作为根 qdisc，
//! 时延/丢包由挂在下面的 `netem` 提供，并且在 veth 两端都施加，所以
//! 单向时延 `d` 的链路 RTT 为 `2d`。
//!
//! 所有命令通过 `sudo ip netns exec` 执行，需要 root 或免密 sudo。

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::shell::{combined_output, sudo, sudo_checked};
use super::{EmuNet, EmuNode, Emulator, IPERF_PORT, IPERF_SERVER_CMD, ThroughputPair};
use crate::error::{PerfError, Result};
use crate::perf::report_line;
use crate::topo::{LinkSpec, NodeKind, TopologySpec};

const BRIDGE: &str = "br0";
const HOST_SUBNET: &str = "10.0.0";
/// Linux 网卡名长度上限
const IFNAME_MAX: usize = 15;
/// 标签长度：网卡名还要再拼链路序号和端点后缀
const TAG_LEN: usize = IFNAME_MAX - 5;
/// 36^4，标签中 pid 和序号各占 4 位 base36
const TAG_FIELD_MOD: u32 = 36 * 36 * 36 * 36;
const LISTEN_POLL: Duration = Duration::from_millis(50);

static NET_COUNTER: AtomicU32 = AtomicU32::new(0);

/// netns 仿真器
#[derive(Debug, Clone)]
pub struct NetnsEmulator {
    prefix: String,
    /// 等待 iperf 服务端开始监听的上限
    listen_timeout: Duration,
}

impl Default for NetnsEmulator {
    fn default() -> Self {
        Self {
            prefix: "ps".to_string(),
            listen_timeout: Duration::from_secs(2),
        }
    }
}

impl NetnsEmulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_listen_timeout(mut self, timeout: Duration) -> Self {
        self.listen_timeout = timeout;
        self
    }

    fn next_tag(&self) -> String {
        let seq = NET_COUNTER.fetch_add(1, Ordering::Relaxed);
        net_tag(&self.prefix, std::process::id(), seq)
    }
}

/// 一次实例化的标签，网卡名 = 标签 + 链路序号 + 端点。
///
/// 定长 `TAG_LEN`：前缀截断到剩余宽度，pid 与序号各取 4 位 base36。
/// 序号在 36^4 次启动后回绕，此时同名的旧网络早已拆除。
pub(crate) fn net_tag(prefix: &str, pid: u32, seq: u32) -> String {
    let head: String = prefix.chars().take(TAG_LEN - 8).collect();
    format!(
        "{head}{}{}",
        base36_fixed(pid % TAG_FIELD_MOD),
        base36_fixed(seq % TAG_FIELD_MOD)
    )
}

fn base36_fixed(mut v: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = [b'0'; 4];
    for slot in out.iter_mut().rev() {
        *slot = DIGITS[(v % 36) as usize];
        v /= 36;
    }
    out.iter().map(|&b| char::from(b)).collect()
}

impl Emulator for NetnsEmulator {
    #[tracing::instrument(skip(self, topo), fields(nodes = topo.nodes().len(), links = topo.links().len()))]
    fn start(&mut self, topo: &TopologySpec) -> Result<Box<dyn EmuNet>> {
        let tag = self.next_tag();
        info!(%tag, "🚀 启动 netns 网络");

        let mut namespaces = Vec::with_capacity(topo.nodes().len());
        for node in topo.nodes() {
            let ns = Namespace::new(&format!("{tag}{}", node.name))?;
            if node.kind == NodeKind::Switch {
                ns.sh_checked(&format!("ip link add {BRIDGE} type bridge && ip link set {BRIDGE} up"))?;
            }
            namespaces.push(ns);
        }

        let mut ips: Vec<Option<String>> = vec![None; topo.nodes().len()];
        let mut host_ordinal = 0;
        for node in topo.nodes() {
            if node.kind == NodeKind::Host {
                host_ordinal += 1;
                ips[node.id.0] = Some(format!("{HOST_SUBNET}.{host_ordinal}"));
            }
        }

        let mut addressed = vec![false; topo.nodes().len()];
        for (idx, link) in topo.links().iter().enumerate() {
            let (a_if, b_if) = veth_names(&tag, idx);
            let (a_ns, b_ns) = (&namespaces[link.a.0], &namespaces[link.b.0]);

            let _ = sudo(&["ip", "link", "del", &a_if]);
            sudo_checked(&["ip", "link", "add", &a_if, "type", "veth", "peer", "name", &b_if])?;
            sudo_checked(&["ip", "link", "set", &a_if, "netns", &a_ns.name])?;
            sudo_checked(&["ip", "link", "set", &b_if, "netns", &b_ns.name])?;

            for (end, iface, ns) in [(link.a, &a_if, a_ns), (link.b, &b_if, b_ns)] {
                match topo.node(end).kind {
                    NodeKind::Switch => {
                        ns.sh_checked(&format!("ip link set {iface} master {BRIDGE}"))?;
                    }
                    NodeKind::Host if !addressed[end.0] => {
                        let ip = ips[end.0].as_deref().unwrap_or_default();
                        ns.sh_checked(&format!("ip addr add {ip}/24 dev {iface}"))?;
                        addressed[end.0] = true;
                    }
                    NodeKind::Host => {}
                }
                ns.sh_checked(&format!("ip link set {iface} up"))?;
                for tc in shaping_commands(iface, link) {
                    ns.sh_checked(&tc)?;
                }
            }
            debug!(link = idx, ?link, a = %a_if, b = %b_if, "链路已配置");
        }

        let mut hosts = Vec::new();
        let mut others = Vec::new();
        for (node, ns) in topo.nodes().iter().zip(namespaces) {
            match &ips[node.id.0] {
                Some(ip) => hosts.push(NetnsNode {
                    name: node.name.clone(),
                    ip: ip.clone(),
                    ns,
                }),
                None => others.push(ns),
            }
        }

        Ok(Box::new(NetnsNet {
            hosts,
            _switches: others,
            listen_timeout: self.listen_timeout,
        }))
    }
}

/// 第 `idx` 条链路两端的网卡名
pub(crate) fn veth_names(tag: &str, idx: usize) -> (String, String) {
    (format!("{tag}{idx}a"), format!("{tag}{idx}b"))
}

/// 为链路一端生成 tc 命令：tbf 限速为根，有损伤时再挂 netem 子 qdisc
pub(crate) fn shaping_commands(iface: &str, link: &LinkSpec) -> Vec<String> {
    let rate_kbit = u64::from(link.bandwidth_mbps) * 1000;
    let burst = (rate_kbit * 1000 / 8).max(15_400) / 10;
    let mut cmds = vec![format!(
        "tc qdisc add dev {iface} root handle 1: tbf rate {rate_kbit}kbit burst {burst} latency 1s"
    )];

    let mut netem = Vec::new();
    if let Some(ms) = link.delay_ms {
        netem.push(format!("delay {ms}ms"));
    }
    if let Some(pct) = link.loss_percent {
        netem.push(format!("loss {pct}%"));
    }
    if !netem.is_empty() {
        cmds.push(format!(
            "tc qdisc add dev {iface} parent 1:1 handle 10: netem {}",
            netem.join(" ")
        ));
    }
    cmds
}

/// 带自动清理的 network namespace
struct Namespace {
    name: String,
}

impl Namespace {
    fn new(name: &str) -> Result<Self> {
        let _ = sudo(&["ip", "netns", "del", name]);
        sudo_checked(&["ip", "netns", "add", name])?;
        let _ = sudo(&["ip", "netns", "exec", name, "ip", "link", "set", "lo", "up"]);
        debug!(ns = name, "创建 namespace");
        Ok(Self {
            name: name.to_string(),
        })
    }

    fn sh(&self, command: &str) -> Result<String> {
        let output = sudo(&["ip", "netns", "exec", &self.name, "sh", "-c", command])?;
        Ok(combined_output(&output))
    }

    fn sh_checked(&self, command: &str) -> Result<String> {
        let output = sudo_checked(&["ip", "netns", "exec", &self.name, "sh", "-c", command])?;
        Ok(combined_output(&output))
    }

    /// 结束 namespace 内的所有进程
    fn kill_all(&self) {
        let Ok(output) = sudo(&["ip", "netns", "pids", &self.name]) else {
            return;
        };
        let pids = String::from_utf8_lossy(&output.stdout).into_owned();
        let pids: Vec<&str> = pids.split_whitespace().collect();
        if pids.is_empty() {
            return;
        }
        debug!(ns = %self.name, count = pids.len(), "结束 namespace 内进程");
        let mut args = vec!["kill"];
        args.extend(pids);
        let _ = sudo(&args);
    }
}

impl Drop for Namespace {
    fn drop(&mut self) {
        self.kill_all();
        debug!(ns = %self.name, "删除 namespace");
        let _ = sudo(&["ip", "netns", "del", &self.name]);
    }
}

struct NetnsNode {
    name: String,
    ip: String,
    ns: Namespace,
}

impl EmuNode for NetnsNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn ip(&self) -> &str {
        &self.ip
    }

    fn cmd(&self, command: &str) -> Result<String> {
        debug!(node = %self.name, command, "执行命令");
        self.ns.sh(command)
    }
}

struct NetnsNet {
    hosts: Vec<NetnsNode>,
    _switches: Vec<Namespace>,
    listen_timeout: Duration,
}

impl NetnsNet {
    fn host(&self, name: &str) -> Result<&NetnsNode> {
        self.hosts
            .iter()
            .find(|h| h.name == name)
            .ok_or_else(|| PerfError::UnknownNode(name.to_string()))
    }

    /// 轮询 `ss` 直到 iperf 端口进入 LISTEN
    fn wait_listening(&self, host: &NetnsNode) -> Result<()> {
        let listen_cmd = format!("ss -Hltn sport = :{IPERF_PORT}");
        let deadline = Instant::now() + self.listen_timeout;
        loop {
            if !host.ns.sh_checked(&listen_cmd)?.trim().is_empty() {
                debug!(node = %host.name, "iperf 服务端已监听");
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(PerfError::Command {
                    command: listen_cmd,
                    stderr: format!(
                        "iperf server on {} not listening after {:?}",
                        host.name, self.listen_timeout
                    ),
                });
            }
            thread::sleep(LISTEN_POLL);
        }
    }
}

impl EmuNet for NetnsNet {
    fn node(&self, name: &str) -> Result<&dyn EmuNode> {
        let host: &dyn EmuNode = self.host(name)?;
        Ok(host)
    }

    fn ping_all(&self) -> Result<f64> {
        let mut sent = 0u32;
        let mut lost = 0u32;
        for src in &self.hosts {
            for dst in self.hosts.iter().filter(|d| d.name != src.name) {
                sent += 1;
                let output = sudo(&[
                    "ip", "netns", "exec", &src.ns.name, "ping", "-c", "1", "-W", "1", &dst.ip,
                ])?;
                if !output.status.success() {
                    lost += 1;
                    debug!(src = %src.name, dst = %dst.name, "ping 失败");
                }
            }
        }
        let drop_pct = if sent == 0 {
            0.0
        } else {
            f64::from(lost) * 100.0 / f64::from(sent)
        };
        info!(sent, lost, drop_pct, "📡 连通性检查");
        Ok(drop_pct)
    }

    fn start_server(&self, server: &str) -> Result<()> {
        let host = self.host(server)?;
        host.cmd(IPERF_SERVER_CMD)?;
        self.wait_listening(host)
    }

    fn iperf(&self, client: &str, server: &str, seconds: u32) -> Result<Option<ThroughputPair>> {
        let cli = self.host(client)?;
        let srv = self.host(server)?;
        let log = server_log_path(&srv.ns.name);

        srv.cmd(&format!("iperf -f m -s > {} 2>&1 &", log.display()))?;
        self.wait_listening(srv)?;
        let client_out = cli.cmd(&format!("iperf -f m -c {} -t {seconds}", srv.ip))?;
        // 服务端在连接关闭后才写汇总行
        thread::sleep(LISTEN_POLL * 10);
        srv.ns.kill_all();

        let server_out = read_server_log(&log);
        // 日志由 root 创建，只能在 namespace 内删除
        srv.ns.sh(&format!("rm -f {}", log.display()))?;
        let server_out = server_out?;

        let client_mbps = report_line::last_sample(&client_out);
        let server_mbps = report_line::last_sample(&server_out);
        match (server_mbps, client_mbps) {
            (Some(server_mbps), Some(client_mbps)) => Ok(Some(ThroughputPair {
                server_mbps,
                client_mbps,
            })),
            _ => {
                warn!(client, server, ?client_mbps, ?server_mbps, "iperf 结果为空");
                Ok(None)
            }
        }
    }

    fn stop(self: Box<Self>) -> Result<()> {
        info!(hosts = self.hosts.len(), "🛑 拆除 netns 网络");
        drop(self);
        Ok(())
    }
}

fn server_log_path(ns: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{ns}-iperf-server.log"))
}

/// 读取服务端日志；日志不存在视为空测量，其他 I/O 错误向上传播
pub(crate) fn read_server_log(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "iperf 服务端日志不存在");
            Ok(String::new())
        }
        Err(err) => Err(err.into()),
    }
}
