//! 测试用的脚本化仿真器：记录每次建拓扑、每条命令，按脚本返回输出

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::emu::{EmuNet, EmuNode, Emulator, IPERF_SERVER_CMD, ThroughputPair};
use crate::error::{PerfError, Result};
use crate::topo::TopologySpec;

pub(crate) type Reply = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

#[derive(Debug, Default)]
pub(crate) struct FakeLog {
    pub builds: Vec<TopologySpec>,
    /// (节点名, 命令)
    pub commands: Vec<(String, String)>,
    pub iperf_calls: usize,
    pub stops: usize,
}

pub(crate) struct FakeEmulator {
    pub log: Arc<Mutex<FakeLog>>,
    reply: Reply,
    iperf_script: Arc<Mutex<VecDeque<Option<ThroughputPair>>>>,
}

impl FakeEmulator {
    /// `reply(node, command)` 决定每条命令的输出
    pub fn new(reply: impl Fn(&str, &str) -> String + Send + Sync + 'static) -> Self {
        Self {
            log: Arc::new(Mutex::new(FakeLog::default())),
            reply: Arc::new(reply),
            iperf_script: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// 客户端 iperf 命令一律返回固定带宽的报告行
    pub fn constant(mbps: f64) -> Self {
        Self::new(move |node, cmd| {
            if node == "h2" && cmd.starts_with("iperf") {
                iperf_line(mbps)
            } else {
                String::new()
            }
        })
    }

    /// `EmuNet::iperf` 依次返回的结果；脚本用完后一直返回空结果
    pub fn with_iperf_script(self, script: Vec<Option<ThroughputPair>>) -> Self {
        *self.iperf_script.lock().expect("script lock") = script.into();
        self
    }

    pub fn builds(&self) -> Vec<TopologySpec> {
        self.log.lock().expect("log lock").builds.clone()
    }

    pub fn commands(&self) -> Vec<(String, String)> {
        self.log.lock().expect("log lock").commands.clone()
    }

    pub fn iperf_calls(&self) -> usize {
        self.log.lock().expect("log lock").iperf_calls
    }

    pub fn stops(&self) -> usize {
        self.log.lock().expect("log lock").stops
    }
}

impl Emulator for FakeEmulator {
    fn start(&mut self, topo: &TopologySpec) -> Result<Box<dyn EmuNet>> {
        self.log.lock().expect("log lock").builds.push(topo.clone());
        let nodes = topo
            .hosts()
            .enumerate()
            .map(|(i, h)| FakeNode {
                name: h.name.clone(),
                ip: format!("10.0.0.{}", i + 1),
                log: Arc::clone(&self.log),
                reply: Arc::clone(&self.reply),
            })
            .collect();
        Ok(Box::new(FakeNet {
            nodes,
            log: Arc::clone(&self.log),
            iperf_script: Arc::clone(&self.iperf_script),
        }))
    }
}

struct FakeNet {
    nodes: Vec<FakeNode>,
    log: Arc<Mutex<FakeLog>>,
    iperf_script: Arc<Mutex<VecDeque<Option<ThroughputPair>>>>,
}

impl EmuNet for FakeNet {
    fn node(&self, name: &str) -> Result<&dyn EmuNode> {
        let node: &dyn EmuNode = self
            .nodes
            .iter()
            .find(|n| n.name == name)
            .ok_or_else(|| PerfError::UnknownNode(name.to_string()))?;
        Ok(node)
    }

    fn ping_all(&self) -> Result<f64> {
        Ok(0.0)
    }

    /// 服务端启动记作 server 节点上的一条命令
    fn start_server(&self, server: &str) -> Result<()> {
        self.node(server)?.cmd(IPERF_SERVER_CMD)?;
        Ok(())
    }

    fn iperf(&self, _client: &str, _server: &str, _seconds: u32) -> Result<Option<ThroughputPair>> {
        self.log.lock().expect("log lock").iperf_calls += 1;
        Ok(self
            .iperf_script
            .lock()
            .expect("script lock")
            .pop_front()
            .flatten())
    }

    fn stop(self: Box<Self>) -> Result<()> {
        self.log.lock().expect("log lock").stops += 1;
        Ok(())
    }
}

struct FakeNode {
    name: String,
    ip: String,
    log: Arc<Mutex<FakeLog>>,
    reply: Reply,
}

impl EmuNode for FakeNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn ip(&self) -> &str {
        &self.ip
    }

    fn cmd(&self, command: &str) -> Result<String> {
        self.log
            .lock()
            .expect("log lock")
            .commands
            .push((self.name.clone(), command.to_string()));
        Ok((self.reply)(&self.name, command))
    }
}

/// iperf 2 客户端汇总行
pub(crate) fn iperf_line(mbps: f64) -> String {
    format!("[  3]  0.0-10.0 sec  1100 MBytes  {mbps} Mbits/sec\n")
}

pub(crate) fn pair(server_mbps: f64, client_mbps: f64) -> ThroughputPair {
    ThroughputPair {
        server_mbps,
        client_mbps,
    }
}

pub(crate) fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-9, "{actual:?} vs {expected:?}");
    }
}
