//! 拓扑描述
//!
//! 定义交给仿真器实例化的拓扑：节点、链路及链路上的损伤参数。

use serde::{Deserialize, Serialize};

/// 节点标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// 链路标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Host,
    Switch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
}

/// 双向链路（仿真器在两端都施加相同的整形参数）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSpec {
    pub a: NodeId,
    pub b: NodeId,
    pub bandwidth_mbps: u32,
    /// 单向时延（毫秒）
    pub delay_ms: Option<u32>,
    /// 丢包率（整数百分比）
    pub loss_percent: Option<u32>,
}

impl LinkSpec {
    pub fn new(a: NodeId, b: NodeId, bandwidth_mbps: u32) -> Self {
        Self {
            a,
            b,
            bandwidth_mbps,
            delay_ms: None,
            loss_percent: None,
        }
    }

    /// 链路是否带有时延或丢包损伤
    pub fn is_impaired(&self) -> bool {
        self.delay_ms.is_some() || self.loss_percent.is_some()
    }
}

/// 拓扑描述：节点按加入顺序编号，链路同理。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySpec {
    nodes: Vec<NodeSpec>,
    links: Vec<LinkSpec>,
}

impl TopologySpec {
    /// 添加主机节点
    pub fn add_host(&mut self, name: impl Into<String>) -> NodeId {
        self.add_node(name.into(), NodeKind::Host)
    }

    /// 添加交换机节点
    pub fn add_switch(&mut self, name: impl Into<String>) -> NodeId {
        self.add_node(name.into(), NodeKind::Switch)
    }

    fn add_node(&mut self, name: String, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeSpec { id, name, kind });
        id
    }

    /// 连接两个节点
    pub fn add_link(&mut self, link: LinkSpec) -> LinkId {
        let id = LinkId(self.links.len());
        self.links.push(link);
        id
    }

    pub fn node(&self, id: NodeId) -> &NodeSpec {
        &self.nodes[id.0]
    }

    /// 按名字查找节点
    pub fn node_by_name(&self, name: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn nodes(&self) -> &[NodeSpec] {
        &self.nodes
    }

    pub fn hosts(&self) -> impl Iterator<Item = &NodeSpec> {
        self.nodes.iter().filter(|n| n.kind == NodeKind::Host)
    }

    pub fn switches(&self) -> impl Iterator<Item = &NodeSpec> {
        self.nodes.iter().filter(|n| n.kind == NodeKind::Switch)
    }

    pub fn links(&self) -> &[LinkSpec] {
        &self.links
    }

    pub fn link(&self, id: LinkId) -> &LinkSpec {
        &self.links[id.0]
    }
}
