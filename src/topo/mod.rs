//! 拓扑模块
//!
//! 拓扑描述、构建选项状态机以及单交换机拓扑构建。

mod build_option;
mod single_switch;
mod spec;

pub use build_option::{BuildOption, BuildOptionKind, BuildOptionSnapshot, BuildOptionState};
pub use single_switch::{
    DEFAULT_HOST_COUNT, LINK_BANDWIDTH_MBPS, SWITCH_NAME, build_single_switch, host_name,
};
pub use spec::{LinkId, LinkSpec, NodeId, NodeKind, NodeSpec, TopologySpec};
