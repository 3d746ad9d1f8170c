//! 拓扑构建选项
//!
//! 三选一（单选按钮）的链路损伤配置：`default` / `delay` / `loss`。
//! 设置任意一个选项都会清零其余选项，因此同一时刻最多只有一种损伤生效。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PerfError, Result};

/// 当前生效的构建选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BuildOption {
    Default(u32),
    /// 单向时延（毫秒）
    Delay(u32),
    /// 丢包率（整数百分比）
    Loss(u32),
}

impl BuildOption {
    pub fn kind(self) -> BuildOptionKind {
        match self {
            BuildOption::Default(_) => BuildOptionKind::Default,
            BuildOption::Delay(_) => BuildOptionKind::Delay,
            BuildOption::Loss(_) => BuildOptionKind::Loss,
        }
    }

    pub fn magnitude(self) -> u32 {
        match self {
            BuildOption::Default(v) | BuildOption::Delay(v) | BuildOption::Loss(v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildOptionKind {
    Default,
    Delay,
    Loss,
}

impl BuildOptionKind {
    pub const ALL: [BuildOptionKind; 3] = [
        BuildOptionKind::Default,
        BuildOptionKind::Delay,
        BuildOptionKind::Loss,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BuildOptionKind::Default => "default",
            BuildOptionKind::Delay => "delay",
            BuildOptionKind::Loss => "loss",
        }
    }

    pub fn with_magnitude(self, magnitude: u32) -> BuildOption {
        match self {
            BuildOptionKind::Default => BuildOption::Default(magnitude),
            BuildOptionKind::Delay => BuildOption::Delay(magnitude),
            BuildOptionKind::Loss => BuildOption::Loss(magnitude),
        }
    }
}

impl fmt::Display for BuildOptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BuildOptionKind {
    type Err = PerfError;

    fn from_str(s: &str) -> Result<Self> {
        BuildOptionKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| PerfError::InvalidOption(s.to_string()))
    }
}

/// `get()` 的结果：生效选项保存其数值，其余为 0。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildOptionSnapshot {
    pub default: u32,
    pub delay: u32,
    pub loss: u32,
}

/// 构建选项状态。
///
/// 由调用方持有并以 `&mut` 传给各个测试，取代进程级全局变量。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptionState {
    active: BuildOption,
}

impl Default for BuildOptionState {
    fn default() -> Self {
        Self {
            active: BuildOption::Default(1),
        }
    }
}

impl BuildOptionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> BuildOptionSnapshot {
        let mut snap = BuildOptionSnapshot::default();
        match self.active {
            BuildOption::Default(v) => snap.default = v,
            BuildOption::Delay(v) => snap.delay = v,
            BuildOption::Loss(v) => snap.loss = v,
        }
        snap
    }

    pub fn option(&self) -> BuildOption {
        self.active
    }

    /// 按名称设置选项，其余选项清零。
    pub fn set(&mut self, name: &str, magnitude: u32) -> Result<()> {
        let kind: BuildOptionKind = name.parse()?;
        self.select(kind.with_magnitude(magnitude));
        Ok(())
    }

    pub fn select(&mut self, option: BuildOption) {
        debug!(from = ?self.active, to = ?option, "切换构建选项");
        self.active = option;
    }

    pub fn reset(&mut self) {
        self.select(BuildOption::Default(1));
    }
}
