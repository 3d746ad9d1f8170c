//! 错误类型
//!
//! 扫描引擎统一使用 [`PerfError`]，参数错误立即返回给调用方，不做重试。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PerfError {
    /// 范围/次数等参数非法，或导出内容为空
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// 未知的拓扑构建选项名
    #[error("invalid build option `{0}`, expected one of: default delay loss")]
    InvalidOption(String),

    /// 有界重试仍未拿到测量结果
    #[error("measurement still empty after {attempts} attempt(s)")]
    RetriesExhausted { attempts: u32 },

    #[error("unknown node `{0}`")]
    UnknownNode(String),

    /// 仿真器的配置命令返回非零
    #[error("command failed: {command}\n{stderr}")]
    Command { command: String, stderr: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("report codec: {0}")]
    Codec(#[from] bincode::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PerfError>;
