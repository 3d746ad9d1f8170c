//! 重试策略
//!
//! 丢包注入时 iperf 偶尔连不上，测量返回空结果。策略对同一操作原样重试，
//! 没有退避；`max_attempts = None` 表示无限重试。

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{PerfError, Result};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// 总尝试次数上限（含第一次）
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
        }
    }
}

impl RetryPolicy {
    pub fn bounded(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
        }
    }

    pub fn unbounded() -> Self {
        Self { max_attempts: None }
    }

    /// 上限至少为 1 次
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == Some(0) {
            return Err(PerfError::InvalidArgument(
                "retry max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// 反复调用 `op(attempt)`（attempt 从 1 开始）直到返回 `Some`。
    ///
    /// `op` 返回的错误直接向上传播，不计入重试。
    pub fn run<T, F>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Result<Option<T>>,
    {
        self.validate()?;
        let mut attempt = 1u32;
        loop {
            if let Some(value) = op(attempt)? {
                return Ok(value);
            }
            if self.max_attempts.is_some_and(|max| attempt >= max) {
                return Err(PerfError::RetriesExhausted { attempts: attempt });
            }
            warn!(label, retry = attempt, "🔁 测量结果为空，重试");
            attempt = attempt.saturating_add(1);
        }
    }
}
