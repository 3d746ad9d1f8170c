//! 子进程辅助函数

use std::process::{Command, Output};

use tracing::trace;

use crate::error::{PerfError, Result};

/// 执行 `sudo <args>`，返回原始输出
pub(crate) fn sudo(args: &[&str]) -> Result<Output> {
    trace!(cmd = %args.join(" "), "sudo");
    Ok(Command::new("sudo").args(args).output()?)
}

/// 执行 `sudo <args>`，非零退出码转成 [`PerfError::Command`]
pub(crate) fn sudo_checked(args: &[&str]) -> Result<Output> {
    let output = sudo(args)?;
    if !output.status.success() {
        return Err(PerfError::Command {
            command: format!("sudo {}", args.join(" ")),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

/// stdout 在前、stderr 在后拼成一个字符串
pub(crate) fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}

/// 是否具备 netns 实验所需的 `ip` 工具和免密 sudo
pub fn check_privileges() -> bool {
    let has_ip = Command::new("ip")
        .arg("netns")
        .output()
        .is_ok_and(|o| o.status.success());

    has_ip
        && Command::new("sudo")
            .args(["-n", "ip", "netns", "list"])
            .output()
            .is_ok_and(|o| o.status.success())
}
