//! 文件大小测试
//!
//! 无时延/丢包的拓扑上依次传输 2^e MB（e ∈ [min_exp, max_exp)）。
//! 整个范围只建一次拓扑，服务端只启动一次。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{
    CLIENT_HOST, Metric, Record, SERVER_HOST, TrialRunner, check_range,
    last_sample, provision, record_point,
};
use crate::emu::{EmuNode, Emulator};
use crate::error::{PerfError, Result};
use crate::topo::{BuildOptionState, DEFAULT_HOST_COUNT, build_single_switch};

/// 2^20 MB = 1 TiB
const MAX_EXP: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSizeTrial {
    /// 指数上下界，传输 2^min_exp .. 2^(max_exp-1) MB
    pub min_exp: u32,
    pub max_exp: u32,
    /// 先用 dd 从 urandom 生成文件再让 iperf 发送；关闭时改用 `iperf -n`，
    /// 后者偶尔会在报告里丢行
    pub use_dd: bool,
    /// dd 生成临时文件的目录
    pub work_dir: PathBuf,
}

impl Default for FileSizeTrial {
    fn default() -> Self {
        Self {
            min_exp: 1,
            max_exp: 11,
            use_dd: true,
            work_dir: std::env::temp_dir(),
        }
    }
}

impl FileSizeTrial {
    pub fn new(min_exp: u32, max_exp: u32) -> Self {
        Self {
            min_exp,
            max_exp,
            ..Self::default()
        }
    }

    /// 单次传输的数据量（MB）
    pub fn sizes_mb(&self) -> impl Iterator<Item = u64> {
        (self.min_exp..self.max_exp).map(|e| 1u64 << e)
    }

    fn transfer(&self, client: &dyn EmuNode, server_ip: &str, mb: u64) -> Result<String> {
        if !self.use_dd {
            return client.cmd(&format!("iperf -f m -c {server_ip} -n {mb}M"));
        }
        let file = self.work_dir.join(format!("{mb}M"));
        let file = file.display();
        client.cmd(&format!(
            "dd if=/dev/urandom of={file} bs=1M count={mb} iflag=fullblock"
        ))?;
        let report = client.cmd(&format!("iperf -f m -c {server_ip} -F {file}"))?;
        client.cmd(&format!("rm -f {file}"))?;
        client.cmd("sync")?;
        Ok(report)
    }
}

impl TrialRunner for FileSizeTrial {
    fn metric(&self) -> Metric {
        Metric::FileSize
    }

    fn points(&self) -> usize {
        self.max_exp.saturating_sub(self.min_exp) as usize
    }

    fn validate(&self) -> Result<()> {
        check_range("file size exponent", self.min_exp, self.max_exp)?;
        if self.max_exp > MAX_EXP {
            return Err(PerfError::InvalidArgument(format!(
                "file size exponent {} exceeds {MAX_EXP}",
                self.max_exp
            )));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, emu, options), fields(min_exp = self.min_exp, max_exp = self.max_exp))]
    fn run(&self, emu: &mut dyn Emulator, options: &mut BuildOptionState) -> Result<Record> {
        self.validate()?;
        info!("📦 文件大小测试开始");

        options.reset();
        let topo = build_single_switch(DEFAULT_HOST_COUNT, options)?;
        let net = provision(emu, &topo)?;
        let mut record = Record::new(Metric::FileSize, self.points());
        {
            let server = net.node(SERVER_HOST)?;
            let client = net.node(CLIENT_HOST)?;
            info!(server = %server.ip(), client = %client.ip(), "测试 h1 与 h2 之间的带宽");
            net.start_server(SERVER_HOST)?;

            for mb in self.sizes_mb() {
                info!(size_mb = mb, "文件大小");
                let report = self.transfer(client, server.ip(), mb)?;
                record_point(&mut record, mb, last_sample(&report));
            }
        }
        net.stop()?;

        if !record.is_complete() {
            warn!(
                expected = record.expected,
                got = record.len(),
                "文件大小测试有样本缺失"
            );
        }
        Ok(record)
    }
}
