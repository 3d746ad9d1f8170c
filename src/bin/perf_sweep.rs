//! 单交换机拓扑吞吐量扫描
//!
//! 在 1 交换机 + 2 主机的 netns 拓扑上，分别以文件大小、时延、丢包率为变量
//! 测量 TCP 吞吐量，多次运行后输出 sum/mean/stddev。

use clap::{ArgGroup, Parser};
use netperf_sweep::emu::NetnsEmulator;
use netperf_sweep::report;
use netperf_sweep::stats::{MetricAggregate, aggregate_all};
use netperf_sweep::sweep::SweepConfig;
use netperf_sweep::topo::BuildOptionState;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "perf-sweep",
    about = "Network performance analysis on a 1-switch/2-host topology: file size, latency, loss rate"
)]
#[command(group(ArgGroup::new("source").required(true).args(["runs", "file"])))]
struct Args {
    /// 三个测试各运行的次数
    #[arg(short, long)]
    runs: Option<usize>,

    /// 加载之前导出的二进制报告
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// 导出二进制报告
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 打印汇总结果
    #[arg(short, long)]
    print: bool,

    /// 导出带标签的 JSON 报告
    #[arg(long)]
    json: Option<PathBuf>,

    /// 测试参数（JSON），不填则使用默认参数
    #[arg(long)]
    config: Option<PathBuf>,

    /// 等待 iperf 服务端开始监听的上限（毫秒）
    #[arg(long, default_value_t = 2000)]
    listen_timeout_ms: u64,

    /// 关闭日志输出
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(if args.quiet {
            tracing_subscriber::EnvFilter::new("off")
        } else {
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        })
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let report: Vec<MetricAggregate> = match (&args.runs, &args.file) {
        (Some(runs), _) => {
            let config = match &args.config {
                Some(path) => SweepConfig::from_json_file(path)?,
                None => SweepConfig::default(),
            };
            let mut emu = NetnsEmulator::new()
                .with_listen_timeout(Duration::from_millis(args.listen_timeout_ms));
            let mut options = BuildOptionState::new();
            aggregate_all(&config.runners(), *runs, &mut emu, &mut options)?
        }
        (None, Some(path)) => report::load(path)?,
        (None, None) => unreachable!("clap requires --runs or --file"),
    };

    if let Some(path) = &args.output {
        report::save(path, &report)?;
    }
    if let Some(path) = &args.json {
        report::export_json(path, &report)?;
    }
    if args.print {
        print!("{}", report::render(&report));
    }
    Ok(())
}
