use anyhow::{Context, Result};
use clap::Parser;
use mirrorsync_lib::config::{default_config_file, SyncSettings};
use mirrorsync_lib::logging::{get_log_dir, LogConfig, SizeRotatingWriter};
use mirrorsync_lib::{CompareMode, PassJob, PassReport, PassScheduler, SyncEngine};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

/// 单向目录镜像：让副本目录与源目录保持一致
#[derive(Debug, Parser)]
#[command(name = "mirrorsync", version, about)]
struct Cli {
    /// 源目录（未指定时读取配置文件）
    source: Option<PathBuf>,

    /// 副本目录（未指定时读取配置文件）
    replica: Option<PathBuf>,

    /// 元数据相同时再比较文件内容
    #[arg(long)]
    verify: bool,

    /// 周期同步间隔（秒）；未指定时只执行一次
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,

    /// 配置文件路径
    #[arg(long, env = "MIRRORSYNC_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// 日志目录
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// 日志级别: error, warn, info, debug, trace
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// 以 JSON 输出每轮报告
    #[arg(long)]
    json: bool,
}

/// 初始化日志系统
fn init_logging(config: &LogConfig, log_dir: &Path) {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(config.tracing_level().into());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    // 文件日志层，创建失败时只输出到控制台
    let file_layer = if config.enabled {
        match SizeRotatingWriter::new(log_dir, config.max_size_mb) {
            Ok(writer) => Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            ),
            Err(e) => {
                eprintln!("无法创建日志文件 {}: {}", log_dir.display(), e);
                None
            }
        }
    } else {
        None
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer);

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn print_report(report: &PassReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
    } else {
        println!(
            "[{}] {} ({} ms)",
            report.pass_id, report.result, report.duration_ms
        );
    }
    Ok(())
}

fn exit_code(report: Option<&PassReport>) -> ExitCode {
    match report {
        Some(r) if r.result.has_errors() => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}

async fn run_app(cli: Cli) -> Result<ExitCode> {
    let config_file = cli.config.clone().unwrap_or_else(default_config_file);

    let mut log_config = LogConfig::load(&config_file);
    if let Some(level) = &cli.log_level {
        log_config.level = level.to_lowercase();
    }
    let log_dir = cli.log_dir.clone().unwrap_or_else(get_log_dir);
    init_logging(&log_config, &log_dir);

    let settings = SyncSettings::load(&config_file);
    let source = cli
        .source
        .or_else(|| settings.source.clone())
        .context("未指定源目录")?;
    let replica = cli
        .replica
        .or_else(|| settings.replica.clone())
        .context("未指定副本目录")?;
    let mode = if cli.verify {
        CompareMode::ContentVerified
    } else {
        settings.compare_mode()
    };
    let interval = cli.interval.or(settings.interval_secs);

    let job = PassJob {
        source,
        replica,
        mode,
    };
    let period = Duration::from_secs(interval.unwrap_or(1).max(1));
    let scheduler = PassScheduler::new(SyncEngine::default(), job, period);

    if interval.is_none() {
        let report = scheduler.run_once().await?;
        print_report(&report, cli.json)?;
        return Ok(exit_code(Some(&report)));
    }

    info!("周期同步已启动，间隔 {} 秒，按 Ctrl-C 停止", period.as_secs());
    let json = cli.json;
    let mut last = None;
    let passes = scheduler
        .run_until(
            async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("无法监听停止信号: {}", e);
                    std::future::pending::<()>().await;
                }
            },
            |report| {
                if let Err(e) = print_report(report, json) {
                    warn!("输出报告失败: {}", e);
                }
                last = Some(report.clone());
            },
        )
        .await;
    info!("共完成 {} 轮同步", passes);

    Ok(exit_code(last.as_ref()))
}

#[tokio::main]
async fn main() -> ExitCode {
    match run_app(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("错误: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
