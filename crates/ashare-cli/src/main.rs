//! A 股选股系统命令行入口。

use ashare_core::{AppConfig, LogFormat};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod workflow;

#[derive(Parser)]
#[command(name = "ashare")]
#[command(about = "A 股选股与行情缓存工具", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件路径（默认查找当前目录 config.yaml）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 日志级别覆盖（trace, debug, info, warn, error）
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 执行一轮完整选股：快照 → 行情 → 策略 → 推送
    Scan,

    /// 仅获取并缓存指定标的的行情
    Fetch {
        /// 标的代码，逗号分隔（例如 "600000,000001"）
        #[arg(long)]
        symbols: String,

        /// 起始日期（YYYY-MM-DD，缺省取配置值）
        #[arg(long)]
        start_date: Option<NaiveDate>,
    },

    /// 定时模式：每个工作日到点自动执行一轮选股
    Daemon,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let format: LogFormat = config.logging.format.parse().unwrap_or_default();
    ashare_core::init_logging(&level, format)
        .map_err(|e| anyhow::anyhow!("日志初始化失败: {}", e))?;

    tracing::info!("AShare Screener 启动");

    match cli.command {
        Commands::Scan => workflow::run_scan(&config).await?,
        Commands::Fetch {
            symbols,
            start_date,
        } => workflow::run_fetch(&config, &symbols, start_date).await?,
        Commands::Daemon => workflow::run_daemon(&config).await?,
    }

    tracing::info!("AShare Screener 退出");
    Ok(())
}
