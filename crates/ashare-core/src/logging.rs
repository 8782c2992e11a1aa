//! 基于 tracing 的日志基础设施。
//!
//! 支持三种输出格式：
//! - **pretty**：开发用，带颜色的多行格式
//! - **json**：生产/日志采集用
//! - **compact**：单行紧凑格式

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// 日志输出格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 带颜色的易读格式（开发用）
    #[default]
    Pretty,
    /// JSON 格式（生产用）
    Json,
    /// 紧凑单行格式
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            _ => Err(format!("未知日志格式: {}", s)),
        }
    }
}

/// 初始化日志系统。
///
/// `level` 为 `EnvFilter` 指令（`RUST_LOG` 环境变量优先）。
pub fn init_logging(level: &str, format: LogFormat) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_target(true))
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_target(true))
                .try_init()?;
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact().with_target(true))
                .try_init()?;
        }
    }

    tracing::info!(format = ?format, level = %level, "日志系统初始化完成");
    Ok(())
}
