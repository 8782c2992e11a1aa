//! 配置管理。
//!
//! 应用配置从三层来源合并：内置默认值、`config.yaml`、
//! `ASHARE__` 前缀的环境变量（`__` 作层级分隔符）。
//! 核心组件不读取任何全局状态，全部配置经构造函数显式注入。

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// 应用配置。
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 数据目录与日期范围
    #[serde(default)]
    pub data: DataConfig,
    /// 行情获取（限速、重试、并发）
    #[serde(default)]
    pub fetch: FetchSettings,
    /// 日志
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 消息推送
    #[serde(default)]
    pub push: PushConfig,
    /// 选股范围过滤
    #[serde(default)]
    pub screen: ScreenConfig,
    /// 定时任务
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// 各策略参数（键为策略名，值为该策略的配置节）
    #[serde(default)]
    pub strategies: HashMap<String, serde_json::Value>,
}

/// 数据目录与日期范围配置。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    /// 缓存目录（每标的一个 CSV 文件）
    pub cache_dir: String,
    /// 历史数据请求起始日
    pub start_date: NaiveDate,
    /// 评估截止日（缺省为当天，仅回看历史时设置）
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            cache_dir: "stock_data_cache".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: None,
        }
    }
}

/// 行情获取配置。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchSettings {
    /// 滑动窗口内允许的上游调用次数
    #[serde(default = "default_rate_limit_calls")]
    pub rate_limit_calls: usize,
    /// 滑动窗口长度（秒）
    #[serde(default = "default_rate_limit_window")]
    pub rate_limit_window_secs: u64,
    /// 最大并发工作任务数
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// 上游请求总尝试次数（含首次）
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// 重试退避基础延迟（毫秒）
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,
    /// 单次请求超时（秒）
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// 清洗合并后的最低可用行数，低于该值降级返回缓存
    #[serde(default = "default_min_rows")]
    pub min_rows: usize,
    /// 收盘数据发布判定时刻（"HH:MM"，交易所本地时间）
    #[serde(default = "default_cutoff_time")]
    pub cutoff_time: String,
    /// 分批大小（0 表示不分批，仅用于平滑突发请求）
    #[serde(default)]
    pub batch_size: usize,
    /// 批间延迟（毫秒）
    #[serde(default = "default_batch_delay")]
    pub batch_delay_ms: u64,
}

fn default_rate_limit_calls() -> usize {
    5
}
fn default_rate_limit_window() -> u64 {
    60
}
fn default_max_workers() -> usize {
    8
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_retry_base_delay() -> u64 {
    1000
}
fn default_request_timeout() -> u64 {
    30
}
fn default_min_rows() -> usize {
    30
}
fn default_cutoff_time() -> String {
    "15:00".to_string()
}
fn default_batch_delay() -> u64 {
    500
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            rate_limit_calls: default_rate_limit_calls(),
            rate_limit_window_secs: default_rate_limit_window(),
            max_workers: default_max_workers(),
            retry_attempts: default_retry_attempts(),
            retry_base_delay_ms: default_retry_base_delay(),
            request_timeout_secs: default_request_timeout(),
            min_rows: default_min_rows(),
            cutoff_time: default_cutoff_time(),
            batch_size: 0,
            batch_delay_ms: default_batch_delay(),
        }
    }
}

impl FetchSettings {
    /// 解析收盘判定时刻，非法配置回退到 15:00。
    pub fn cutoff(&self) -> NaiveTime {
        NaiveTime::parse_from_str(&self.cutoff_time, "%H:%M")
            .unwrap_or_else(|_| NaiveTime::from_hms_opt(15, 0, 0).unwrap())
    }
}

/// 日志配置。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 日志级别（如 "info"、"ashare_data=debug"）
    pub level: String,
    /// 输出格式（pretty、json、compact）
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 推送配置（WxPusher）。
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PushConfig {
    /// 是否启用推送
    pub enabled: bool,
    /// WxPusher 应用 token
    #[serde(default)]
    pub app_token: String,
    /// 接收用户 UID 列表
    #[serde(default)]
    pub uids: Vec<String>,
}

/// 选股范围过滤配置。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScreenConfig {
    /// 排除科创板（688 开头）
    #[serde(default = "default_true")]
    pub exclude_star_market: bool,
    /// 排除创业板（300 开头）
    #[serde(default = "default_true")]
    pub exclude_chinext: bool,
    /// 排除 ST 标的
    #[serde(default = "default_true")]
    pub exclude_st: bool,
    /// 最低总市值（元）
    #[serde(default = "default_min_market_cap")]
    pub min_market_cap: Decimal,
    /// 机构席位榜代码列表（"高而窄的旗形" 策略门槛）
    #[serde(default)]
    pub top_list: Vec<String>,
}

fn default_true() -> bool {
    true
}
fn default_min_market_cap() -> Decimal {
    Decimal::new(10_000_000_000, 0)
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            exclude_star_market: true,
            exclude_chinext: true,
            exclude_st: true,
            min_market_cap: default_min_market_cap(),
            top_list: Vec::new(),
        }
    }
}

/// 定时任务配置。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleConfig {
    /// 每个工作日的执行时刻（"HH:MM"，交易所本地时间）
    #[serde(default = "default_exec_time")]
    pub exec_time: String,
}

fn default_exec_time() -> String {
    "15:15".to_string()
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            exec_time: default_exec_time(),
        }
    }
}

impl ScheduleConfig {
    /// 解析执行时刻，非法配置回退到 15:15。
    pub fn exec_at(&self) -> NaiveTime {
        NaiveTime::parse_from_str(&self.exec_time, "%H:%M")
            .unwrap_or_else(|_| NaiveTime::from_hms_opt(15, 15, 0).unwrap())
    }
}

impl AppConfig {
    /// 从文件与环境变量加载配置。
    ///
    /// 文件不存在时使用内置默认值，环境变量始终可覆盖。
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = match path {
            Some(p) => builder.add_source(config::File::from(p.as_ref()).required(false)),
            None => builder.add_source(config::File::with_name("config").required(false)),
        };

        builder = builder.add_source(
            config::Environment::with_prefix("ASHARE")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.fetch.rate_limit_calls, 5);
        assert_eq!(config.fetch.rate_limit_window_secs, 60);
        assert_eq!(config.fetch.max_workers, 8);
        assert_eq!(config.data.cache_dir, "stock_data_cache");
        assert!(!config.push.enabled);
    }

    #[test]
    fn test_cutoff_parse() {
        let mut fetch = FetchSettings::default();
        assert_eq!(fetch.cutoff(), NaiveTime::from_hms_opt(15, 0, 0).unwrap());
        fetch.cutoff_time = "09:30".to_string();
        assert_eq!(fetch.cutoff(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        fetch.cutoff_time = "bogus".to_string();
        assert_eq!(fetch.cutoff(), NaiveTime::from_hms_opt(15, 0, 0).unwrap());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = AppConfig::load(Some("/nonexistent/config.yaml")).unwrap();
        assert_eq!(config.fetch.retry_attempts, 3);
        assert_eq!(config.schedule.exec_time, "15:15");
    }
}
