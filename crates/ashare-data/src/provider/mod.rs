//! 上游行情数据源抽象。
//!
//! 上游被视为不可靠协作方：可能抛错、可能返回空、字段可能缺失。
//! `Fetcher` 在采信其输出前会做防御性校验与填充。

pub mod eastmoney;

pub use eastmoney::EastmoneyProvider;

use ashare_core::Symbol;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// 复权方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Adjustment {
    /// 不复权
    None,
    /// 前复权
    #[default]
    Forward,
    /// 后复权
    Backward,
}

/// 上游返回的原始日线行。
///
/// 数值字段保留 `Option`：上游的稀疏空值在这里显式呈现，
/// 由获取管线按「前向填充 → 后向填充 → 补零」策略统一处理。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: Option<Decimal>,
    pub close: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    /// 成交量（股）
    pub volume: Option<Decimal>,
    /// 成交额（元）
    pub amount: Option<Decimal>,
    /// 换手率（%）
    pub turnover_rate: Option<Decimal>,
}

/// 上游数据源错误。
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP 请求失败（连接、超时等）
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// 上游返回非 2xx 状态码
    #[error("Upstream returned status {0}")]
    Status(u16),

    /// 未知证券代码（上游无此标的）
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    /// 上游返回空结果
    #[error("Upstream returned empty result")]
    Empty,

    /// 响应格式异常（字段缺失、无法解析）
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// 是否为瞬态错误（值得退避重试）。
    ///
    /// 瞬态：网络超时/连接失败、429、5xx。
    /// 永久：未知代码、空结果、格式异常——重试不会改变结果。
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Status(code) => *code == 429 || *code >= 500,
            Self::UnknownSymbol(_) | Self::Empty | Self::Malformed(_) => false,
        }
    }
}

/// 日线历史数据源。
///
/// 实现方返回 `[start, end]`（含两端）范围内的原始日线行，
/// 顺序不作要求，调用方负责排序与去重。
#[async_trait]
pub trait DailyBarProvider: Send + Sync {
    async fn daily_history(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
        adjust: Adjustment,
    ) -> std::result::Result<Vec<RawBar>, ProviderError>;
}

/// 实时快照行（全市场列表，选股工作流使用）。
#[derive(Debug, Clone)]
pub struct SpotQuote {
    pub code: String,
    pub name: String,
    /// 当日涨跌幅（%）
    pub pct_change: Option<Decimal>,
    /// 总市值（元）
    pub market_cap: Option<Decimal>,
}
