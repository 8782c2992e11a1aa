//! 单标的行情获取管线。
//!
//! 把缓存、限速、重试、上游调用串成一条管线：
//!
//! ```text
//! 查缓存 ──损坏──▶ 删除, 按无缓存处理
//!    │
//!    ▼
//! 新鲜度判定 ──Fresh──▶ 直接返回缓存 (零上游调用)
//!    │
//!    ▼ 计算最小缺失区间
//! 限速闸门 → 上游调用 (瞬态错误退避重试)
//!    │                      │
//!    ▼ 成功                 ▼ 最终失败
//! 清洗(填充) → 合并 → 落盘   降级返回缓存
//! ```
//!
//! 管线没有会向调用方抛出的终态：单标的的彻底失败降级为空序列或
//! 过期序列，批量调用方无需针对单标的做异常处理。

use crate::cache::CacheStore;
use crate::provider::{Adjustment, DailyBarProvider, ProviderError, RawBar};
use crate::rate_limit::RateLimiter;
use crate::retry::RetryPolicy;
use ashare_core::{Bar, Symbol, TimeSeries};
use chrono::{NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 获取管线配置。
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// 复权方式
    pub adjust: Adjustment,
    /// 清洗合并后的最低可用行数，低于该值降级返回缓存
    pub min_rows: usize,
    /// 收盘数据发布判定时刻
    pub cutoff: NaiveTime,
    /// 交易所时区
    pub timezone: Tz,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            adjust: Adjustment::Forward,
            min_rows: 30,
            cutoff: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            timezone: chrono_tz::Asia::Shanghai,
        }
    }
}

/// 降级原因。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradeReason {
    /// 上游调用在重试耗尽后仍然失败
    UpstreamFailed,
    /// 上游返回空结果
    EmptyResponse,
    /// 清洗合并后可用行数不足
    TooFewRows,
}

impl fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpstreamFailed => write!(f, "upstream_failed"),
            Self::EmptyResponse => write!(f, "empty_response"),
            Self::TooFewRows => write!(f, "too_few_rows"),
        }
    }
}

/// 单次获取的结果。
///
/// 调用方可据此区分「缓存直出」「增量合并」与「降级回退」，
/// 三种终态都携带可用序列，永不携带错误。
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// 缓存新鲜，未发生上游调用
    Cached(TimeSeries),
    /// 已拉取增量并合并落盘
    Merged(TimeSeries),
    /// 获取失败，回退到最佳可用缓存（可能为空）
    Degraded {
        series: TimeSeries,
        reason: DegradeReason,
    },
}

impl FetchOutcome {
    pub fn series(&self) -> &TimeSeries {
        match self {
            Self::Cached(s) | Self::Merged(s) => s,
            Self::Degraded { series, .. } => series,
        }
    }

    pub fn into_series(self) -> TimeSeries {
        match self {
            Self::Cached(s) | Self::Merged(s) => s,
            Self::Degraded { series, .. } => series,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// 单标的行情获取器。
///
/// 限速器与重试策略由外部注入，行为可独立测试；
/// 同一标的在一轮运行中由调用方保证至多一个进行中的获取任务。
pub struct Fetcher<P> {
    provider: P,
    cache: CacheStore,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    config: FetchConfig,
}

impl<P: DailyBarProvider> Fetcher<P> {
    pub fn new(
        provider: P,
        cache: CacheStore,
        limiter: Arc<RateLimiter>,
        retry: RetryPolicy,
        config: FetchConfig,
    ) -> Self {
        Self {
            provider,
            cache,
            limiter,
            retry,
            config,
        }
    }

    /// 返回该标的自 `start` 起的最新时间序列。
    ///
    /// 缓存新鲜时零上游调用；否则只拉取缺失区间。任何失败都降级为
    /// 返回最佳可用数据，绝不向调用方抛错。
    pub async fn fetch(&self, symbol: &Symbol, start: NaiveDate) -> FetchOutcome {
        let cached = match self.cache.read(symbol) {
            Ok(series) => series,
            Err(e) => {
                warn!(symbol = %symbol.code, error = %e, "缓存条目损坏, 删除后全量重拉");
                if let Err(e) = self.cache.remove(symbol) {
                    warn!(symbol = %symbol.code, error = %e, "删除损坏缓存条目失败");
                }
                None
            }
        };

        let now = Utc::now().with_timezone(&self.config.timezone).naive_local();
        let freshness = CacheStore::freshness(cached.as_ref(), start, now, self.config.cutoff);

        let fetch_from = match freshness.fetch_from() {
            None => {
                let series = cached.unwrap_or_default();
                debug!(symbol = %symbol.code, rows = series.len(), "缓存新鲜, 直接返回");
                return FetchOutcome::Cached(series);
            }
            Some(from) => from,
        };

        debug!(symbol = %symbol.code, freshness = ?freshness, "缓存需更新");
        let fallback = cached.clone().unwrap_or_default();

        let rows = match self.call_upstream(symbol, fetch_from, now.date()).await {
            Ok(rows) => rows,
            Err(e) => {
                let reason = if matches!(e, ProviderError::Empty) {
                    DegradeReason::EmptyResponse
                } else {
                    DegradeReason::UpstreamFailed
                };
                warn!(symbol = %symbol.code, error = %e, "上游获取失败, 降级返回缓存数据");
                return FetchOutcome::Degraded {
                    series: fallback,
                    reason,
                };
            }
        };

        let incoming = TimeSeries::from_bars(clean_rows(rows));
        let merged = match &cached {
            Some(existing) => existing.merge(&incoming),
            None => incoming,
        };

        if merged.len() < self.config.min_rows {
            warn!(
                symbol = %symbol.code,
                rows = merged.len(),
                min_rows = self.config.min_rows,
                "清洗合并后行数不足, 降级返回缓存数据"
            );
            return FetchOutcome::Degraded {
                series: fallback,
                reason: DegradeReason::TooFewRows,
            };
        }

        if let Err(e) = self.cache.write(symbol, &merged) {
            // 本轮数据仍然可用, 落盘失败留待下一轮重拉
            warn!(symbol = %symbol.code, error = %e, "缓存写入失败");
        }

        info!(symbol = %symbol.code, rows = merged.len(), "行情更新完成");
        FetchOutcome::Merged(merged)
    }

    /// 经限速闸门调用上游，瞬态错误按策略退避重试。
    async fn call_upstream(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawBar>, ProviderError> {
        let mut attempt: u32 = 0;
        loop {
            self.limiter.acquire().await;
            match self
                .provider
                .daily_history(symbol, start, end, self.config.adjust)
                .await
            {
                Ok(rows) => return Ok(rows),
                Err(e) if e.is_transient() && attempt + 1 < self.retry.max_attempts => {
                    let delay = self.retry.delay(attempt);
                    warn!(
                        symbol = %symbol.code,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "上游请求瞬态失败, 退避重试"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// 清洗上游原始行：按日期排序后逐列「前向填充 → 后向填充 → 补零」。
///
/// 清洗后的行不含缺失值，序列上的算术运算不会因空值失败。
fn clean_rows(mut rows: Vec<RawBar>) -> Vec<Bar> {
    rows.sort_by_key(|r| r.date);

    let mut open: Vec<Option<Decimal>> = rows.iter().map(|r| r.open).collect();
    let mut close: Vec<Option<Decimal>> = rows.iter().map(|r| r.close).collect();
    let mut high: Vec<Option<Decimal>> = rows.iter().map(|r| r.high).collect();
    let mut low: Vec<Option<Decimal>> = rows.iter().map(|r| r.low).collect();
    let mut volume: Vec<Option<Decimal>> = rows.iter().map(|r| r.volume).collect();
    let mut amount: Vec<Option<Decimal>> = rows.iter().map(|r| r.amount).collect();
    let mut turnover: Vec<Option<Decimal>> = rows.iter().map(|r| r.turnover_rate).collect();

    for column in [
        &mut open,
        &mut close,
        &mut high,
        &mut low,
        &mut volume,
        &mut amount,
        &mut turnover,
    ] {
        fill_column(column);
    }

    rows.iter()
        .enumerate()
        .map(|(i, r)| {
            Bar::new(
                r.date,
                open[i].unwrap_or_default(),
                close[i].unwrap_or_default(),
                high[i].unwrap_or_default(),
                low[i].unwrap_or_default(),
                volume[i].unwrap_or_default(),
                amount[i].unwrap_or_default(),
                turnover[i].unwrap_or_default(),
            )
        })
        .collect()
}

fn fill_column(values: &mut [Option<Decimal>]) {
    let mut last = None;
    for v in values.iter_mut() {
        if v.is_some() {
            last = *v;
        } else if last.is_some() {
            *v = last;
        }
    }
    let mut next = None;
    for v in values.iter_mut().rev() {
        if v.is_some() {
            next = *v;
        } else if next.is_some() {
            *v = next;
        }
    }
    for v in values.iter_mut() {
        if v.is_none() {
            *v = Some(Decimal::ZERO);
        }
    }
}
