//! 测试用上游数据源桩。

use crate::provider::{Adjustment, DailyBarProvider, ProviderError, RawBar};
use ashare_core::Symbol;
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// 生成自 `start` 起连续 `n` 个自然日的原始日线。
pub fn raw_bars(start: NaiveDate, n: usize) -> Vec<RawBar> {
    (0..n)
        .map(|i| {
            let close = Decimal::new(1000 + i as i64, 2);
            RawBar {
                date: start
                    .checked_add_days(Days::new(i as u64))
                    .expect("测试日期范围合法"),
                open: Some(close),
                close: Some(close),
                high: Some(close),
                low: Some(close),
                volume: Some(Decimal::new(1_000_000, 0)),
                amount: Some(Decimal::new(10_000_000, 0)),
                turnover_rate: Some(Decimal::new(25, 1)),
            }
        })
        .collect()
}

/// 按脚本依次返回预设响应的数据源；脚本耗尽后返回空结果错误。
pub struct ScriptProvider {
    script: Mutex<VecDeque<Result<Vec<RawBar>, ProviderError>>>,
    calls: AtomicUsize,
}

impl ScriptProvider {
    pub fn new(script: Vec<Result<Vec<RawBar>, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// 已发生的上游调用次数。
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DailyBarProvider for ScriptProvider {
    async fn daily_history(
        &self,
        _symbol: &Symbol,
        _start: NaiveDate,
        _end: NaiveDate,
        _adjust: Adjustment,
    ) -> Result<Vec<RawBar>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or(Err(ProviderError::Empty))
    }
}

/// 对特定代码永远失败、其余返回固定行数的数据源。
pub struct PoisonProvider {
    pub poison_code: String,
    pub start: NaiveDate,
    pub rows: usize,
    calls: AtomicUsize,
}

impl PoisonProvider {
    pub fn new(poison_code: impl Into<String>, start: NaiveDate, rows: usize) -> Self {
        Self {
            poison_code: poison_code.into(),
            start,
            rows,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DailyBarProvider for PoisonProvider {
    async fn daily_history(
        &self,
        symbol: &Symbol,
        _start: NaiveDate,
        _end: NaiveDate,
        _adjust: Adjustment,
    ) -> Result<Vec<RawBar>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if symbol.code == self.poison_code {
            return Err(ProviderError::Status(500));
        }
        Ok(raw_bars(self.start, self.rows))
    }
}
