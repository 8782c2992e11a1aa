//! 时间序列定义。
//!
//! `TimeSeries` 是一只标的按日期严格升序、去重后的日线序列。
//!
//! # 不变量
//!
//! - 日期严格递增，无重复（冲突时保留后写入的值）
//! - 非空序列中每根日线的数值字段均已填充完毕
//! - 涨跌幅由相邻收盘价重算得出，首日为零

use crate::types::Bar;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

/// 单只标的的日线时间序列。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    bars: Vec<Bar>,
}

impl TimeSeries {
    /// 创建空序列。
    pub fn new() -> Self {
        Self::default()
    }

    /// 由日线集合构建序列：按日期排序、去重（后出现者胜出）、重算涨跌幅。
    pub fn from_bars(bars: Vec<Bar>) -> Self {
        let mut by_date: BTreeMap<NaiveDate, Bar> = BTreeMap::new();
        for bar in bars {
            by_date.insert(bar.date, bar);
        }
        let mut series = Self {
            bars: by_date.into_values().collect(),
        };
        series.recompute_pct_change();
        series
    }

    /// 合并两个序列：按日期求并集，`incoming` 在日期冲突时胜出。
    ///
    /// 结果重新排序并重算涨跌幅，保持全部不变量。
    pub fn merge(&self, incoming: &TimeSeries) -> TimeSeries {
        let mut bars = self.bars.clone();
        bars.extend(incoming.bars.iter().cloned());
        Self::from_bars(bars)
    }

    /// 截取到指定日期（含）为止的子序列。
    pub fn up_to(&self, date: NaiveDate) -> TimeSeries {
        let bars: Vec<Bar> = self
            .bars
            .iter()
            .filter(|b| b.date <= date)
            .cloned()
            .collect();
        // 截断不改变相邻关系, 涨跌幅无需重算
        Self { bars }
    }

    /// 全部日线（升序）。
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// 末尾 `n` 根日线（不足 `n` 时返回全部）。
    pub fn tail(&self, n: usize) -> &[Bar] {
        let start = self.bars.len().saturating_sub(n);
        &self.bars[start..]
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// 最早的交易日。
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    /// 最晚的交易日。
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// 收盘价序列（f64，供指标库使用）。
    pub fn closes_f64(&self) -> Vec<f64> {
        use rust_decimal::prelude::ToPrimitive;
        self.bars
            .iter()
            .map(|b| b.close.to_f64().unwrap_or_default())
            .collect()
    }

    /// 成交量序列（f64，供指标库使用）。
    pub fn volumes_f64(&self) -> Vec<f64> {
        use rust_decimal::prelude::ToPrimitive;
        self.bars
            .iter()
            .map(|b| b.volume.to_f64().unwrap_or_default())
            .collect()
    }

    /// 按相邻收盘价重算涨跌幅，首日补零。
    fn recompute_pct_change(&mut self) {
        let closes: Vec<Decimal> = self.bars.iter().map(|b| b.close).collect();
        for (i, bar) in self.bars.iter_mut().enumerate() {
            bar.pct_change = if i == 0 {
                Decimal::ZERO
            } else if closes[i - 1].is_zero() {
                Decimal::ZERO
            } else {
                ((closes[i] / closes[i - 1] - Decimal::ONE) * dec!(100)).round_dp(2)
            };
        }
    }
}
