//! 涨停板次日溢价。
//!
//! 入场判定：末日涨停且成交量较前 5 日均量放大。
//! 另附历史回放：对窗口内每个涨停日模拟次日开盘买入，
//! 按「先看止盈、再看止损、否则收盘离场」结算次日收益。
//! 仓位只做统计计数，不做任何资金核算。

use crate::Strategy;
use ashare_core::{Symbol, TimeSeries};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 涨停板次日溢价参数。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitUpConfig {
    /// 均量回溯天数
    #[serde(default = "default_volume_lookback")]
    pub volume_lookback: usize,
    /// 涨停判定涨幅（%）
    #[serde(default = "default_limit_up_threshold")]
    pub limit_up_threshold: Decimal,
    /// 成交量放大倍数
    #[serde(default = "default_volume_ratio")]
    pub volume_ratio: Decimal,
    /// 次日止盈目标（比例）
    #[serde(default = "default_profit_target")]
    pub profit_target: Decimal,
    /// 次日止损线（比例，负值）
    #[serde(default = "default_stop_loss")]
    pub stop_loss: Decimal,
}

fn default_volume_lookback() -> usize {
    5
}
fn default_limit_up_threshold() -> Decimal {
    dec!(9.5)
}
fn default_volume_ratio() -> Decimal {
    dec!(1.5)
}
fn default_profit_target() -> Decimal {
    dec!(0.03)
}
fn default_stop_loss() -> Decimal {
    dec!(-0.05)
}

impl Default for LimitUpConfig {
    fn default() -> Self {
        Self {
            volume_lookback: default_volume_lookback(),
            limit_up_threshold: default_limit_up_threshold(),
            volume_ratio: default_volume_ratio(),
            profit_target: default_profit_target(),
            stop_loss: default_stop_loss(),
        }
    }
}

/// 回放统计。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BacktestStats {
    /// 总交易次数
    pub trades: u32,
    /// 盈利次数
    pub wins: u32,
    /// 亏损次数
    pub losses: u32,
    /// 胜率（0~1）
    pub win_rate: Decimal,
    /// 平均收益率（比例）
    pub avg_return: Decimal,
}

/// 涨停板次日溢价策略。
pub struct LimitUpStrategy {
    config: LimitUpConfig,
}

impl LimitUpStrategy {
    pub fn new(config: LimitUpConfig) -> Self {
        Self { config }
    }

    /// 指定下标的那一天是否满足入场条件。
    fn entry_at(&self, series: &TimeSeries, idx: usize) -> bool {
        let lookback = self.config.volume_lookback;
        if idx < lookback {
            return false;
        }
        let bars = series.bars();
        let bar = &bars[idx];
        if bar.pct_change < self.config.limit_up_threshold {
            return false;
        }

        let prev = &bars[idx - lookback..idx];
        let total: Decimal = prev.iter().map(|b| b.volume).sum();
        let avg = total / Decimal::from(lookback);
        if avg.is_zero() {
            return false;
        }
        bar.volume >= avg * self.config.volume_ratio
    }

    /// 对 `[start, end]` 区间内的涨停日做次日收益回放。
    pub fn backtest(&self, series: &TimeSeries, start: NaiveDate, end: NaiveDate) -> BacktestStats {
        let bars = series.bars();
        let mut stats = BacktestStats::default();
        let mut total_return = Decimal::ZERO;

        for idx in 0..bars.len().saturating_sub(1) {
            let date = bars[idx].date;
            if date < start || date > end {
                continue;
            }
            if !self.entry_at(series, idx) {
                continue;
            }

            let next = &bars[idx + 1];
            if next.open.is_zero() {
                continue;
            }

            let target = next.open * (Decimal::ONE + self.config.profit_target);
            let stop = next.open * (Decimal::ONE + self.config.stop_loss);
            let ret = if next.high >= target {
                self.config.profit_target
            } else if next.low <= stop {
                self.config.stop_loss
            } else {
                next.close / next.open - Decimal::ONE
            };

            stats.trades += 1;
            if ret > Decimal::ZERO {
                stats.wins += 1;
            } else {
                stats.losses += 1;
            }
            total_return += ret;
        }

        if stats.trades > 0 {
            let trades = Decimal::from(stats.trades);
            stats.win_rate = Decimal::from(stats.wins) / trades;
            stats.avg_return = total_return / trades;
        }
        stats
    }
}

impl Strategy for LimitUpStrategy {
    fn name(&self) -> &str {
        "涨停板次日溢价"
    }

    fn check(&self, symbol: &Symbol, series: &TimeSeries) -> bool {
        if series.len() < self.config.volume_lookback + 1 {
            debug!(symbol = %symbol.code, rows = series.len(), "历史不足, 跳过");
            return false;
        }
        let hit = self.entry_at(series, series.len() - 1);
        if hit {
            debug!(symbol = %symbol.code, "末日涨停放量命中");
        }
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::SeriesBuilder;

    fn symbol() -> Symbol {
        Symbol::new("000625", "长安汽车")
    }

    #[test]
    fn test_limit_up_with_volume_matches() {
        let series = SeriesBuilder::new()
            .flat_days(10, 10.0, 1_000_000.0)
            .day(10.0, 11.0, 11.0, 9.95, 2_000_000.0)
            .build();
        let strategy = LimitUpStrategy::new(LimitUpConfig::default());
        assert!(strategy.check(&symbol(), &series));
    }

    #[test]
    fn test_limit_up_without_volume_no_match() {
        let series = SeriesBuilder::new()
            .flat_days(10, 10.0, 1_000_000.0)
            .day(10.0, 11.0, 11.0, 9.95, 1_200_000.0)
            .build();
        let strategy = LimitUpStrategy::new(LimitUpConfig::default());
        assert!(!strategy.check(&symbol(), &series));
    }

    #[test]
    fn test_backtest_counts_next_day_outcomes() {
        // 一次涨停, 次日冲高触及止盈
        let series = SeriesBuilder::new()
            .flat_days(10, 10.0, 1_000_000.0)
            .day(10.0, 11.0, 11.0, 9.95, 2_000_000.0)
            .day(11.2, 11.3, 11.6, 11.1, 1_800_000.0)
            .build();
        let strategy = LimitUpStrategy::new(LimitUpConfig::default());
        let stats = strategy.backtest(
            &series,
            series.first_date().unwrap(),
            series.last_date().unwrap(),
        );
        assert_eq!(stats.trades, 1);
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.win_rate, Decimal::ONE);
        assert_eq!(stats.avg_return, dec!(0.03));
    }

    #[test]
    fn test_backtest_stop_loss_path() {
        // 次日深跌触及止损
        let series = SeriesBuilder::new()
            .flat_days(10, 10.0, 1_000_000.0)
            .day(10.0, 11.0, 11.0, 9.95, 2_000_000.0)
            .day(11.0, 10.3, 11.05, 10.2, 1_800_000.0)
            .build();
        let strategy = LimitUpStrategy::new(LimitUpConfig::default());
        let stats = strategy.backtest(
            &series,
            series.first_date().unwrap(),
            series.last_date().unwrap(),
        );
        assert_eq!(stats.trades, 1);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.avg_return, dec!(-0.05));
    }

    #[test]
    fn test_backtest_no_entries() {
        let series = SeriesBuilder::new().flat_days(20, 10.0, 1_000_000.0).build();
        let strategy = LimitUpStrategy::new(LimitUpConfig::default());
        let stats = strategy.backtest(
            &series,
            series.first_date().unwrap(),
            series.last_date().unwrap(),
        );
        assert_eq!(stats, BacktestStats::default());
    }
}
