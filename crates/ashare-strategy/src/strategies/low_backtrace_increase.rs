//! 无大幅回撤。
//!
//! 窗口内累计涨幅达标，且不存在深跌：单日跌幅与连续两日
//! 累计跌幅都不触及阈值。

use crate::Strategy;
use ashare_core::{Symbol, TimeSeries};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 无大幅回撤参数。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LowBacktraceIncreaseConfig {
    /// 检查窗口（交易日）
    #[serde(default = "default_threshold_days")]
    pub threshold_days: usize,
    /// 窗口累计最低涨幅（比例，0.6 = 60%）
    #[serde(default = "default_min_price_increase")]
    pub min_price_increase: Decimal,
    /// 允许的单日最大跌幅（%）
    #[serde(default = "default_max_single_day_drop")]
    pub max_single_day_drop: Decimal,
    /// 允许的连续两日最大累计跌幅（%）
    #[serde(default = "default_max_two_day_drop")]
    pub max_two_day_drop: Decimal,
}

fn default_threshold_days() -> usize {
    60
}
fn default_min_price_increase() -> Decimal {
    dec!(0.6)
}
fn default_max_single_day_drop() -> Decimal {
    dec!(-7.0)
}
fn default_max_two_day_drop() -> Decimal {
    dec!(-10.0)
}

impl Default for LowBacktraceIncreaseConfig {
    fn default() -> Self {
        Self {
            threshold_days: default_threshold_days(),
            min_price_increase: default_min_price_increase(),
            max_single_day_drop: default_max_single_day_drop(),
            max_two_day_drop: default_max_two_day_drop(),
        }
    }
}

/// 无大幅回撤策略。
pub struct LowBacktraceIncreaseStrategy {
    config: LowBacktraceIncreaseConfig,
}

impl LowBacktraceIncreaseStrategy {
    pub fn new(config: LowBacktraceIncreaseConfig) -> Self {
        Self { config }
    }
}

impl Strategy for LowBacktraceIncreaseStrategy {
    fn name(&self) -> &str {
        "无大幅回撤"
    }

    fn check(&self, symbol: &Symbol, series: &TimeSeries) -> bool {
        let cfg = &self.config;
        if series.len() < cfg.threshold_days {
            debug!(symbol = %symbol.code, rows = series.len(), "历史不足, 跳过");
            return false;
        }

        let window = series.tail(cfg.threshold_days);
        let first = &window[0];
        let last = &window[window.len() - 1];
        if first.close.is_zero() {
            return false;
        }

        if last.close / first.close - Decimal::ONE < cfg.min_price_increase {
            return false;
        }

        for bar in window {
            if bar.pct_change < cfg.max_single_day_drop {
                return false;
            }
        }
        for pair in window.windows(2) {
            if pair[0].pct_change + pair[1].pct_change < cfg.max_two_day_drop {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::SeriesBuilder;

    fn symbol() -> Symbol {
        Symbol::new("002594", "比亚迪")
    }

    fn rising_series(dip: Option<f64>) -> ashare_core::TimeSeries {
        // 60 日每日 +1%, 累计约 +80%; dip 指定某一天的替代涨幅
        let mut builder = SeriesBuilder::new();
        let mut price = 100.0;
        for i in 0..60 {
            let step = match dip {
                Some(d) if i == 30 => 1.0 + d / 100.0,
                _ => 1.01,
            };
            price *= step;
            builder = builder.day(price, price, price * 1.001, price * 0.999, 1_000_000.0);
        }
        builder.build()
    }

    #[test]
    fn test_steady_rise_matches() {
        let strategy = LowBacktraceIncreaseStrategy::new(LowBacktraceIncreaseConfig::default());
        assert!(strategy.check(&symbol(), &rising_series(None)));
    }

    #[test]
    fn test_single_day_crash_no_match() {
        let strategy = LowBacktraceIncreaseStrategy::new(LowBacktraceIncreaseConfig::default());
        assert!(!strategy.check(&symbol(), &rising_series(Some(-8.0))));
    }

    #[test]
    fn test_weak_rise_no_match() {
        let series = SeriesBuilder::new().flat_days(60, 100.0, 1_000_000.0).build();
        let strategy = LowBacktraceIncreaseStrategy::new(LowBacktraceIncreaseConfig::default());
        assert!(!strategy.check(&symbol(), &series));
    }
}
