//! 放量跌停。
//!
//! 末日跌停且成交额、量比双双放大——恐慌出货形态。

use crate::{indicators, Strategy};
use ashare_core::{Symbol, TimeSeries};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 放量跌停参数。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClimaxLimitdownConfig {
    /// 回看窗口（交易日）
    #[serde(default = "default_threshold_days")]
    pub threshold_days: usize,
    /// 跌停判定涨幅上限（%）
    #[serde(default = "default_max_pct_change")]
    pub max_pct_change: Decimal,
    /// 末日最低成交额（元）
    #[serde(default = "default_min_amount")]
    pub min_amount: Decimal,
    /// 末日成交量相对前 5 日均量的最低倍数
    #[serde(default = "default_volume_ratio_min")]
    pub volume_ratio_min: Decimal,
}

fn default_threshold_days() -> usize {
    60
}
fn default_max_pct_change() -> Decimal {
    dec!(-9.5)
}
fn default_min_amount() -> Decimal {
    dec!(200000000)
}
fn default_volume_ratio_min() -> Decimal {
    dec!(4.0)
}

impl Default for ClimaxLimitdownConfig {
    fn default() -> Self {
        Self {
            threshold_days: default_threshold_days(),
            max_pct_change: default_max_pct_change(),
            min_amount: default_min_amount(),
            volume_ratio_min: default_volume_ratio_min(),
        }
    }
}

/// 放量跌停策略。
pub struct ClimaxLimitdownStrategy {
    config: ClimaxLimitdownConfig,
}

impl ClimaxLimitdownStrategy {
    pub fn new(config: ClimaxLimitdownConfig) -> Self {
        Self { config }
    }
}

impl Strategy for ClimaxLimitdownStrategy {
    fn name(&self) -> &str {
        "放量跌停"
    }

    fn check(&self, symbol: &Symbol, series: &TimeSeries) -> bool {
        if series.len() < self.config.threshold_days + 1 {
            debug!(symbol = %symbol.code, rows = series.len(), "历史不足, 跳过");
            return false;
        }

        let bars = series.bars();
        let last = &bars[bars.len() - 1];

        if last.pct_change > self.config.max_pct_change {
            return false;
        }
        if last.amount < self.config.min_amount {
            return false;
        }

        let volumes: Vec<Decimal> = bars.iter().map(|b| b.volume).collect();
        let vol_ma5 = indicators::sma(&volumes, 5);
        let prev_ma = match vol_ma5[bars.len() - 2] {
            Some(v) if !v.is_zero() => v,
            _ => return false,
        };

        if last.volume >= prev_ma * self.config.volume_ratio_min {
            debug!(symbol = %symbol.code, pct = %last.pct_change, "放量跌停命中");
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::SeriesBuilder;

    fn symbol() -> Symbol {
        Symbol::new("000063", "中兴通讯")
    }

    #[test]
    fn test_high_volume_limitdown_matches() {
        let series = SeriesBuilder::new()
            .flat_days(60, 100.0, 10_000_000.0)
            .day(98.0, 90.0, 98.5, 90.0, 50_000_000.0) // -10%, 量比 5
            .build();
        let strategy = ClimaxLimitdownStrategy::new(ClimaxLimitdownConfig::default());
        assert!(strategy.check(&symbol(), &series));
    }

    #[test]
    fn test_limitdown_without_volume_no_match() {
        let series = SeriesBuilder::new()
            .flat_days(60, 100.0, 10_000_000.0)
            .day(98.0, 90.0, 98.5, 90.0, 12_000_000.0)
            .build();
        let strategy = ClimaxLimitdownStrategy::new(ClimaxLimitdownConfig::default());
        assert!(!strategy.check(&symbol(), &series));
    }

    #[test]
    fn test_normal_down_day_no_match() {
        let series = SeriesBuilder::new()
            .flat_days(60, 100.0, 10_000_000.0)
            .day(99.0, 97.0, 99.5, 96.8, 50_000_000.0)
            .build();
        let strategy = ClimaxLimitdownStrategy::new(ClimaxLimitdownConfig::default());
        assert!(!strategy.check(&symbol(), &series));
    }
}
