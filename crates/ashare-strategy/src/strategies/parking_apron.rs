//! 停机坪。
//!
//! 窗口内出现一根涨停（且当日收盘创阶段新高），随后数日
//! 在涨停收盘价附近窄幅整理、无大幅波动。

use crate::strategies::turtle_trade::TurtleTradeStrategy;
use crate::Strategy;
use ashare_core::{Symbol, TimeSeries};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 停机坪参数。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParkingApronConfig {
    /// 搜索涨停日的回看窗口（交易日）
    #[serde(default = "default_threshold_days")]
    pub threshold_days: usize,
    /// 涨停判定涨幅（%）
    #[serde(default = "default_limit_up_threshold")]
    pub limit_up_threshold: Decimal,
    /// 整理天数
    #[serde(default = "default_consolidation_days")]
    pub consolidation_days: usize,
    /// 整理区间下限（相对涨停收盘价）
    #[serde(default = "default_ratio_min")]
    pub consolidation_ratio_min: Decimal,
    /// 整理区间上限（相对涨停收盘价）
    #[serde(default = "default_ratio_max")]
    pub consolidation_ratio_max: Decimal,
    /// 整理日单日涨跌幅绝对值上限（%）
    #[serde(default = "default_price_change_max")]
    pub price_change_max: Decimal,
}

fn default_threshold_days() -> usize {
    15
}
fn default_limit_up_threshold() -> Decimal {
    dec!(9.5)
}
fn default_consolidation_days() -> usize {
    3
}
fn default_ratio_min() -> Decimal {
    dec!(0.97)
}
fn default_ratio_max() -> Decimal {
    dec!(1.03)
}
fn default_price_change_max() -> Decimal {
    dec!(5.0)
}

impl Default for ParkingApronConfig {
    fn default() -> Self {
        Self {
            threshold_days: default_threshold_days(),
            limit_up_threshold: default_limit_up_threshold(),
            consolidation_days: default_consolidation_days(),
            consolidation_ratio_min: default_ratio_min(),
            consolidation_ratio_max: default_ratio_max(),
            price_change_max: default_price_change_max(),
        }
    }
}

/// 停机坪策略。
pub struct ParkingApronStrategy {
    config: ParkingApronConfig,
}

impl ParkingApronStrategy {
    pub fn new(config: ParkingApronConfig) -> Self {
        Self { config }
    }

    /// 涨停日之后的整理段是否合规。
    fn consolidates(&self, series: &TimeSeries, limit_up_idx: usize) -> bool {
        let bars = series.bars();
        let limit_close = bars[limit_up_idx].close;
        if limit_close.is_zero() {
            return false;
        }

        let follow = &bars[limit_up_idx + 1..];
        if follow.len() < self.config.consolidation_days {
            return false;
        }

        follow[..self.config.consolidation_days].iter().all(|bar| {
            let open_ratio = bar.open / limit_close;
            let close_ratio = bar.close / limit_close;
            open_ratio >= self.config.consolidation_ratio_min
                && open_ratio <= self.config.consolidation_ratio_max
                && close_ratio >= self.config.consolidation_ratio_min
                && close_ratio <= self.config.consolidation_ratio_max
                && bar.pct_change.abs() <= self.config.price_change_max
        })
    }
}

impl Strategy for ParkingApronStrategy {
    fn name(&self) -> &str {
        "停机坪"
    }

    fn check(&self, symbol: &Symbol, series: &TimeSeries) -> bool {
        let threshold = self.config.threshold_days;
        if series.len() < threshold {
            debug!(symbol = %symbol.code, rows = series.len(), "历史不足, 跳过");
            return false;
        }

        let bars = series.bars();
        let start = bars.len() - threshold;
        for idx in start..bars.len() {
            if bars[idx].pct_change <= self.config.limit_up_threshold {
                continue;
            }
            // 涨停日需同时创出截至当日的阶段新高
            let up_to_limit = series.up_to(bars[idx].date);
            if !TurtleTradeStrategy::breaks_high(&up_to_limit, threshold) {
                continue;
            }
            if self.consolidates(series, idx) {
                debug!(symbol = %symbol.code, date = %bars[idx].date, "涨停后整理形态命中");
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::SeriesBuilder;

    fn symbol() -> Symbol {
        Symbol::new("000002", "万科A")
    }

    #[test]
    fn test_limit_up_then_consolidation_matches() {
        // 平台整理 → 涨停创新高 → 3 日窄幅整理
        let series = SeriesBuilder::new()
            .flat_days(20, 100.0, 1_000_000.0)
            .day(100.0, 110.0, 110.0, 99.9, 3_000_000.0) // 涨停 +10%
            .day(110.5, 111.0, 112.0, 109.5, 1_500_000.0)
            .day(111.0, 110.0, 111.5, 109.0, 1_200_000.0)
            .day(110.0, 112.0, 112.5, 109.8, 1_100_000.0)
            .build();
        let strategy = ParkingApronStrategy::new(ParkingApronConfig::default());
        assert!(strategy.check(&symbol(), &series));
    }

    #[test]
    fn test_deep_pullback_after_limit_up_no_match() {
        let series = SeriesBuilder::new()
            .flat_days(20, 100.0, 1_000_000.0)
            .day(100.0, 110.0, 110.0, 99.9, 3_000_000.0)
            .day(108.0, 100.0, 108.5, 99.0, 2_000_000.0) // 大幅回落
            .day(100.0, 101.0, 102.0, 99.0, 1_000_000.0)
            .day(101.0, 100.5, 101.5, 99.5, 1_000_000.0)
            .build();
        let strategy = ParkingApronStrategy::new(ParkingApronConfig::default());
        assert!(!strategy.check(&symbol(), &series));
    }

    #[test]
    fn test_no_limit_up_no_match() {
        let series = SeriesBuilder::new().flat_days(30, 100.0, 1_000_000.0).build();
        let strategy = ParkingApronStrategy::new(ParkingApronConfig::default());
        assert!(!strategy.check(&symbol(), &series));
    }
}
