//! 回踩年线。
//!
//! 此前 10～50 个交易日内出现放量上穿 250 日均线的突破日，
//! 其后缩量回踩但未深跌，当前收盘仍站在年线上方。

use crate::{indicators, Strategy};
use ashare_core::{Symbol, TimeSeries};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 回踩年线参数。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BacktraceMa250Config {
    /// 年线周期
    #[serde(default = "default_ma_period")]
    pub ma_period: usize,
    /// 突破日放量倍数（相对前一日 5 日均量）
    #[serde(default = "default_volume_ratio_min")]
    pub volume_ratio_min: Decimal,
    /// 当前收盘相对突破日收盘的最低比例（回踩深度约束）
    #[serde(default = "default_price_ratio_max")]
    pub price_ratio_max: Decimal,
    /// 突破日距今最少天数
    #[serde(default = "default_days_min")]
    pub days_min: usize,
    /// 突破日距今最多天数
    #[serde(default = "default_days_max")]
    pub days_max: usize,
}

fn default_ma_period() -> usize {
    250
}
fn default_volume_ratio_min() -> Decimal {
    dec!(2.0)
}
fn default_price_ratio_max() -> Decimal {
    dec!(0.8)
}
fn default_days_min() -> usize {
    10
}
fn default_days_max() -> usize {
    50
}

impl Default for BacktraceMa250Config {
    fn default() -> Self {
        Self {
            ma_period: default_ma_period(),
            volume_ratio_min: default_volume_ratio_min(),
            price_ratio_max: default_price_ratio_max(),
            days_min: default_days_min(),
            days_max: default_days_max(),
        }
    }
}

/// 回踩年线策略。
pub struct BacktraceMa250Strategy {
    config: BacktraceMa250Config,
}

impl BacktraceMa250Strategy {
    pub fn new(config: BacktraceMa250Config) -> Self {
        Self { config }
    }
}

impl Strategy for BacktraceMa250Strategy {
    fn name(&self) -> &str {
        "回踩年线"
    }

    fn check(&self, symbol: &Symbol, series: &TimeSeries) -> bool {
        let cfg = &self.config;
        if cfg.days_min >= cfg.days_max || series.len() < cfg.ma_period + cfg.days_max {
            debug!(symbol = %symbol.code, rows = series.len(), "历史不足, 跳过");
            return false;
        }

        let bars = series.bars();
        let closes: Vec<Decimal> = bars.iter().map(|b| b.close).collect();
        let volumes: Vec<Decimal> = bars.iter().map(|b| b.volume).collect();
        let ma = indicators::sma(&closes, cfg.ma_period);
        let vol_ma5 = indicators::sma(&volumes, 5);

        let len = bars.len();
        let last = &bars[len - 1];
        let Some(last_ma) = ma[len - 1] else {
            return false;
        };
        if last.close < last_ma {
            return false;
        }

        for b in (len - cfg.days_max)..(len - cfg.days_min) {
            let (Some(ma_b), Some(prev_vol_ma)) = (ma[b], vol_ma5[b.saturating_sub(1)]) else {
                continue;
            };
            if prev_vol_ma.is_zero() || bars[b].close.is_zero() {
                continue;
            }
            let crossed = bars[b].open < ma_b && ma_b <= bars[b].close;
            let surged = bars[b].volume >= prev_vol_ma * cfg.volume_ratio_min;
            let shallow = last.close >= bars[b].close * cfg.price_ratio_max;
            let shrunk = last.volume < bars[b].volume;
            if crossed && surged && shallow && shrunk {
                debug!(symbol = %symbol.code, breakout = %bars[b].date, "回踩年线形态命中");
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
        Symbol::new("601318", "中国平安")
    }

    /// 年线附近的典型回踩结构：250 日横盘后放量突破，再缩量整理 20 日。
    fn pullback_series(breakout_volume: f64) -> ashare_core::TimeSeries {
        SeriesBuilder::new()
            .flat_days(280, 100.0, 1_000_000.0)
            .day(99.0, 104.0, 104.5, 98.5, breakout_volume) // 上穿年线
            .flat_days(20, 102.0, 800_000.0) // 缩量整理, 收盘仍在年线上方
            .build()
    }

    #[test]
    fn test_breakout_and_shallow_pullback_matches() {
        let strategy = BacktraceMa250Strategy::new(BacktraceMa250Config::default());
        assert!(strategy.check(&symbol(), &pullback_series(3_000_000.0)));
    }

    #[test]
    fn test_breakout_without_volume_no_match() {
        let strategy = BacktraceMa250Strategy::new(BacktraceMa250Config::default());
        assert!(!strategy.check(&symbol(), &pullback_series(1_000_000.0)));
    }

    #[test]
    fn test_short_history_no_match() {
        let series = SeriesBuilder::new().flat_days(100, 100.0, 1_000_000.0).build();
        let strategy = BacktraceMa250Strategy::new(BacktraceMa250Config::default());
        assert!(!strategy.check(&symbol(), &series));
    }
}
