//! 放量上涨。
//!
//! 末日放量收阳：涨幅、成交额、量比三重门槛同时满足。

use crate::{indicators, Strategy};
use ashare_core::{Symbol, TimeSeries};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 放量上涨参数。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VolumeSurgeConfig {
    /// 回看窗口（交易日）
    #[serde(default = "default_threshold_days")]
    pub threshold_days: usize,
    /// 末日最低涨幅（%）
    #[serde(default = "default_min_pct_change")]
    pub min_pct_change: Decimal,
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
fn default_min_pct_change() -> Decimal {
    dec!(2)
}
fn default_min_amount() -> Decimal {
    dec!(200000000)
}
fn default_volume_ratio_min() -> Decimal {
    dec!(2.0)
}

impl Default for VolumeSurgeConfig {
    fn default() -> Self {
        Self {
            threshold_days: default_threshold_days(),
            min_pct_change: default_min_pct_change(),
            min_amount: default_min_amount(),
            volume_ratio_min: default_volume_ratio_min(),
        }
    }
}

/// 放量上涨策略。
pub struct VolumeSurgeStrategy {
    config: VolumeSurgeConfig,
}

impl VolumeSurgeStrategy {
    pub fn new(config: VolumeSurgeConfig) -> Self {
        Self { config }
    }
}

impl Strategy for VolumeSurgeStrategy {
    fn name(&self) -> &str {
        "放量上涨"
    }

    fn check(&self, symbol: &Symbol, series: &TimeSeries) -> bool {
        if series.len() < self.config.threshold_days + 1 {
            debug!(symbol = %symbol.code, rows = series.len(), "历史不足, 跳过");
            return false;
        }

        let bars = series.bars();
        let last = &bars[bars.len() - 1];

        if last.pct_change < self.config.min_pct_change || last.close < last.open {
            return false;
        }
        if last.amount < self.config.min_amount {
            return false;
        }

        // 前 5 日均量取倒数第二天的 5 日均线值
        let volumes: Vec<Decimal> = bars.iter().map(|b| b.volume).collect();
        let vol_ma5 = indicators::sma(&volumes, 5);
        let prev_ma = match vol_ma5[bars.len() - 2] {
            Some(v) if !v.is_zero() => v,
            _ => return false,
        };

        let ratio = last.volume / prev_ma;
        if ratio >= self.config.volume_ratio_min {
            debug!(symbol = %symbol.code, ratio = %ratio, pct = %last.pct_change, "放量上涨命中");
            true
        } else {
            false
        }
    }
}
