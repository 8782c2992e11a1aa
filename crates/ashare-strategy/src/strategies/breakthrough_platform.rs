//! 突破平台。
//!
//! 窗口内出现放量上穿 60 日均线的突破日，且突破前的平台期
//! 收盘价紧贴该日均线运行（偏离度落在设定区间内）。

use crate::{indicators, Strategy};
use ashare_core::{Symbol, TimeSeries};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 突破平台参数。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BreakthroughPlatformConfig {
    /// 搜索突破日的回看窗口（交易日）
    #[serde(default = "default_threshold_days")]
    pub threshold_days: usize,
    /// 平台均线周期
    #[serde(default = "default_ma_period")]
    pub ma_period: usize,
    /// 平台期长度（突破日之前的天数）
    #[serde(default = "default_platform_days")]
    pub platform_days: usize,
    /// 平台期收盘相对均线的最低偏离
    #[serde(default = "default_price_range_min")]
    pub price_range_min: Decimal,
    /// 平台期收盘相对均线的最高偏离
    #[serde(default = "default_price_range_max")]
    pub price_range_max: Decimal,
    /// 突破日放量倍数（相对前一日 5 日均量）
    #[serde(default = "default_volume_ratio_min")]
    pub volume_ratio_min: Decimal,
}

fn default_threshold_days() -> usize {
    60
}
fn default_ma_period() -> usize {
    60
}
fn default_platform_days() -> usize {
    24
}
fn default_price_range_min() -> Decimal {
    dec!(-0.05)
}
fn default_price_range_max() -> Decimal {
    dec!(0.2)
}
fn default_volume_ratio_min() -> Decimal {
    dec!(2.0)
}

impl Default for BreakthroughPlatformConfig {
    fn default() -> Self {
        Self {
            threshold_days: default_threshold_days(),
            ma_period: default_ma_period(),
            platform_days: default_platform_days(),
            price_range_min: default_price_range_min(),
            price_range_max: default_price_range_max(),
            volume_ratio_min: default_volume_ratio_min(),
        }
    }
}

/// 突破平台策略。
pub struct BreakthroughPlatformStrategy {
    config: BreakthroughPlatformConfig,
}

impl BreakthroughPlatformStrategy {
    pub fn new(config: BreakthroughPlatformConfig) -> Self {
        Self { config }
    }
}

impl Strategy for BreakthroughPlatformStrategy {
    fn name(&self) -> &str {
        "突破平台"
    }

    fn check(&self, symbol: &Symbol, series: &TimeSeries) -> bool {
        let cfg = &self.config;
        if series.len() < cfg.ma_period + cfg.threshold_days {
            debug!(symbol = %symbol.code, rows = series.len(), "历史不足, 跳过");
            return false;
        }

        let bars = series.bars();
        let closes: Vec<Decimal> = bars.iter().map(|b| b.close).collect();
        let volumes: Vec<Decimal> = bars.iter().map(|b| b.volume).collect();
        let ma = indicators::sma(&closes, cfg.ma_period);
        let vol_ma5 = indicators::sma(&volumes, 5);

        let len = bars.len();
        for b in (len - cfg.threshold_days)..len {
            if b < cfg.platform_days {
                continue;
            }
            let (Some(ma_b), Some(prev_vol_ma)) = (ma[b], vol_ma5[b.saturating_sub(1)]) else {
                continue;
            };
            if ma_b.is_zero() || prev_vol_ma.is_zero() {
                continue;
            }
            if !(bars[b].open < ma_b && ma_b <= bars[b].close) {
                continue;
            }
            if bars[b].volume < prev_vol_ma * cfg.volume_ratio_min {
                continue;
            }

            let platform_ok = bars[b - cfg.platform_days..b].iter().all(|bar| {
                let deviation = (bar.close - ma_b) / ma_b;
                deviation >= cfg.price_range_min && deviation <= cfg.price_range_max
            });
            if platform_ok {
                debug!(symbol = %symbol.code, breakout = %bars[b].date, "平台突破命中");
                return true;
            }
        }
        false
    }
}
