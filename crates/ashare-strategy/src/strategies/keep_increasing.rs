//! 均线多头。
//!
//! 30 日均线在窗口内的四分位检查点上持续抬升，且末值较首值
//! 上涨超过设定倍数。

use crate::{indicators, Strategy};
use ashare_core::{Symbol, TimeSeries};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 均线多头参数。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeepIncreasingConfig {
    /// 均线周期
    #[serde(default = "default_ma_period")]
    pub ma_period: usize,
    /// 检查窗口（交易日）
    #[serde(default = "default_threshold_days")]
    pub threshold_days: usize,
    /// 窗口末均线值相对首值的最低倍数
    #[serde(default = "default_growth_factor")]
    pub growth_factor: Decimal,
}

fn default_ma_period() -> usize {
    30
}
fn default_threshold_days() -> usize {
    30
}
fn default_growth_factor() -> Decimal {
    dec!(1.2)
}

impl Default for KeepIncreasingConfig {
    fn default() -> Self {
        Self {
            ma_period: default_ma_period(),
            threshold_days: default_threshold_days(),
            growth_factor: default_growth_factor(),
        }
    }
}

/// 均线多头策略。
pub struct KeepIncreasingStrategy {
    config: KeepIncreasingConfig,
}

impl KeepIncreasingStrategy {
    pub fn new(config: KeepIncreasingConfig) -> Self {
        Self { config }
    }
}

impl Strategy for KeepIncreasingStrategy {
    fn name(&self) -> &str {
        "均线多头"
    }

    fn check(&self, symbol: &Symbol, series: &TimeSeries) -> bool {
        let threshold = self.config.threshold_days;
        if threshold < 3 || series.len() < self.config.ma_period + threshold {
            debug!(symbol = %symbol.code, rows = series.len(), "历史不足, 跳过");
            return false;
        }

        let closes: Vec<Decimal> = series.bars().iter().map(|b| b.close).collect();
        let ma = indicators::sma(&closes, self.config.ma_period);

        let len = closes.len();
        let start = len - threshold;
        let q1 = start + threshold / 3;
        let q2 = start + threshold * 2 / 3;
        let end = len - 1;

        let points = [ma[start], ma[q1], ma[q2], ma[end]];
        let [Some(first), Some(p1), Some(p2), Some(last)] = points else {
            return false;
        };

        first < p1 && p1 < p2 && p2 < last && last >= first * self.config.growth_factor
    }
}
