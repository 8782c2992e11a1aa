//! 高而窄的旗形。
//!
//! 机构席位榜标的中，近两周股价接近翻倍且包含两连板的强势形态。
//! 榜单代码列表由配置提供，列表外的标的一律不入选。

use crate::Strategy;
use ashare_core::{Symbol, TimeSeries};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// 高而窄的旗形参数。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HighTightFlagConfig {
    /// 最低历史长度（交易日）
    #[serde(default = "default_threshold_days")]
    pub threshold_days: usize,
    /// 形态分析窗口（交易日）
    #[serde(default = "default_window_days")]
    pub window_days: usize,
    /// 窗口末最高价相对窗口最低价的最低倍数
    #[serde(default = "default_min_price_ratio")]
    pub min_price_ratio: Decimal,
    /// 连板判定涨幅（%）
    #[serde(default = "default_min_pct_change")]
    pub min_pct_change: Decimal,
}

fn default_threshold_days() -> usize {
    60
}
fn default_window_days() -> usize {
    14
}
fn default_min_price_ratio() -> Decimal {
    dec!(1.9)
}
fn default_min_pct_change() -> Decimal {
    dec!(9.5)
}

impl Default for HighTightFlagConfig {
    fn default() -> Self {
        Self {
            threshold_days: default_threshold_days(),
            window_days: default_window_days(),
            min_price_ratio: default_min_price_ratio(),
            min_pct_change: default_min_pct_change(),
        }
    }
}

/// 高而窄的旗形策略。
pub struct HighTightFlagStrategy {
    config: HighTightFlagConfig,
    top_list: HashSet<String>,
}

impl HighTightFlagStrategy {
    pub fn new(config: HighTightFlagConfig, top_list: Vec<String>) -> Self {
        Self {
            config,
            top_list: top_list.into_iter().collect(),
        }
    }
}

impl Strategy for HighTightFlagStrategy {
    fn name(&self) -> &str {
        "高而窄的旗形"
    }

    fn check(&self, symbol: &Symbol, series: &TimeSeries) -> bool {
        if !self.top_list.contains(&symbol.code) {
            return false;
        }
        if series.len() < self.config.threshold_days {
            debug!(symbol = %symbol.code, rows = series.len(), "历史不足, 跳过");
            return false;
        }

        let window = series.tail(self.config.window_days);
        if window.len() < self.config.window_days {
            return false;
        }

        let low = window.iter().map(|b| b.low).min().unwrap_or(Decimal::ZERO);
        let high = window[window.len() - 1].high;
        if low.is_zero() || high / low < self.config.min_price_ratio {
            return false;
        }

        // 窗口内需出现两连板
        let doubled = window.windows(2).any(|pair| {
            pair[0].pct_change >= self.config.min_pct_change
                && pair[1].pct_change >= self.config.min_pct_change
        });
        if doubled {
            debug!(symbol = %symbol.code, "高而窄的旗形命中");
        }
        doubled
    }
}
