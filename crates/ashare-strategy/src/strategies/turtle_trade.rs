//! 海龟交易法则（入场判定）。
//!
//! 末日收盘价为窗口内最高收盘价。

use crate::Strategy;
use ashare_core::{Symbol, TimeSeries};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 海龟入场参数。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TurtleTradeConfig {
    /// 检查周期（交易日）
    #[serde(default = "default_threshold_days")]
    pub threshold_days: usize,
}

fn default_threshold_days() -> usize {
    60
}

impl Default for TurtleTradeConfig {
    fn default() -> Self {
        Self {
            threshold_days: default_threshold_days(),
        }
    }
}

/// 海龟交易法则策略。
pub struct TurtleTradeStrategy {
    config: TurtleTradeConfig,
}

impl TurtleTradeStrategy {
    pub fn new(config: TurtleTradeConfig) -> Self {
        Self { config }
    }

    /// 窗口内末日收盘是否为最高收盘（供其他策略作门槛复用）。
    pub fn breaks_high(series: &TimeSeries, threshold: usize) -> bool {
        if threshold == 0 || series.len() < threshold {
            return false;
        }
        let window = series.tail(threshold);
        let max_close = window.iter().map(|b| b.close).max();
        match (max_close, window.last()) {
            (Some(max), Some(last)) => last.close >= max,
            _ => false,
        }
    }
}

impl Strategy for TurtleTradeStrategy {
    fn name(&self) -> &str {
        "海龟交易法则"
    }

    fn check(&self, symbol: &Symbol, series: &TimeSeries) -> bool {
        let hit = Self::breaks_high(series, self.config.threshold_days);
        if hit {
            debug!(symbol = %symbol.code, "末日收盘创窗口新高");
        }
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::SeriesBuilder;

    fn symbol() -> Symbol {
        Symbol::new("600519", "贵州茅台")
    }

    #[test]
    fn test_new_high_matches() {
        let series = SeriesBuilder::new()
            .flat_days(60, 100.0, 1_000_000.0)
            .day(100.0, 108.0, 108.5, 99.8, 1_200_000.0)
            .build();
        let strategy = TurtleTradeStrategy::new(TurtleTradeConfig::default());
        assert!(strategy.check(&symbol(), &series));
    }

    #[test]
    fn test_below_high_no_match() {
        let series = SeriesBuilder::new()
            .flat_days(30, 100.0, 1_000_000.0)
            .day(100.0, 120.0, 121.0, 99.8, 1_200_000.0)
            .flat_days(30, 110.0, 1_000_000.0)
            .build();
        let strategy = TurtleTradeStrategy::new(TurtleTradeConfig::default());
        assert!(!strategy.check(&symbol(), &series));
    }

    #[test]
    fn test_short_history_no_match() {
        let series = SeriesBuilder::new().flat_days(10, 100.0, 1_000_000.0).build();
        let strategy = TurtleTradeStrategy::new(TurtleTradeConfig::default());
        assert!(!strategy.check(&symbol(), &series));
    }
}
