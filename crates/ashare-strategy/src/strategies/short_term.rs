//! 东方财富短线。
//!
//! 多指标复合门槛：流动性、均线、MACD、量比、布林中轨、RSI、
//! KDJ、换手率逐项过滤，全部通过才入选。布尔开关与 0 值周期
//! 可逐项停用对应门槛。

use crate::{indicators, Strategy};
use ashare_core::{Symbol, TimeSeries};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 东方财富短线参数。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShortTermConfig {
    /// 最低上市天数
    #[serde(default = "default_min_listed_days")]
    pub min_listed_days: usize,
    /// 日均成交额统计天数
    #[serde(default = "default_avg_turnover_days")]
    pub avg_turnover_days: usize,
    /// 最低日均成交额（元）
    #[serde(default = "default_min_avg_daily_turnover_amount")]
    pub min_avg_daily_turnover_amount: Decimal,
    /// MA5 上穿 MA10 的回看天数（0 停用）
    #[serde(default = "default_ma5_cross_ma10_period")]
    pub ma5_cross_ma10_period: usize,
    /// 收盘须站上 MA20
    #[serde(default = "default_true")]
    pub close_above_ma20: bool,
    /// MACD 金叉回看天数（0 停用）
    #[serde(default = "default_macd_gold_cross_within_days")]
    pub macd_gold_cross_within_days: usize,
    /// DIF 须大于 DEA 且大于零
    #[serde(default = "default_true")]
    pub macd_dif_above_dea_and_zero: bool,
    /// 量比（相对前 5 日均量）下限
    #[serde(default = "default_volume_ratio_min")]
    pub volume_ratio_to_5day_avg_min: Decimal,
    /// 量比上限
    #[serde(default = "default_volume_ratio_max")]
    pub volume_ratio_to_5day_avg_max: Decimal,
    /// 量比均量天数
    #[serde(default = "default_volume_ratio_days")]
    pub volume_ratio_to_5day_avg_days: usize,
    /// 收盘须上穿布林中轨
    #[serde(default = "default_true")]
    pub boll_break_middle_band: bool,
    /// RSI 周期
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,
    /// RSI 须自下而上穿越下限
    #[serde(default = "default_true")]
    pub rsi_cross_30: bool,
    /// RSI 下限
    #[serde(default = "default_rsi_lower_limit")]
    pub rsi_lower_limit: Decimal,
    /// RSI 上限
    #[serde(default = "default_rsi_upper_limit")]
    pub rsi_upper_limit: Decimal,
    /// KDJ 须金叉
    #[serde(default = "default_true")]
    pub kdj_gold_cross: bool,
    /// KDJ J 值上限
    #[serde(default = "default_kdj_j_upper_limit")]
    pub kdj_j_upper_limit: Decimal,
    /// KDJ J 值下限
    #[serde(default = "default_kdj_j_lower_limit")]
    pub kdj_j_lower_limit: Decimal,
    /// 末日换手率下限（%）
    #[serde(default = "default_min_daily_turnover_rate")]
    pub min_daily_turnover_rate: Decimal,
    /// 末日换手率上限（%）
    #[serde(default = "default_max_daily_turnover_rate")]
    pub max_daily_turnover_rate: Decimal,
}

fn default_true() -> bool {
    true
}
fn default_min_listed_days() -> usize {
    60
}
fn default_avg_turnover_days() -> usize {
    20
}
fn default_min_avg_daily_turnover_amount() -> Decimal {
    dec!(100000000)
}
fn default_ma5_cross_ma10_period() -> usize {
    3
}
fn default_macd_gold_cross_within_days() -> usize {
    3
}
fn default_volume_ratio_min() -> Decimal {
    dec!(1.5)
}
fn default_volume_ratio_max() -> Decimal {
    dec!(2.5)
}
fn default_volume_ratio_days() -> usize {
    5
}
fn default_rsi_period() -> usize {
    6
}
fn default_rsi_lower_limit() -> Decimal {
    dec!(30)
}
fn default_rsi_upper_limit() -> Decimal {
    dec!(70)
}
fn default_kdj_j_upper_limit() -> Decimal {
    dec!(50)
}
fn default_kdj_j_lower_limit() -> Decimal {
    dec!(20)
}
fn default_min_daily_turnover_rate() -> Decimal {
    dec!(3.0)
}
fn default_max_daily_turnover_rate() -> Decimal {
    dec!(25.0)
}

impl Default for ShortTermConfig {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).expect("空配置节必然可反序列化")
    }
}

/// 东方财富短线策略。
pub struct ShortTermStrategy {
    config: ShortTermConfig,
}

impl ShortTermStrategy {
    pub fn new(config: ShortTermConfig) -> Self {
        Self { config }
    }

    /// 日均成交额门槛。
    fn liquidity_ok(&self, series: &TimeSeries) -> bool {
        let days = self.config.avg_turnover_days.max(1);
        if series.len() < days {
            return false;
        }
        let window = series.tail(days);
        let total: Decimal = window.iter().map(|b| b.amount).sum();
        total / Decimal::from(days) >= self.config.min_avg_daily_turnover_amount
    }

    /// `fast` 序列在最近 `within` 天内是否上穿 `slow` 序列。
    fn crossed_up(
        fast: &[Option<Decimal>],
        slow: &[Option<Decimal>],
        within: usize,
    ) -> bool {
        let len = fast.len().min(slow.len());
        if within == 0 || len < 2 {
            return false;
        }
        let start = len.saturating_sub(within).max(1);
        (start..len).any(|i| {
            match (fast[i - 1], slow[i - 1], fast[i], slow[i]) {
                (Some(f0), Some(s0), Some(f1), Some(s1)) => f0 <= s0 && f1 > s1,
                _ => false,
            }
        })
    }

    fn ma_cross_ok(&self, closes: &[Decimal]) -> bool {
        if self.config.ma5_cross_ma10_period == 0 {
            return true;
        }
        let ma5 = indicators::sma(closes, 5);
        let ma10 = indicators::sma(closes, 10);
        Self::crossed_up(&ma5, &ma10, self.config.ma5_cross_ma10_period)
    }

    fn ma20_ok(&self, closes: &[Decimal]) -> bool {
        if !self.config.close_above_ma20 {
            return true;
        }
        let ma20 = indicators::sma(closes, 20);
        match (closes.last(), ma20.last().copied().flatten()) {
            (Some(close), Some(ma)) => *close > ma,
            _ => false,
        }
    }

    fn macd_ok(&self, closes: &[Decimal]) -> bool {
        if self.config.macd_gold_cross_within_days == 0 {
            return true;
        }
        let macd = indicators::macd(closes, 12, 26, 9);
        let dif: Vec<Option<Decimal>> = macd.iter().map(|p| p.map(|p| p.dif)).collect();
        let dea: Vec<Option<Decimal>> = macd.iter().map(|p| p.map(|p| p.dea)).collect();
        if !Self::crossed_up(&dif, &dea, self.config.macd_gold_cross_within_days) {
            return false;
        }
        if !self.config.macd_dif_above_dea_and_zero {
            return true;
        }
        match macd.last().copied().flatten() {
            Some(point) => point.dif > point.dea && point.dif > Decimal::ZERO,
            None => false,
        }
    }

    fn volume_ratio_ok(&self, series: &TimeSeries) -> bool {
        let days = self.config.volume_ratio_to_5day_avg_days.max(1);
        if series.len() < days + 1 {
            return false;
        }
        let bars = series.bars();
        let last = &bars[bars.len() - 1];
        let prev = &bars[bars.len() - 1 - days..bars.len() - 1];
        let total: Decimal = prev.iter().map(|b| b.volume).sum();
        let avg = total / Decimal::from(days);
        if avg.is_zero() {
            return false;
        }
        let ratio = last.volume / avg;
        ratio >= self.config.volume_ratio_to_5day_avg_min
            && ratio <= self.config.volume_ratio_to_5day_avg_max
    }

    fn boll_ok(&self, closes: &[Decimal]) -> bool {
        if !self.config.boll_break_middle_band {
            return true;
        }
        // 布林中轨即 20 日均线
        let middle = indicators::sma(closes, 20);
        let len = closes.len();
        if len < 2 {
            return false;
        }
        match (middle[len - 2], middle[len - 1]) {
            (Some(prev_mid), Some(mid)) => closes[len - 2] <= prev_mid && closes[len - 1] > mid,
            _ => false,
        }
    }

    fn rsi_ok(&self, closes: &[Decimal]) -> bool {
        if !self.config.rsi_cross_30 {
            return true;
        }
        let rsi = indicators::rsi(closes, self.config.rsi_period.max(1));
        let len = rsi.len();
        if len < 2 {
            return false;
        }
        match (rsi[len - 2], rsi[len - 1]) {
            (Some(prev), Some(last)) => {
                prev < self.config.rsi_lower_limit
                    && last >= self.config.rsi_lower_limit
                    && last < self.config.rsi_upper_limit
            }
            _ => false,
        }
    }

    fn kdj_ok(&self, series: &TimeSeries) -> bool {
        if !self.config.kdj_gold_cross {
            return true;
        }
        let bars = series.bars();
        let highs: Vec<Decimal> = bars.iter().map(|b| b.high).collect();
        let lows: Vec<Decimal> = bars.iter().map(|b| b.low).collect();
        let closes: Vec<Decimal> = bars.iter().map(|b| b.close).collect();
        let kdj = indicators::kdj(&highs, &lows, &closes, 9, 3);
        let len = kdj.len();
        if len < 2 {
            return false;
        }
        match (kdj[len - 2], kdj[len - 1]) {
            (Some(prev), Some(last)) => {
                prev.k <= prev.d
                    && last.k > last.d
                    && last.j >= self.config.kdj_j_lower_limit
                    && last.j <= self.config.kdj_j_upper_limit
            }
            _ => false,
        }
    }

    fn turnover_rate_ok(&self, series: &TimeSeries) -> bool {
        match series.last() {
            Some(last) => {
                last.turnover_rate >= self.config.min_daily_turnover_rate
                    && last.turnover_rate <= self.config.max_daily_turnover_rate
            }
            None => false,
        }
    }
}

impl Strategy for ShortTermStrategy {
    fn name(&self) -> &str {
        "东方财富短线"
    }

    fn check(&self, symbol: &Symbol, series: &TimeSeries) -> bool {
        if series.len() < self.config.min_listed_days {
            debug!(symbol = %symbol.code, rows = series.len(), "上市时间不足, 跳过");
            return false;
        }

        let closes: Vec<Decimal> = series.bars().iter().map(|b| b.close).collect();

        let hit = self.liquidity_ok(series)
            && self.ma_cross_ok(&closes)
            && self.ma20_ok(&closes)
            && self.macd_ok(&closes)
            && self.volume_ratio_ok(series)
            && self.boll_ok(&closes)
            && self.rsi_ok(&closes)
            && self.kdj_ok(series)
            && self.turnover_rate_ok(series);

        if hit {
            debug!(symbol = %symbol.code, "短线复合条件全部命中");
        }
        hit
    }
}
