//! 日线数据定义。

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 一只标的某个交易日的日线记录。
///
/// 日期为交易所本地日历日，不含时间部分；同一标的下日期唯一。
/// 所有数值字段在入库前均已按填充策略补齐，序列上的运算不会遇到缺失值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// 交易日
    pub date: NaiveDate,
    /// 开盘价
    pub open: Decimal,
    /// 收盘价
    pub close: Decimal,
    /// 最高价
    pub high: Decimal,
    /// 最低价
    pub low: Decimal,
    /// 成交量（股）
    pub volume: Decimal,
    /// 成交额（元）
    pub amount: Decimal,
    /// 换手率（%）
    pub turnover_rate: Decimal,
    /// 涨跌幅（%，相对前一交易日收盘价，由序列重算）
    pub pct_change: Decimal,
}

impl Bar {
    /// 创建一根日线，涨跌幅初始为零，由 `TimeSeries` 在构建时统一重算。
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        date: NaiveDate,
        open: Decimal,
        close: Decimal,
        high: Decimal,
        low: Decimal,
        volume: Decimal,
        amount: Decimal,
        turnover_rate: Decimal,
    ) -> Self {
        Self {
            date,
            open,
            close,
            high,
            low,
            volume,
            amount,
            turnover_rate,
            pct_change: Decimal::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bar_new_zeroes_pct_change() {
        let bar = Bar::new(
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            dec!(10.0),
            dec!(10.5),
            dec!(10.6),
            dec!(9.9),
            dec!(1000000),
            dec!(10500000),
            dec!(2.5),
        );
        assert_eq!(bar.pct_change, Decimal::ZERO);
        assert_eq!(bar.close, dec!(10.5));
    }
}
