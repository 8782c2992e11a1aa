//! 技术指标计算辅助。
//!
//! 全部基于 `Decimal` 的标准公式实现，不追求与任何特定指标库
//! 的数值一致。每个函数返回与输入等长的序列，预热期内为 `None`。

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// 简单移动平均。
pub fn sma(values: &[Decimal], period: usize) -> Vec<Option<Decimal>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    let mut out = Vec::with_capacity(values.len());
    let mut sum = Decimal::ZERO;
    for (i, v) in values.iter().enumerate() {
        sum += *v;
        if i >= period {
            sum -= values[i - period];
        }
        if i + 1 >= period {
            out.push(Some(sum / Decimal::from(period)));
        } else {
            out.push(None);
        }
    }
    out
}

/// 指数移动平均（以首值为种子，`alpha = 2/(period+1)`）。
pub fn ema(values: &[Decimal], period: usize) -> Vec<Option<Decimal>> {
    if period == 0 || values.is_empty() {
        return vec![None; values.len()];
    }
    let alpha = dec!(2) / Decimal::from(period + 1);
    let mut out = Vec::with_capacity(values.len());
    let mut prev = values[0];
    for (i, v) in values.iter().enumerate() {
        prev = if i == 0 {
            *v
        } else {
            alpha * *v + (Decimal::ONE - alpha) * prev
        };
        if i + 1 >= period {
            out.push(Some(prev));
        } else {
            out.push(None);
        }
    }
    out
}

/// 相对强弱指标（简单均值 RS）。
pub fn rsi(values: &[Decimal], period: usize) -> Vec<Option<Decimal>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period + 1 {
        return out;
    }
    for i in period..values.len() {
        let mut gain = Decimal::ZERO;
        let mut loss = Decimal::ZERO;
        for j in (i - period + 1)..=i {
            let change = values[j] - values[j - 1];
            if change > Decimal::ZERO {
                gain += change;
            } else {
                loss += change.abs();
            }
        }
        out[i] = Some(if loss.is_zero() {
            dec!(100)
        } else {
            let rs = gain / loss;
            dec!(100) - dec!(100) / (Decimal::ONE + rs)
        });
    }
    out
}

/// MACD 的一个采样点。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    /// 快慢 EMA 之差（DIF）
    pub dif: Decimal,
    /// DIF 的信号线 EMA（DEA）
    pub dea: Decimal,
}

/// MACD（默认参数 12/26/9 由调用方给定）。
pub fn macd(values: &[Decimal], fast: usize, slow: usize, signal: usize) -> Vec<Option<MacdPoint>> {
    let fast_ema = ema(values, fast);
    let slow_ema = ema(values, slow);

    let dif: Vec<Decimal> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => *f - *s,
            _ => Decimal::ZERO,
        })
        .collect();
    let dea = ema(&dif, signal);

    let warmup = slow + signal;
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i + 1 >= warmup {
                Some(MacdPoint {
                    dif: dif[i],
                    dea: dea[i].unwrap_or(Decimal::ZERO),
                })
            } else {
                None
            }
        })
        .collect()
}

/// KDJ 的一个采样点。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KdjPoint {
    pub k: Decimal,
    pub d: Decimal,
    pub j: Decimal,
}

/// KDJ 随机指标（RSV 周期 `n`，K/D 平滑系数 1/`m`，K/D 以 50 为种子）。
pub fn kdj(
    highs: &[Decimal],
    lows: &[Decimal],
    closes: &[Decimal],
    n: usize,
    m: usize,
) -> Vec<Option<KdjPoint>> {
    let len = closes.len();
    let mut out = vec![None; len];
    if n == 0 || m == 0 || len < n || highs.len() != len || lows.len() != len {
        return out;
    }

    let alpha = Decimal::ONE / Decimal::from(m);
    let mut k = dec!(50);
    let mut d = dec!(50);

    for i in (n - 1)..len {
        let window = (i + 1 - n)..=i;
        let high = highs[window.clone()].iter().copied().max().unwrap_or(closes[i]);
        let low = lows[window].iter().copied().min().unwrap_or(closes[i]);
        let range = high - low;
        let rsv = if range.is_zero() {
            dec!(50)
        } else {
            (closes[i] - low) / range * dec!(100)
        };
        k = alpha * rsv + (Decimal::ONE - alpha) * k;
        d = alpha * k + (Decimal::ONE - alpha) * d;
        out[i] = Some(KdjPoint {
            k,
            d,
            j: dec!(3) * k - dec!(2) * d,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decs(values: &[f64]) -> Vec<Decimal> {
        values.iter().map(|v| Decimal::try_from(*v).unwrap()).collect()
    }

    #[test]
    fn test_sma_warmup_and_values() {
        let values = decs(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let out = sma(&values, 3);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_eq!(out[2], Some(dec!(2)));
        assert_eq!(out[3], Some(dec!(3)));
        assert_eq!(out[4], Some(dec!(4)));
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let values = decs(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let out = rsi(&values, 6);
        assert_eq!(out[6], Some(dec!(100)));
        assert_eq!(out[5], None);
    }

    #[test]
    fn test_rsi_balanced_is_50() {
        // 涨跌幅度完全对称 → RSI = 50
        let values = decs(&[10.0, 11.0, 10.0, 11.0, 10.0, 11.0, 10.0]);
        let out = rsi(&values, 6);
        assert_eq!(out[6], Some(dec!(50)));
    }

    #[test]
    fn test_ema_converges_toward_latest() {
        let values = decs(&[10.0; 20])
            .into_iter()
            .chain(decs(&[20.0; 20]))
            .collect::<Vec<_>>();
        let out = ema(&values, 5);
        let last = out.last().unwrap().unwrap();
        assert!(last > dec!(19.9), "EMA 应收敛到新价位, 实际 {}", last);
    }

    #[test]
    fn test_macd_warmup() {
        let values = decs(&[10.0; 40]);
        let out = macd(&values, 12, 26, 9);
        assert!(out[33].is_none());
        let point = out[39].unwrap();
        // 平盘序列 DIF/DEA 均为零
        assert_eq!(point.dif, Decimal::ZERO);
        assert_eq!(point.dea, Decimal::ZERO);
    }

    #[test]
    fn test_kdj_flat_series() {
        let values = decs(&[10.0; 15]);
        let out = kdj(&values, &values, &values, 9, 3);
        assert!(out[7].is_none());
        let point = out[14].unwrap();
        // 无波动时 RSV 取 50, K/D 保持在种子值
        assert_eq!(point.k, dec!(50));
        assert_eq!(point.d, dec!(50));
        assert_eq!(point.j, dec!(50));
    }
}
