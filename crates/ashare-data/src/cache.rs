//! 每标的一个 CSV 文件的本地行情缓存。
//!
//! 文件路径为 `{cache_dir}/{code}.csv`，列固定为
//! date,open,close,high,low,volume,amount,turnover_rate。
//! 涨跌幅可由相邻收盘价导出，不落盘，由 `TimeSeries` 载入时重算。
//!
//! # 新鲜度判定
//!
//! 「最新应有交易日」按本地时间近似：当前时刻到达收盘判定时刻
//! （默认 15:00）则为今天，否则为昨天。该近似不查询交易日历，
//! 周末与节假日会把缓存误判为过期——此时上游会返回空增量，
//! 管线降级回缓存数据，结果仍然正确，只是多一次上游调用。
//!
//! 不同标的的缓存文件互不相交；同一标的在一轮运行中至多存在
//! 一个进行中的获取任务，因此文件层面无需跨任务加锁。

use crate::error::{DataError, Result};
use ashare_core::{Bar, Symbol, TimeSeries};
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 缓存文件中的一行。
///
/// 数值列固定走字符串编解码，往返缓存不经过浮点转换。
#[derive(Debug, Serialize, Deserialize)]
struct BarRecord {
    date: NaiveDate,
    #[serde(with = "rust_decimal::serde::str")]
    open: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    close: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    high: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    low: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    volume: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    turnover_rate: Decimal,
}

impl From<&Bar> for BarRecord {
    fn from(bar: &Bar) -> Self {
        Self {
            date: bar.date,
            open: bar.open,
            close: bar.close,
            high: bar.high,
            low: bar.low,
            volume: bar.volume,
            amount: bar.amount,
            turnover_rate: bar.turnover_rate,
        }
    }
}

impl From<BarRecord> for Bar {
    fn from(record: BarRecord) -> Self {
        Bar::new(
            record.date,
            record.open,
            record.close,
            record.high,
            record.low,
            record.volume,
            record.amount,
            record.turnover_rate,
        )
    }
}

/// 缓存条目相对请求范围的新鲜度分类。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// 覆盖范围完整且已含最新应有交易日，无需上游调用
    Fresh,
    /// 末端过期：需要拉取 `[fetch_from, 今天]` 的增量
    Stale { fetch_from: NaiveDate },
    /// 历史不足：参考策略为从请求起始日整段重拉（而非窗口回补）
    ShortHistory { fetch_from: NaiveDate },
    /// 无缓存：全量拉取
    Absent { fetch_from: NaiveDate },
}

impl Freshness {
    /// 需要向上游请求的起始日；`Fresh` 时为 `None`。
    pub fn fetch_from(&self) -> Option<NaiveDate> {
        match self {
            Self::Fresh => None,
            Self::Stale { fetch_from }
            | Self::ShortHistory { fetch_from }
            | Self::Absent { fetch_from } => Some(*fetch_from),
        }
    }
}

/// 每标的一个 CSV 文件的缓存存储。
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 标的对应的缓存文件路径。
    pub fn path(&self, symbol: &Symbol) -> PathBuf {
        self.dir.join(format!("{}.csv", symbol.code))
    }

    /// 读取缓存条目。
    ///
    /// 文件不存在或无数据行时返回 `Ok(None)`；文件存在但无法解析、
    /// 缺少必需列时返回 `CorruptCache`，调用方应删除后按无缓存处理。
    pub fn read(&self, symbol: &Symbol) -> Result<Option<TimeSeries>> {
        let path = self.path(symbol);
        if !path.exists() {
            return Ok(None);
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let mut bars = Vec::new();
        for record in reader.deserialize::<BarRecord>() {
            let record = record.map_err(|e| corrupt(&path, e))?;
            bars.push(Bar::from(record));
        }

        if bars.is_empty() {
            return Ok(None);
        }

        debug!(symbol = %symbol.code, rows = bars.len(), "缓存命中");
        Ok(Some(TimeSeries::from_bars(bars)))
    }

    /// 原子化写入完整序列：先写临时文件再重命名覆盖。
    pub fn write(&self, symbol: &Symbol, series: &TimeSeries) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path(symbol);
        let tmp = self.dir.join(format!("{}.csv.tmp", symbol.code));

        let mut writer = csv::Writer::from_path(&tmp)?;
        for bar in series.bars() {
            writer.serialize(BarRecord::from(bar))?;
        }
        writer.flush()?;
        drop(writer);

        fs::rename(&tmp, &path)?;
        debug!(symbol = %symbol.code, rows = series.len(), path = %path.display(), "缓存写入完成");
        Ok(())
    }

    /// 删除缓存条目（不存在时静默成功）。
    pub fn remove(&self, symbol: &Symbol) -> Result<()> {
        let path = self.path(symbol);
        match fs::remove_file(&path) {
            Ok(_) => {
                info!(symbol = %symbol.code, path = %path.display(), "缓存条目已删除");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// 判定缓存序列相对请求范围的新鲜度。
    ///
    /// 纯函数：评估时刻由调用方注入，便于测试。
    pub fn freshness(
        series: Option<&TimeSeries>,
        requested_start: NaiveDate,
        now: NaiveDateTime,
        cutoff: NaiveTime,
    ) -> Freshness {
        let expected = latest_expected_trading_date(now, cutoff);

        let series = match series.filter(|s| !s.is_empty()) {
            Some(s) => s,
            None => {
                return Freshness::Absent {
                    fetch_from: requested_start,
                }
            }
        };

        // first/last 此处必然存在, 上面已排除空序列
        let first = series.first_date().unwrap_or(requested_start);
        let last = series.last_date().unwrap_or(requested_start);

        if first > requested_start {
            return Freshness::ShortHistory {
                fetch_from: requested_start,
            };
        }

        if last < expected {
            return Freshness::Stale {
                fetch_from: last.checked_add_days(Days::new(1)).unwrap_or(expected),
            };
        }

        Freshness::Fresh
    }
}

/// 最新应有交易日：到达收盘判定时刻后为今天，否则为昨天。
pub fn latest_expected_trading_date(now: NaiveDateTime, cutoff: NaiveTime) -> NaiveDate {
    if now.time() >= cutoff {
        now.date()
    } else {
        now.date().checked_sub_days(Days::new(1)).unwrap_or(now.date())
    }
}

fn corrupt(path: &Path, err: impl std::fmt::Display) -> DataError {
    DataError::CorruptCache {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar(y: i32, m: u32, d: u32) -> Bar {
        Bar::new(
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            dec!(10.0),
            dec!(10.5),
            dec!(10.6),
            dec!(9.9),
            dec!(1000000),
            dec!(10500000),
            dec!(2.5),
        )
    }

    fn cutoff() -> NaiveTime {
        NaiveTime::from_hms_opt(15, 0, 0).unwrap()
    }

    fn at(date: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        date.and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap())
    }

    #[test]
    fn test_write_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let symbol = Symbol::new("000001", "平安银行");
        let series = TimeSeries::from_bars(vec![bar(2024, 1, 2), bar(2024, 1, 3)]);

        store.write(&symbol, &series).unwrap();
        assert!(store.path(&symbol).exists());

        let loaded = store.read(&symbol).unwrap().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.bars()[0].close, dec!(10.5));
    }

    #[test]
    fn test_read_absent_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        assert!(store
            .read(&Symbol::new("600000", "浦发银行"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_read_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let symbol = Symbol::new("600000", "浦发银行");
        fs::write(store.path(&symbol), "这不是 CSV 数据\n乱码行").unwrap();

        let err = store.read(&symbol).unwrap_err();
        assert!(matches!(err, DataError::CorruptCache { .. }));
    }

    #[test]
    fn test_read_missing_columns_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let symbol = Symbol::new("600000", "浦发银行");
        fs::write(store.path(&symbol), "date,open\n2024-01-02,10.0\n").unwrap();

        let err = store.read(&symbol).unwrap_err();
        assert!(matches!(err, DataError::CorruptCache { .. }));
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        store.remove(&Symbol::new("600000", "浦发银行")).unwrap();
    }

    #[test]
    fn test_latest_expected_trading_date() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2024, 6, 9).unwrap();
        assert_eq!(latest_expected_trading_date(at(today, 16, 0), cutoff()), today);
        assert_eq!(latest_expected_trading_date(at(today, 15, 0), cutoff()), today);
        assert_eq!(
            latest_expected_trading_date(at(today, 10, 0), cutoff()),
            yesterday
        );
    }

    #[test]
    fn test_freshness_stale_after_cutoff() {
        // 缓存最新为昨天, 16:00 评估: 今天的数据应已发布 → Stale
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let series = TimeSeries::from_bars(vec![bar(2024, 6, 8), bar(2024, 6, 9)]);
        let f = CacheStore::freshness(
            Some(&series),
            NaiveDate::from_ymd_opt(2024, 6, 8).unwrap(),
            at(today, 16, 0),
            cutoff(),
        );
        assert_eq!(
            f,
            Freshness::Stale {
                fetch_from: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
            }
        );
    }

    #[test]
    fn test_freshness_fresh_before_cutoff() {
        // 缓存最新为今天, 10:00 评估: 昨天即为最新应有交易日 → Fresh
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let series = TimeSeries::from_bars(vec![bar(2024, 6, 9), bar(2024, 6, 10)]);
        let f = CacheStore::freshness(
            Some(&series),
            NaiveDate::from_ymd_opt(2024, 6, 9).unwrap(),
            at(today, 10, 0),
            cutoff(),
        );
        assert_eq!(f, Freshness::Fresh);
    }

    #[test]
    fn test_freshness_short_history() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let series = TimeSeries::from_bars(vec![bar(2024, 6, 9), bar(2024, 6, 10)]);
        let requested = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let f = CacheStore::freshness(Some(&series), requested, at(today, 16, 0), cutoff());
        assert_eq!(
            f,
            Freshness::ShortHistory {
                fetch_from: requested
            }
        );
    }

    #[test]
    fn test_freshness_absent() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let requested = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(
            CacheStore::freshness(None, requested, at(today, 16, 0), cutoff()),
            Freshness::Absent {
                fetch_from: requested
            }
        );
        let empty = TimeSeries::new();
        assert_eq!(
            CacheStore::freshness(Some(&empty), requested, at(today, 16, 0), cutoff()),
            Freshness::Absent {
                fetch_from: requested
            }
        );
    }
}
