//! 东方财富行情数据源。
//!
//! 通过东财公开行情接口获取 A 股数据：
//! - `push2his`：日线 K 线历史（前复权可选）
//! - `push2`：全市场实时快照列表（代码、名称、涨跌幅、总市值）
//!
//! 接口返回的 K 线为逗号拼接的字符串行，字段顺序固定；
//! 本模块解析时校验字段数与日期格式，防御上游的格式漂移。

use super::{Adjustment, DailyBarProvider, ProviderError, RawBar, SpotQuote};
use ashare_core::Symbol;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_KLINE_BASE: &str = "https://push2his.eastmoney.com";
const DEFAULT_SPOT_BASE: &str = "https://push2.eastmoney.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// 日线接口字段：日期,开盘,收盘,最高,最低,成交量,成交额,振幅,涨跌幅,涨跌额,换手率。
const KLINE_FIELDS: &str = "f51,f52,f53,f54,f55,f56,f57,f58,f59,f60,f61";
const KLINE_FIELD_COUNT: usize = 11;

/// 快照列表字段：最新价,涨跌幅,代码,名称,总市值。
const SPOT_FIELDS: &str = "f2,f3,f12,f14,f20";
/// 沪深 A 股全市场筛选表达式。
const SPOT_MARKETS: &str = "m:0+t:6,m:0+t:80,m:1+t:2,m:1+t:23";

/// 东方财富行情客户端。
#[derive(Clone)]
pub struct EastmoneyProvider {
    client: reqwest::Client,
    kline_base: String,
    spot_base: String,
}

impl EastmoneyProvider {
    /// 创建客户端，使用默认 30 秒请求超时。
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// 创建客户端并指定请求超时。超时会被归类为瞬态错误进入重试。
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            kline_base: DEFAULT_KLINE_BASE.to_string(),
            spot_base: DEFAULT_SPOT_BASE.to_string(),
        }
    }

    /// 覆盖接口地址（测试用）。
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.kline_base = base.clone();
        self.spot_base = base;
        self
    }

    /// 东财 secid：沪市（6 开头）前缀 1，其余前缀 0。
    fn secid(symbol: &Symbol) -> String {
        if symbol.code.starts_with('6') {
            format!("1.{}", symbol.code)
        } else {
            format!("0.{}", symbol.code)
        }
    }

    fn fqt(adjust: Adjustment) -> &'static str {
        match adjust {
            Adjustment::None => "0",
            Adjustment::Forward => "1",
            Adjustment::Backward => "2",
        }
    }

    /// 拉取全市场 A 股实时快照列表。
    pub async fn fetch_spot(&self) -> Result<Vec<SpotQuote>, ProviderError> {
        let url = format!("{}/api/qt/clist/get", self.spot_base);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("pn", "1"),
                ("pz", "10000"),
                ("po", "1"),
                ("np", "1"),
                ("fltt", "2"),
                ("fid", "f3"),
                ("fs", SPOT_MARKETS),
                ("fields", SPOT_FIELDS),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(format!("快照响应不是合法 JSON: {}", e)))?;

        let diff = body
            .pointer("/data/diff")
            .and_then(Value::as_array)
            .ok_or(ProviderError::Empty)?;

        let quotes: Vec<SpotQuote> = diff
            .iter()
            .filter_map(|row| {
                let code = row.get("f12")?.as_str()?.to_string();
                let name = row.get("f14")?.as_str()?.to_string();
                Some(SpotQuote {
                    code,
                    name,
                    pct_change: row.get("f3").and_then(value_decimal),
                    market_cap: row.get("f20").and_then(value_decimal),
                })
            })
            .collect();

        if quotes.is_empty() {
            return Err(ProviderError::Empty);
        }

        debug!(count = quotes.len(), "快照列表拉取完成");
        Ok(quotes)
    }
}

impl Default for EastmoneyProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DailyBarProvider for EastmoneyProvider {
    async fn daily_history(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
        adjust: Adjustment,
    ) -> Result<Vec<RawBar>, ProviderError> {
        let url = format!("{}/api/qt/stock/kline/get", self.kline_base);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("secid", Self::secid(symbol)),
                ("klt", "101".to_string()),
                ("fqt", Self::fqt(adjust).to_string()),
                ("beg", start.format("%Y%m%d").to_string()),
                ("end", end.format("%Y%m%d").to_string()),
                ("fields1", "f1,f2,f3,f4,f5,f6".to_string()),
                ("fields2", KLINE_FIELDS.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        let body: KlineResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(format!("日线响应不是合法 JSON: {}", e)))?;

        let data = body
            .data
            .ok_or_else(|| ProviderError::UnknownSymbol(symbol.code.clone()))?;

        if data.klines.is_empty() {
            return Err(ProviderError::Empty);
        }

        let total = data.klines.len();
        let bars: Vec<RawBar> = data
            .klines
            .iter()
            .filter_map(|line| match parse_kline_row(line) {
                Ok(bar) => Some(bar),
                Err(reason) => {
                    warn!(symbol = %symbol.code, line = %line, reason = %reason, "跳过无法解析的 K 线行");
                    None
                }
            })
            .collect();

        if bars.is_empty() {
            return Err(ProviderError::Malformed(format!(
                "{} 行 K 线全部无法解析",
                total
            )));
        }

        debug!(symbol = %symbol.code, rows = bars.len(), "日线历史拉取完成");
        Ok(bars)
    }
}

#[derive(Debug, Deserialize)]
struct KlineResponse {
    data: Option<KlineData>,
}

#[derive(Debug, Deserialize)]
struct KlineData {
    #[serde(default)]
    klines: Vec<String>,
}

/// 解析一行逗号拼接的 K 线。
///
/// 东财成交量单位为手，这里统一换算为股。
fn parse_kline_row(line: &str) -> Result<RawBar, String> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < KLINE_FIELD_COUNT {
        return Err(format!(
            "字段数 {} 少于预期 {}",
            fields.len(),
            KLINE_FIELD_COUNT
        ));
    }

    let date = NaiveDate::parse_from_str(fields[0], "%Y-%m-%d")
        .map_err(|e| format!("日期解析失败: {}", e))?;

    Ok(RawBar {
        date,
        open: opt_decimal(fields[1]),
        close: opt_decimal(fields[2]),
        high: opt_decimal(fields[3]),
        low: opt_decimal(fields[4]),
        volume: opt_decimal(fields[5]).map(|v| v * Decimal::ONE_HUNDRED),
        amount: opt_decimal(fields[6]),
        turnover_rate: opt_decimal(fields[10]),
    })
}

fn opt_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() || s == "-" {
        return None;
    }
    Decimal::from_str(s).ok()
}

fn value_decimal(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(n) => n.as_f64().and_then(Decimal::from_f64),
        Value::String(s) => opt_decimal(s),
        _ => None,
    }
}
