//! 选股工作流。
//!
//! 一轮完整流程：全市场快照 → 标的池过滤 → 市场统计 →
//! 并发行情获取 → 逐策略筛选 → 汇总推送。
//! 策略与推送的失败都只记日志，流程继续走完。

use anyhow::Context;
use ashare_core::{AppConfig, ScreenConfig, Symbol, TimeSeries};
use ashare_data::provider::SpotQuote;
use ashare_data::{
    Adjustment, CacheStore, ConcurrentRunner, EastmoneyProvider, FetchConfig, Fetcher,
    RateLimiter, RetryPolicy, RunnerConfig,
};
use ashare_notification::{NotificationSender, WxPusherConfig, WxPusherSender};
use ashare_strategy::strategies::limit_up::{LimitUpConfig, LimitUpStrategy};
use chrono::{DateTime, Datelike, Days, NaiveDate, Weekday};
use chrono_tz::Tz;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const MARKET_TZ: Tz = chrono_tz::Asia::Shanghai;

/// 按配置组装获取管线。
fn build_fetcher(config: &AppConfig) -> Arc<Fetcher<EastmoneyProvider>> {
    let fetch = &config.fetch;
    let provider =
        EastmoneyProvider::with_timeout(Duration::from_secs(fetch.request_timeout_secs));
    let limiter = Arc::new(RateLimiter::new(
        fetch.rate_limit_calls,
        Duration::from_secs(fetch.rate_limit_window_secs),
    ));
    let retry = RetryPolicy::new(
        fetch.retry_attempts,
        Duration::from_millis(fetch.retry_base_delay_ms),
    );
    Arc::new(Fetcher::new(
        provider,
        CacheStore::new(&config.data.cache_dir),
        limiter,
        retry,
        FetchConfig {
            adjust: Adjustment::Forward,
            min_rows: fetch.min_rows,
            cutoff: fetch.cutoff(),
            timezone: MARKET_TZ,
        },
    ))
}

fn build_runner(config: &AppConfig) -> ConcurrentRunner {
    ConcurrentRunner::new(RunnerConfig {
        max_workers: config.fetch.max_workers,
        batch_size: config.fetch.batch_size,
        batch_delay: Duration::from_millis(config.fetch.batch_delay_ms),
    })
}

/// 从快照筛出参与选股的标的池。
pub fn select_universe(spot: &[SpotQuote], screen: &ScreenConfig) -> Vec<Symbol> {
    spot.iter()
        .filter_map(|quote| {
            let symbol = Symbol::new(&quote.code, &quote.name);
            if screen.exclude_star_market && symbol.is_star_market() {
                return None;
            }
            if screen.exclude_chinext && symbol.is_chinext() {
                return None;
            }
            if screen.exclude_st && symbol.is_st() {
                return None;
            }
            match quote.market_cap {
                Some(cap) if cap >= screen.min_market_cap => Some(symbol),
                _ => None,
            }
        })
        .collect()
}

/// 全市场涨跌统计。
pub fn market_statistics(spot: &[SpotQuote]) -> String {
    let mut limit_up = 0usize;
    let mut limit_down = 0usize;
    let mut up5 = 0usize;
    let mut down5 = 0usize;

    for quote in spot {
        let Some(pct) = quote.pct_change else {
            continue;
        };
        if pct >= dec!(9.5) {
            limit_up += 1;
        }
        if pct <= dec!(-9.5) {
            limit_down += 1;
        }
        if pct >= dec!(5) {
            up5 += 1;
        }
        if pct <= dec!(-5) {
            down5 += 1;
        }
    }

    format!(
        "************************ 市场统计 ************************\n\
         涨停数：{}   跌停数：{}\n\
         涨幅大于5%数：{}  跌幅大于5%数：{}\n\
         ************************ 策略结果 ************************\n",
        limit_up, limit_down, up5, down5
    )
}

fn today_local() -> NaiveDate {
    chrono::Utc::now().with_timezone(&MARKET_TZ).date_naive()
}

async fn push_report(config: &AppConfig, report: &str) {
    let mut wx = WxPusherConfig::new(config.push.app_token.clone(), config.push.uids.clone());
    wx.enabled = config.push.enabled;
    let sender = WxPusherSender::new(wx);
    if let Err(e) = sender.send_text(report).await {
        error!(error = %e, "推送失败");
    }
}

/// 执行一轮完整选股。
pub async fn run_scan(config: &AppConfig) -> anyhow::Result<()> {
    info!("************ 选股流程开始 ************");

    let provider =
        EastmoneyProvider::with_timeout(Duration::from_secs(config.fetch.request_timeout_secs));
    let spot = match provider.fetch_spot().await {
        Ok(spot) => spot,
        Err(e) => {
            push_report(config, &format!("选股流程执行失败: {}", e)).await;
            return Err(e).context("拉取全市场快照失败");
        }
    };
    info!(total = spot.len(), "快照拉取完成");

    let symbols = select_universe(&spot, &config.screen);
    info!(universe = symbols.len(), "标的池过滤完成");

    let fetcher = build_fetcher(config);
    let runner = build_runner(config);
    let data = runner.run(fetcher, &symbols, config.data.start_date).await;

    let eval_date = config.data.end_date.unwrap_or_else(today_local);
    // 截断到评估日, 丢弃评估日尚未上市的标的
    let eval_data: Vec<(Symbol, TimeSeries)> = data
        .into_iter()
        .filter_map(|(symbol, series)| {
            let truncated = series.up_to(eval_date);
            if truncated.is_empty() {
                return None;
            }
            Some((symbol, truncated))
        })
        .collect();

    let mut report = market_statistics(&spot);
    let mut any_hit = false;
    let mut limit_up_hits: Vec<Symbol> = Vec::new();

    let strategies = ashare_strategy::build_all(&config.strategies, &config.screen.top_list);
    for strategy in &strategies {
        let mut hits: Vec<&Symbol> = eval_data
            .iter()
            .filter(|(symbol, series)| strategy.check(symbol, series))
            .map(|(symbol, _)| symbol)
            .collect();
        hits.sort_by(|a, b| a.code.cmp(&b.code));

        info!(strategy = strategy.name(), hits = hits.len(), "策略筛选完成");
        if hits.is_empty() {
            continue;
        }
        any_hit = true;
        let names: Vec<String> = hits.iter().map(|s| s.to_string()).collect();
        report.push_str(&format!(
            "\n**************\"{}\"**************\n{}\n",
            strategy.name(),
            names.join("、")
        ));
        if strategy.name() == "涨停板次日溢价" {
            limit_up_hits = hits.into_iter().cloned().collect();
        }
    }

    if !limit_up_hits.is_empty() {
        report.push_str(&backtest_report(config, &eval_data, &limit_up_hits, eval_date));
    }

    if !any_hit {
        report.push_str("\n今日没有符合条件的股票\n");
    }
    push_report(config, &report).await;

    info!("************ 选股流程结束 ************");
    Ok(())
}

/// 对涨停板候选做次日溢价回放并汇总。
fn backtest_report(
    config: &AppConfig,
    eval_data: &[(Symbol, TimeSeries)],
    hits: &[Symbol],
    eval_date: NaiveDate,
) -> String {
    let limit_cfg: LimitUpConfig = config
        .strategies
        .get("涨停板次日溢价")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();
    let strategy = LimitUpStrategy::new(limit_cfg);

    let mut out = String::from(
        "\n************************ 涨停板次日溢价回测 ************************\n",
    );
    for symbol in hits {
        let Some((_, series)) = eval_data.iter().find(|(s, _)| s == symbol) else {
            continue;
        };
        let stats = strategy.backtest(
            series,
            config.data.start_date,
            eval_date,
        );
        if stats.trades == 0 {
            continue;
        }
        out.push_str(&format!(
            "{}：交易 {} 次, 胜率 {:.1}%, 平均收益 {:.2}%\n",
            symbol,
            stats.trades,
            stats.win_rate * dec!(100),
            stats.avg_return * dec!(100),
        ));
    }
    out
}

/// 仅获取并缓存指定标的。
pub async fn run_fetch(
    config: &AppConfig,
    symbols_arg: &str,
    start_date: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let symbols: Vec<Symbol> = symbols_arg
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|code| Symbol::new(code, code))
        .collect();
    if symbols.is_empty() {
        anyhow::bail!("未给出任何标的代码");
    }

    let start = start_date.unwrap_or(config.data.start_date);
    info!(count = symbols.len(), start = %start, "开始行情获取");

    let fetcher = build_fetcher(config);
    let runner = build_runner(config);
    let data = runner.run(fetcher, &symbols, start).await;

    for symbol in &symbols {
        match data.get(symbol) {
            Some(series) => info!(
                symbol = %symbol.code,
                rows = series.len(),
                last = %series.last_date().map(|d| d.to_string()).unwrap_or_default(),
                "获取成功"
            ),
            None => warn!(symbol = %symbol.code, "本轮无可用数据"),
        }
    }
    info!(succeeded = data.len(), requested = symbols.len(), "行情获取结束");
    Ok(())
}

/// 下一个工作日执行时刻。
fn next_run(now: DateTime<Tz>, exec_at: chrono::NaiveTime) -> DateTime<Tz> {
    let mut date = now.date_naive();
    if now.time() >= exec_at {
        date = date.checked_add_days(Days::new(1)).unwrap_or(date);
    }
    while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        date = date.checked_add_days(Days::new(1)).unwrap_or(date);
    }
    date.and_time(exec_at)
        .and_local_timezone(MARKET_TZ)
        .earliest()
        .unwrap_or(now)
}

/// 定时模式：每个工作日到点执行一轮选股。
pub async fn run_daemon(config: &AppConfig) -> anyhow::Result<()> {
    let exec_at = config.schedule.exec_at();
    info!(exec_time = %config.schedule.exec_time, "定时模式启动");

    loop {
        let now = chrono::Utc::now().with_timezone(&MARKET_TZ);
        let next = next_run(now, exec_at);
        let wait = (next - now)
            .to_std()
            .unwrap_or_else(|_| Duration::from_secs(60));
        info!(next = %next, wait_secs = wait.as_secs(), "等待下一次执行");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("收到终止信号, 定时模式退出");
                break;
            }
            _ = tokio::time::sleep(wait) => {
                if let Err(e) = run_scan(config).await {
                    error!(error = %e, "本轮选股执行失败");
                }
            }
        }
    }
    Ok(())
}
