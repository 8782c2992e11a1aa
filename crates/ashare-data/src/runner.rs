//! 并发批量获取调度器。
//!
//! 以有界并发驱动 `Fetcher` 遍历标的列表，聚合成「标的 → 序列」映射。
//! 单个标的的缓慢或失败不会阻塞、更不会取消其余任务；
//! 任务内的任何异常（包括 panic）都在任务边界被吸收为「该标的无数据」。
//!
//! 可选的分批调度只为平滑对限速闸门的突发压力，硬性上限始终由
//! `RateLimiter` 保证，分批与否不影响正确性。

use crate::fetcher::Fetcher;
use crate::provider::DailyBarProvider;
use ashare_core::{Symbol, TimeSeries};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// 调度器配置。
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// 最大并发工作任务数
    pub max_workers: usize,
    /// 分批大小（0 表示不分批）
    pub batch_size: usize,
    /// 批间延迟
    pub batch_delay: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_workers: 8,
            batch_size: 0,
            batch_delay: Duration::from_millis(500),
        }
    }
}

/// 有界并发的批量获取调度器。
pub struct ConcurrentRunner {
    config: RunnerConfig,
}

impl ConcurrentRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// 并发获取全部标的的时间序列。
    ///
    /// 返回映射只包含有可用数据的标的；空序列（含彻底失败的降级
    /// 结果）被丢弃。完成顺序不作保证，结果按标的为键，天然与
    /// 顺序无关。
    pub async fn run<P>(
        &self,
        fetcher: Arc<Fetcher<P>>,
        symbols: &[Symbol],
        start: NaiveDate,
    ) -> HashMap<Symbol, TimeSeries>
    where
        P: DailyBarProvider + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers.max(1)));
        let mut results: HashMap<Symbol, TimeSeries> = HashMap::new();

        let chunk_size = if self.config.batch_size == 0 {
            symbols.len().max(1)
        } else {
            self.config.batch_size
        };
        let batch_count = symbols.len().div_ceil(chunk_size);

        for (batch_idx, batch) in symbols.chunks(chunk_size).enumerate() {
            let mut tasks: JoinSet<(Symbol, TimeSeries)> = JoinSet::new();

            for symbol in batch.iter().cloned() {
                let fetcher = Arc::clone(&fetcher);
                let semaphore = Arc::clone(&semaphore);
                tasks.spawn(async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => return (symbol, TimeSeries::new()),
                    };
                    let outcome = fetcher.fetch(&symbol, start).await;
                    if outcome.is_degraded() {
                        debug!(symbol = %symbol.code, "获取降级, 使用最佳可用数据");
                    }
                    (symbol, outcome.into_series())
                });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((symbol, series)) => {
                        if series.is_empty() {
                            debug!(symbol = %symbol.code, "本轮无可用数据, 跳过");
                        } else {
                            results.insert(symbol, series);
                        }
                    }
                    // 任务 panic 只影响自己的标的
                    Err(e) => error!(error = %e, "获取任务异常退出"),
                }
            }

            if batch_idx + 1 < batch_count && !self.config.batch_delay.is_zero() {
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }

        info!(
            requested = symbols.len(),
            succeeded = results.len(),
            "批量行情获取完成"
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use crate::fetcher::FetchConfig;
    use crate::rate_limit::RateLimiter;
    use crate::retry::RetryPolicy;
    use crate::test_util::PoisonProvider;

    fn symbols(n: usize) -> Vec<Symbol> {
        (0..n)
            .map(|i| Symbol::new(format!("6000{:02}", i), format!("测试{}", i)))
            .collect()
    }

    fn make_fetcher(provider: PoisonProvider, dir: &std::path::Path) -> Arc<Fetcher<PoisonProvider>> {
        Arc::new(Fetcher::new(
            provider,
            CacheStore::new(dir),
            Arc::new(RateLimiter::new(1000, Duration::from_secs(1))),
            RetryPolicy {
                max_attempts: 2,
                base_delay: Duration::from_millis(10),
                max_delay: Duration::from_millis(50),
                jitter: false,
            },
            FetchConfig::default(),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_with_poison_symbol() {
        // 20 个标的, 第 10 个上游永远失败: 返回 19 个条目, 全程不抛错
        let dir = tempfile::tempdir().unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let provider = PoisonProvider::new("600009", start, 120);
        let fetcher = make_fetcher(provider, dir.path());

        let runner = ConcurrentRunner::new(RunnerConfig {
            max_workers: 4,
            ..RunnerConfig::default()
        });
        let all = symbols(20);
        let results = runner.run(fetcher, &all, start).await;

        assert_eq!(results.len(), 19);
        assert!(!results.contains_key(&Symbol::new("600009", "测试9")));
        for series in results.values() {
            assert_eq!(series.len(), 120);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_symbol_list() {
        let dir = tempfile::tempdir().unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let provider = PoisonProvider::new("999999", start, 120);
        let fetcher = make_fetcher(provider, dir.path());

        let runner = ConcurrentRunner::new(RunnerConfig::default());
        let results = runner.run(fetcher, &[], start).await;
        assert!(results.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_batched_run_covers_all_symbols() {
        let dir = tempfile::tempdir().unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let provider = PoisonProvider::new("999999", start, 120);
        let fetcher = make_fetcher(provider, dir.path());

        let runner = ConcurrentRunner::new(RunnerConfig {
            max_workers: 2,
            batch_size: 3,
            batch_delay: Duration::from_millis(100),
        });
        let all = symbols(10);
        let results = runner.run(fetcher, &all, start).await;

        assert_eq!(results.len(), 10);
    }
}
