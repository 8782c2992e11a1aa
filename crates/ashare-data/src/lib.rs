//! # AShare Data
//!
//! 行情数据获取与缓存核心。
//!
//! 把一个不可靠、限速的上游行情源，变成可供数十个策略评估器
//! 并发读取的、每标的一份的一致时间序列存储。
//!
//! # 组件
//!
//! - [`rate_limit::RateLimiter`] — 进程级滑动窗口限速闸门
//! - [`cache::CacheStore`] — 每标的一个 CSV 文件的本地缓存与新鲜度判定
//! - [`fetcher::Fetcher`] — 单标的「查缓存 → 增量拉取 → 合并落盘」管线
//! - [`runner::ConcurrentRunner`] — 有界并发的批量调度器
//!
//! # 数据流
//!
//! ```text
//! 标的列表
//!    │
//!    ▼
//! ConcurrentRunner ──(每标的一个任务, 有界并发)──▶ Fetcher
//!                                                  │
//!                                     ┌────────────┼─────────────┐
//!                                     ▼            ▼             ▼
//!                                CacheStore   RateLimiter   上游数据源
//!                                 (读/写)      (acquire)     (重试+超时)
//! ```
//!
//! 任何单标的的失败都在任务边界被吸收为「该标的本轮无数据」，
//! 不会向批量调用方抛出异常。

pub mod cache;
pub mod error;
pub mod fetcher;
pub mod provider;
pub mod rate_limit;
pub mod retry;
pub mod runner;

#[cfg(test)]
pub(crate) mod test_util;

pub use cache::{CacheStore, Freshness};
pub use error::{DataError, Result};
pub use fetcher::{DegradeReason, FetchConfig, FetchOutcome, Fetcher};
pub use provider::{Adjustment, DailyBarProvider, EastmoneyProvider, ProviderError, RawBar};
pub use rate_limit::RateLimiter;
pub use retry::RetryPolicy;
pub use runner::{ConcurrentRunner, RunnerConfig};
