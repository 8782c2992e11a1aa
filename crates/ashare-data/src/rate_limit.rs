//! 进程级上游调用限速。
//!
//! 滑动窗口计数：维护最近一个窗口内的调用时刻队列。`acquire` 在
//! 窗口内调用数达到上限时挂起，直到最早的调用滑出窗口为止。
//!
//! 公平性：等待者都阻塞在同一把公平互斥锁上，先到先得；
//! 等得最久的调用者最先放行。`acquire` 只会延迟，不会失败。

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// 滑动窗口限速闸门。
///
/// 多个工作任务共享一个实例（`Arc` 包裹），时间戳队列是
/// 整个数据层中唯一被并发修改的共享结构。
#[derive(Debug)]
pub struct RateLimiter {
    max_calls: usize,
    window: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// 创建限速器：滚动 `window` 窗口内最多 `max_calls` 次调用。
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            max_calls: max_calls.max(1),
            window,
            calls: Mutex::new(VecDeque::new()),
        }
    }

    /// 等待直到可以安全发起一次上游调用，并记录本次调用。
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut calls = self.calls.lock().await;
                let now = Instant::now();
                while calls
                    .front()
                    .is_some_and(|t| now.duration_since(*t) >= self.window)
                {
                    calls.pop_front();
                }
                if calls.len() < self.max_calls {
                    calls.push_back(now);
                    return;
                }
                // 队首是窗口内最早的调用, 等它滑出窗口
                match calls.front() {
                    Some(oldest) => self.window.saturating_sub(now.duration_since(*oldest)),
                    None => Duration::ZERO,
                }
            };
            tokio::time::sleep(wait).await;
        }
    }

    /// 当前窗口内已记录的调用数（测试与监控用）。
    pub async fn in_flight(&self) -> usize {
        let mut calls = self.calls.lock().await;
        let now = Instant::now();
        while calls
            .front()
            .is_some_and(|t| now.duration_since(*t) >= self.window)
        {
            calls.pop_front();
        }
        calls.len()
    }
}
