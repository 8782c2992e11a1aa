//! 上游请求重试策略。
//!
//! 指数退避加随机抖动：`delay = base * 2^attempt`，封顶 `max_delay`，
//! 抖动幅度 ±50%，避免批量任务同时失败后同时重试。

use rand::Rng;
use std::time::Duration;

/// 重试策略。
///
/// 只有瞬态错误才进入重试；永久性错误由调用方立即降级处理。
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 总尝试次数（含首次）
    pub max_attempts: u32,
    /// 首次重试前的基础延迟
    pub base_delay: Duration,
    /// 退避延迟上限
    pub max_delay: Duration,
    /// 是否加入 ±50% 随机抖动
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// 创建指定尝试次数与基础延迟的策略，其余取默认值。
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            ..Self::default()
        }
    }

    /// 第 `attempt` 次失败后的退避延迟（attempt 从 0 起）。
    pub fn delay(&self, attempt: u32) -> Duration {
        let scale = 2f64.powi(attempt.min(16) as i32);
        let seconds = self.base_delay.as_secs_f64() * scale;
        let capped = seconds.min(self.max_delay.as_secs_f64());
        let mut delay = Duration::from_secs_f64(capped);

        if self.jitter {
            let half = delay.as_millis() as u64 / 2;
            if half > 0 {
                let offset = rand::thread_rng().gen_range(0..=half * 2);
                let millis = (delay.as_millis() as i64 + offset as i64 - half as i64).max(0);
                delay = Duration::from_millis(millis as u64);
            }
        }

        delay
    }
}
