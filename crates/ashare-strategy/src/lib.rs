//! # AShare Strategy
//!
//! 规则化选股策略。
//!
//! 每个策略对单只标的的日线序列做纯同步判定，返回是否入选。
//! 序列由调用方截断到评估日，最低历史长度由各策略自行把关
//! （缓存层不负责长度约束）。
//!
//! 策略参数为带默认值的 serde 配置结构，由配置文件的对应节
//! 反序列化注入，便于独立调参与测试。

pub mod indicators;
pub mod strategies;

pub use strategies::build_all;

use ashare_core::{Symbol, TimeSeries};

/// 选股策略。
///
/// 实现方不得修改序列，判定失败（数据不足、缺列等）一律返回
/// `false` 而非报错——批量筛选不因单个标的中断。
pub trait Strategy: Send + Sync {
    /// 策略名称（用于报告标题与配置节键名）。
    fn name(&self) -> &str;

    /// 判定标的当前是否满足入选条件。
    fn check(&self, symbol: &Symbol, series: &TimeSeries) -> bool;
}
