//! 策略集合与装配。

pub mod backtrace_ma250;
pub mod breakthrough_platform;
pub mod climax_limitdown;
pub mod high_tight_flag;
pub mod keep_increasing;
pub mod limit_up;
pub mod low_backtrace_increase;
pub mod parking_apron;
pub mod short_term;
pub mod turtle_trade;
pub mod volume_surge;

pub use backtrace_ma250::BacktraceMa250Strategy;
pub use breakthrough_platform::BreakthroughPlatformStrategy;
pub use climax_limitdown::ClimaxLimitdownStrategy;
pub use high_tight_flag::HighTightFlagStrategy;
pub use keep_increasing::KeepIncreasingStrategy;
pub use limit_up::{BacktestStats, LimitUpStrategy};
pub use low_backtrace_increase::LowBacktraceIncreaseStrategy;
pub use parking_apron::ParkingApronStrategy;
pub use short_term::ShortTermStrategy;
pub use turtle_trade::TurtleTradeStrategy;
pub use volume_surge::VolumeSurgeStrategy;

use crate::Strategy;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::warn;

/// 从配置节反序列化策略参数，缺失或非法时回退默认值。
fn section<T: DeserializeOwned + Default>(
    params: &HashMap<String, serde_json::Value>,
    key: &str,
) -> T {
    match params.get(key) {
        None => T::default(),
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            warn!(strategy = key, error = %e, "策略配置节解析失败, 使用默认参数");
            T::default()
        }),
    }
}

/// 按配置装配全部策略。
///
/// `top_list` 为机构席位榜代码列表，仅「高而窄的旗形」使用。
pub fn build_all(
    params: &HashMap<String, serde_json::Value>,
    top_list: &[String],
) -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(LimitUpStrategy::new(section(params, "涨停板次日溢价"))),
        Box::new(VolumeSurgeStrategy::new(section(params, "放量上涨"))),
        Box::new(KeepIncreasingStrategy::new(section(params, "均线多头"))),
        Box::new(ParkingApronStrategy::new(section(params, "停机坪"))),
        Box::new(BacktraceMa250Strategy::new(section(params, "回踩年线"))),
        Box::new(BreakthroughPlatformStrategy::new(section(params, "突破平台"))),
        Box::new(LowBacktraceIncreaseStrategy::new(section(params, "无大幅回撤"))),
        Box::new(TurtleTradeStrategy::new(section(params, "海龟交易法则"))),
        Box::new(HighTightFlagStrategy::new(
            section(params, "高而窄的旗形"),
            top_list.to_vec(),
        )),
        Box::new(ClimaxLimitdownStrategy::new(section(params, "放量跌停"))),
        Box::new(ShortTermStrategy::new(section(params, "东方财富短线"))),
    ]
}
