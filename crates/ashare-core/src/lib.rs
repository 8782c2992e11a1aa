//! # AShare Core
//!
//! A 股选股系统的核心领域模型与类型。
//!
//! 本 crate 提供系统各层共用的基础类型：
//! - 标的 (`Symbol`) 与板块判断
//! - 日线数据 (`Bar`) 与时间序列 (`TimeSeries`)
//! - 应用配置管理
//! - 日志基础设施

pub mod config;
pub mod logging;
pub mod types;

pub use config::*;
pub use logging::*;
pub use types::*;
