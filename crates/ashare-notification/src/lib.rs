//! # AShare Notification
//!
//! 选股报告的消息推送通道。
//!
//! 推送失败只记日志，绝不让筛选流程中断。

pub mod types;
pub mod wxpusher;

pub use types::{NotificationError, NotificationResult, NotificationSender};
pub use wxpusher::{WxPusherConfig, WxPusherSender};
