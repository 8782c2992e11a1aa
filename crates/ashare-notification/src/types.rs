//! 通知类型定义。

use async_trait::async_trait;
use thiserror::Error;

/// 通知发送错误。
#[derive(Debug, Error)]
pub enum NotificationError {
    /// HTTP 请求失败
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// 服务端拒绝（返回非成功业务码）
    #[error("Push rejected with code {code}: {message}")]
    Rejected { code: i64, message: String },

    /// 响应无法解析
    #[error("Malformed push response: {0}")]
    Malformed(String),
}

pub type NotificationResult = Result<(), NotificationError>;

/// 文本消息发送通道。
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// 通道名称（日志用）。
    fn name(&self) -> &str;

    /// 发送一段文本。通道被停用时应静默成功。
    async fn send_text(&self, content: &str) -> NotificationResult;
}
