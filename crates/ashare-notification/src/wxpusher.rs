//! WxPusher 推送通道。
//!
//! 通过 WxPusher 开放接口向配置的 UID 列表发送文本消息。
//! 超长报告按上限切片逐条发送，片间加入短暂延迟避免触发服务端限流。

use crate::types::{NotificationError, NotificationResult, NotificationSender};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_API_URL: &str = "https://wxpusher.zjiecode.com/api/send/message";
/// WxPusher 成功业务码。
const CODE_OK: i64 = 1000;
/// 单条消息内容上限（字符）。
const MAX_CHUNK_CHARS: usize = 4096;
/// 分片发送的片间延迟。
const CHUNK_DELAY: Duration = Duration::from_secs(1);

/// WxPusher 通道配置。
#[derive(Debug, Clone)]
pub struct WxPusherConfig {
    /// 应用 token（wxpusher 后台申请）
    pub app_token: String,
    /// 接收用户 UID 列表
    pub uids: Vec<String>,
    /// 是否启用；停用时发送调用静默成功
    pub enabled: bool,
    /// 接口地址（测试时可覆盖）
    pub api_url: String,
}

impl WxPusherConfig {
    /// 创建新配置。
    pub fn new(app_token: impl Into<String>, uids: Vec<String>) -> Self {
        Self {
            app_token: app_token.into(),
            uids,
            enabled: true,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// 从环境变量创建配置（`WXPUSHER_APP_TOKEN`、`WXPUSHER_UIDS` 逗号分隔）。
    pub fn from_env() -> Option<Self> {
        let app_token = std::env::var("WXPUSHER_APP_TOKEN").ok()?;
        let uids = std::env::var("WXPUSHER_UIDS")
            .ok()?
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Some(Self::new(app_token, uids))
    }
}

/// WxPusher 推送发送器。
pub struct WxPusherSender {
    config: WxPusherConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    code: i64,
    #[serde(default)]
    msg: String,
}

impl WxPusherSender {
    pub fn new(config: WxPusherConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// 从环境变量创建发送器。
    pub fn from_env() -> Option<Self> {
        WxPusherConfig::from_env().map(Self::new)
    }

    /// 按字符数切片，避免在多字节字符中间截断。
    fn chunks(content: &str) -> Vec<String> {
        let chars: Vec<char> = content.chars().collect();
        chars
            .chunks(MAX_CHUNK_CHARS)
            .map(|c| c.iter().collect())
            .collect()
    }

    async fn send_chunk(&self, content: &str) -> NotificationResult {
        let body = json!({
            "appToken": self.config.app_token,
            "content": content,
            "contentType": 1,
            "uids": self.config.uids,
        });

        let response = self
            .client
            .post(&self.config.api_url)
            .json(&body)
            .send()
            .await?;

        let parsed: PushResponse = response
            .json()
            .await
            .map_err(|e| NotificationError::Malformed(e.to_string()))?;

        if parsed.code != CODE_OK {
            return Err(NotificationError::Rejected {
                code: parsed.code,
                message: parsed.msg,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationSender for WxPusherSender {
    fn name(&self) -> &str {
        "wxpusher"
    }

    async fn send_text(&self, content: &str) -> NotificationResult {
        if !self.config.enabled {
            debug!("推送已停用, 丢弃消息");
            return Ok(());
        }
        if self.config.uids.is_empty() {
            warn!("未配置接收 UID, 丢弃消息");
            return Ok(());
        }

        let chunks = Self::chunks(content);
        let total = chunks.len();
        for (idx, chunk) in chunks.iter().enumerate() {
            self.send_chunk(chunk).await?;
            if idx + 1 < total {
                tokio::time::sleep(CHUNK_DELAY).await;
            }
        }

        info!(chunks = total, chars = content.chars().count(), "推送发送完成");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender_for(server: &mockito::ServerGuard, enabled: bool) -> WxPusherSender {
        WxPusherSender::new(WxPusherConfig {
            app_token: "AT_test".to_string(),
            uids: vec!["UID_test".to_string()],
            enabled,
            api_url: format!("{}/api/send/message", server.url()),
        })
    }

    #[tokio::test]
    async fn test_send_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/send/message")
            .with_status(200)
            .with_body(r#"{"code":1000,"msg":"处理成功"}"#)
            .create_async()
            .await;

        let sender = sender_for(&server, true);
        sender.send_text("今日无符合条件的标的").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/send/message")
            .with_status(200)
            .with_body(r#"{"code":1001,"msg":"appToken 无效"}"#)
            .create_async()
            .await;

        let sender = sender_for(&server, true);
        let err = sender.send_text("测试").await.unwrap_err();
        assert!(matches!(err, NotificationError::Rejected { code: 1001, .. }));
    }

    #[tokio::test]
    async fn test_disabled_sender_is_noop() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/send/message")
            .expect(0)
            .create_async()
            .await;

        let sender = sender_for(&server, false);
        sender.send_text("不应发送").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_long_message_is_chunked() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/send/message")
            .with_status(200)
            .with_body(r#"{"code":1000,"msg":"处理成功"}"#)
            .expect(2)
            .create_async()
            .await;

        let sender = sender_for(&server, true);
        let long = "股".repeat(MAX_CHUNK_CHARS + 10);
        sender.send_text(&long).await.unwrap();
        mock.assert_async().await;
    }

    #[test]
    fn test_chunks_respect_char_boundaries() {
        let content = "涨".repeat(MAX_CHUNK_CHARS * 2 + 1);
        let chunks = WxPusherSender::chunks(&content);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), MAX_CHUNK_CHARS);
        assert_eq!(chunks[2].chars().count(), 1);
    }
}
