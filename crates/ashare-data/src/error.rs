//! 数据模块错误类型。

use crate::provider::ProviderError;
use thiserror::Error;

/// 数据层错误。
///
/// 注意：单标的获取管线对外不暴露这些错误——`Fetcher` 把所有失败
/// 降级为 `FetchOutcome::Degraded`。本类型只在缓存读写等内部边界使用。
#[derive(Debug, Error)]
pub enum DataError {
    /// 缓存文件存在但无法解析或缺少必需列
    #[error("Corrupt cache file {path}: {reason}")]
    CorruptCache { path: String, reason: String },

    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV 读写错误
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// 上游数据源错误
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

pub type Result<T> = std::result::Result<T, DataError>;
