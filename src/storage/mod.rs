//! PhotoSpace Blob 存储模块
//!
//! 元数据事务之外的字节存储：照片原图与缩略图。
//! 删除永远发生在元数据事务提交之后，属于补偿性清理

pub mod cleanup;
pub mod fs_store;
pub mod memory;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::error::AppError;

pub use cleanup::{purge_blobs, DELETE_BATCH_SIZE, RETRY_BATCH_SIZE};
pub use fs_store::FsBlobStore;
pub use memory::MemoryBlobStore;

/// 不透明的 blob 键
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobRef(String);

impl BlobRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlobRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Blob 存储错误
#[derive(Debug, Error)]
pub enum BlobError {
    /// 对象不存在
    #[error("对象 {0} 不存在")]
    NotFound(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 单次操作超出时限，调用方应缩小批量后重试
    #[error("操作超出时限")]
    DeadlineExceeded,
}

impl From<BlobError> for AppError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::NotFound(key) => AppError::NotFound(format!("对象 {} ", key)),
            BlobError::Io(e) => AppError::Io(e),
            BlobError::DeadlineExceeded => {
                AppError::TransientStore("blob 存储操作超出时限".to_string())
            }
        }
    }
}

/// Blob 存储接口
///
/// 与主存储没有共享事务；写入在元数据落库之前，删除在提交之后
pub trait BlobStore: Send + Sync {
    /// 存入一段字节，返回其键
    fn store(&self, mime: &str, binary: &[u8]) -> Result<BlobRef, BlobError>;

    /// 读出一段字节
    fn fetch(&self, blob: &BlobRef) -> Result<Vec<u8>, BlobError>;

    /// 批量删除；键不存在不算错误
    fn delete_batch(&self, blobs: &[BlobRef]) -> Result<(), BlobError>;
}
