//! Blob 批量清理
//!
//! 元数据事务提交之后的补偿步骤。分批删除以避免超出单次操作时限；
//! 收到时限信号后用更小的批量重试一次剩余键，再次超时则放弃。
//! 任何失败只记录日志，从不向调用方上抛——孤儿 blob 可接受，
//! 元数据不一致不可接受

use super::{BlobError, BlobRef, BlobStore};

/// 常规删除批量
pub const DELETE_BATCH_SIZE: usize = 8;
/// 超时降级后的删除批量
pub const RETRY_BATCH_SIZE: usize = 2;

/// 尽力删除一组 blob，返回确认删除的数量
pub fn purge_blobs(store: &dyn BlobStore, blobs: &[BlobRef]) -> usize {
    let mut deleted = 0;

    for (i, chunk) in blobs.chunks(DELETE_BATCH_SIZE).enumerate() {
        match store.delete_batch(chunk) {
            Ok(()) => deleted += chunk.len(),
            Err(BlobError::DeadlineExceeded) => {
                let remaining = &blobs[i * DELETE_BATCH_SIZE..];
                tracing::warn!(
                    "blob 批量删除超时，剩余 {} 个降级为批量 {} 重试",
                    remaining.len(),
                    RETRY_BATCH_SIZE
                );
                return deleted + purge_small_batches(store, remaining);
            }
            Err(e) => {
                tracing::warn!("blob 批量删除失败，跳过 {} 个: {}", chunk.len(), e);
            }
        }
    }

    deleted
}

/// 降级批量的删除；再次超时即放弃剩余键
fn purge_small_batches(store: &dyn BlobStore, blobs: &[BlobRef]) -> usize {
    let mut deleted = 0;

    for (i, chunk) in blobs.chunks(RETRY_BATCH_SIZE).enumerate() {
        match store.delete_batch(chunk) {
            Ok(()) => deleted += chunk.len(),
            Err(BlobError::DeadlineExceeded) => {
                let abandoned = blobs.len() - i * RETRY_BATCH_SIZE;
                tracing::warn!("blob 删除再次超时，放弃剩余 {} 个（产生孤儿）", abandoned);
                return deleted;
            }
            Err(e) => {
                tracing::warn!("blob 删除失败，跳过 {} 个: {}", chunk.len(), e);
            }
        }
    }

    deleted
}
