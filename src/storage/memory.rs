//! 内存 Blob 存储
//!
//! 用于测试与本地开发；可注入批量删除的时限信号

use std::collections::HashMap;
use std::sync::Mutex;

use xxhash_rust::xxh3::xxh3_128;

use super::{BlobError, BlobRef, BlobStore};

/// 内存 Blob 存储
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    /// 单次 delete_batch 允许的最大键数，超过则报超时
    max_delete_batch: Mutex<Option<usize>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注入时限：批量超过 limit 的删除将返回 DeadlineExceeded
    pub fn set_max_delete_batch(&self, limit: Option<usize>) {
        if let Ok(mut guard) = self.max_delete_batch.lock() {
            *guard = limit;
        }
    }

    /// 当前存储的对象数
    pub fn len(&self) -> usize {
        self.blobs.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 是否包含指定对象
    pub fn contains(&self, blob: &BlobRef) -> bool {
        self.blobs
            .lock()
            .map(|b| b.contains_key(blob.as_str()))
            .unwrap_or(false)
    }
}

impl BlobStore for MemoryBlobStore {
    fn store(&self, _mime: &str, binary: &[u8]) -> Result<BlobRef, BlobError> {
        let key = format!("{:032x}", xxh3_128(binary));
        if let Ok(mut blobs) = self.blobs.lock() {
            blobs.insert(key.clone(), binary.to_vec());
        }
        Ok(BlobRef::new(key))
    }

    fn fetch(&self, blob: &BlobRef) -> Result<Vec<u8>, BlobError> {
        self.blobs
            .lock()
            .ok()
            .and_then(|blobs| blobs.get(blob.as_str()).cloned())
            .ok_or_else(|| BlobError::NotFound(blob.as_str().to_string()))
    }

    fn delete_batch(&self, blobs: &[BlobRef]) -> Result<(), BlobError> {
        if let Ok(limit) = self.max_delete_batch.lock() {
            if let Some(limit) = *limit {
                if blobs.len() > limit {
                    return Err(BlobError::DeadlineExceeded);
                }
            }
        }

        if let Ok(mut stored) = self.blobs.lock() {
            for blob in blobs {
                stored.remove(blob.as_str());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_fetch_delete() {
        let store = MemoryBlobStore::new();
        let blob = store.store("image/gif", b"data").unwrap();
        assert!(store.contains(&blob));
        assert_eq!(store.fetch(&blob).unwrap(), b"data");

        store.delete_batch(&[blob.clone()]).unwrap();
        assert!(!store.contains(&blob));
        assert!(matches!(store.fetch(&blob), Err(BlobError::NotFound(_))));
    }

    #[test]
    fn test_deadline_injection() {
        let store = MemoryBlobStore::new();
        let a = store.store("x", b"a").unwrap();
        let b = store.store("x", b"b").unwrap();
        let c = store.store("x", b"c").unwrap();

        store.set_max_delete_batch(Some(2));
        let refs = vec![a, b, c];
        assert!(matches!(
            store.delete_batch(&refs),
            Err(BlobError::DeadlineExceeded)
        ));
        // 超时的批次不应有部分删除
        assert_eq!(store.len(), 3);

        assert!(store.delete_batch(&refs[..2]).is_ok());
        assert_eq!(store.len(), 1);
    }
}
