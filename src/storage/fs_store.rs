//! 文件系统 Blob 存储
//!
//! 内容寻址：键为内容的 xxh3 摘要，相同字节写入得到相同键。
//! 目录布局 `<base>/<ab>/<cd>/<digest>`，避免单目录文件过多

use std::fs;
use std::path::PathBuf;

use xxhash_rust::xxh3::xxh3_128;

use super::{BlobError, BlobRef, BlobStore};

/// 文件系统 Blob 存储
#[derive(Clone)]
pub struct FsBlobStore {
    /// 存储根目录
    base_dir: PathBuf,
}

impl FsBlobStore {
    /// 创建文件系统 Blob 存储
    pub fn new(base_dir: PathBuf) -> Result<Self, BlobError> {
        if !base_dir.exists() {
            fs::create_dir_all(&base_dir)?;
            tracing::info!("创建 blob 存储目录: {:?}", base_dir);
        }
        Ok(Self { base_dir })
    }

    /// 根据键计算存储路径
    fn blob_path(&self, key: &str) -> PathBuf {
        // 摘要不足 4 字符时直接平铺在根目录
        if key.len() < 4 {
            return self.base_dir.join(key);
        }
        self.base_dir.join(&key[0..2]).join(&key[2..4]).join(key)
    }

    /// 计算内容摘要键
    fn digest(binary: &[u8]) -> String {
        format!("{:032x}", xxh3_128(binary))
    }
}

impl BlobStore for FsBlobStore {
    fn store(&self, _mime: &str, binary: &[u8]) -> Result<BlobRef, BlobError> {
        let key = Self::digest(binary);
        let path = self.blob_path(&key);

        // 内容寻址：同内容已存在时无需重写
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, binary)?;
            tracing::debug!("写入 blob: {} ({} 字节)", key, binary.len());
        }

        Ok(BlobRef::new(key))
    }

    fn fetch(&self, blob: &BlobRef) -> Result<Vec<u8>, BlobError> {
        let path = self.blob_path(blob.as_str());
        match fs::read(&path) {
            Ok(binary) => Ok(binary),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(blob.as_str().to_string()))
            }
            Err(e) => Err(BlobError::Io(e)),
        }
    }

    fn delete_batch(&self, blobs: &[BlobRef]) -> Result<(), BlobError> {
        let mut last_err: Option<BlobError> = None;
        for blob in blobs {
            let path = self.blob_path(blob.as_str());
            match fs::remove_file(&path) {
                Ok(()) => {}
                // 幂等删除：文件不存在视为成功
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!("删除 blob {} 失败: {}", blob, e);
                    last_err = Some(BlobError::Io(e));
                }
            }
        }
        match last_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
