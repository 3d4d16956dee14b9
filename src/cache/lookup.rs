//! 查询结果缓存
//!
//! 短生命周期的渲染结果缓存：照片字节、水印合成结果、评论列表。
//! 全部尽力而为，读写失败一律吞掉，不影响请求本身。

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

use crate::models::{Comment, PhotoKind};

/// 默认容量：评论列表条目数
const COMMENTS_CAPACITY: usize = 256;
/// 默认容量：照片/渲染字节条目数
const BYTES_CAPACITY: usize = 64;

/// 查询结果缓存
#[derive(Clone)]
pub struct LookupCache {
    /// 评论列表，键 `comment_<album>_<photo>_<scope>`
    comments: Arc<Mutex<LruCache<String, Vec<Comment>>>>,
    /// 照片原始字节，键 `photo_cache_<kind>_<album>_<photo>`
    photo_bytes: Arc<Mutex<LruCache<String, (String, Vec<u8>)>>>,
    /// 水印合成结果，键 `blob_cache_<blob>_<watermark>`
    renditions: Arc<Mutex<LruCache<String, Vec<u8>>>>,
}

fn comment_key(album_name: &str, photo_name: &str, public_only: bool) -> String {
    let scope = if public_only { "public" } else { "all" };
    format!("comment_{}_{}_{}", album_name, photo_name, scope)
}

fn photo_key(kind: PhotoKind, album_name: &str, photo_name: &str) -> String {
    format!("photo_cache_{}_{}_{}", kind.name(), album_name, photo_name)
}

fn rendition_key(blob_key: &str, watermark: &str) -> String {
    format!("blob_cache_{}_{}", blob_key, watermark)
}

impl LookupCache {
    /// 创建查询结果缓存
    pub fn new() -> Self {
        let comments_cap = NonZeroUsize::new(COMMENTS_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        let bytes_cap = NonZeroUsize::new(BYTES_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            comments: Arc::new(Mutex::new(LruCache::new(comments_cap))),
            photo_bytes: Arc::new(Mutex::new(LruCache::new(bytes_cap))),
            renditions: Arc::new(Mutex::new(LruCache::new(bytes_cap))),
        }
    }

    // ==================== 评论列表 ====================

    pub fn get_comments(
        &self,
        album_name: &str,
        photo_name: &str,
        public_only: bool,
    ) -> Option<Vec<Comment>> {
        let key = comment_key(album_name, photo_name, public_only);
        self.comments.lock().ok()?.get(&key).cloned()
    }

    pub fn put_comments(
        &self,
        album_name: &str,
        photo_name: &str,
        public_only: bool,
        comments: Vec<Comment>,
    ) {
        let key = comment_key(album_name, photo_name, public_only);
        if let Ok(mut cache) = self.comments.lock() {
            cache.put(key, comments);
        }
    }

    /// 失效一张照片的评论缓存（公开与全量两个视图）
    pub fn invalidate_comments(&self, album_name: &str, photo_name: &str) {
        if let Ok(mut cache) = self.comments.lock() {
            cache.pop(&comment_key(album_name, photo_name, true));
            cache.pop(&comment_key(album_name, photo_name, false));
        }
    }

    // ==================== 照片字节 ====================

    pub fn get_photo_bytes(
        &self,
        kind: PhotoKind,
        album_name: &str,
        photo_name: &str,
    ) -> Option<(String, Vec<u8>)> {
        let key = photo_key(kind, album_name, photo_name);
        self.photo_bytes.lock().ok()?.get(&key).cloned()
    }

    pub fn put_photo_bytes(
        &self,
        kind: PhotoKind,
        album_name: &str,
        photo_name: &str,
        mime: String,
        binary: Vec<u8>,
    ) {
        let key = photo_key(kind, album_name, photo_name);
        if let Ok(mut cache) = self.photo_bytes.lock() {
            cache.put(key, (mime, binary));
        }
    }

    /// 失效若干照片的字节缓存（原图与缩略图）
    pub fn invalidate_photos(&self, album_name: &str, photo_names: &[String]) {
        if let Ok(mut cache) = self.photo_bytes.lock() {
            for name in photo_names {
                cache.pop(&photo_key(PhotoKind::Photo, album_name, name));
                cache.pop(&photo_key(PhotoKind::Thumb, album_name, name));
            }
        }
    }

    // ==================== 水印合成结果 ====================

    pub fn get_rendition(&self, blob_key: &str, watermark: &str) -> Option<Vec<u8>> {
        let key = rendition_key(blob_key, watermark);
        self.renditions.lock().ok()?.get(&key).cloned()
    }

    pub fn put_rendition(&self, blob_key: &str, watermark: &str, binary: Vec<u8>) {
        let key = rendition_key(blob_key, watermark);
        if let Ok(mut cache) = self.renditions.lock() {
            cache.put(key, binary);
        }
    }

    /// 清空全部缓存（水印参数变更时调用）
    pub fn flush(&self) {
        if let Ok(mut cache) = self.comments.lock() {
            cache.clear();
        }
        if let Ok(mut cache) = self.photo_bytes.lock() {
            cache.clear();
        }
        if let Ok(mut cache) = self.renditions.lock() {
            cache.clear();
        }
    }
}

impl Default for LookupCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_comment(content: &str) -> Comment {
        Comment {
            comment_id: 1,
            photo_key_name: "dbphoto/trip/img1".to_string(),
            author: "guest".to_string(),
            email: String::new(),
            public: true,
            content: content.to_string(),
            date: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_comments_scoped_by_visibility() {
        let cache = LookupCache::new();
        cache.put_comments("trip", "img1", true, vec![test_comment("公开")]);
        cache.put_comments("trip", "img1", false, vec![test_comment("全部1"), test_comment("全部2")]);

        assert_eq!(cache.get_comments("trip", "img1", true).unwrap().len(), 1);
        assert_eq!(cache.get_comments("trip", "img1", false).unwrap().len(), 2);
    }

    #[test]
    fn test_invalidate_comments_clears_both_views() {
        let cache = LookupCache::new();
        cache.put_comments("trip", "img1", true, vec![test_comment("x")]);
        cache.put_comments("trip", "img1", false, vec![test_comment("x")]);

        cache.invalidate_comments("trip", "img1");
        assert!(cache.get_comments("trip", "img1", true).is_none());
        assert!(cache.get_comments("trip", "img1", false).is_none());
    }

    #[test]
    fn test_photo_bytes_roundtrip_and_invalidate() {
        let cache = LookupCache::new();
        cache.put_photo_bytes(
            PhotoKind::Thumb,
            "trip",
            "img1",
            "image/png".to_string(),
            vec![1, 2, 3],
        );

        let (mime, binary) = cache.get_photo_bytes(PhotoKind::Thumb, "trip", "img1").unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(binary, vec![1, 2, 3]);

        cache.invalidate_photos("trip", &["img1".to_string()]);
        assert!(cache.get_photo_bytes(PhotoKind::Thumb, "trip", "img1").is_none());
    }

    #[test]
    fn test_flush_clears_everything() {
        let cache = LookupCache::new();
        cache.put_comments("trip", "img1", true, vec![test_comment("x")]);
        cache.put_rendition("blob1", "水印", vec![9]);

        cache.flush();
        assert!(cache.get_comments("trip", "img1", true).is_none());
        assert!(cache.get_rendition("blob1", "水印").is_none());
    }
}
