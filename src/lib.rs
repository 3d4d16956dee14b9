//! PhotoSpace - 自托管照片相册核心库
//!
//! 相册/照片/评论的生命周期管理：SQLite 元数据 + 内容寻址 blob 存储，
//! 进程内实体缓存与查询缓存。HTTP 路由、模板与鉴权由上层接入

pub mod cache;
pub mod db;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

use std::path::PathBuf;
use std::sync::Arc;

use cache::{EntityCache, LookupCache, DEFAULT_CAPACITY};
use db::Database;
use services::{AlbumManager, CommentManager, PhotoManager, SettingsRegistry};
use storage::BlobStore;
use utils::error::AppResult;

/// 应用程序上下文
///
/// 持有全部管理器；各管理器共享同一数据库连接与缓存
pub struct Gallery {
    pub db: Database,
    pub albums: AlbumManager,
    pub photos: PhotoManager,
    pub comments: CommentManager,
    pub settings: SettingsRegistry,
}

impl Gallery {
    /// 打开或创建数据库文件并初始化上下文
    pub fn open(db_path: PathBuf, blobs: Arc<dyn BlobStore>) -> AppResult<Self> {
        tracing::info!("数据库路径: {:?}", db_path);
        let db = Database::open(db_path)?;
        Self::build(db, blobs)
    }

    /// 以内存数据库初始化上下文（用于测试）
    pub fn open_in_memory(blobs: Arc<dyn BlobStore>) -> AppResult<Self> {
        let db = Database::open_in_memory()?;
        Self::build(db, blobs)
    }

    fn build(db: Database, blobs: Arc<dyn BlobStore>) -> AppResult<Self> {
        db.init()?;

        let cache = EntityCache::new(DEFAULT_CAPACITY);
        let lookup = LookupCache::new();
        let settings = SettingsRegistry::new(db.clone(), cache.clone(), lookup.clone());
        let albums = AlbumManager::new(
            db.clone(),
            cache.clone(),
            lookup.clone(),
            blobs.clone(),
            settings.clone(),
        );
        let photos = PhotoManager::new(
            db.clone(),
            cache.clone(),
            lookup.clone(),
            blobs,
            settings.clone(),
        );
        let comments = CommentManager::new(db.clone(), cache, lookup);

        Ok(Self {
            db,
            albums,
            photos,
            comments,
            settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateAlbum, CreateComment, CreatePhoto};
    use crate::storage::MemoryBlobStore;
    use crate::utils::imaging;

    /// 最小可解码 GIF（1x1 像素），前 10 字节足以识别魔数
    fn gif_bytes() -> Vec<u8> {
        vec![
            0x47, 0x49, 0x46, 0x38, 0x39, 0x61, // GIF89a
            0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, // 1x1，全局色表
            0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, // 色表
            0x2C, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, // 图像描述符
            0x02, 0x02, 0x44, 0x01, 0x00, // 图像数据
            0x3B, // 结束
        ]
    }

    /// 端到端场景：建相册、传照片、入册、删相册
    #[test]
    fn test_end_to_end_album_lifecycle() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let gallery = Gallery::open_in_memory(blobs.clone()).unwrap();

        // 创建公开相册 trip
        let album = gallery
            .albums
            .create(&CreateAlbum {
                name: "trip".to_string(),
                description: "夏季旅行".to_string(),
                public: true,
                owner: "owner@example.com".to_string(),
            })
            .unwrap();
        assert!(album.public);

        // 从 GIF 字节创建照片 (trip, img1)
        let binary = gif_bytes();
        assert_eq!(imaging::get_img_type(&binary), imaging::mime::GIF);

        let photo = gallery
            .photos
            .create(
                &CreatePhoto {
                    album_name: "trip".to_string(),
                    photo_name: "img1".to_string(),
                    owner: "owner@example.com".to_string(),
                    description: String::new(),
                    site: String::new(),
                },
                &binary,
            )
            .unwrap();
        assert_eq!(photo.mime, imaging::mime::GIF);

        // 入册后成员列表与计数符合预期
        let album = gallery.albums.add_photo_to_album("trip", &photo).unwrap();
        assert_eq!(album.photoslist, vec!["dbphoto/trip/img1".to_string()]);
        assert_eq!(album.photocount(), 1);

        // 发表评论
        gallery
            .comments
            .create(&CreateComment {
                album_name: "trip".to_string(),
                photo_name: "img1".to_string(),
                author: "guest".to_string(),
                email: "guest@example.com".to_string(),
                content: "风景不错".to_string(),
            })
            .unwrap();

        // 删除相册：相册、照片、评论、索引条目、blob 全部回收
        gallery.albums.delete("trip").unwrap();
        assert!(gallery.albums.get("trip").unwrap().is_none());
        assert!(gallery.photos.get_by_name("trip", "img1").unwrap().is_none());
        assert!(gallery
            .comments
            .get_comments("trip", "img1", false)
            .unwrap()
            .is_empty());
        assert!(!gallery.settings.load().unwrap().has_album("trip"));
        assert!(blobs.is_empty());
    }

    #[test]
    fn test_settings_survive_reopen_of_context() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let gallery = Gallery::open_in_memory(blobs).unwrap();

        let settings = gallery.settings.load().unwrap();
        assert_eq!(settings.albums_per_page, 8);
        assert!(gallery.db.get_site_settings().unwrap().is_some());
    }
}
