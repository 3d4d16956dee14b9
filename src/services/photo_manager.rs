//! 照片生命周期管理
//!
//! 照片创建（blob 写入 + 元数据落库）、读取与渲染字节的获取。
//! 照片只能隶属于已存在的相册；入册由调用方随后完成

use std::sync::Arc;

use crate::cache::{CachedEntity, EntityCache, LookupCache};
use crate::db::Database;
use crate::models::{now_iso8601, Album, CreatePhoto, Photo, PhotoKind, UpdatePhoto};
use crate::services::settings_registry::SettingsRegistry;
use crate::services::watermark;
use crate::storage::{BlobRef, BlobStore};
use crate::utils::error::{AppError, AppResult};
use crate::utils::imaging;

/// 照片管理器
#[derive(Clone)]
pub struct PhotoManager {
    db: Database,
    cache: EntityCache,
    lookup: LookupCache,
    blobs: Arc<dyn BlobStore>,
    registry: SettingsRegistry,
}

impl PhotoManager {
    /// 创建照片管理器
    pub fn new(
        db: Database,
        cache: EntityCache,
        lookup: LookupCache,
        blobs: Arc<dyn BlobStore>,
        registry: SettingsRegistry,
    ) -> Self {
        Self {
            db,
            cache,
            lookup,
            blobs,
            registry,
        }
    }

    // ==================== 创建 ====================

    /// 创建照片
    ///
    /// 先写两个 blob（原图、缩略图）再落元数据，照片实体一旦存在
    /// 必然携带两个非空 blob 引用。可见性从相册当前状态继承。
    /// 入册不在本操作内，由调用方执行
    pub fn create(&self, input: &CreatePhoto, binary: &[u8]) -> AppResult<Photo> {
        let album = self
            .load_album(&input.album_name)?
            .ok_or_else(|| AppError::NotFound(format!("相册 {} ", input.album_name)))?;

        let key_name = Photo::key_name_for(&input.album_name, &input.photo_name);
        if self.get_by_key(&key_name)?.is_some() {
            return Err(AppError::AlreadyExists(format!(
                "照片 {} ",
                input.photo_name
            )));
        }

        let settings = self.registry.load()?;
        let max_bytes = (settings.max_upload_size_mb * 1024.0 * 1024.0) as usize;
        if binary.is_empty() {
            return Err(AppError::Validation("上传内容为空".to_string()));
        }
        if binary.len() > max_bytes {
            return Err(AppError::Validation(format!(
                "文件大小超出限制[最大 {} MB]",
                settings.max_upload_size_mb
            )));
        }

        // 魔数识别；无法识别的类型在本层接受
        let mime = imaging::get_img_type(binary);

        let blob = self.blobs.store(mime, binary)?;
        // 缩略图生成失败时退回原图引用，照片仍可创建
        let thumb_blob = match imaging::make_thumbnail(binary) {
            Ok(thumb) => self.blobs.store(imaging::mime::PNG, &thumb)?,
            Err(e) => {
                tracing::warn!("缩略图生成失败({})，退回原图: {}", input.photo_name, e);
                blob.clone()
            }
        };

        let photo = Photo {
            album_name: input.album_name.clone(),
            photo_name: input.photo_name.clone(),
            owner: input.owner.clone(),
            public: album.public,
            mime: mime.to_string(),
            size: binary.len() as i64,
            description: input.description.trim().to_string(),
            createdate: now_iso8601(),
            blob_key: blob.as_str().to_string(),
            thumb_blob_key: thumb_blob.as_str().to_string(),
            site: input.site.clone(),
        };

        self.db.insert_photo(&photo)?;
        self.cache.invalidate(&[photo.key_name()]);

        tracing::info!("创建照片: {} ({} 字节, {})", photo.key_name(), photo.size, mime);
        Ok(photo)
    }

    // ==================== 读取 ====================

    /// 根据相册名与照片名获取照片（经实体缓存）
    pub fn get_by_name(&self, album_name: &str, photo_name: &str) -> AppResult<Option<Photo>> {
        self.get_by_key(&Photo::key_name_for(album_name, photo_name))
    }

    /// 按实体键批量获取照片，结果与输入键一一对应
    pub fn get_by_key_names(&self, keys: &[String]) -> AppResult<Vec<Option<Photo>>> {
        let rows = self.cache.fetch(keys, |missing| {
            let photos = self.db.get_photos_by_keys(missing)?;
            Ok(photos
                .into_iter()
                .map(|photo| photo.map(CachedEntity::Photo))
                .collect())
        })?;

        Ok(rows
            .into_iter()
            .map(|entity| match entity {
                Some(CachedEntity::Photo(photo)) => Some(photo),
                _ => None,
            })
            .collect())
    }

    /// 获取最新照片（按创建时间倒序，可选过滤私有）
    pub fn get_latest(&self, count: u32, include_private: bool) -> AppResult<Vec<Photo>> {
        self.db.get_latest_photos(count, include_private)
    }

    /// 更新照片描述或可见性
    ///
    /// 可见性变化不回溯影响已有评论的可见性快照
    pub fn update(
        &self,
        album_name: &str,
        photo_name: &str,
        update: &UpdatePhoto,
    ) -> AppResult<Photo> {
        let key_name = Photo::key_name_for(album_name, photo_name);
        if self.get_by_key(&key_name)?.is_none() {
            return Err(AppError::NotFound(format!("照片 {} ", photo_name)));
        }

        let trimmed = UpdatePhoto {
            description: update.description.as_ref().map(|d| d.trim().to_string()),
            public: update.public,
        };
        self.db.update_photo(&key_name, &trimmed)?;
        self.cache.invalidate(&[key_name.clone()]);

        self.get_by_key(&key_name)?
            .ok_or_else(|| AppError::NotFound(format!("照片 {} ", photo_name)))
    }

    // ==================== 字节获取 ====================

    /// 获取照片或缩略图的字节与 MIME
    ///
    /// 开启水印且配置了水印图片时，原图按 (blob, 水印文字) 合成并缓存，
    /// 输出 PNG；其余路径直接回源 blob 并缓存
    pub fn fetch_photo_data(
        &self,
        album_name: &str,
        photo_name: &str,
        kind: PhotoKind,
    ) -> AppResult<(String, Vec<u8>)> {
        let settings = self.registry.load()?;
        let watermark_img = settings.watermark_img_bytes();
        let watermark_active =
            kind == PhotoKind::Photo && settings.enable_watermark && watermark_img.is_some();

        if !watermark_active {
            if let Some(hit) = self.lookup.get_photo_bytes(kind, album_name, photo_name) {
                return Ok(hit);
            }
        }

        let photo = self
            .get_by_name(album_name, photo_name)?
            .ok_or_else(|| AppError::NotFound(format!("照片 {} ", photo_name)))?;

        let blob_key = match kind {
            PhotoKind::Photo => photo.blob_key.clone(),
            PhotoKind::Thumb => photo.thumb_blob_key.clone(),
        };

        if watermark_active {
            if let Some(hit) = self.lookup.get_rendition(&blob_key, &settings.watermark) {
                return Ok((imaging::mime::PNG.to_string(), hit));
            }

            let binary = self.blobs.fetch(&BlobRef::new(blob_key.clone()))?;
            let mark = watermark_img.unwrap_or_default();
            let composited = watermark::apply_watermark(
                &binary,
                &mark,
                settings.watermark_position,
                settings.watermark_opacity,
            )?;
            self.lookup
                .put_rendition(&blob_key, &settings.watermark, composited.clone());
            return Ok((imaging::mime::PNG.to_string(), composited));
        }

        let binary = self.blobs.fetch(&BlobRef::new(blob_key))?;
        // 缩略图固定为 PNG，原图沿用识别出的 MIME
        let mime = match kind {
            PhotoKind::Photo => photo.mime.clone(),
            PhotoKind::Thumb => imaging::mime::PNG.to_string(),
        };
        self.lookup.put_photo_bytes(
            kind,
            album_name,
            photo_name,
            mime.clone(),
            binary.clone(),
        );
        Ok((mime, binary))
    }

    // ==================== 内部 ====================

    fn get_by_key(&self, key_name: &str) -> AppResult<Option<Photo>> {
        let keys = vec![key_name.to_string()];
        let mut rows = self.get_by_key_names(&keys)?;
        Ok(rows.pop().flatten())
    }

    fn load_album(&self, name: &str) -> AppResult<Option<Album>> {
        let keys = vec![Album::key_name_for(name)];
        let mut rows = self.cache.fetch(&keys, |missing| {
            let mut out = Vec::with_capacity(missing.len());
            for key in missing {
                out.push(self.db.get_album_by_key(key)?.map(CachedEntity::Album));
            }
            Ok(out)
        })?;

        match rows.pop().flatten() {
            Some(CachedEntity::Album(album)) => Ok(Some(album)),
            _ => Ok(None),
        }
    }
}
