//! 相册生命周期管理
//!
//! 相册的创建、删除与成员维护。跨实体的元数据变更
//! （级联删除、创建同步索引）在单个事务内完成；
//! blob 清理在提交之后尽力执行，失败只产生孤儿不影响请求

use std::sync::Arc;

use crate::cache::{CachedEntity, EntityCache, LookupCache};
use crate::db::{album_dao, comment_dao, photo_dao, settings_dao, Database};
use crate::models::{now_iso8601, Album, AlbumCursor, CreateAlbum, Photo, UpdateAlbum};
use crate::services::settings_registry::SettingsRegistry;
use crate::storage::{purge_blobs, BlobRef, BlobStore};
use crate::utils::error::{AppError, AppResult};
use crate::utils::sanitize;

/// 相册管理器
#[derive(Clone)]
pub struct AlbumManager {
    db: Database,
    cache: EntityCache,
    lookup: LookupCache,
    blobs: Arc<dyn BlobStore>,
    registry: SettingsRegistry,
}

impl AlbumManager {
    /// 创建相册管理器
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

    // ==================== 读取 ====================

    /// 根据相册名获取相册（经实体缓存）
    pub fn get(&self, name: &str) -> AppResult<Option<Album>> {
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

    /// 按创建时间倒序分页列出相册
    ///
    /// 返回 (本页相册, 下一页游标)；游标为 None 表示已到末页
    pub fn list(
        &self,
        include_private: bool,
        page_size: u32,
        cursor: Option<&AlbumCursor>,
    ) -> AppResult<(Vec<Album>, Option<AlbumCursor>)> {
        let albums = self
            .db
            .get_albums_page(include_private, page_size, cursor)?;

        let next_cursor = if albums.len() == page_size as usize && page_size > 0 {
            albums.last().map(|album| AlbumCursor {
                createdate: album.createdate.clone(),
                key_name: album.key_name(),
            })
        } else {
            None
        };

        Ok((albums, next_cursor))
    }

    /// 获取相册中一段照片（按成员列表顺序）
    pub fn get_album_photos(
        &self,
        name: &str,
        start_index: usize,
        page_size: usize,
    ) -> AppResult<Vec<Photo>> {
        let album = self
            .get(name)?
            .ok_or_else(|| AppError::NotFound(format!("相册 {} ", name)))?;

        let start = start_index.min(album.photoslist.len());
        let end = start.saturating_add(page_size).min(album.photoslist.len());
        let keys = album.photoslist[start..end].to_vec();

        let photos = self.load_photos(&keys)?;
        Ok(photos.into_iter().flatten().collect())
    }

    // ==================== 创建与更新 ====================

    /// 创建相册
    ///
    /// 相册实体与索引条目在同一事务内写入
    pub fn create(&self, input: &CreateAlbum) -> AppResult<Album> {
        let name = sanitize::sanitize_album_name(&input.name);
        sanitize::validate_album_name(&name)?;
        let description = sanitize::sanitize_description(&input.description)?;

        if self.get(&name)?.is_some() {
            return Err(AppError::AlreadyExists(format!("相册 {} ", name)));
        }

        let now = now_iso8601();
        let album = Album {
            name: name.clone(),
            owner: input.owner.clone(),
            description,
            public: input.public,
            createdate: now.clone(),
            updatedate: now,
            photoslist: Vec::new(),
            coverphoto: String::new(),
        };

        self.db.transaction_with_retry(|conn| {
            album_dao::insert_album_tx(conn, &album)?;
            settings_dao::add_album_entry_tx(conn, &album.name, album.public)
        })?;

        self.cache.invalidate(&[album.key_name()]);
        self.registry.invalidate();

        tracing::info!("创建相册: {}", album.name);
        Ok(album)
    }

    /// 更新相册描述或可见性
    ///
    /// 可见性变化同步到索引条目；已有照片与评论的可见性不回溯修改
    pub fn update(&self, name: &str, update: &UpdateAlbum) -> AppResult<Album> {
        let mut album = self
            .get(name)?
            .ok_or_else(|| AppError::NotFound(format!("相册 {} ", name)))?;

        if let Some(ref description) = update.description {
            album.description = sanitize::sanitize_description(description)?;
        }
        let public_changed = match update.public {
            Some(public) if public != album.public => {
                album.public = public;
                true
            }
            _ => false,
        };
        album.updatedate = now_iso8601();

        self.db.transaction_with_retry(|conn| {
            album_dao::save_album_tx(conn, &album)?;
            if public_changed {
                settings_dao::update_album_entry_tx(conn, &album.name, album.public)?;
            }
            Ok(())
        })?;

        self.cache.invalidate(&[album.key_name()]);
        if public_changed {
            self.registry.invalidate();
        }

        Ok(album)
    }

    // ==================== 成员维护 ====================

    /// 把照片加入相册（幂等头插）
    ///
    /// 照片创建与入册是两步操作，不在同一事务内；
    /// 重复加入同一照片不改变成员列表
    pub fn add_photo_to_album(&self, name: &str, photo: &Photo) -> AppResult<Album> {
        let mut album = self
            .get(name)?
            .ok_or_else(|| AppError::NotFound(format!("相册 {} ", name)))?;

        let photo_key = photo.key_name();
        if !album.photoslist.contains(&photo_key) {
            album.photoslist.insert(0, photo_key);
            album.updatedate = now_iso8601();
            self.db.save_album(&album)?;
            self.cache.invalidate(&[album.key_name()]);
        }

        Ok(album)
    }

    /// 设置相册封面
    ///
    /// 照片不是本相册成员时不做任何修改，返回 false
    pub fn set_cover_photo(&self, name: &str, photo_name: &str) -> AppResult<bool> {
        let mut album = self
            .get(name)?
            .ok_or_else(|| AppError::NotFound(format!("相册 {} ", name)))?;

        let photo_key = Photo::key_name_for(name, photo_name);
        if !album.photoslist.contains(&photo_key) {
            return Ok(false);
        }

        album.coverphoto = photo_key;
        album.updatedate = now_iso8601();
        self.db.save_album(&album)?;
        self.cache.invalidate(&[album.key_name()]);

        Ok(true)
    }

    // ==================== 删除 ====================

    /// 删除相册及其全部照片、评论与索引条目
    ///
    /// 元数据在单个事务内删除；blob 清理在提交后尽力执行
    pub fn delete(&self, name: &str) -> AppResult<()> {
        let album = self
            .get(name)?
            .ok_or_else(|| AppError::NotFound(format!("相册 {} ", name)))?;

        let photo_keys = album.photoslist.clone();
        let photos: Vec<Photo> = self.load_photos(&photo_keys)?.into_iter().flatten().collect();
        let blob_refs = collect_blob_refs(&photos);

        let mut invalidate_keys = photo_keys.clone();
        invalidate_keys.push(album.key_name());

        let album_key = album.key_name();
        self.db.transaction_with_retry(|conn| {
            self.cache.invalidate(&invalidate_keys);
            comment_dao::delete_comments_for_photos_tx(conn, &photo_keys)?;
            settings_dao::remove_album_entry_tx(conn, &album.name)?;
            photo_dao::delete_photos_tx(conn, &photo_keys)?;
            album_dao::delete_album_tx(conn, &album_key)?;
            Ok(())
        })?;
        self.registry.invalidate();

        let photo_names: Vec<String> = photos.iter().map(|p| p.photo_name.clone()).collect();
        self.lookup.invalidate_photos(&album.name, &photo_names);
        for photo_name in &photo_names {
            self.lookup.invalidate_comments(&album.name, photo_name);
        }

        let purged = purge_blobs(self.blobs.as_ref(), &blob_refs);
        tracing::info!(
            "删除相册 {}: 照片 {} 张，blob 清理 {}/{}",
            album.name,
            photos.len(),
            purged,
            blob_refs.len()
        );

        Ok(())
    }

    /// 按名称删除相册中的一批照片，返回实际删除数量
    ///
    /// 成员列表同步收缩；封面指向被删照片时清空封面
    pub fn delete_photos_by_name(&self, name: &str, photo_names: &[String]) -> AppResult<usize> {
        let album = self
            .get(name)?
            .ok_or_else(|| AppError::NotFound(format!("相册 {} ", name)))?;

        // 只处理确实属于本相册的键
        let removed_keys: Vec<String> = photo_names
            .iter()
            .map(|photo_name| Photo::key_name_for(name, photo_name))
            .filter(|key| album.photoslist.contains(key))
            .collect();

        let photos: Vec<Photo> = self
            .load_photos(&removed_keys)?
            .into_iter()
            .flatten()
            .collect();
        let blob_refs = collect_blob_refs(&photos);

        let mut updated = album.clone();
        updated
            .photoslist
            .retain(|key| !removed_keys.contains(key));
        if removed_keys.contains(&updated.coverphoto) {
            updated.coverphoto = String::new();
        }
        updated.updatedate = now_iso8601();

        let mut invalidate_keys = removed_keys.clone();
        invalidate_keys.push(album.key_name());

        let deleted = self.db.transaction_with_retry(|conn| {
            self.cache.invalidate(&invalidate_keys);
            comment_dao::delete_comments_for_photos_tx(conn, &removed_keys)?;
            let deleted = photo_dao::delete_photos_tx(conn, &removed_keys)?;
            album_dao::save_album_tx(conn, &updated)?;
            Ok(deleted)
        })?;

        let removed_names: Vec<String> = photos.iter().map(|p| p.photo_name.clone()).collect();
        self.lookup.invalidate_photos(&album.name, &removed_names);
        for photo_name in &removed_names {
            self.lookup.invalidate_comments(&album.name, photo_name);
        }

        let purged = purge_blobs(self.blobs.as_ref(), &blob_refs);
        tracing::info!(
            "相册 {} 删除照片 {} 张，blob 清理 {}/{}",
            album.name,
            deleted,
            purged,
            blob_refs.len()
        );

        Ok(deleted)
    }

    // ==================== 内部 ====================

    /// 按实体键批量读取照片（经实体缓存）
    fn load_photos(&self, keys: &[String]) -> AppResult<Vec<Option<Photo>>> {
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
}

/// 收集照片持有的全部 blob 键（原图 + 缩略图，去重）
fn collect_blob_refs(photos: &[Photo]) -> Vec<BlobRef> {
    let mut refs: Vec<BlobRef> = Vec::with_capacity(photos.len() * 2);
    for photo in photos {
        let original = BlobRef::new(photo.blob_key.clone());
        if !refs.contains(&original) {
            refs.push(original);
        }
        let thumb = BlobRef::new(photo.thumb_blob_key.clone());
        if !refs.contains(&thumb) {
            refs.push(thumb);
        }
    }
    refs
}
