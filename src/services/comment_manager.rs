//! 评论生命周期管理
//!
//! 评论只能挂在已存在的照片上；可见性在发表瞬间从照片快照，
//! 之后照片可见性变化不回溯影响已有评论

use crate::cache::{CachedEntity, EntityCache, LookupCache};
use crate::db::Database;
use crate::models::{now_iso8601, Comment, CreateComment, Photo};
use crate::utils::error::{AppError, AppResult};
use crate::utils::sanitize;

/// 评论管理器
#[derive(Clone)]
pub struct CommentManager {
    db: Database,
    cache: EntityCache,
    lookup: LookupCache,
}

impl CommentManager {
    /// 创建评论管理器
    pub fn new(db: Database, cache: EntityCache, lookup: LookupCache) -> Self {
        Self { db, cache, lookup }
    }

    /// 发表评论
    ///
    /// 照片不存在时拒绝；公开标记从照片当前可见性快照
    pub fn create(&self, input: &CreateComment) -> AppResult<Comment> {
        let content = sanitize::sanitize_comment(&input.content)?;

        let photo = self
            .load_photo(&input.album_name, &input.photo_name)?
            .ok_or_else(|| AppError::NotFound(format!("照片 {} ", input.photo_name)))?;

        let mut comment = Comment {
            comment_id: 0,
            photo_key_name: photo.key_name(),
            author: input.author.trim().to_string(),
            email: input.email.trim().to_string(),
            public: photo.public,
            content,
            date: now_iso8601(),
        };
        comment.comment_id = self.db.insert_comment(&comment)?;

        self.lookup
            .invalidate_comments(&input.album_name, &input.photo_name);

        Ok(comment)
    }

    /// 获取一张照片的评论（经查询缓存）
    pub fn get_comments(
        &self,
        album_name: &str,
        photo_name: &str,
        public_only: bool,
    ) -> AppResult<Vec<Comment>> {
        if let Some(hit) = self.lookup.get_comments(album_name, photo_name, public_only) {
            return Ok(hit);
        }

        let key_name = Photo::key_name_for(album_name, photo_name);
        let comments = self.db.get_comments_for_photo(&key_name, public_only)?;
        self.lookup
            .put_comments(album_name, photo_name, public_only, comments.clone());
        Ok(comments)
    }

    /// 获取最新评论
    pub fn get_latest(&self, count: u32, public_only: bool) -> AppResult<Vec<Comment>> {
        self.db.get_latest_comments(count, public_only)
    }

    /// 删除一张照片的全部评论，返回删除数量
    pub fn delete_comments(&self, album_name: &str, photo_name: &str) -> AppResult<usize> {
        let key_name = Photo::key_name_for(album_name, photo_name);
        let deleted = self.db.delete_comments_for_photo(&key_name)?;
        self.lookup.invalidate_comments(album_name, photo_name);
        Ok(deleted)
    }

    /// 根据ID删除评论
    ///
    /// 返回所属的（相册名，照片名）供调用方失效派生缓存；
    /// 评论不存在时返回 None
    pub fn delete_by_id(&self, comment_id: i64) -> AppResult<Option<(String, String)>> {
        let comment = match self.db.get_comment(comment_id)? {
            Some(comment) => comment,
            None => return Ok(None),
        };

        self.db.delete_comment(comment_id)?;

        match comment.owning_names() {
            Some((album_name, photo_name)) => {
                self.lookup.invalidate_comments(album_name, photo_name);
                Ok(Some((album_name.to_string(), photo_name.to_string())))
            }
            None => Ok(None),
        }
    }

    // ==================== 内部 ====================

    fn load_photo(&self, album_name: &str, photo_name: &str) -> AppResult<Option<Photo>> {
        let keys = vec![Photo::key_name_for(album_name, photo_name)];
        let mut rows = self.cache.fetch(&keys, |missing| {
            let photos = self.db.get_photos_by_keys(missing)?;
            Ok(photos
                .into_iter()
                .map(|photo| photo.map(CachedEntity::Photo))
                .collect())
        })?;

        match rows.pop().flatten() {
            Some(CachedEntity::Photo(photo)) => Ok(Some(photo)),
            _ => Ok(None),
        }
    }
}
