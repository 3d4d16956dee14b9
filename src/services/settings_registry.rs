//! 站点设置服务
//!
//! 单例设置的读写与去范化相册索引的懒修复。
//! 不使用全局状态，由调用方注入到各管理器

use crate::cache::{CachedEntity, EntityCache, LookupCache};
use crate::db::Database;
use crate::models::settings::MAX_WATERMARK_SIZE;
use crate::models::{SettingsUpdate, SiteSettings};
use crate::utils::error::{AppError, AppResult};
use crate::utils::imaging;

/// 设置服务
#[derive(Clone)]
pub struct SettingsRegistry {
    db: Database,
    cache: EntityCache,
    lookup: LookupCache,
}

impl SettingsRegistry {
    /// 创建设置服务
    pub fn new(db: Database, cache: EntityCache, lookup: LookupCache) -> Self {
        Self { db, cache, lookup }
    }

    /// 读取站点设置（经实体缓存）
    ///
    /// 首次访问时落库默认设置；相册索引为空而相册表非空时，
    /// 全表扫描重建一次并持久化
    pub fn load(&self) -> AppResult<SiteSettings> {
        let keys = vec![SiteSettings::key_name().to_string()];
        let mut rows = self.cache.fetch(&keys, |_missing| {
            let settings = self.load_from_store()?;
            Ok(vec![Some(CachedEntity::Settings(settings))])
        })?;

        match rows.pop().flatten() {
            Some(CachedEntity::Settings(settings)) => Ok(settings),
            _ => self.load_from_store(),
        }
    }

    /// 从主存储读取设置，附带懒修复
    fn load_from_store(&self) -> AppResult<SiteSettings> {
        let mut settings = match self.db.get_site_settings()? {
            Some(settings) => settings,
            None => {
                let settings = SiteSettings::default();
                self.db.save_site_settings(&settings)?;
                tracing::info!("首次写入默认站点设置");
                settings
            }
        };

        if settings.albums.is_empty() && self.db.count_albums()? > 0 {
            settings.albums = self.db.scan_album_index()?;
            self.db.save_site_settings(&settings)?;
            tracing::info!("重建相册索引: {} 个条目", settings.albums.len());
        }

        Ok(settings)
    }

    /// 保存站点设置（字段级更新）
    ///
    /// 水印字号与不透明度超界时收敛到边界值；水印图片必须是可识别的图像。
    /// 水印相关参数变化时清空全部渲染结果缓存
    pub fn save(&self, update: &SettingsUpdate) -> AppResult<SiteSettings> {
        let mut settings = self.load()?;
        let mut watermark_changed = false;

        if let Some(ref title) = update.title {
            settings.title = title.trim().to_string();
        }
        if let Some(ref description) = update.description {
            settings.description = description.trim().to_string();
        }
        if let Some(albums_per_page) = update.albums_per_page {
            settings.albums_per_page = albums_per_page;
        }
        if let Some(thumbs_per_page) = update.thumbs_per_page {
            settings.thumbs_per_page = thumbs_per_page;
        }
        if let Some(latest_photos_count) = update.latest_photos_count {
            settings.latest_photos_count = latest_photos_count;
        }
        if let Some(latest_comments_count) = update.latest_comments_count {
            settings.latest_comments_count = latest_comments_count;
        }
        if let Some(max_upload_size_mb) = update.max_upload_size_mb {
            settings.max_upload_size_mb = max_upload_size_mb;
        }
        if let Some(ref adminlist) = update.adminlist {
            settings.adminlist = adminlist.clone();
        }
        if let Some(enable_comment) = update.enable_comment {
            settings.enable_comment = enable_comment;
        }
        if let Some(enable_anonymous_comment) = update.enable_anonymous_comment {
            settings.enable_anonymous_comment = enable_anonymous_comment;
        }
        if let Some(enable_watermark) = update.enable_watermark {
            settings.enable_watermark = enable_watermark;
            watermark_changed = true;
        }
        if let Some(ref watermark) = update.watermark {
            settings.watermark = watermark.trim().to_string();
            watermark_changed = true;
        }
        if let Some(watermark_size) = update.watermark_size {
            settings.watermark_size = watermark_size.min(MAX_WATERMARK_SIZE);
            watermark_changed = true;
        }
        if let Some(watermark_opacity) = update.watermark_opacity {
            settings.watermark_opacity = watermark_opacity.clamp(0.0, 1.0);
            watermark_changed = true;
        }
        if let Some(watermark_position) = update.watermark_position {
            settings.watermark_position = watermark_position;
            watermark_changed = true;
        }
        if let Some(ref watermark_img) = update.watermark_img {
            if imaging::get_img_type(watermark_img) == imaging::mime::UNKNOWN {
                return Err(AppError::Validation("水印图片格式无法识别".to_string()));
            }
            settings.set_watermark_img(watermark_img);
            watermark_changed = true;
        }
        if let Some(block_referrers) = update.block_referrers {
            settings.block_referrers = block_referrers;
        }
        if let Some(ref unblock_sites_list) = update.unblock_sites_list {
            settings.unblock_sites_list = unblock_sites_list.clone();
        }

        self.db.save_site_settings(&settings)?;
        self.invalidate();

        if watermark_changed {
            tracing::info!("水印参数变更，清空渲染结果缓存");
            self.lookup.flush();
        }

        Ok(settings)
    }

    /// 恢复默认设置（相册索引随后由懒修复重建）
    pub fn reset(&self) -> AppResult<SiteSettings> {
        let settings = SiteSettings::default();
        self.db.save_site_settings(&settings)?;
        self.invalidate();
        self.lookup.flush();
        self.load()
    }

    /// 失效设置的实体缓存（相册生命周期在事务内改动索引后调用）
    pub fn invalidate(&self) {
        self.cache
            .invalidate(&[SiteSettings::key_name().to_string()]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DEFAULT_CAPACITY;
    use crate::models::now_iso8601;
    use crate::models::Album;

    fn registry() -> SettingsRegistry {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();
        SettingsRegistry::new(db, EntityCache::new(DEFAULT_CAPACITY), LookupCache::new())
    }

    fn insert_album(db: &Database, name: &str, public: bool) {
        let album = Album {
            name: name.to_string(),
            owner: String::new(),
            description: "description".to_string(),
            public,
            createdate: now_iso8601(),
            updatedate: now_iso8601(),
            photoslist: Vec::new(),
            coverphoto: String::new(),
        };
        db.transaction(|conn| crate::db::album_dao::insert_album_tx(conn, &album))
            .unwrap();
    }

    #[test]
    fn test_load_persists_defaults_once() {
        let registry = registry();

        let settings = registry.load().unwrap();
        assert_eq!(settings.albums_per_page, 8);

        // 已落库
        assert!(registry.db.get_site_settings().unwrap().is_some());
    }

    #[test]
    fn test_lazy_self_heal_rebuilds_index() {
        let registry = registry();
        insert_album(&registry.db, "trip", true);
        insert_album(&registry.db, "family", false);

        let settings = registry.load().unwrap();
        assert_eq!(settings.albums.len(), 2);
        assert!(settings.has_album("trip"));
        assert!(settings.has_album("family"));

        // 重建结果已持久化
        let stored = registry.db.get_site_settings().unwrap().unwrap();
        assert_eq!(stored.albums.len(), 2);
    }

    #[test]
    fn test_save_clamps_watermark_params() {
        let registry = registry();

        let update = SettingsUpdate {
            watermark_size: Some(9999),
            watermark_opacity: Some(1.5),
            ..Default::default()
        };
        let settings = registry.save(&update).unwrap();
        assert_eq!(settings.watermark_size, MAX_WATERMARK_SIZE);
        assert_eq!(settings.watermark_opacity, 1.0);

        let update = SettingsUpdate {
            watermark_opacity: Some(-0.5),
            ..Default::default()
        };
        let settings = registry.save(&update).unwrap();
        assert_eq!(settings.watermark_opacity, 0.0);
    }

    #[test]
    fn test_save_rejects_invalid_watermark_img() {
        let registry = registry();

        let update = SettingsUpdate {
            watermark_img: Some(b"not an image".to_vec()),
            ..Default::default()
        };
        match registry.save(&update) {
            Err(AppError::Validation(_)) => {}
            other => panic!("unexpected: {:?}", other.map(|_| ()).err().map(|e| e.kind())),
        }
    }

    #[test]
    fn test_save_flushes_lookup_cache_on_watermark_change() {
        let registry = registry();
        registry
            .lookup
            .put_rendition("blob1", "水印", vec![1, 2, 3]);

        let update = SettingsUpdate {
            enable_watermark: Some(true),
            ..Default::default()
        };
        registry.save(&update).unwrap();
        assert!(registry.lookup.get_rendition("blob1", "水印").is_none());
    }

    #[test]
    fn test_save_persists_through_cache() {
        let registry = registry();

        let update = SettingsUpdate {
            title: Some("我的相册站".to_string()),
            ..Default::default()
        };
        registry.save(&update).unwrap();

        // 缓存失效后重新读取仍是新值
        let settings = registry.load().unwrap();
        assert_eq!(settings.title, "我的相册站");
    }

    #[test]
    fn test_reset_restores_defaults() {
        let registry = registry();
        registry
            .save(&SettingsUpdate {
                title: Some("改过的标题".to_string()),
                ..Default::default()
            })
            .unwrap();

        let settings = registry.reset().unwrap();
        assert_eq!(settings.title, "PhotoSpace");
    }
}
