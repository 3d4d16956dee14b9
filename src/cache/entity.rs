//! 实体缓存
//!
//! 主存储之前的进程内记忆层，以实体键为索引。
//! 读取时只回源缓存缺失的键；任何变更操作必须对相应键调用
//! `invalidate`，否则陈旧数据会在进程生命周期内一直可见。
//! 容量有上限（LRU 淘汰），替代无界增长的历史行为。

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

use crate::models::{Album, Photo, SiteSettings};
use crate::utils::error::AppResult;

/// 默认缓存容量（条目数）
pub const DEFAULT_CAPACITY: usize = 1024;

/// 可被实体缓存承载的实体
#[derive(Debug, Clone)]
pub enum CachedEntity {
    Album(Album),
    Photo(Photo),
    Settings(SiteSettings),
}

/// 实体缓存
#[derive(Clone)]
pub struct EntityCache {
    inner: Arc<Mutex<LruCache<String, CachedEntity>>>,
}

impl EntityCache {
    /// 创建实体缓存
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// 批量读取实体
    ///
    /// 只有缓存缺失的键才交给 `load` 回源；回源结果中的命中会写入缓存。
    /// 返回值与输入键一一对应，主存储也没有的键对应 None（None 不缓存）
    pub fn fetch<F>(&self, keys: &[String], load: F) -> AppResult<Vec<Option<CachedEntity>>>
    where
        F: FnOnce(&[String]) -> AppResult<Vec<Option<CachedEntity>>>,
    {
        let mut results: Vec<Option<CachedEntity>> = vec![None; keys.len()];
        let mut missing: Vec<String> = Vec::new();
        let mut missing_slots: Vec<usize> = Vec::new();

        if let Ok(mut cache) = self.inner.lock() {
            for (i, key) in keys.iter().enumerate() {
                match cache.get(key) {
                    Some(entity) => results[i] = Some(entity.clone()),
                    None => {
                        missing.push(key.clone());
                        missing_slots.push(i);
                    }
                }
            }
        } else {
            // 锁中毒时退化为全量回源
            missing = keys.to_vec();
            missing_slots = (0..keys.len()).collect();
        }

        if missing.is_empty() {
            return Ok(results);
        }

        // 回源期间不持锁
        let loaded = load(&missing)?;

        if let Ok(mut cache) = self.inner.lock() {
            for (key, entity) in missing.iter().zip(loaded.iter()) {
                if let Some(entity) = entity {
                    cache.put(key.clone(), entity.clone());
                }
            }
        }

        for (slot, entity) in missing_slots.into_iter().zip(loaded.into_iter()) {
            results[slot] = entity;
        }

        Ok(results)
    }

    /// 写入单个实体
    pub fn put(&self, key: String, entity: CachedEntity) {
        if let Ok(mut cache) = self.inner.lock() {
            cache.put(key, entity);
        }
    }

    /// 失效指定键（变更操作前后调用，即发即弃）
    pub fn invalidate(&self, keys: &[String]) {
        if let Ok(mut cache) = self.inner.lock() {
            for key in keys {
                cache.pop(key);
            }
        }
    }

    /// 当前缓存条目数
    pub fn len(&self) -> usize {
        self.inner.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    /// 缓存是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn photo_entity(name: &str) -> CachedEntity {
        CachedEntity::Photo(Photo {
            album_name: "trip".to_string(),
            photo_name: name.to_string(),
            owner: String::new(),
            public: true,
            mime: "image/gif".to_string(),
            size: 1,
            description: String::new(),
            createdate: "2024-01-01T00:00:00Z".to_string(),
            blob_key: "b".to_string(),
            thumb_blob_key: "t".to_string(),
            site: String::new(),
        })
    }

    #[test]
    fn test_fetch_loads_only_missing_keys() {
        let cache = EntityCache::new(16);
        cache.put("dbphoto/trip/a".to_string(), photo_entity("a"));

        let loaded_keys = std::cell::RefCell::new(Vec::new());
        let keys = vec!["dbphoto/trip/a".to_string(), "dbphoto/trip/b".to_string()];
        let results = cache
            .fetch(&keys, |missing| {
                loaded_keys.borrow_mut().extend(missing.to_vec());
                Ok(missing.iter().map(|_| Some(photo_entity("b"))).collect())
            })
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].is_some());
        assert!(results[1].is_some());
        // 只有缺失键回源
        assert_eq!(loaded_keys.borrow().as_slice(), &["dbphoto/trip/b".to_string()]);
    }

    #[test]
    fn test_fetch_populates_cache() {
        let cache = EntityCache::new(16);
        let calls = AtomicUsize::new(0);

        let keys = vec!["dbphoto/trip/a".to_string()];
        for _ in 0..2 {
            cache
                .fetch(&keys, |missing| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(missing.iter().map(|_| Some(photo_entity("a"))).collect())
                })
                .unwrap();
        }

        // 第二次读取全部命中，不再回源
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fetch_does_not_cache_absent_entities() {
        let cache = EntityCache::new(16);
        let calls = AtomicUsize::new(0);

        let keys = vec!["dbphoto/trip/missing".to_string()];
        for _ in 0..2 {
            let results = cache
                .fetch(&keys, |missing| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(missing.iter().map(|_| None).collect())
                })
                .unwrap();
            assert!(results[0].is_none());
        }

        // 主存储没有的键每次都回源
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_invalidate_forces_reload() {
        let cache = EntityCache::new(16);
        cache.put("dbphoto/trip/a".to_string(), photo_entity("a"));

        cache.invalidate(&["dbphoto/trip/a".to_string()]);

        let keys = vec!["dbphoto/trip/a".to_string()];
        let calls = AtomicUsize::new(0);
        cache
            .fetch(&keys, |missing| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(missing.iter().map(|_| Some(photo_entity("a"))).collect())
            })
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_capacity_is_bounded() {
        let cache = EntityCache::new(4);
        for i in 0..20 {
            cache.put(format!("dbphoto/trip/{}", i), photo_entity(&i.to_string()));
        }
        assert!(cache.len() <= 4);
    }
}
