//! PhotoSpace 缓存模块
//!
//! 实体缓存与查询结果缓存

pub mod entity;
pub mod lookup;

pub use entity::{CachedEntity, EntityCache, DEFAULT_CAPACITY};
pub use lookup::LookupCache;
