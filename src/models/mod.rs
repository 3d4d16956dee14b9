//! PhotoSpace 数据模型模块
//!
//! 包含所有数据结构定义

pub mod album;
pub mod comment;
pub mod photo;
pub mod settings;

// 重新导出常用类型
pub use album::{Album, AlbumCursor, CreateAlbum, UpdateAlbum};
pub use comment::{Comment, CreateComment};
pub use photo::{CreatePhoto, Photo, PhotoKind, UpdatePhoto};
pub use settings::{AlbumEntry, SettingsUpdate, SiteSettings, WatermarkPosition};

use chrono::{SecondsFormat, Utc};

/// 获取当前 UTC 时间的 ISO 8601 字符串
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
