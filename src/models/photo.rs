//! 照片数据模型

use serde::{Deserialize, Serialize};

/// 照片实体键前缀，键格式 `dbphoto/<相册名>/<照片名>`
///
/// 该键同时作为公开 URL 的一部分，格式不可变更
pub const KEY_PREFIX: &str = "dbphoto/";

/// 照片
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    /// 所属相册名
    pub album_name: String,
    /// 照片名（相册内唯一）
    pub photo_name: String,
    /// 所有者
    pub owner: String,
    /// 是否公开（创建时从相册继承，之后不自动同步）
    pub public: bool,
    /// MIME 类型（由魔数识别）
    pub mime: String,
    /// 原始字节大小
    pub size: i64,
    /// 描述
    pub description: String,
    /// 创建时间
    pub createdate: String,
    /// 原图 blob 键
    pub blob_key: String,
    /// 缩略图 blob 键
    pub thumb_blob_key: String,
    /// 来源站点 URL 前缀
    pub site: String,
}

impl Photo {
    /// 根据相册名与照片名生成实体键
    pub fn key_name_for(album_name: &str, photo_name: &str) -> String {
        format!("{}{}/{}", KEY_PREFIX, album_name, photo_name)
    }

    /// 本照片的实体键
    pub fn key_name(&self) -> String {
        Self::key_name_for(&self.album_name, &self.photo_name)
    }

    /// 从实体键拆出（相册名，照片名）
    pub fn split_key_name(key_name: &str) -> Option<(&str, &str)> {
        let rest = key_name.strip_prefix(KEY_PREFIX)?;
        rest.split_once('/')
    }

    /// 原图 URL
    pub fn url(&self) -> String {
        format!("{}/{}/{}", self.site, self.album_name, self.photo_name)
    }

    /// 缩略图 URL
    pub fn thumb_url(&self) -> String {
        format!("{}/{}/{}/thumb/", self.site, self.album_name, self.photo_name)
    }

    /// 从实体键生成缩略图相对 URL
    pub fn thumb_url_from_key_name(key_name: &str) -> String {
        let rest = key_name.strip_prefix(KEY_PREFIX).unwrap_or(key_name);
        format!("{}/thumb/", rest)
    }
}

/// 照片资源种类（原图或缩略图）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoKind {
    Photo,
    Thumb,
}

impl PhotoKind {
    /// 缓存键中使用的种类名称
    pub fn name(&self) -> &'static str {
        match self {
            PhotoKind::Photo => "photo",
            PhotoKind::Thumb => "thumb",
        }
    }
}

/// 用于创建照片的输入结构
///
/// 可见性不由调用方指定，创建时从相册继承
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePhoto {
    pub album_name: String,
    pub photo_name: String,
    pub owner: String,
    pub description: String,
    pub site: String,
}

/// 用于更新照片的输入结构
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePhoto {
    pub description: Option<String>,
    pub public: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_name_roundtrip() {
        let key = Photo::key_name_for("trip", "img1.jpg");
        assert_eq!(key, "dbphoto/trip/img1.jpg");
        assert_eq!(Photo::split_key_name(&key), Some(("trip", "img1.jpg")));
    }

    #[test]
    fn test_split_key_name_rejects_foreign_keys() {
        assert_eq!(Photo::split_key_name("dbalbum/trip"), None);
        assert_eq!(Photo::split_key_name("dbphoto/noslash"), None);
    }

    #[test]
    fn test_urls() {
        let photo = Photo {
            album_name: "trip".to_string(),
            photo_name: "img1".to_string(),
            owner: String::new(),
            public: true,
            mime: "image/gif".to_string(),
            size: 10,
            description: String::new(),
            createdate: "2024-01-01T00:00:00Z".to_string(),
            blob_key: "abc".to_string(),
            thumb_blob_key: "def".to_string(),
            site: "https://example.com".to_string(),
        };
        assert_eq!(photo.url(), "https://example.com/trip/img1");
        assert_eq!(photo.thumb_url(), "https://example.com/trip/img1/thumb/");
        assert_eq!(
            Photo::thumb_url_from_key_name("dbphoto/trip/img1"),
            "trip/img1/thumb/"
        );
    }
}
