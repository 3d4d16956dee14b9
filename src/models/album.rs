//! 相册数据模型

use serde::{Deserialize, Serialize};

use crate::models::photo::Photo;

/// 相册实体键前缀，键格式 `dbalbum/<相册名>`
///
/// 该键同时作为公开 URL 的一部分，格式不可变更
pub const KEY_PREFIX: &str = "dbalbum/";

/// 相册
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    /// 相册名（唯一，创建后不可变）
    pub name: String,
    /// 所有者
    pub owner: String,
    /// 描述
    pub description: String,
    /// 是否公开
    pub public: bool,
    /// 创建时间
    pub createdate: String,
    /// 更新时间
    pub updatedate: String,
    /// 照片键列表（最新的在最前）
    pub photoslist: Vec<String>,
    /// 封面照片键（空串表示未设置）
    pub coverphoto: String,
}

impl Album {
    /// 根据相册名生成实体键
    pub fn key_name_for(name: &str) -> String {
        format!("{}{}", KEY_PREFIX, name)
    }

    /// 本相册的实体键
    pub fn key_name(&self) -> String {
        Self::key_name_for(&self.name)
    }

    /// 相册内照片数量
    pub fn photocount(&self) -> usize {
        self.photoslist.len()
    }

    /// 封面缩略图 URL
    ///
    /// 未设置封面时回退到第一张照片，再回退到站点默认图
    pub fn cover_url(&self) -> String {
        if !self.coverphoto.is_empty() {
            return Photo::thumb_url_from_key_name(&self.coverphoto);
        }
        if let Some(first) = self.photoslist.first() {
            return Photo::thumb_url_from_key_name(first);
        }
        "/static/images/cover.jpg".to_string()
    }
}

/// 用于创建相册的输入结构
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlbum {
    pub name: String,
    pub description: String,
    pub public: bool,
    pub owner: String,
}

/// 用于更新相册的输入结构
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAlbum {
    pub description: Option<String>,
    pub public: Option<bool>,
}

/// 相册列表游标（按创建时间倒序分页）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumCursor {
    pub createdate: String,
    pub key_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_album() -> Album {
        Album {
            name: "trip".to_string(),
            owner: "owner@example.com".to_string(),
            description: "description".to_string(),
            public: true,
            createdate: "2024-01-01T00:00:00Z".to_string(),
            updatedate: "2024-01-01T00:00:00Z".to_string(),
            photoslist: vec![],
            coverphoto: String::new(),
        }
    }

    #[test]
    fn test_key_name() {
        assert_eq!(Album::key_name_for("trip"), "dbalbum/trip");
        assert_eq!(sample_album().key_name(), "dbalbum/trip");
    }

    #[test]
    fn test_cover_url_fallback_chain() {
        let mut album = sample_album();
        assert_eq!(album.cover_url(), "/static/images/cover.jpg");

        album.photoslist.push("dbphoto/trip/img1".to_string());
        assert_eq!(album.cover_url(), "trip/img1/thumb/");

        album.photoslist.insert(0, "dbphoto/trip/img2".to_string());
        album.coverphoto = "dbphoto/trip/img1".to_string();
        assert_eq!(album.cover_url(), "trip/img1/thumb/");
    }

    #[test]
    fn test_photocount() {
        let mut album = sample_album();
        assert_eq!(album.photocount(), 0);
        album.photoslist.push("dbphoto/trip/img1".to_string());
        assert_eq!(album.photocount(), 1);
    }
}
