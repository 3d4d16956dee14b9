//! 站点设置数据模型
//!
//! 单例实体，以 JSON 文档形式持久化

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// 设置单例的实体键
pub const SETTINGS_KEY: &str = "dbsitesettings/site_settings";

/// 水印字号上限
pub const MAX_WATERMARK_SIZE: u32 = 150;

/// 水印锚点位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum WatermarkPosition {
    TopLeft,
    Top,
    TopRight,
    Left,
    Center,
    Right,
    BottomLeft,
    Bottom,
    #[default]
    BottomRight,
}

/// 去范化相册索引条目
///
/// 以相册名为键，避免导航菜单对相册表的全量扫描
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumEntry {
    pub name: String,
    pub public: bool,
}

/// 站点设置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteSettings {
    /// 站点标题
    pub title: String,
    /// 站点描述
    pub description: String,
    /// 首页每页相册数
    pub albums_per_page: u32,
    /// 相册页每页缩略图数
    pub thumbs_per_page: u32,
    /// 首页最新照片数
    pub latest_photos_count: u32,
    /// 首页最新评论数
    pub latest_comments_count: u32,
    /// 上传大小上限（MB）
    pub max_upload_size_mb: f64,
    /// 管理员邮箱列表
    pub adminlist: Vec<String>,
    /// 是否开启评论
    pub enable_comment: bool,
    /// 是否允许匿名评论
    pub enable_anonymous_comment: bool,
    /// 是否开启水印
    pub enable_watermark: bool,
    /// 水印文字
    pub watermark: String,
    /// 水印字号
    pub watermark_size: u32,
    /// 水印不透明度 (0.0-1.0)
    pub watermark_opacity: f64,
    /// 水印位置
    pub watermark_position: WatermarkPosition,
    /// 水印图片（base64）
    pub watermark_img: Option<String>,
    /// 是否拦截外站引用
    pub block_referrers: bool,
    /// 不拦截的站点通配符列表
    pub unblock_sites_list: Vec<String>,
    /// 去范化相册索引（按创建时间倒序）
    pub albums: Vec<AlbumEntry>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            title: "PhotoSpace".to_string(),
            description: "Photo gallery based on PhotoSpace".to_string(),
            albums_per_page: 8,
            thumbs_per_page: 12,
            latest_photos_count: 9,
            latest_comments_count: 5,
            max_upload_size_mb: 2.0,
            adminlist: Vec::new(),
            enable_comment: true,
            enable_anonymous_comment: false,
            enable_watermark: false,
            watermark: String::new(),
            watermark_size: 20,
            watermark_opacity: 0.4,
            watermark_position: WatermarkPosition::default(),
            watermark_img: None,
            block_referrers: false,
            unblock_sites_list: Vec::new(),
            albums: Vec::new(),
        }
    }
}

impl SiteSettings {
    /// 设置单例的实体键
    pub fn key_name() -> &'static str {
        SETTINGS_KEY
    }

    /// 解码水印图片字节，未配置或损坏时返回 None
    pub fn watermark_img_bytes(&self) -> Option<Vec<u8>> {
        let encoded = self.watermark_img.as_ref()?;
        BASE64.decode(encoded).ok()
    }

    /// 写入水印图片字节
    pub fn set_watermark_img(&mut self, binary: &[u8]) {
        self.watermark_img = Some(BASE64.encode(binary));
    }

    /// 索引中是否含有指定相册
    pub fn has_album(&self, name: &str) -> bool {
        self.albums.iter().any(|entry| entry.name == name)
    }
}

/// 用于更新站点设置的输入结构
///
/// 字段在编译期枚举，不做运行时类型推断；
/// 相册索引不在此结构内，由相册生命周期维护
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub albums_per_page: Option<u32>,
    pub thumbs_per_page: Option<u32>,
    pub latest_photos_count: Option<u32>,
    pub latest_comments_count: Option<u32>,
    pub max_upload_size_mb: Option<f64>,
    pub adminlist: Option<Vec<String>>,
    pub enable_comment: Option<bool>,
    pub enable_anonymous_comment: Option<bool>,
    pub enable_watermark: Option<bool>,
    pub watermark: Option<String>,
    pub watermark_size: Option<u32>,
    pub watermark_opacity: Option<f64>,
    pub watermark_position: Option<WatermarkPosition>,
    pub watermark_img: Option<Vec<u8>>,
    pub block_referrers: Option<bool>,
    pub unblock_sites_list: Option<Vec<String>>,
}
