//! 评论数据模型

use serde::{Deserialize, Serialize};

use crate::models::photo::Photo;

/// 评论
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// 评论ID
    pub comment_id: i64,
    /// 所属照片的实体键
    pub photo_key_name: String,
    /// 作者昵称
    pub author: String,
    /// 作者邮箱
    pub email: String,
    /// 是否公开（发表时从照片快照，之后不变）
    pub public: bool,
    /// 评论内容
    pub content: String,
    /// 发表时间
    pub date: String,
}

impl Comment {
    /// 拆出所属的（相册名，照片名）
    pub fn owning_names(&self) -> Option<(&str, &str)> {
        Photo::split_key_name(&self.photo_key_name)
    }
}

/// 用于创建评论的输入结构
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateComment {
    pub album_name: String,
    pub photo_name: String,
    pub author: String,
    pub email: String,
    pub content: String,
}
