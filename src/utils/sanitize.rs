//! 名称与文本净化工具

use crate::utils::error::{AppError, AppResult};

/// 相册名最大长度（字符数）
pub const MAX_ALBUM_NAME: usize = 30;
/// 描述最大长度（字符数）
pub const MAX_DESCRIPTION: usize = 50;
/// 评论最大长度（字符数）
pub const MAX_COMMENT: usize = 140;

/// 相册名中直接剔除的标点字符
const NAME_BLACKLIST: &[char] = &[
    '&', '#', '?', '$', '^', ';', '*', '/', '\\', '<', '>', ',',
];

/// 与路由冲突的保留相册名
pub const RESERVED_ALBUM_NAMES: &[&str] = &["login", "logout", "admin", "slider", "feed"];

/// 净化相册名：去除首尾空白并剔除黑名单字符
pub fn sanitize_album_name(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !NAME_BLACKLIST.contains(c))
        .collect()
}

/// 校验净化后的相册名
///
/// 空名、超长或保留名均拒绝
pub fn validate_album_name(name: &str) -> AppResult<()> {
    if name.is_empty() {
        return Err(AppError::Validation("相册名为空".to_string()));
    }
    if name.chars().count() > MAX_ALBUM_NAME {
        return Err(AppError::Validation(format!(
            "相册名过长[最多 {} 字符]",
            MAX_ALBUM_NAME
        )));
    }
    if RESERVED_ALBUM_NAMES.contains(&name.to_lowercase().as_str()) {
        return Err(AppError::Validation("相册名不可用".to_string()));
    }
    Ok(())
}

/// 净化描述：去除首尾空白，空值回退为默认描述
pub fn sanitize_description(raw: &str) -> AppResult<String> {
    let description = raw.trim();
    if description.chars().count() > MAX_DESCRIPTION {
        return Err(AppError::Validation(format!(
            "描述过长[最多 {} 字符]",
            MAX_DESCRIPTION
        )));
    }
    if description.is_empty() {
        Ok("description".to_string())
    } else {
        Ok(description.to_string())
    }
}

/// 净化评论内容
pub fn sanitize_comment(raw: &str) -> AppResult<String> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(AppError::Validation("评论内容为空".to_string()));
    }
    if content.chars().count() > MAX_COMMENT {
        return Err(AppError::Validation(format!(
            "评论过长[最多 {} 字符]",
            MAX_COMMENT
        )));
    }
    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_blacklist() {
        assert_eq!(sanitize_album_name("  tr/i\\p<20?24>  "), "trip2024");
        assert_eq!(sanitize_album_name("a&b#c$d^e;f*g,h"), "abcdefgh");
    }

    #[test]
    fn test_validate_rejects_empty() {
        let name = sanitize_album_name("   /\\  ");
        assert!(validate_album_name(&name).is_err());
    }

    #[test]
    fn test_validate_rejects_overlong() {
        let name: String = "长".repeat(MAX_ALBUM_NAME + 1);
        assert!(validate_album_name(&name).is_err());
        let ok: String = "长".repeat(MAX_ALBUM_NAME);
        assert!(validate_album_name(&ok).is_ok());
    }

    #[test]
    fn test_validate_rejects_reserved_names() {
        for name in ["admin", "Login", "FEED", "slider", "logout"] {
            assert!(validate_album_name(name).is_err(), "{} 应被拒绝", name);
        }
        assert!(validate_album_name("trip").is_ok());
    }

    #[test]
    fn test_description_fallback() {
        assert_eq!(sanitize_description("   ").unwrap(), "description");
        assert_eq!(sanitize_description(" 旅行 ").unwrap(), "旅行");
        assert!(sanitize_description(&"x".repeat(MAX_DESCRIPTION + 1)).is_err());
    }

    #[test]
    fn test_comment_limits() {
        assert!(sanitize_comment("  ").is_err());
        assert!(sanitize_comment(&"y".repeat(MAX_COMMENT + 1)).is_err());
        assert_eq!(sanitize_comment(" 不错 ").unwrap(), "不错");
    }
}
