//! PhotoSpace 服务模块
//!
//! 包含所有业务逻辑服务

pub mod album_manager;
pub mod comment_manager;
pub mod photo_manager;
pub mod settings_registry;
pub mod watermark;

// 重新导出常用类型
pub use album_manager::AlbumManager;
pub use comment_manager::CommentManager;
pub use photo_manager::PhotoManager;
pub use settings_registry::SettingsRegistry;
