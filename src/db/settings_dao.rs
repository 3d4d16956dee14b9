//! 站点设置数据访问层
//!
//! 设置以单行 JSON 文档持久化；去范化相册索引的增删
//! 提供事务内版本，供相册生命周期在同一原子单元内维护

use rusqlite::{params, Connection};

use crate::models::settings::SETTINGS_KEY;
use crate::models::{AlbumEntry, SiteSettings};
use crate::utils::error::{AppError, AppResult};

use super::connection::Database;

/// 在事务内读取站点设置
pub(crate) fn get_site_settings_tx(conn: &Connection) -> AppResult<Option<SiteSettings>> {
    let result = conn.query_row(
        "SELECT data FROM site_settings WHERE key_name = ?1",
        params![SETTINGS_KEY],
        |row| row.get::<_, String>(0),
    );

    match result {
        Ok(raw) => {
            let settings = serde_json::from_str(&raw)
                .map_err(|e| AppError::Config(format!("设置文档格式错误: {}", e)))?;
            Ok(Some(settings))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(AppError::Database(e)),
    }
}

/// 在事务内保存站点设置
pub(crate) fn save_site_settings_tx(conn: &Connection, settings: &SiteSettings) -> AppResult<()> {
    let raw = serde_json::to_string(settings)
        .map_err(|e| AppError::Config(format!("无法序列化设置: {}", e)))?;
    conn.execute(
        "INSERT OR REPLACE INTO site_settings (key_name, data) VALUES (?1, ?2)",
        params![SETTINGS_KEY, raw],
    )?;
    Ok(())
}

/// 在事务内向相册索引追加条目（已存在时先移除旧条目）
pub(crate) fn add_album_entry_tx(conn: &Connection, name: &str, public: bool) -> AppResult<()> {
    let mut settings = get_site_settings_tx(conn)?.unwrap_or_default();
    settings.albums.retain(|entry| entry.name != name);
    settings.albums.push(AlbumEntry {
        name: name.to_string(),
        public,
    });
    save_site_settings_tx(conn, &settings)
}

/// 在事务内按相册名移除索引条目
///
/// 仅按名称匹配，公开标记变更不影响移除
pub(crate) fn remove_album_entry_tx(conn: &Connection, name: &str) -> AppResult<()> {
    let mut settings = get_site_settings_tx(conn)?.unwrap_or_default();
    settings.albums.retain(|entry| entry.name != name);
    save_site_settings_tx(conn, &settings)
}

/// 在事务内更新索引条目的公开标记
pub(crate) fn update_album_entry_tx(conn: &Connection, name: &str, public: bool) -> AppResult<()> {
    let mut settings = get_site_settings_tx(conn)?.unwrap_or_default();
    for entry in settings.albums.iter_mut() {
        if entry.name == name {
            entry.public = public;
        }
    }
    save_site_settings_tx(conn, &settings)
}

impl Database {
    /// 读取站点设置
    pub fn get_site_settings(&self) -> AppResult<Option<SiteSettings>> {
        let conn = self.connection()?;
        get_site_settings_tx(&conn)
    }

    /// 保存站点设置
    pub fn save_site_settings(&self, settings: &SiteSettings) -> AppResult<()> {
        let conn = self.connection()?;
        save_site_settings_tx(&conn, settings)
    }
}
