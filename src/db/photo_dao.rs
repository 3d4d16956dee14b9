//! 照片数据访问层

use std::collections::HashMap;

use rusqlite::{params, Connection, Row};

use crate::models::{Photo, UpdatePhoto};
use crate::utils::error::{AppError, AppResult};

use super::connection::Database;

/// 从数据库行映射到 Photo 结构
fn row_to_photo(row: &Row<'_>) -> rusqlite::Result<Photo> {
    Ok(Photo {
        album_name: row.get("album_name")?,
        photo_name: row.get("photo_name")?,
        owner: row.get("owner")?,
        public: row.get::<_, i32>("public")? != 0,
        mime: row.get("mime")?,
        size: row.get("size")?,
        description: row.get("description")?,
        createdate: row.get("createdate")?,
        blob_key: row.get("blob_key")?,
        thumb_blob_key: row.get("thumb_blob_key")?,
        site: row.get("site")?,
    })
}

/// 在事务内插入照片
pub(crate) fn insert_photo_tx(conn: &Connection, photo: &Photo) -> AppResult<()> {
    conn.execute(
        r#"
        INSERT INTO photos (
            key_name, album_name, photo_name, owner, public, mime,
            size, description, createdate, blob_key, thumb_blob_key, site
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
        params![
            photo.key_name(),
            photo.album_name,
            photo.photo_name,
            photo.owner,
            photo.public as i32,
            photo.mime,
            photo.size,
            photo.description,
            photo.createdate,
            photo.blob_key,
            photo.thumb_blob_key,
            photo.site,
        ],
    )?;
    Ok(())
}

/// 在事务内批量删除照片，返回删除行数
pub(crate) fn delete_photos_tx(conn: &Connection, key_names: &[String]) -> AppResult<usize> {
    if key_names.is_empty() {
        return Ok(0);
    }

    let placeholders: Vec<&str> = key_names.iter().map(|_| "?").collect();
    let sql = format!(
        "DELETE FROM photos WHERE key_name IN ({})",
        placeholders.join(", ")
    );

    let params_refs: Vec<&dyn rusqlite::ToSql> = key_names
        .iter()
        .map(|k| k as &dyn rusqlite::ToSql)
        .collect();

    let rows = conn.execute(&sql, params_refs.as_slice())?;
    Ok(rows)
}

impl Database {
    /// 插入照片记录
    pub fn insert_photo(&self, photo: &Photo) -> AppResult<()> {
        let conn = self.connection()?;
        insert_photo_tx(&conn, photo)
    }

    /// 根据实体键获取照片
    pub fn get_photo_by_key(&self, key_name: &str) -> AppResult<Option<Photo>> {
        let conn = self.connection()?;

        let result = conn.query_row(
            "SELECT * FROM photos WHERE key_name = ?1",
            params![key_name],
            row_to_photo,
        );

        match result {
            Ok(photo) => Ok(Some(photo)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    /// 按实体键批量获取照片，结果与输入键一一对应
    pub fn get_photos_by_keys(&self, key_names: &[String]) -> AppResult<Vec<Option<Photo>>> {
        if key_names.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.connection()?;

        let placeholders: Vec<&str> = key_names.iter().map(|_| "?").collect();
        let sql = format!(
            "SELECT * FROM photos WHERE key_name IN ({})",
            placeholders.join(", ")
        );

        let params_refs: Vec<&dyn rusqlite::ToSql> = key_names
            .iter()
            .map(|k| k as &dyn rusqlite::ToSql)
            .collect();

        let mut stmt = conn.prepare(&sql)?;
        let mut found: HashMap<String, Photo> = HashMap::new();
        let rows = stmt.query_map(params_refs.as_slice(), row_to_photo)?;
        for row in rows.flatten() {
            found.insert(row.key_name(), row);
        }

        Ok(key_names.iter().map(|k| found.remove(k)).collect())
    }

    /// 获取最新照片（按创建时间倒序）
    pub fn get_latest_photos(&self, count: u32, include_private: bool) -> AppResult<Vec<Photo>> {
        let conn = self.connection()?;

        let sql = if include_private {
            "SELECT * FROM photos ORDER BY createdate DESC, rowid DESC LIMIT ?1"
        } else {
            "SELECT * FROM photos WHERE public = 1 ORDER BY createdate DESC, rowid DESC LIMIT ?1"
        };

        let mut stmt = conn.prepare(sql)?;
        let photos: Vec<Photo> = stmt
            .query_map(params![count as i64], row_to_photo)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(photos)
    }

    /// 更新照片可变字段
    pub fn update_photo(&self, key_name: &str, update: &UpdatePhoto) -> AppResult<bool> {
        let conn = self.connection()?;

        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref description) = update.description {
            updates.push("description = ?");
            params_vec.push(Box::new(description.clone()));
        }
        if let Some(public) = update.public {
            updates.push("public = ?");
            params_vec.push(Box::new(public as i32));
        }

        if updates.is_empty() {
            return Ok(false);
        }

        params_vec.push(Box::new(key_name.to_string()));

        let sql = format!(
            "UPDATE photos SET {} WHERE key_name = ?",
            updates.join(", ")
        );

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        let rows = conn.execute(&sql, params_refs.as_slice())?;

        Ok(rows > 0)
    }
}
