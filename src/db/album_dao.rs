//! 相册数据访问层

use rusqlite::{params, Connection, Row};

use crate::models::{Album, AlbumCursor, AlbumEntry};
use crate::utils::error::{AppError, AppResult};

use super::connection::Database;

/// 从数据库行映射到 Album 结构
fn row_to_album(row: &Row<'_>) -> rusqlite::Result<Album> {
    let photoslist_raw: String = row.get("photoslist")?;
    Ok(Album {
        name: row.get("name")?,
        owner: row.get("owner")?,
        description: row.get("description")?,
        public: row.get::<_, i32>("public")? != 0,
        createdate: row.get("createdate")?,
        updatedate: row.get("updatedate")?,
        photoslist: serde_json::from_str(&photoslist_raw).unwrap_or_default(),
        coverphoto: row.get("coverphoto")?,
    })
}

/// 在事务内插入相册
pub(crate) fn insert_album_tx(conn: &Connection, album: &Album) -> AppResult<()> {
    let photoslist = serde_json::to_string(&album.photoslist)
        .map_err(|e| AppError::Config(format!("无法序列化照片列表: {}", e)))?;
    conn.execute(
        r#"
        INSERT INTO albums (key_name, name, owner, description, public, createdate, updatedate, photoslist, coverphoto)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            album.key_name(),
            album.name,
            album.owner,
            album.description,
            album.public as i32,
            album.createdate,
            album.updatedate,
            photoslist,
            album.coverphoto,
        ],
    )?;
    Ok(())
}

/// 在事务内保存相册可变字段
pub(crate) fn save_album_tx(conn: &Connection, album: &Album) -> AppResult<bool> {
    let photoslist = serde_json::to_string(&album.photoslist)
        .map_err(|e| AppError::Config(format!("无法序列化照片列表: {}", e)))?;
    let rows = conn.execute(
        r#"
        UPDATE albums
        SET description = ?1, public = ?2, updatedate = ?3, photoslist = ?4, coverphoto = ?5
        WHERE key_name = ?6
        "#,
        params![
            album.description,
            album.public as i32,
            album.updatedate,
            photoslist,
            album.coverphoto,
            album.key_name(),
        ],
    )?;
    Ok(rows > 0)
}

/// 在事务内删除相册
pub(crate) fn delete_album_tx(conn: &Connection, key_name: &str) -> AppResult<bool> {
    let rows = conn.execute("DELETE FROM albums WHERE key_name = ?1", params![key_name])?;
    Ok(rows > 0)
}

impl Database {
    /// 根据实体键获取相册
    pub fn get_album_by_key(&self, key_name: &str) -> AppResult<Option<Album>> {
        let conn = self.connection()?;

        let result = conn.query_row(
            "SELECT * FROM albums WHERE key_name = ?1",
            params![key_name],
            row_to_album,
        );

        match result {
            Ok(album) => Ok(Some(album)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    /// 保存相册可变字段（单实体写入路径）
    pub fn save_album(&self, album: &Album) -> AppResult<bool> {
        let conn = self.connection()?;
        save_album_tx(&conn, album)
    }

    /// 按创建时间倒序分页获取相册
    ///
    /// 游标为上一页最后一行的 (createdate, key_name)
    pub fn get_albums_page(
        &self,
        include_private: bool,
        page_size: u32,
        cursor: Option<&AlbumCursor>,
    ) -> AppResult<Vec<Album>> {
        let conn = self.connection()?;

        let mut where_clauses: Vec<String> = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if !include_private {
            where_clauses.push("public = 1".to_string());
        }
        if let Some(cursor) = cursor {
            where_clauses
                .push("(createdate < ? OR (createdate = ? AND key_name < ?))".to_string());
            params_vec.push(Box::new(cursor.createdate.clone()));
            params_vec.push(Box::new(cursor.createdate.clone()));
            params_vec.push(Box::new(cursor.key_name.clone()));
        }

        let where_sql = if where_clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", where_clauses.join(" AND "))
        };

        let sql = format!(
            "SELECT * FROM albums {} ORDER BY createdate DESC, key_name DESC LIMIT ?",
            where_sql
        );
        params_vec.push(Box::new(page_size as i64));

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let albums: Vec<Album> = stmt
            .query_map(params_refs.as_slice(), row_to_album)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(albums)
    }

    /// 获取相册总数
    pub fn count_albums(&self) -> AppResult<i64> {
        let conn = self.connection()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM albums", [], |row| row.get(0))?;
        Ok(count)
    }

    /// 全表扫描重建相册索引（按创建时间正序，与创建追加顺序一致）
    pub fn scan_album_index(&self) -> AppResult<Vec<AlbumEntry>> {
        let conn = self.connection()?;

        let mut stmt =
            conn.prepare("SELECT name, public FROM albums ORDER BY createdate, key_name")?;
        let entries: Vec<AlbumEntry> = stmt
            .query_map([], |row| {
                Ok(AlbumEntry {
                    name: row.get(0)?,
                    public: row.get::<_, i32>(1)? != 0,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(entries)
    }
}
