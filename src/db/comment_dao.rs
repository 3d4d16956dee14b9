//! 评论数据访问层

use rusqlite::{params, Connection, Row};

use crate::models::Comment;
use crate::utils::error::{AppError, AppResult};

use super::connection::Database;

/// 从数据库行映射到 Comment 结构
fn row_to_comment(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        comment_id: row.get("comment_id")?,
        photo_key_name: row.get("photo_key_name")?,
        author: row.get("author")?,
        email: row.get("email")?,
        public: row.get::<_, i32>("public")? != 0,
        content: row.get("content")?,
        date: row.get("date")?,
    })
}

/// 在事务内删除多张照片的全部评论，返回删除行数
pub(crate) fn delete_comments_for_photos_tx(
    conn: &Connection,
    photo_key_names: &[String],
) -> AppResult<usize> {
    if photo_key_names.is_empty() {
        return Ok(0);
    }

    let placeholders: Vec<&str> = photo_key_names.iter().map(|_| "?").collect();
    let sql = format!(
        "DELETE FROM comments WHERE photo_key_name IN ({})",
        placeholders.join(", ")
    );

    let params_refs: Vec<&dyn rusqlite::ToSql> = photo_key_names
        .iter()
        .map(|k| k as &dyn rusqlite::ToSql)
        .collect();

    let rows = conn.execute(&sql, params_refs.as_slice())?;
    Ok(rows)
}

impl Database {
    /// 插入评论，返回评论ID
    pub fn insert_comment(&self, comment: &Comment) -> AppResult<i64> {
        let conn = self.connection()?;

        conn.execute(
            r#"
            INSERT INTO comments (photo_key_name, author, email, public, content, date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                comment.photo_key_name,
                comment.author,
                comment.email,
                comment.public as i32,
                comment.content,
                comment.date,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// 根据ID获取评论
    pub fn get_comment(&self, comment_id: i64) -> AppResult<Option<Comment>> {
        let conn = self.connection()?;

        let result = conn.query_row(
            "SELECT * FROM comments WHERE comment_id = ?1",
            params![comment_id],
            row_to_comment,
        );

        match result {
            Ok(comment) => Ok(Some(comment)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    /// 获取一张照片的评论（按发表时间正序）
    pub fn get_comments_for_photo(
        &self,
        photo_key_name: &str,
        public_only: bool,
    ) -> AppResult<Vec<Comment>> {
        let conn = self.connection()?;

        let sql = if public_only {
            "SELECT * FROM comments WHERE photo_key_name = ?1 AND public = 1 ORDER BY date, comment_id"
        } else {
            "SELECT * FROM comments WHERE photo_key_name = ?1 ORDER BY date, comment_id"
        };

        let mut stmt = conn.prepare(sql)?;
        let comments: Vec<Comment> = stmt
            .query_map(params![photo_key_name], row_to_comment)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(comments)
    }

    /// 获取最新评论（按发表时间倒序）
    pub fn get_latest_comments(&self, count: u32, public_only: bool) -> AppResult<Vec<Comment>> {
        let conn = self.connection()?;

        let sql = if public_only {
            "SELECT * FROM comments WHERE public = 1 ORDER BY date DESC, comment_id DESC LIMIT ?1"
        } else {
            "SELECT * FROM comments ORDER BY date DESC, comment_id DESC LIMIT ?1"
        };

        let mut stmt = conn.prepare(sql)?;
        let comments: Vec<Comment> = stmt
            .query_map(params![count as i64], row_to_comment)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(comments)
    }

    /// 根据ID删除评论
    pub fn delete_comment(&self, comment_id: i64) -> AppResult<bool> {
        let conn = self.connection()?;
        let rows = conn.execute(
            "DELETE FROM comments WHERE comment_id = ?1",
            params![comment_id],
        )?;
        Ok(rows > 0)
    }

    /// 删除一张照片的全部评论，返回删除行数
    pub fn delete_comments_for_photo(&self, photo_key_name: &str) -> AppResult<usize> {
        let conn = self.connection()?;
        let rows = conn.execute(
            "DELETE FROM comments WHERE photo_key_name = ?1",
            params![photo_key_name],
        )?;
        Ok(rows)
    }
}
