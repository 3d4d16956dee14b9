//! 数据库 Schema 定义
//!
//! 包含所有表的 CREATE 语句和迁移脚本

/// 数据库版本
pub const SCHEMA_VERSION: i32 = 1;

/// 初始化 Schema SQL
///
/// key_name 沿用实体键命名约定（`dbalbum/<name>`、`dbphoto/<album>/<name>`），
/// 既是主键也是公开 URL 的来源
pub const INIT_SCHEMA: &str = r#"
-- 相册表
CREATE TABLE IF NOT EXISTS albums (
    key_name        TEXT PRIMARY KEY,
    name            TEXT NOT NULL UNIQUE,
    owner           TEXT NOT NULL DEFAULT '',
    description     TEXT NOT NULL DEFAULT 'description',
    public          INTEGER NOT NULL DEFAULT 1,
    createdate      TEXT NOT NULL,
    updatedate      TEXT NOT NULL,
    photoslist      TEXT NOT NULL DEFAULT '[]',
    coverphoto      TEXT NOT NULL DEFAULT ''
);

-- 照片表
CREATE TABLE IF NOT EXISTS photos (
    key_name        TEXT PRIMARY KEY,
    album_name      TEXT NOT NULL,
    photo_name      TEXT NOT NULL,
    owner           TEXT NOT NULL DEFAULT '',
    public          INTEGER NOT NULL DEFAULT 1,
    mime            TEXT NOT NULL,
    size            INTEGER NOT NULL,
    description     TEXT NOT NULL DEFAULT '',
    createdate      TEXT NOT NULL,
    blob_key        TEXT NOT NULL,
    thumb_blob_key  TEXT NOT NULL,
    site            TEXT NOT NULL DEFAULT ''
);

-- 评论表
CREATE TABLE IF NOT EXISTS comments (
    comment_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    photo_key_name  TEXT NOT NULL,
    author          TEXT NOT NULL DEFAULT '',
    email           TEXT NOT NULL DEFAULT '',
    public          INTEGER NOT NULL DEFAULT 1,
    content         TEXT NOT NULL,
    date            TEXT NOT NULL
);

-- 站点设置表（单行，JSON 文档）
CREATE TABLE IF NOT EXISTS site_settings (
    key_name        TEXT PRIMARY KEY,
    data            TEXT NOT NULL
);

-- 数据库版本表
CREATE TABLE IF NOT EXISTS schema_version (
    version         INTEGER PRIMARY KEY,
    applied_at      TEXT NOT NULL
);

-- 索引
CREATE INDEX IF NOT EXISTS idx_albums_createdate ON albums(createdate);
CREATE INDEX IF NOT EXISTS idx_albums_public ON albums(public);

CREATE INDEX IF NOT EXISTS idx_photos_album_name ON photos(album_name);
CREATE INDEX IF NOT EXISTS idx_photos_createdate ON photos(createdate);
CREATE INDEX IF NOT EXISTS idx_photos_public ON photos(public);

CREATE INDEX IF NOT EXISTS idx_comments_photo_key ON comments(photo_key_name);
CREATE INDEX IF NOT EXISTS idx_comments_date ON comments(date);
CREATE INDEX IF NOT EXISTS idx_comments_public ON comments(public);
"#;

/// 迁移脚本
pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// 所有迁移脚本列表
pub const MIGRATIONS: &[Migration] = &[];
