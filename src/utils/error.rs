//! PhotoSpace 错误处理模块
//!
//! 定义应用程序错误类型

use serde::Serialize;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 数据库错误
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 图像处理错误
    #[error("图像处理错误: {0}")]
    Image(#[from] image::ImageError),

    /// 实体不存在（相册/照片/评论）
    #[error("{0}不存在")]
    NotFound(String),

    /// 同名实体已存在
    #[error("{0}已存在")]
    AlreadyExists(String),

    /// 输入校验失败
    #[error("校验失败: {0}")]
    Validation(String),

    /// 主存储瞬时故障（重试次数耗尽后上抛）
    #[error("存储瞬时故障: {0}")]
    TransientStore(String),

    /// Blob 清理失败（仅记录，不中断请求）
    #[error("Blob 清理失败: {0}")]
    BlobCleanup(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
}

impl AppError {
    /// 稳定的错误种类代码，供表现层映射为用户可见文案
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Database(_) => "E_DB_ERROR",
            AppError::Io(_) => "E_IO_ERROR",
            AppError::Image(_) => "E_IMAGE_ERROR",
            AppError::NotFound(_) => "E_NOT_FOUND",
            AppError::AlreadyExists(_) => "E_ALREADY_EXISTS",
            AppError::Validation(_) => "E_VALIDATION",
            AppError::TransientStore(_) => "E_TRANSIENT_STORE",
            AppError::BlobCleanup(_) => "E_BLOB_CLEANUP",
            AppError::Config(_) => "E_CONFIG",
        }
    }
}

/// 用于对外接口返回的错误包装
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError {
            code: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// 应用程序结果类型别名
pub type AppResult<T> = Result<T, AppError>;
