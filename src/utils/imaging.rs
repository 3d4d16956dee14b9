//! 图像类型识别与缩略图生成
//!
//! 通过文件头魔数识别图像格式，不依赖扩展名

use std::io::Cursor;

use image::{imageops::FilterType, ImageFormat};

use crate::utils::error::AppResult;

/// 常见图像 MIME 常量
pub mod mime {
    pub const GIF: &str = "image/gif";
    pub const JPEG: &str = "image/jpeg";
    pub const TIFF: &str = "image/tiff";
    pub const PNG: &str = "image/png";
    pub const BMP: &str = "image/bmp";
    pub const ICO: &str = "image/x-icon";
    /// 无法识别时的兜底类型
    pub const UNKNOWN: &str = "application/octet-stream";
}

/// 缩略图尺寸：480x360，等比缩放，输出 PNG
///
/// 历史上存在 480x360/PNG 与 280x210/JPEG 两种实现，这里固定使用前者
pub const THUMB_WIDTH: u32 = 480;
pub const THUMB_HEIGHT: u32 = 360;

/// 根据文件头魔数识别图像类型
///
/// 无法识别时返回 [`mime::UNKNOWN`]，从不报错
pub fn get_img_type(binary: &[u8]) -> &'static str {
    let size = binary.len();
    if size >= 6 && binary.starts_with(b"GIF") {
        mime::GIF
    } else if size >= 8 && binary.starts_with(b"\x89PNG\x0D\x0A\x1A\x0A") {
        mime::PNG
    } else if size >= 2 && binary.starts_with(b"\xFF\xD8") {
        mime::JPEG
    } else if size >= 8 && (binary.starts_with(b"II\x2A\x00") || binary.starts_with(b"MM\x00\x2A"))
    {
        mime::TIFF
    } else if size >= 2 && binary.starts_with(b"BM") {
        mime::BMP
    } else if size >= 4 && binary.starts_with(b"\x00\x00\x01\x00") {
        mime::ICO
    } else {
        mime::UNKNOWN
    }
}

/// 生成缩略图
///
/// 等比缩放到 480x360 以内并编码为 PNG
pub fn make_thumbnail(binary: &[u8]) -> AppResult<Vec<u8>> {
    let img = image::load_from_memory(binary)?;
    let thumb = img.resize(THUMB_WIDTH, THUMB_HEIGHT, FilterType::Triangle);

    let mut buf = Cursor::new(Vec::new());
    thumb.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}
