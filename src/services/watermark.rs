//! 水印合成服务
//!
//! 把水印图片按锚点位置与不透明度合成到照片上，输出 PNG。
//! 水印超出照片范围时只绘制重叠区域

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};

use crate::models::WatermarkPosition;
use crate::utils::error::AppResult;

/// 计算锚点对应的水印左上角坐标
fn anchor_offset(
    base_w: u32,
    base_h: u32,
    mark_w: u32,
    mark_h: u32,
    position: WatermarkPosition,
) -> (u32, u32) {
    let center_x = base_w.saturating_sub(mark_w) / 2;
    let right_x = base_w.saturating_sub(mark_w);
    let center_y = base_h.saturating_sub(mark_h) / 2;
    let bottom_y = base_h.saturating_sub(mark_h);

    match position {
        WatermarkPosition::TopLeft => (0, 0),
        WatermarkPosition::Top => (center_x, 0),
        WatermarkPosition::TopRight => (right_x, 0),
        WatermarkPosition::Left => (0, center_y),
        WatermarkPosition::Center => (center_x, center_y),
        WatermarkPosition::Right => (right_x, center_y),
        WatermarkPosition::BottomLeft => (0, bottom_y),
        WatermarkPosition::Bottom => (center_x, bottom_y),
        WatermarkPosition::BottomRight => (right_x, bottom_y),
    }
}

/// 在照片上合成水印
///
/// `opacity` 取值 0.0-1.0，叠加在水印自身的 alpha 之上
pub fn apply_watermark(
    binary: &[u8],
    watermark: &[u8],
    position: WatermarkPosition,
    opacity: f64,
) -> AppResult<Vec<u8>> {
    let mut base: RgbaImage = image::load_from_memory(binary)?.to_rgba8();
    let mark: RgbaImage = image::load_from_memory(watermark)?.to_rgba8();

    let opacity = opacity.clamp(0.0, 1.0) as f32;
    let (x0, y0) = anchor_offset(
        base.width(),
        base.height(),
        mark.width(),
        mark.height(),
        position,
    );

    let max_x = base.width().min(x0 + mark.width());
    let max_y = base.height().min(y0 + mark.height());

    for y in y0..max_y {
        for x in x0..max_x {
            let mark_px = mark.get_pixel(x - x0, y - y0);
            let alpha = (mark_px.0[3] as f32 / 255.0) * opacity;
            if alpha <= 0.0 {
                continue;
            }

            let base_px = base.get_pixel_mut(x, y);
            for c in 0..3 {
                let blended =
                    base_px.0[c] as f32 * (1.0 - alpha) + mark_px.0[c] as f32 * alpha;
                base_px.0[c] = blended.round() as u8;
            }
        }
    }

    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(base).write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}
