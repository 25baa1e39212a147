//! Palette-era raster backend: fast, aliased and predictable.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Resample | `image::imageops::resize` with `Triangle` filter |
//! | Rotate 90/180/270 | `image::imageops::rotate270` / `rotate180` / `rotate90` (lossless) |
//! | Rotate other angles | nearest-neighbour inverse mapping |
//! | Shapes, text | tiny-skia with anti-aliasing off; `Line` thickness ignored |
//!
//! Alpha is exposed on a 0–127 inverted scale.

use super::backend::{BackendKind, GraphicsBackend};
use super::calculations::Rotation;
use super::drawing::DrawingObject;
use super::paint::{self, RenderStyle};
use super::params::{Color, Rect, TextParams};
use super::surface::{self, CompositeMode, Surface};
use crate::error::Result;
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use std::path::Path;

const STYLE: RenderStyle = RenderStyle {
    anti_alias: false,
    hairline_lines: true,
};

/// Raster backend. See the [module docs](self).
#[derive(Debug, Default, Clone, Copy)]
pub struct RasterBackend;

impl RasterBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Nearest-neighbour rotation onto the enlarged canvas.
fn rotate_nearest(src: &RgbaImage, angle: f64, background: Rgba<u8>) -> RgbaImage {
    let (w, h) = src.dimensions();
    let rotation = Rotation::new(w, h, angle);
    let (cw, ch) = rotation.extent();
    RgbaImage::from_fn(cw, ch, |x, y| {
        let (sx, sy) = rotation.inverse(x as f64 + 0.5, y as f64 + 0.5);
        let (sx, sy) = (sx.floor(), sy.floor());
        if sx >= 0.0 && sy >= 0.0 && sx < w as f64 && sy < h as f64 {
            *src.get_pixel(sx as u32, sy as u32)
        } else {
            background
        }
    })
}

impl GraphicsBackend for RasterBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Raster
    }

    fn is_available(&self) -> bool {
        [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::Gif]
            .iter()
            .all(|f| f.reading_enabled() && f.writing_enabled())
    }

    fn alpha_max(&self) -> u8 {
        127
    }

    fn copy_resampled(
        &self,
        dst: &mut Surface,
        src: &Surface,
        src_rect: Rect,
        dst_rect: Rect,
        mode: CompositeMode,
    ) -> Result<()> {
        if dst_rect.width == 0 || dst_rect.height == 0 {
            return Ok(());
        }
        if (src_rect.width, src_rect.height) == (dst_rect.width, dst_rect.height) {
            surface::blit(
                dst.pixels_mut(),
                src.pixels(),
                src_rect,
                dst_rect.x,
                dst_rect.y,
                mode,
            );
            return Ok(());
        }
        // Only pixels that exist are sampled.
        let Some(region) = src_rect.clip_to(src.width(), src.height()) else {
            return Ok(());
        };
        let view = imageops::crop_imm(
            src.pixels(),
            region.x as u32,
            region.y as u32,
            region.width,
            region.height,
        )
        .to_image();
        let scaled = imageops::resize(&view, dst_rect.width, dst_rect.height, FilterType::Triangle);
        surface::blit(
            dst.pixels_mut(),
            &scaled,
            Rect::sized(dst_rect.width, dst_rect.height),
            dst_rect.x,
            dst_rect.y,
            mode,
        );
        Ok(())
    }

    fn draw(&self, surface: &mut Surface, object: &DrawingObject) -> Result<()> {
        paint::draw_object(surface, object, STYLE)
    }

    fn rotate(&self, surface: &Surface, angle: f64, background: Color) -> Result<Surface> {
        let src = surface.pixels();
        let turned = angle.rem_euclid(360.0);
        let pixels = if turned == 0.0 {
            src.clone()
        } else if turned == 90.0 {
            imageops::rotate270(src)
        } else if turned == 180.0 {
            imageops::rotate180(src)
        } else if turned == 270.0 {
            imageops::rotate90(src)
        } else {
            rotate_nearest(src, angle, Rgba(background.to_rgba8()))
        };
        Ok(Surface::from_rgba(pixels, self.kind())?.inherit_origin(surface))
    }

    fn text(&self, surface: &mut Surface, params: &TextParams, font: &Path) -> Result<()> {
        paint::draw_text(surface, params, font, STYLE.anti_alias)
    }
}
