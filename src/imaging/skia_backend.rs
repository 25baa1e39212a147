//! High-quality backend built on tiny-skia.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Resample | `Pixmap::draw_pixmap` with `FilterQuality::Bicubic` |
//! | Rotate | `Pixmap::draw_pixmap` through an affine transform, `FilterQuality::Bilinear` |
//! | Shapes, text | tiny-skia paths, anti-aliased |
//!
//! Alpha is exposed on a 0–255 inverted scale.

use super::backend::{BackendKind, GraphicsBackend};
use super::calculations::Rotation;
use super::drawing::DrawingObject;
use super::paint::{self, RenderStyle};
use super::params::{Color, Rect, TextParams};
use super::surface::{self, CompositeMode, Surface};
use crate::error::{GrafikaError, Result};
use image::imageops;
use std::path::Path;
use tiny_skia::{BlendMode, FilterQuality, Pixmap, PixmapPaint, Transform};

const STYLE: RenderStyle = RenderStyle {
    anti_alias: true,
    hairline_lines: false,
};

/// tiny-skia backend. See the [module docs](self).
#[derive(Debug, Default, Clone, Copy)]
pub struct SkiaBackend;

impl SkiaBackend {
    pub fn new() -> Self {
        Self
    }
}

impl GraphicsBackend for SkiaBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Skia
    }

    fn is_available(&self) -> bool {
        Pixmap::new(1, 1).is_some()
    }

    fn alpha_max(&self) -> u8 {
        255
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
        let source = paint::to_pixmap(&view)?;
        let mut target = paint::to_pixmap(dst.pixels())?;

        let sx = dst_rect.width as f32 / src_rect.width as f32;
        let sy = dst_rect.height as f32 / src_rect.height as f32;
        // The clipped region may start inside the requested rect.
        let tx = dst_rect.x as f32 + (region.x - src_rect.x) as f32 * sx;
        let ty = dst_rect.y as f32 + (region.y - src_rect.y) as f32 * sy;
        let pixmap_paint = PixmapPaint {
            blend_mode: match mode {
                CompositeMode::Blend => BlendMode::SourceOver,
                CompositeMode::Replace => BlendMode::Source,
            },
            quality: FilterQuality::Bicubic,
            ..PixmapPaint::default()
        };
        target.draw_pixmap(
            0,
            0,
            source.as_ref(),
            &pixmap_paint,
            Transform::from_row(sx, 0.0, 0.0, sy, tx, ty),
            None,
        );
        paint::write_back(&target, dst.pixels_mut());
        Ok(())
    }

    fn draw(&self, surface: &mut Surface, object: &DrawingObject) -> Result<()> {
        paint::draw_object(surface, object, STYLE)
    }

    fn rotate(&self, surface: &Surface, angle: f64, background: Color) -> Result<Surface> {
        let rotation = Rotation::new(surface.width(), surface.height(), angle);
        let (cw, ch) = rotation.extent();
        let mut canvas = Pixmap::new(cw, ch).ok_or_else(|| {
            GrafikaError::invalid(format!("cannot allocate a {cw}x{ch} rotation canvas"))
        })?;
        let [r, g, b, a] = background.to_rgba8();
        canvas.fill(tiny_skia::Color::from_rgba8(r, g, b, a));

        let source = paint::to_pixmap(surface.pixels())?;
        let [sx, ky, kx, sy, tx, ty] = rotation.affine().map(|v| v as f32);
        let pixmap_paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        canvas.draw_pixmap(
            0,
            0,
            source.as_ref(),
            &pixmap_paint,
            Transform::from_row(sx, ky, kx, sy, tx, ty),
            None,
        );
        Ok(Surface::from_rgba(paint::from_pixmap(&canvas), self.kind())?.inherit_origin(surface))
    }

    fn text(&self, surface: &mut Surface, params: &TextParams, font: &Path) -> Result<()> {
        paint::draw_text(surface, params, font, STYLE.anti_alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Point;
    use image::{Rgba, RgbaImage};

    fn surface_from(pixels: RgbaImage) -> Surface {
        Surface::from_rgba(pixels, BackendKind::Skia).unwrap()
    }

    fn near(a: [u8; 4], b: [u8; 4]) -> bool {
        a.iter().zip(b).all(|(x, y)| x.abs_diff(y) <= 2)
    }

    #[test]
    fn probe_reports_available() {
        assert!(SkiaBackend::new().is_available());
        assert_eq!(SkiaBackend.alpha_max(), 255);
    }

    #[test]
    fn upscale_of_solid_color_keeps_color() {
        let src = surface_from(RgbaImage::from_pixel(2, 2, Rgba([10, 200, 30, 255])));
        let mut dst = SkiaBackend.create_surface(8, 8).unwrap();
        SkiaBackend
            .copy_resampled(
                &mut dst,
                &src,
                Rect::sized(2, 2),
                Rect::sized(8, 8),
                CompositeMode::Blend,
            )
            .unwrap();
        for (x, y) in [(0, 0), (4, 4), (7, 7)] {
            let px = dst.rgba_at(x, y).unwrap();
            assert!(near(px, [10, 200, 30, 255]), "pixel ({x},{y}) = {px:?}");
        }
    }

    #[test]
    fn replace_mode_keeps_transparency() {
        let src = surface_from(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0])));
        let mut dst = SkiaBackend.create_surface(2, 2).unwrap();
        SkiaBackend
            .copy_resampled(
                &mut dst,
                &src,
                Rect::sized(4, 4),
                Rect::sized(2, 2),
                CompositeMode::Replace,
            )
            .unwrap();
        assert_eq!(dst.rgba_at(1, 1).unwrap()[3], 0);
    }

    #[test]
    fn blend_mode_over_opaque_black_stays_opaque() {
        let src = surface_from(RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 0])));
        let mut dst = SkiaBackend.create_surface(2, 2).unwrap();
        SkiaBackend
            .copy_resampled(
                &mut dst,
                &src,
                Rect::sized(4, 4),
                Rect::sized(2, 2),
                CompositeMode::Blend,
            )
            .unwrap();
        assert_eq!(dst.rgba_at(0, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn quarter_turn_is_counter_clockwise() {
        let red = Rgba([255, 0, 0, 255]);
        let blue = Rgba([0, 0, 255, 255]);
        let src = surface_from(RgbaImage::from_fn(8, 4, |x, _| if x < 4 { red } else { blue }));
        let rotated = SkiaBackend.rotate(&src, 90.0, Color::WHITE).unwrap();
        assert_eq!(rotated.dimensions(), (4, 8));
        assert!(near(rotated.rgba_at(1, 1).unwrap(), blue.0));
        assert!(near(rotated.rgba_at(2, 6).unwrap(), red.0));
    }

    #[test]
    fn rotated_corners_take_background() {
        let src = surface_from(RgbaImage::from_pixel(50, 50, Rgba([255, 0, 0, 255])));
        let rotated = SkiaBackend.rotate(&src, 30.0, Color::new(0, 255, 0)).unwrap();
        assert_eq!(rotated.rgba_at(0, 0), Some([0, 255, 0, 255]));
    }

    #[test]
    fn anti_aliased_line_honors_thickness() {
        let mut surface = surface_from(RgbaImage::from_pixel(20, 20, Rgba([255, 255, 255, 255])));
        let thick = DrawingObject::line(Point::new(0, 10), Point::new(19, 10), 5, Color::BLACK);
        SkiaBackend.draw(&mut surface, &thick).unwrap();
        assert_eq!(surface.rgba_at(10, 8), Some([0, 0, 0, 255]));
        assert_eq!(surface.rgba_at(10, 4), Some([255, 255, 255, 255]));
    }
}
