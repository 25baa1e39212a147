//! The pixel surface owned by an [`Editor`](crate::Editor).
//!
//! A [`Surface`] is a straight-alpha RGBA8 buffer plus what the editor needs
//! to know about where it came from: the decoded [`PixelFormat`], the encoded
//! [`ImageType`], the source path and the backend that allocated it. Width and
//! height are read from the buffer itself, so they can never drift from the
//! pixel data.
//!
//! The free functions at the bottom ([`blit`], [`composite`], [`flood_fill`])
//! are unscaled pixel loops shared by every backend.

use super::backend::BackendKind;
use super::params::{Color, ImageType, PixelFormat, Rect};
use crate::error::{GrafikaError, Result};
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};

/// How source pixels are written onto a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeMode {
    /// Source-over blending; translucent pixels mix with what is underneath.
    Blend,
    /// Source pixels, alpha included, overwrite the destination.
    Replace,
}

/// An owned raster buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pixels: RgbaImage,
    format: PixelFormat,
    image_type: ImageType,
    source: Option<PathBuf>,
    allocated_by: BackendKind,
    full_alpha: bool,
}

impl Surface {
    /// Opaque black truecolor surface.
    pub fn blank(width: u32, height: u32, allocated_by: BackendKind) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GrafikaError::invalid(format!(
                "surface dimensions must be positive, got {width}x{height}"
            )));
        }
        Ok(Self {
            pixels: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
            format: PixelFormat::Rgb,
            image_type: ImageType::Unknown,
            source: None,
            allocated_by,
            full_alpha: false,
        })
    }

    /// Wrap an existing RGBA buffer. Zero-sized buffers are rejected.
    pub fn from_rgba(pixels: RgbaImage, allocated_by: BackendKind) -> Result<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(GrafikaError::invalid("surface dimensions must be positive"));
        }
        Ok(Self {
            pixels,
            format: PixelFormat::Rgba,
            image_type: ImageType::Unknown,
            source: None,
            allocated_by,
            full_alpha: false,
        })
    }

    /// Attach decode metadata.
    pub fn with_origin(
        mut self,
        format: PixelFormat,
        image_type: ImageType,
        source: Option<PathBuf>,
    ) -> Self {
        self.format = format;
        self.image_type = image_type;
        self.source = source;
        self
    }

    /// Copy the origin metadata of `other` onto a freshly allocated surface.
    pub(crate) fn inherit_origin(mut self, other: &Surface) -> Self {
        self.format = other.format;
        self.image_type = other.image_type;
        self.source = other.source.clone();
        self
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn image_type(&self) -> ImageType {
        self.image_type
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn allocated_by(&self) -> BackendKind {
        self.allocated_by
    }

    /// Whether copies onto this surface keep source alpha verbatim.
    pub fn full_alpha(&self) -> bool {
        self.full_alpha
    }

    pub fn set_full_alpha(&mut self, enabled: bool) {
        self.full_alpha = enabled;
    }

    /// Composite mode for writes onto this surface.
    pub fn composite_mode(&self) -> CompositeMode {
        if self.full_alpha {
            CompositeMode::Replace
        } else {
            CompositeMode::Blend
        }
    }

    /// Composite mode when resampling this surface into a fresh one.
    ///
    /// PNG sources and full-alpha surfaces keep their alpha; everything else
    /// is flattened onto the new surface's opaque black.
    pub fn resample_mode(&self) -> CompositeMode {
        if self.full_alpha || self.image_type == ImageType::Png {
            CompositeMode::Replace
        } else {
            CompositeMode::Blend
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }

    /// Straight RGBA8 at (x, y), or `None` outside the surface.
    pub fn rgba_at(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        (x < self.width() && y < self.height()).then(|| self.pixels.get_pixel(x, y).0)
    }
}

/// Write `src` onto `dst` according to `mode`.
pub fn composite(dst: &mut Rgba<u8>, src: Rgba<u8>, mode: CompositeMode) {
    if mode == CompositeMode::Replace || src.0[3] == 255 {
        *dst = src;
        return;
    }
    let sa = src.0[3] as f32 / 255.0;
    if sa == 0.0 {
        return;
    }
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let sc = src.0[c] as f32;
        let dc = dst.0[c] as f32;
        dst.0[c] = ((sc * sa + dc * da * (1.0 - sa)) / out_a).round() as u8;
    }
    dst.0[3] = (out_a * 255.0).round() as u8;
}

/// Unscaled copy of `src_rect` from `src` to `(dst_x, dst_y)` in `dst`.
///
/// No clamping of the request itself: source pixels outside `src` are skipped
/// (the destination keeps whatever it had) and destination pixels outside
/// `dst` are dropped.
pub fn blit(
    dst: &mut RgbaImage,
    src: &RgbaImage,
    src_rect: Rect,
    dst_x: i64,
    dst_y: i64,
    mode: CompositeMode,
) {
    let (src_w, src_h) = (src.width() as i64, src.height() as i64);
    let (dst_w, dst_h) = (dst.width() as i64, dst.height() as i64);
    for row in 0..src_rect.height as i64 {
        let sy = src_rect.y + row;
        let dy = dst_y + row;
        if sy < 0 || sy >= src_h || dy < 0 || dy >= dst_h {
            continue;
        }
        for col in 0..src_rect.width as i64 {
            let sx = src_rect.x + col;
            let dx = dst_x + col;
            if sx < 0 || sx >= src_w || dx < 0 || dx >= dst_w {
                continue;
            }
            let pixel = *src.get_pixel(sx as u32, sy as u32);
            composite(dst.get_pixel_mut(dx as u32, dy as u32), pixel, mode);
        }
    }
}

/// Flood fill the 4-connected region sharing the seed pixel's color.
///
/// A seed outside the surface is a no-op.
pub fn flood_fill(img: &mut RgbaImage, x: i64, y: i64, color: Color) {
    let (w, h) = (img.width() as i64, img.height() as i64);
    if x < 0 || y < 0 || x >= w || y >= h {
        return;
    }
    let target = *img.get_pixel(x as u32, y as u32);
    let replacement = Rgba(color.to_rgba8());
    if target == replacement {
        return;
    }
    let mut stack = vec![(x as u32, y as u32)];
    while let Some((px, py)) = stack.pop() {
        if *img.get_pixel(px, py) != target {
            continue;
        }
        img.put_pixel(px, py, replacement);
        if px > 0 {
            stack.push((px - 1, py));
        }
        if py > 0 {
            stack.push((px, py - 1));
        }
        if (px as i64) + 1 < w {
            stack.push((px + 1, py));
        }
        if (py as i64) + 1 < h {
            stack.push((px, py + 1));
        }
    }
}
