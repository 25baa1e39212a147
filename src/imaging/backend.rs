//! Graphics backend trait and shared types.
//!
//! The [`GraphicsBackend`] trait is the seam between the backend-agnostic
//! [`Editor`](crate::Editor) and the code that actually touches pixels. The
//! editor only ever asks a backend for low-level primitives (allocate, copy
//! with resampling, read/write one pixel, draw a shape, rotate, render text,
//! encode); every geometric decision is made before the backend is called.
//!
//! Two implementations ship with the crate:
//!
//! | Backend | Name | Resampling | Rotation | Shapes | Native alpha |
//! |---|---|---|---|---|---|
//! | [`SkiaBackend`](super::skia_backend::SkiaBackend) | `skia` | bicubic | bilinear, any angle | anti-aliased | 0–255 |
//! | [`RasterBackend`](super::raster_backend::RasterBackend) | `raster` | triangle | exact right angles, nearest otherwise | aliased, 1px lines | 0–127 |
//!
//! Native alpha is inverted on both: `0` is opaque and the maximum is fully
//! transparent. [`NativePixel`] exposes that scale so alpha arithmetic can be
//! written once against [`GraphicsBackend::alpha_max`].

use super::drawing::DrawingObject;
use super::filter::Filter;
use super::io;
use super::params::{Color, ImageType, Rect, SaveOptions, TextParams};
use super::surface::{self, CompositeMode, Surface};
use crate::error::{GrafikaError, Result};
use image::Rgba;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Identifies a backend implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Skia,
    Raster,
}

impl BackendKind {
    /// Every kind, in default preference order.
    pub const ALL: [BackendKind; 2] = [BackendKind::Skia, BackendKind::Raster];

    pub fn name(self) -> &'static str {
        match self {
            Self::Skia => "skia",
            Self::Raster => "raster",
        }
    }
}

impl FromStr for BackendKind {
    type Err = GrafikaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skia" => Ok(Self::Skia),
            "raster" => Ok(Self::Raster),
            other => Err(GrafikaError::invalid(format!(
                "unknown backend '{other}'. Expected skia or raster"
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One pixel with alpha on the backend's inverted native scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativePixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// `0` is opaque, [`GraphicsBackend::alpha_max`] is fully transparent.
    pub alpha: u8,
}

/// Map an 8-bit straight alpha onto an inverted `0..=max` scale.
pub fn to_native_alpha(alpha: u8, max: u8) -> u8 {
    max - (alpha as f32 * max as f32 / 255.0).round() as u8
}

/// Inverse of [`to_native_alpha`].
pub fn from_native_alpha(native: u8, max: u8) -> u8 {
    let native = native.min(max);
    ((max - native) as f32 * 255.0 / max as f32).round() as u8
}

/// Trait for graphics backends.
///
/// Required methods are the ones whose quality or semantics differ between
/// implementations. Everything with a single sensible implementation (pixel
/// access, flood fill, filters, encoding) is provided.
pub trait GraphicsBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Capability probe. Cheap and side-effect free.
    fn is_available(&self) -> bool;

    /// Largest value on the inverted native alpha scale (fully transparent).
    fn alpha_max(&self) -> u8;

    /// Allocate an opaque black truecolor surface.
    fn create_surface(&self, width: u32, height: u32) -> Result<Surface> {
        Surface::blank(width, height, self.kind())
    }

    /// Decode an image file.
    fn open(&self, path: &Path) -> Result<Surface> {
        io::read_image(path, self.kind())
    }

    /// Copy `src_rect` of `src` into `dst_rect` of `dst`, resampling when the
    /// sizes differ. Neither rect is clamped; pixels that fall outside either
    /// surface are simply not written.
    fn copy_resampled(
        &self,
        dst: &mut Surface,
        src: &Surface,
        src_rect: Rect,
        dst_rect: Rect,
        mode: CompositeMode,
    ) -> Result<()>;

    /// Read one pixel, or `None` outside the surface.
    fn pixel(&self, surface: &Surface, x: u32, y: u32) -> Option<NativePixel> {
        let [r, g, b, a] = surface.rgba_at(x, y)?;
        Some(NativePixel {
            r,
            g,
            b,
            alpha: to_native_alpha(a, self.alpha_max()),
        })
    }

    /// Overwrite one pixel. Writes outside the surface are ignored.
    fn set_pixel(&self, surface: &mut Surface, x: u32, y: u32, pixel: NativePixel) {
        if x < surface.width() && y < surface.height() {
            let alpha = from_native_alpha(pixel.alpha, self.alpha_max());
            surface
                .pixels_mut()
                .put_pixel(x, y, Rgba([pixel.r, pixel.g, pixel.b, alpha]));
        }
    }

    /// Flood fill from `(x, y)`.
    fn fill(&self, surface: &mut Surface, color: Color, x: i64, y: i64) -> Result<()> {
        surface::flood_fill(surface.pixels_mut(), x, y, color);
        Ok(())
    }

    /// Render a shape. Invalid geometry fails before any pixel changes.
    fn draw(&self, surface: &mut Surface, object: &DrawingObject) -> Result<()>;

    /// A new surface holding `surface` rotated counter-clockwise by `angle`
    /// degrees, uncovered corners painted with `background`.
    fn rotate(&self, surface: &Surface, angle: f64, background: Color) -> Result<Surface>;

    /// Render a line of text with the font file at `font`.
    fn text(&self, surface: &mut Surface, params: &TextParams, font: &Path) -> Result<()>;

    fn apply_filter(&self, surface: &mut Surface, filter: Filter) -> Result<()> {
        filter.apply(surface.pixels_mut());
        Ok(())
    }

    /// Encode `surface` as `image_type` and write it to `path`.
    fn save(
        &self,
        surface: &Surface,
        path: &Path,
        image_type: ImageType,
        options: &SaveOptions,
    ) -> Result<()> {
        io::encode_and_write(surface, path, image_type, options)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::calculations::rotated_extent;
    use std::sync::Mutex;

    /// Mock backend that records operations.
    /// Uses Mutex (not RefCell) so it is Sync and can sit behind an `Arc<dyn GraphicsBackend>`.
    ///
    /// Pixel work is real but naive (nearest-neighbour copies, shape drawing
    /// is only recorded) so editor tests can assert on geometry and content.
    pub struct MockBackend {
        pub kind: BackendKind,
        pub available: bool,
        pub alpha_max: u8,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        CreateSurface {
            width: u32,
            height: u32,
        },
        Open(String),
        CopyResampled {
            src_rect: Rect,
            dst_rect: Rect,
            mode: CompositeMode,
        },
        Draw(&'static str),
        Rotate {
            angle: f64,
        },
        Text(String),
        Save {
            path: String,
            image_type: ImageType,
        },
    }

    impl Default for MockBackend {
        fn default() -> Self {
            Self {
                kind: BackendKind::Raster,
                available: true,
                alpha_max: 127,
                operations: Mutex::new(Vec::new()),
            }
        }
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn of_kind(kind: BackendKind, available: bool) -> Self {
            Self {
                kind,
                available,
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn record(&self, op: RecordedOp) {
            self.operations.lock().unwrap().push(op);
        }
    }

    impl GraphicsBackend for MockBackend {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn alpha_max(&self) -> u8 {
            self.alpha_max
        }

        fn create_surface(&self, width: u32, height: u32) -> Result<Surface> {
            self.record(RecordedOp::CreateSurface { width, height });
            Surface::blank(width, height, self.kind)
        }

        fn open(&self, path: &Path) -> Result<Surface> {
            self.record(RecordedOp::Open(path.to_string_lossy().to_string()));
            io::read_image(path, self.kind)
        }

        fn copy_resampled(
            &self,
            dst: &mut Surface,
            src: &Surface,
            src_rect: Rect,
            dst_rect: Rect,
            mode: CompositeMode,
        ) -> Result<()> {
            self.record(RecordedOp::CopyResampled {
                src_rect,
                dst_rect,
                mode,
            });
            for dy in 0..dst_rect.height as i64 {
                for dx in 0..dst_rect.width as i64 {
                    let sx = src_rect.x + dx * src_rect.width as i64 / dst_rect.width as i64;
                    let sy = src_rect.y + dy * src_rect.height as i64 / dst_rect.height as i64;
                    let (tx, ty) = (dst_rect.x + dx, dst_rect.y + dy);
                    if sx < 0 || sy < 0 || tx < 0 || ty < 0 {
                        continue;
                    }
                    let Some(pixel) = src.rgba_at(sx as u32, sy as u32) else {
                        continue;
                    };
                    if let Some(target) = dst.pixels_mut().get_pixel_mut_checked(tx as u32, ty as u32)
                    {
                        surface::composite(target, Rgba(pixel), mode);
                    }
                }
            }
            Ok(())
        }

        fn draw(&self, _surface: &mut Surface, object: &DrawingObject) -> Result<()> {
            object.validate()?;
            self.record(RecordedOp::Draw(object.name()));
            Ok(())
        }

        fn rotate(&self, surface: &Surface, angle: f64, background: Color) -> Result<Surface> {
            self.record(RecordedOp::Rotate { angle });
            let (w, h) = rotated_extent(surface.width(), surface.height(), angle);
            let mut rotated = Surface::blank(w, h, self.kind)?.inherit_origin(surface);
            for p in rotated.pixels_mut().pixels_mut() {
                *p = Rgba(background.to_rgba8());
            }
            Ok(rotated)
        }

        fn text(&self, _surface: &mut Surface, params: &TextParams, _font: &Path) -> Result<()> {
            self.record(RecordedOp::Text(params.text.clone()));
            Ok(())
        }

        fn save(
            &self,
            surface: &Surface,
            path: &Path,
            image_type: ImageType,
            options: &SaveOptions,
        ) -> Result<()> {
            self.record(RecordedOp::Save {
                path: path.to_string_lossy().to_string(),
                image_type,
            });
            io::encode_and_write(surface, path, image_type, options)
        }
    }

    // =========================================================================
    // BackendKind / native alpha
    // =========================================================================

    #[test]
    fn backend_kind_parses_names() {
        assert_eq!("skia".parse::<BackendKind>().unwrap(), BackendKind::Skia);
        assert_eq!(" Raster ".parse::<BackendKind>().unwrap(), BackendKind::Raster);
        assert!("imagick".parse::<BackendKind>().is_err());
        assert_eq!(BackendKind::Skia.to_string(), "skia");
    }

    #[test]
    fn native_alpha_scale_is_inverted() {
        assert_eq!(to_native_alpha(255, 127), 0);
        assert_eq!(to_native_alpha(0, 127), 127);
        assert_eq!(from_native_alpha(0, 127), 255);
        assert_eq!(from_native_alpha(127, 127), 0);
        assert_eq!(to_native_alpha(200, 255), 55);
        assert_eq!(from_native_alpha(55, 255), 200);
    }

    #[test]
    fn provided_pixel_access_round_trips_through_native_scale() {
        let backend = MockBackend::new();
        let mut surface = backend.create_surface(2, 2).unwrap();
        let px = NativePixel {
            r: 9,
            g: 8,
            b: 7,
            alpha: 127,
        };
        backend.set_pixel(&mut surface, 1, 1, px);
        assert_eq!(backend.pixel(&surface, 1, 1), Some(px));
        assert_eq!(surface.rgba_at(1, 1), Some([9, 8, 7, 0]));
        assert_eq!(backend.pixel(&surface, 2, 0), None);
    }

    // =========================================================================
    // MockBackend
    // =========================================================================

    #[test]
    fn mock_records_copy_and_scales() {
        let backend = MockBackend::new();
        let mut src = backend.create_surface(2, 2).unwrap();
        src.pixels_mut().put_pixel(1, 1, Rgba([255, 0, 0, 255]));
        let mut dst = backend.create_surface(4, 4).unwrap();
        backend
            .copy_resampled(
                &mut dst,
                &src,
                Rect::sized(2, 2),
                Rect::sized(4, 4),
                CompositeMode::Blend,
            )
            .unwrap();
        assert_eq!(dst.rgba_at(3, 3), Some([255, 0, 0, 255]));
        assert_eq!(dst.rgba_at(0, 0), Some([0, 0, 0, 255]));
        assert!(matches!(
            backend.get_operations().last(),
            Some(RecordedOp::CopyResampled { dst_rect, .. }) if *dst_rect == Rect::sized(4, 4)
        ));
    }

    #[test]
    fn mock_draw_validates_geometry() {
        let backend = MockBackend::new();
        let mut surface = backend.create_surface(4, 4).unwrap();
        let bad = DrawingObject::rectangle(0, 3, Default::default(), 1, None, None);
        assert!(backend.draw(&mut surface, &bad).is_err());
        assert!(!backend
            .get_operations()
            .iter()
            .any(|op| matches!(op, RecordedOp::Draw(_))));
    }
}
