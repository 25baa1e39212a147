//! The fluent single-image editor.
//!
//! An [`Editor`] owns at most one active [`Surface`] and a shared handle to the
//! [`GraphicsBackend`] that does the pixel work. Every mutating call returns
//! `Result<&mut Self>` so edits chain with `?`:
//!
//! ```no_run
//! # use grafika::{Editor, SkiaBackend, Position};
//! # use std::sync::Arc;
//! # fn main() -> grafika::Result<()> {
//! Editor::new(Arc::new(SkiaBackend))
//!     .open("photo.jpg")?
//!     .resize_fill(400, 300)?
//!     .crop(200, 200, Position::Center, Position::Center)?
//!     .save("thumb.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure model
//!
//! Calls that need an image check for one before anything else and fail with
//! [`GrafikaError::NoActiveImage`]. Operations that replace the surface (crop,
//! resize, rotate) build the replacement first and only swap it in once it is
//! complete, so a failed call leaves the previous image untouched.
//!
//! ## Out-of-range geometry
//!
//! Crop and overlay offsets are not clamped. Source pixels outside the image
//! leave the destination's opaque black in place; overlay pixels that land
//! outside the base image are dropped.

use crate::config::GrafikaConfig;
use crate::error::{GrafikaError, Result};
use crate::imaging::backend::{GraphicsBackend, NativePixel};
use crate::imaging::calculations::{resize_dimensions, resolve_axis};
use crate::imaging::compare::{self, ImageSource};
use crate::imaging::drawing::{DrawingObject, ShapeArgs};
use crate::imaging::filter::Filter;
use crate::imaging::io;
use crate::imaging::params::{
    Color, Dimension, ImageType, Point, Position, Rect, ResizeMode, SaveOptions, TextParams,
};
use crate::imaging::surface::{CompositeMode, Surface};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Values used when a call leaves an argument out.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorDefaults {
    /// Font for [`Editor::text`] when the params name none.
    pub font: Option<PathBuf>,
    pub text_size: f32,
    pub save: SaveOptions,
}

impl Default for EditorDefaults {
    fn default() -> Self {
        Self {
            font: None,
            text_size: 12.0,
            save: SaveOptions::default(),
        }
    }
}

impl EditorDefaults {
    pub fn from_config(config: &GrafikaConfig) -> Self {
        Self {
            font: config.text.font.clone(),
            text_size: config.text.size,
            save: config.save_options(),
        }
    }
}

/// Fluent editor over one image. See the [module docs](self).
pub struct Editor {
    backend: Arc<dyn GraphicsBackend>,
    surface: Option<Surface>,
    defaults: EditorDefaults,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("backend", &self.backend.name())
            .field("dimensions", &self.surface.as_ref().map(Surface::dimensions))
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl Editor {
    pub fn new(backend: Arc<dyn GraphicsBackend>) -> Self {
        Self {
            backend,
            surface: None,
            defaults: EditorDefaults::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: EditorDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn backend(&self) -> &dyn GraphicsBackend {
        self.backend.as_ref()
    }

    pub fn defaults(&self) -> &EditorDefaults {
        &self.defaults
    }

    /// Capability probe of the underlying backend.
    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    // =========================================================================
    // Surface lifecycle
    // =========================================================================

    fn active(&self) -> Result<&Surface> {
        self.surface.as_ref().ok_or(GrafikaError::NoActiveImage)
    }

    fn active_mut(&mut self) -> Result<&mut Surface> {
        self.surface.as_mut().ok_or(GrafikaError::NoActiveImage)
    }

    /// Install `next` as the active surface, dropping the previous one.
    fn commit(&mut self, next: Surface) -> &mut Self {
        debug!(
            backend = self.backend.name(),
            width = next.width(),
            height = next.height(),
            "replaced active surface"
        );
        self.surface = Some(next);
        self
    }

    /// Fresh backend surface for a copy of `src`.
    ///
    /// Alpha-capable sources switch the destination to full-alpha so the copy
    /// keeps transparency instead of flattening onto black.
    fn allocate_for(&self, src: &Surface, width: u32, height: u32) -> Result<Surface> {
        let mut next = self
            .backend
            .create_surface(width, height)?
            .inherit_origin(src);
        next.set_full_alpha(src.resample_mode() == CompositeMode::Replace);
        Ok(next)
    }

    /// Decode `path` and make it the active image.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let surface = self.backend.open(path.as_ref())?;
        Ok(self.commit(surface))
    }

    /// Start from an opaque black `width` x `height` image.
    pub fn blank(&mut self, width: u32, height: u32) -> Result<&mut Self> {
        let surface = self.backend.create_surface(width, height)?;
        Ok(self.commit(surface))
    }

    pub fn image(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    pub fn into_image(self) -> Option<Surface> {
        self.surface
    }

    pub fn set_image(&mut self, surface: Surface) -> &mut Self {
        self.commit(surface)
    }

    pub fn dimensions(&self) -> Result<(u32, u32)> {
        Ok(self.active()?.dimensions())
    }

    /// Release the active image.
    pub fn free(&mut self) -> &mut Self {
        if self.surface.take().is_some() {
            trace!("released active surface");
        }
        self
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    fn cropped(
        &self,
        src: &Surface,
        width: u32,
        height: u32,
        x: Position,
        y: Position,
    ) -> Result<Surface> {
        let left = resolve_axis(x, src.width(), width);
        let top = resolve_axis(y, src.height(), height);
        trace!(left, top, width, height, "crop region");
        let mut next = self.allocate_for(src, width, height)?;
        let mode = next.composite_mode();
        self.backend.copy_resampled(
            &mut next,
            src,
            Rect::new(left, top, width, height),
            Rect::sized(width, height),
            mode,
        )?;
        Ok(next)
    }

    /// Cut a `width` x `height` region placed by `x` and `y`.
    pub fn crop(&mut self, width: u32, height: u32, x: Position, y: Position) -> Result<&mut Self> {
        let next = self.cropped(self.active()?, width, height, x, y)?;
        Ok(self.commit(next))
    }

    /// Resize by mode name (`exact`, `exactWidth`, `exactHeight`, `fit`, `fill`).
    pub fn resize(&mut self, width: u32, height: u32, mode: &str) -> Result<&mut Self> {
        self.active()?;
        let mode: ResizeMode = mode.parse()?;
        self.resize_with(width, height, mode)
    }

    pub fn resize_with(&mut self, width: u32, height: u32, mode: ResizeMode) -> Result<&mut Self> {
        let src = self.active()?;
        let (needs_width, needs_height) = match mode {
            ResizeMode::ExactWidth => (true, false),
            ResizeMode::ExactHeight => (false, true),
            _ => (true, true),
        };
        if (needs_width && width == 0) || (needs_height && height == 0) {
            return Err(GrafikaError::invalid(format!(
                "{mode} resize needs a positive target, got {width}x{height}"
            )));
        }
        let (new_w, new_h) = resize_dimensions(mode, src.dimensions(), (width, height));
        debug!(
            %mode,
            from = ?src.dimensions(),
            to = ?(new_w, new_h),
            "resizing"
        );
        let mut next = self.allocate_for(src, new_w, new_h)?;
        let copy_mode = next.composite_mode();
        self.backend.copy_resampled(
            &mut next,
            src,
            Rect::sized(src.width(), src.height()),
            Rect::sized(new_w, new_h),
            copy_mode,
        )?;
        if mode == ResizeMode::Fill && (new_w, new_h) != (width, height) {
            next = self.cropped(&next, width, height, Position::Center, Position::Center)?;
        }
        Ok(self.commit(next))
    }

    /// Distort to exactly `width` x `height`.
    pub fn resize_exact(&mut self, width: u32, height: u32) -> Result<&mut Self> {
        self.resize_with(width, height, ResizeMode::Exact)
    }

    /// Largest size inside the box; nothing is cropped.
    pub fn resize_fit(&mut self, width: u32, height: u32) -> Result<&mut Self> {
        self.resize_with(width, height, ResizeMode::Fit)
    }

    /// Cover the box, then center-crop to it.
    pub fn resize_fill(&mut self, width: u32, height: u32) -> Result<&mut Self> {
        self.resize_with(width, height, ResizeMode::Fill)
    }

    pub fn resize_exact_width(&mut self, width: u32) -> Result<&mut Self> {
        self.resize_with(width, 0, ResizeMode::ExactWidth)
    }

    pub fn resize_exact_height(&mut self, height: u32) -> Result<&mut Self> {
        self.resize_with(0, height, ResizeMode::ExactHeight)
    }

    /// Rotate counter-clockwise by `angle` degrees. The canvas grows to fit;
    /// uncovered corners take `background` (black when `None`).
    pub fn rotate(&mut self, angle: f64, background: Option<Color>) -> Result<&mut Self> {
        let src = self.active()?;
        if !angle.is_finite() {
            return Err(GrafikaError::invalid(format!("invalid rotation angle {angle}")));
        }
        let next = self
            .backend
            .rotate(src, angle, background.unwrap_or(Color::BLACK))?;
        Ok(self.commit(next))
    }

    // =========================================================================
    // Pixels
    // =========================================================================

    /// Flood fill the region around `(x, y)` that shares its color.
    pub fn fill(&mut self, color: Color, x: i64, y: i64) -> Result<&mut Self> {
        let backend = Arc::clone(&self.backend);
        backend.fill(self.active_mut()?, color, x, y)?;
        Ok(self)
    }

    /// Scale every pixel's visibility by `factor` (clamped to 0.0–1.0).
    ///
    /// Walks every pixel through the backend's native alpha scale, so it is
    /// slow on large images. Fully transparent pixels are left alone.
    pub fn opacity(&mut self, factor: f64) -> Result<&mut Self> {
        let backend = Arc::clone(&self.backend);
        let surface = self.active_mut()?;
        if factor.is_nan() {
            return Err(GrafikaError::invalid("opacity factor is not a number"));
        }
        let factor = factor.clamp(0.0, 1.0);
        let max = backend.alpha_max();
        let (width, height) = surface.dimensions();
        for y in 0..height {
            for x in 0..width {
                let Some(pixel) = backend.pixel(surface, x, y) else {
                    continue;
                };
                if pixel.alpha >= max {
                    continue;
                }
                let visibility = (max - pixel.alpha) as f64 * factor;
                let alpha = max - visibility.round() as u8;
                // Writing back an unchanged alpha would round it through the native scale.
                if alpha != pixel.alpha {
                    backend.set_pixel(surface, x, y, NativePixel { alpha, ..pixel });
                }
            }
        }
        Ok(self)
    }

    /// Composite another image on top of this one.
    ///
    /// When both `width` and `height` are given the overlay is first fitted
    /// into that box; percentages resolve against the base image. Translucent
    /// overlay pixels blend with what is underneath.
    pub fn overlay<'a>(
        &mut self,
        source: impl Into<ImageSource<'a>>,
        x: Position,
        y: Position,
        width: Option<Dimension>,
        height: Option<Dimension>,
    ) -> Result<&mut Self> {
        let (base_w, base_h) = self.active()?.dimensions();
        let mut layer = source.into().load(self.backend.as_ref())?.into_owned();
        if let (Some(w), Some(h)) = (width, height) {
            let mut scoped = Editor::new(Arc::clone(&self.backend));
            scoped
                .set_image(layer)
                .resize_fit(w.resolve(base_w), h.resolve(base_h))?;
            layer = scoped.into_image().ok_or(GrafikaError::NoActiveImage)?;
        }
        let (layer_w, layer_h) = layer.dimensions();
        let left = resolve_axis(x, base_w, layer_w);
        let top = resolve_axis(y, base_h, layer_h);
        trace!(left, top, layer_w, layer_h, "overlay placement");

        let backend = Arc::clone(&self.backend);
        backend.copy_resampled(
            self.active_mut()?,
            &layer,
            Rect::sized(layer_w, layer_h),
            Rect::new(left, top, layer_w, layer_h),
            CompositeMode::Blend,
        )?;
        Ok(self)
    }

    // =========================================================================
    // Drawing
    // =========================================================================

    pub fn draw(&mut self, object: &DrawingObject) -> Result<&mut Self> {
        let backend = Arc::clone(&self.backend);
        let surface = self.active_mut()?;
        trace!(shape = object.name(), "drawing");
        backend.draw(surface, object)?;
        Ok(self)
    }

    /// Draw a shape given by name; see [`DrawingObject::from_name`].
    pub fn draw_named(&mut self, name: &str, args: ShapeArgs) -> Result<&mut Self> {
        self.active()?;
        let object = DrawingObject::from_name(name, args)?;
        self.draw(&object)
    }

    pub fn line(
        &mut self,
        start: impl Into<Point>,
        end: impl Into<Point>,
        thickness: u32,
        color: Color,
    ) -> Result<&mut Self> {
        self.draw(&DrawingObject::line(start.into(), end.into(), thickness, color))
    }

    pub fn rectangle(
        &mut self,
        width: u32,
        height: u32,
        position: impl Into<Point>,
        border_size: u32,
        border_color: Option<Color>,
        fill_color: Option<Color>,
    ) -> Result<&mut Self> {
        self.draw(&DrawingObject::rectangle(
            width,
            height,
            position.into(),
            border_size,
            border_color,
            fill_color,
        ))
    }

    pub fn ellipse(
        &mut self,
        width: u32,
        height: u32,
        position: impl Into<Point>,
        border_size: u32,
        border_color: Option<Color>,
        fill_color: Option<Color>,
    ) -> Result<&mut Self> {
        self.draw(&DrawingObject::ellipse(
            width,
            height,
            position.into(),
            border_size,
            border_color,
            fill_color,
        ))
    }

    pub fn polygon(
        &mut self,
        points: impl IntoIterator<Item = impl Into<Point>>,
        border_size: u32,
        border_color: Option<Color>,
        fill_color: Option<Color>,
    ) -> Result<&mut Self> {
        let points = points.into_iter().map(Into::into).collect();
        self.draw(&DrawingObject::polygon(
            points,
            border_size,
            border_color,
            fill_color,
        ))
    }

    pub fn bezier_quad(
        &mut self,
        start: impl Into<Point>,
        control: impl Into<Point>,
        end: impl Into<Point>,
        color: Color,
    ) -> Result<&mut Self> {
        self.draw(&DrawingObject::quadratic_bezier(
            start.into(),
            control.into(),
            end.into(),
            color,
        ))
    }

    pub fn bezier_cubic(
        &mut self,
        start: impl Into<Point>,
        control1: impl Into<Point>,
        control2: impl Into<Point>,
        end: impl Into<Point>,
        color: Color,
    ) -> Result<&mut Self> {
        self.draw(&DrawingObject::cubic_bezier(
            start.into(),
            control1.into(),
            control2.into(),
            end.into(),
            color,
        ))
    }

    // =========================================================================
    // Filters and text
    // =========================================================================

    pub fn apply(&mut self, filter: Filter) -> Result<&mut Self> {
        let backend = Arc::clone(&self.backend);
        let surface = self.active_mut()?;
        debug!(filter = filter.name(), "applying filter");
        backend.apply_filter(surface, filter)?;
        Ok(self)
    }

    pub fn grayscale(&mut self) -> Result<&mut Self> {
        self.apply(Filter::Grayscale)
    }

    pub fn greyscale(&mut self) -> Result<&mut Self> {
        self.grayscale()
    }

    pub fn dither(&mut self) -> Result<&mut Self> {
        self.apply(Filter::Dither)
    }

    /// [`TextParams`] pre-filled with this editor's default size and font.
    pub fn text_params(&self, text: impl Into<String>) -> TextParams {
        let params = TextParams::new(text).size(self.defaults.text_size);
        match &self.defaults.font {
            Some(font) => params.font(font),
            None => params,
        }
    }

    /// Render one line of text. The font comes from `params` or the editor
    /// defaults; with neither the call fails.
    pub fn text(&mut self, params: &TextParams) -> Result<&mut Self> {
        let backend = Arc::clone(&self.backend);
        let font = params.font.as_ref().or(self.defaults.font.as_ref()).cloned();
        let surface = self.active_mut()?;
        let font = font.ok_or_else(|| {
            GrafikaError::invalid("no font given and no default font configured")
        })?;
        backend.text(surface, params, &font)?;
        Ok(self)
    }

    // =========================================================================
    // Output
    // =========================================================================

    /// Save with the editor's default options.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let options = self.defaults.save.clone();
        self.save_with(path, &options)
    }

    /// Save to `path`. Without an explicit type the extension decides, then
    /// the type the image was opened as, then JPEG.
    pub fn save_with(&mut self, path: impl AsRef<Path>, options: &SaveOptions) -> Result<&mut Self> {
        let path = path.as_ref();
        let surface = self.active()?;
        let image_type = match options.image_type {
            Some(explicit) => explicit,
            None => match io::infer_format(path, surface.image_type()) {
                ImageType::Unknown => ImageType::Jpeg,
                inferred => inferred,
            },
        };
        self.backend.save(surface, path, image_type, options)?;
        Ok(self)
    }

    // =========================================================================
    // Comparison
    // =========================================================================

    /// Hamming distance between the difference hashes of two images.
    pub fn compare<'a, 'b>(
        &self,
        a: impl Into<ImageSource<'a>>,
        b: impl Into<ImageSource<'b>>,
    ) -> Result<u32> {
        compare::compare(self.backend.as_ref(), a, b)
    }

    /// Same dimensions and identical RGB at every pixel.
    pub fn equal<'a, 'b>(
        &self,
        a: impl Into<ImageSource<'a>>,
        b: impl Into<ImageSource<'b>>,
    ) -> Result<bool> {
        compare::equal(self.backend.as_ref(), a, b)
    }
}
