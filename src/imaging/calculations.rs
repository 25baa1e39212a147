//! Pure calculation functions for positions and dimensions.
//!
//! All functions here are pure and testable without any I/O or images. The
//! [`Editor`](crate::Editor) decides *what* to compute; the backend only ever
//! sees the resulting integer offsets and sizes.
//!
//! Resize formulas, with `ratio = width / height` of the current image:
//!
//! ```text
//! h = w / ratio      (rounded)
//! w = h * ratio      (truncated)
//! ```

use super::params::{Position, ResizeMode};

/// Resolve a per-axis [`Position`] to a pixel offset.
///
/// - start → `0`
/// - end → `container - content`
/// - center → `round(container / 2 - content / 2)`
/// - offsets pass through unchanged, even when negative or out of range
///
/// # Examples
/// ```
/// # use grafika::imaging::{resolve_axis, Position};
/// assert_eq!(resolve_axis(Position::Center, 100, 20), 40);
/// assert_eq!(resolve_axis(Position::Start, 100, 20), 0);
/// assert_eq!(resolve_axis(Position::End, 100, 20), 80);
/// ```
pub fn resolve_axis(position: Position, container: u32, content: u32) -> i64 {
    match position {
        Position::Start => 0,
        Position::End => container as i64 - content as i64,
        Position::Center => (container as f64 / 2.0 - content as f64 / 2.0).round() as i64,
        Position::Offset(offset) => offset,
    }
}

fn ratio(source: (u32, u32)) -> f64 {
    source.0 as f64 / source.1 as f64
}

fn at_least_one(value: f64) -> u32 {
    (value as u32).max(1)
}

/// Width fixed, height rounded from the aspect ratio.
pub fn exact_width_dimensions(source: (u32, u32), width: u32) -> (u32, u32) {
    let height = (width as f64 / ratio(source)).round();
    (width.max(1), at_least_one(height))
}

/// Height fixed, width truncated from the aspect ratio.
pub fn exact_height_dimensions(source: (u32, u32), height: u32) -> (u32, u32) {
    let width = height as f64 * ratio(source);
    (at_least_one(width), height.max(1))
}

/// Dimensions that fit entirely inside `target` with at least one side exact.
///
/// Tries the width first; if the rounded height overflows the box, bases the
/// result on the height instead.
pub fn fit_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (tgt_w, tgt_h) = target;
    let (w, h) = exact_width_dimensions(source, tgt_w);
    if w > tgt_w || h > tgt_h {
        exact_height_dimensions(source, tgt_h)
    } else {
        (w, h)
    }
}

/// Dimensions that fully cover `target` before the center crop.
///
/// Tries the width first; if that leaves the box under-filled in either
/// direction, bases the result on the height instead.
pub fn fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (tgt_w, tgt_h) = target;
    let (w, h) = exact_width_dimensions(source, tgt_w);
    if w < tgt_w || h < tgt_h {
        exact_height_dimensions(source, tgt_h)
    } else {
        (w, h)
    }
}

/// Size of the surface produced by a resize, before any fill crop.
pub fn resize_dimensions(mode: ResizeMode, source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    match mode {
        ResizeMode::Exact => (target.0.max(1), target.1.max(1)),
        ResizeMode::ExactWidth => exact_width_dimensions(source, target.0),
        ResizeMode::ExactHeight => exact_height_dimensions(source, target.1),
        ResizeMode::Fit => fit_dimensions(source, target),
        ResizeMode::Fill => fill_dimensions(source, target),
    }
}

/// Bounding box of a `width` x `height` image rotated by `angle` degrees.
///
/// Components are snapped to 1e-6 before rounding up, so right angles don't
/// grow by a pixel from floating point noise.
pub fn rotated_extent(width: u32, height: u32, angle: f64) -> (u32, u32) {
    let (sin, cos) = angle.to_radians().sin_cos();
    let snap = |v: f64| ((v * 1e6).round() / 1e6).ceil().max(1.0) as u32;
    let w = width as f64;
    let h = height as f64;
    (
        snap(w * cos.abs() + h * sin.abs()),
        snap(w * sin.abs() + h * cos.abs()),
    )
}

/// Counter-clockwise rotation of a `width` x `height` image about its center,
/// onto the canvas given by [`rotated_extent`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    cos: f64,
    sin: f64,
    src_center: (f64, f64),
    dst_center: (f64, f64),
    extent: (u32, u32),
}

impl Rotation {
    pub fn new(width: u32, height: u32, angle: f64) -> Self {
        let (sin, cos) = angle.to_radians().sin_cos();
        let extent = rotated_extent(width, height, angle);
        Self {
            cos,
            sin,
            src_center: (width as f64 / 2.0, height as f64 / 2.0),
            dst_center: (extent.0 as f64 / 2.0, extent.1 as f64 / 2.0),
            extent,
        }
    }

    pub fn extent(&self) -> (u32, u32) {
        self.extent
    }

    /// Source coordinates to canvas coordinates. Y points down.
    pub fn forward(&self, x: f64, y: f64) -> (f64, f64) {
        let (dx, dy) = (x - self.src_center.0, y - self.src_center.1);
        (
            dx * self.cos + dy * self.sin + self.dst_center.0,
            -dx * self.sin + dy * self.cos + self.dst_center.1,
        )
    }

    /// Canvas coordinates back to source coordinates.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let (dx, dy) = (x - self.dst_center.0, y - self.dst_center.1);
        (
            dx * self.cos - dy * self.sin + self.src_center.0,
            dx * self.sin + dy * self.cos + self.src_center.1,
        )
    }

    /// Forward mapping as an affine row `[sx, ky, kx, sy, tx, ty]`.
    pub fn affine(&self) -> [f64; 6] {
        let (tx, ty) = self.forward(0.0, 0.0);
        [self.cos, -self.sin, self.sin, self.cos, tx, ty]
    }
}
