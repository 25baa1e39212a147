//! Vector rendering shared by both backends, on top of tiny-skia.
//!
//! Surfaces are straight-alpha while tiny-skia works premultiplied, so every
//! render goes surface → [`to_pixmap`] → paint → [`write_back`]. `write_back`
//! only touches pixels the render changed, which keeps translucent pixels
//! outside the shape bit-exact.
//!
//! Stroke geometry is offset by half a pixel so integer coordinates land on
//! pixel centers; fills use the coordinates as given.

use super::drawing::DrawingObject;
use super::params::{Color, Point, TextParams};
use super::surface::Surface;
use crate::error::{GrafikaError, Result};
use image::{Rgba, RgbaImage};
use std::path::Path;
use tiny_skia::{
    ColorU8, FillRule, LineCap, Paint, PathBuilder, Pixmap, PremultipliedColorU8, Rect, Stroke,
    Transform,
};

/// Per-backend rendering knobs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RenderStyle {
    pub anti_alias: bool,
    /// Draw every `Line` one pixel wide, whatever its thickness.
    pub hairline_lines: bool,
}

fn premultiplied(px: &Rgba<u8>) -> PremultipliedColorU8 {
    let [r, g, b, a] = px.0;
    ColorU8::from_rgba(r, g, b, a).premultiply()
}

fn straight(px: PremultipliedColorU8) -> Rgba<u8> {
    let c = px.demultiply();
    Rgba([c.red(), c.green(), c.blue(), c.alpha()])
}

pub(crate) fn to_pixmap(img: &RgbaImage) -> Result<Pixmap> {
    let mut pixmap = Pixmap::new(img.width(), img.height()).ok_or_else(|| {
        GrafikaError::invalid(format!(
            "cannot allocate a {}x{} pixmap",
            img.width(),
            img.height()
        ))
    })?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
        *dst = premultiplied(src);
    }
    Ok(pixmap)
}

pub(crate) fn from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        *dst = straight(*src);
    }
    img
}

/// Copy rendered pixels back, skipping the ones the render left untouched.
pub(crate) fn write_back(pixmap: &Pixmap, img: &mut RgbaImage) {
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        if premultiplied(dst) != *src {
            *dst = straight(*src);
        }
    }
}

fn paint(color: Color, anti_alias: bool) -> Paint<'static> {
    let [r, g, b, a] = color.to_rgba8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = anti_alias;
    paint
}

fn degenerate(object: &DrawingObject) -> GrafikaError {
    GrafikaError::invalid(format!("degenerate {} geometry", object.name()))
}

fn xy(p: Point) -> (f32, f32) {
    (p.x as f32, p.y as f32)
}

fn polyline(points: &[Point], close: bool) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    let (x, y) = xy(*first);
    pb.move_to(x, y);
    for p in rest {
        let (x, y) = xy(*p);
        pb.line_to(x, y);
    }
    if close {
        pb.close();
    }
    pb.finish()
}

/// Band of width `t` just inside the rect, for even-odd filling.
fn frame(rect: Rect, t: f32) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    pb.push_rect(rect);
    if rect.width() > 2.0 * t && rect.height() > 2.0 * t {
        pb.push_rect(Rect::from_xywh(
            rect.x() + t,
            rect.y() + t,
            rect.width() - 2.0 * t,
            rect.height() - 2.0 * t,
        )?);
    }
    pb.finish()
}

struct Canvas {
    pixmap: Pixmap,
    anti_alias: bool,
}

impl Canvas {
    fn stroke(&mut self, path: &tiny_skia::Path, color: Color, width: f32, cap: LineCap) {
        let stroke = Stroke {
            width,
            line_cap: cap,
            ..Stroke::default()
        };
        self.pixmap.stroke_path(
            path,
            &paint(color, self.anti_alias),
            &stroke,
            Transform::from_translate(0.5, 0.5),
            None,
        );
    }

    fn fill(&mut self, path: &tiny_skia::Path, color: Color, rule: FillRule) {
        self.pixmap.fill_path(
            path,
            &paint(color, self.anti_alias),
            rule,
            Transform::identity(),
            None,
        );
    }

    fn dot(&mut self, p: Point, size: f32, color: Color) {
        let (x, y) = xy(p);
        let half = (size - 1.0) / 2.0;
        if let Some(rect) = Rect::from_xywh(x - half, y - half, size, size) {
            self.pixmap.fill_rect(
                rect,
                &paint(color, self.anti_alias),
                Transform::identity(),
                None,
            );
        }
    }
}

/// Render `object` onto `surface`. Geometry is checked before any pixel changes.
pub(crate) fn draw_object(
    surface: &mut Surface,
    object: &DrawingObject,
    style: RenderStyle,
) -> Result<()> {
    object.validate()?;
    let mut canvas = Canvas {
        pixmap: to_pixmap(surface.pixels())?,
        anti_alias: style.anti_alias,
    };

    match object {
        DrawingObject::Line {
            start,
            end,
            thickness,
            color,
        } => {
            if *thickness > 0 {
                let width = if style.hairline_lines {
                    1.0
                } else {
                    *thickness as f32
                };
                if start == end {
                    canvas.dot(*start, width, *color);
                } else {
                    let path = polyline(&[*start, *end], false).ok_or_else(|| degenerate(object))?;
                    canvas.stroke(&path, *color, width, LineCap::Square);
                }
            }
        }
        DrawingObject::Rectangle {
            width,
            height,
            position,
            border_size,
            border_color,
            fill_color,
        } => {
            let (x, y) = xy(*position);
            let rect = Rect::from_xywh(x, y, *width as f32, *height as f32)
                .ok_or_else(|| degenerate(object))?;
            if let Some(fill) = fill_color {
                canvas.fill(&PathBuilder::from_rect(rect), *fill, FillRule::Winding);
            }
            if let (Some(border), true) = (border_color, *border_size > 0) {
                let band = frame(rect, *border_size as f32).ok_or_else(|| degenerate(object))?;
                canvas.fill(&band, *border, FillRule::EvenOdd);
            }
        }
        DrawingObject::Ellipse {
            width,
            height,
            position,
            border_size,
            border_color,
            fill_color,
        } => {
            let (x, y) = xy(*position);
            let (w, h) = (*width as f32, *height as f32);
            let bounds = Rect::from_xywh(x, y, w, h).ok_or_else(|| degenerate(object))?;
            let oval = PathBuilder::from_oval(bounds).ok_or_else(|| degenerate(object))?;
            if let Some(fill) = fill_color {
                canvas.fill(&oval, *fill, FillRule::Winding);
            }
            if let (Some(border), true) = (border_color, *border_size > 0) {
                let t = *border_size as f32;
                // Stroke centered half a border inside the bounds; too thin to
                // stroke means the border is the whole ellipse.
                let inset = Rect::from_xywh(x + t / 2.0 - 0.5, y + t / 2.0 - 0.5, w - t, h - t)
                    .and_then(PathBuilder::from_oval);
                match inset {
                    Some(ring) if w > t && h > t => {
                        canvas.stroke(&ring, *border, t, LineCap::Butt)
                    }
                    _ => canvas.fill(&oval, *border, FillRule::Winding),
                }
            }
        }
        DrawingObject::Polygon {
            points,
            border_size,
            border_color,
            fill_color,
        } => {
            let outline = polyline(points, true).ok_or_else(|| degenerate(object))?;
            if let Some(fill) = fill_color {
                canvas.fill(&outline, *fill, FillRule::Winding);
            }
            if let (Some(border), true) = (border_color, *border_size > 0) {
                canvas.stroke(&outline, *border, *border_size as f32, LineCap::Butt);
            }
        }
        DrawingObject::QuadraticBezier {
            start,
            control,
            end,
            color,
        } => {
            let mut pb = PathBuilder::new();
            let (sx, sy) = xy(*start);
            let (cx, cy) = xy(*control);
            let (ex, ey) = xy(*end);
            pb.move_to(sx, sy);
            pb.quad_to(cx, cy, ex, ey);
            let path = pb.finish().ok_or_else(|| degenerate(object))?;
            canvas.stroke(&path, *color, 1.0, LineCap::Square);
        }
        DrawingObject::CubicBezier {
            start,
            control1,
            control2,
            end,
            color,
        } => {
            let mut pb = PathBuilder::new();
            let (sx, sy) = xy(*start);
            let (c1x, c1y) = xy(*control1);
            let (c2x, c2y) = xy(*control2);
            let (ex, ey) = xy(*end);
            pb.move_to(sx, sy);
            pb.cubic_to(c1x, c1y, c2x, c2y, ex, ey);
            let path = pb.finish().ok_or_else(|| degenerate(object))?;
            canvas.stroke(&path, *color, 1.0, LineCap::Square);
        }
    }

    write_back(&canvas.pixmap, surface.pixels_mut());
    Ok(())
}

// ============================================================================
// Text
// ============================================================================

/// Accumulates glyph outlines into one path, flipping font units to screen space.
struct GlyphPathBuilder {
    path_builder: PathBuilder,
    pen_x: f32,
    baseline: f32,
    scale: f32,
}

impl GlyphPathBuilder {
    fn tx(&self, gx: f32) -> f32 {
        self.pen_x + gx * self.scale
    }

    fn ty(&self, gy: f32) -> f32 {
        self.baseline - gy * self.scale
    }
}

impl ttf_parser::OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.path_builder.move_to(self.tx(x), self.ty(y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.path_builder.line_to(self.tx(x), self.ty(y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.path_builder
            .quad_to(self.tx(x1), self.ty(y1), self.tx(x), self.ty(y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.path_builder.cubic_to(
            self.tx(x1),
            self.ty(y1),
            self.tx(x2),
            self.ty(y2),
            self.tx(x),
            self.ty(y),
        );
    }

    fn close(&mut self) {
        self.path_builder.close();
    }
}

/// Counter-clockwise rotation by `degrees` about `(ox, oy)`.
fn rotate_about(degrees: f32, ox: f32, oy: f32) -> Transform {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Transform::from_row(
        cos,
        -sin,
        sin,
        cos,
        ox - cos * ox - sin * oy,
        oy + sin * ox - cos * oy,
    )
}

/// Render one line of text. The top of the text box sits at `params.y`, so
/// the baseline is at `y + size`. Characters missing from the font are skipped.
pub(crate) fn draw_text(
    surface: &mut Surface,
    params: &TextParams,
    font: &Path,
    anti_alias: bool,
) -> Result<()> {
    if params.size.is_nan() || params.size <= 0.0 {
        return Err(GrafikaError::invalid(format!(
            "font size must be positive, got {}",
            params.size
        )));
    }
    let data = std::fs::read(font).map_err(|e| GrafikaError::io(font, e))?;
    let face = ttf_parser::Face::parse(&data, 0).map_err(|e| GrafikaError::Font {
        path: font.to_path_buf(),
        message: e.to_string(),
    })?;

    let scale = params.size / face.units_per_em() as f32;
    let origin_x = params.x as f32;
    let baseline = params.y as f32 + params.size;
    let mut builder = GlyphPathBuilder {
        path_builder: PathBuilder::new(),
        pen_x: origin_x,
        baseline,
        scale,
    };
    for ch in params.text.chars() {
        let Some(glyph) = face.glyph_index(ch) else {
            continue;
        };
        face.outline_glyph(glyph, &mut builder);
        builder.pen_x += face.glyph_hor_advance(glyph).unwrap_or(0) as f32 * scale;
    }
    // Whitespace-only text has no outline.
    let Some(path) = builder.path_builder.finish() else {
        return Ok(());
    };

    let mut pixmap = to_pixmap(surface.pixels())?;
    pixmap.fill_path(
        &path,
        &paint(params.color, anti_alias),
        FillRule::Winding,
        rotate_about(params.angle, origin_x, baseline),
        None,
    );
    write_back(&pixmap, surface.pixels_mut());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::BackendKind;

    const CRISP: RenderStyle = RenderStyle {
        anti_alias: false,
        hairline_lines: false,
    };

    fn white(width: u32, height: u32) -> Surface {
        let pixels = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        Surface::from_rgba(pixels, BackendKind::Raster).unwrap()
    }

    #[test]
    fn untouched_translucent_pixels_survive_round_trip() {
        let mut img = RgbaImage::from_pixel(3, 3, Rgba([200, 100, 50, 3]));
        let pixmap = to_pixmap(&img).unwrap();
        write_back(&pixmap, &mut img);
        assert!(img.pixels().all(|p| p.0 == [200, 100, 50, 3]));
    }

    #[test]
    fn rectangle_fill_and_border_are_pixel_exact() {
        let mut surface = white(10, 10);
        let red = Color::new(255, 0, 0);
        let rect = DrawingObject::rectangle(6, 6, Point::new(2, 2), 1, Some(Color::BLACK), Some(red));
        draw_object(&mut surface, &rect, CRISP).unwrap();
        assert_eq!(surface.rgba_at(2, 2), Some([0, 0, 0, 255]));
        assert_eq!(surface.rgba_at(7, 7), Some([0, 0, 0, 255]));
        assert_eq!(surface.rgba_at(4, 4), Some([255, 0, 0, 255]));
        assert_eq!(surface.rgba_at(1, 1), Some([255, 255, 255, 255]));
        assert_eq!(surface.rgba_at(8, 8), Some([255, 255, 255, 255]));
    }

    #[test]
    fn rectangle_without_colors_draws_nothing() {
        let mut surface = white(5, 5);
        let rect = DrawingObject::rectangle(3, 3, Point::new(1, 1), 1, None, None);
        draw_object(&mut surface, &rect, CRISP).unwrap();
        assert!(surface.pixels().pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn horizontal_line_paints_its_row() {
        let mut surface = white(10, 10);
        let line = DrawingObject::line(Point::new(0, 5), Point::new(9, 5), 1, Color::BLACK);
        draw_object(&mut surface, &line, CRISP).unwrap();
        assert_eq!(surface.rgba_at(4, 5), Some([0, 0, 0, 255]));
        assert_eq!(surface.rgba_at(4, 3), Some([255, 255, 255, 255]));
    }

    #[test]
    fn ellipse_center_takes_fill_color() {
        let mut surface = white(20, 20);
        let blue = Color::new(0, 0, 255);
        let ellipse = DrawingObject::ellipse(16, 10, Point::new(2, 5), 1, Some(Color::BLACK), Some(blue));
        draw_object(&mut surface, &ellipse, CRISP).unwrap();
        assert_eq!(surface.rgba_at(10, 10), Some([0, 0, 255, 255]));
        assert_eq!(surface.rgba_at(0, 0), Some([255, 255, 255, 255]));
    }

    #[test]
    fn polygon_interior_is_filled() {
        let mut surface = white(20, 20);
        let green = Color::new(0, 255, 0);
        let triangle = DrawingObject::polygon(
            vec![Point::new(0, 0), Point::new(19, 0), Point::new(0, 19)],
            1,
            None,
            Some(green),
        );
        draw_object(&mut surface, &triangle, CRISP).unwrap();
        assert_eq!(surface.rgba_at(4, 4), Some([0, 255, 0, 255]));
        assert_eq!(surface.rgba_at(18, 18), Some([255, 255, 255, 255]));
    }

    #[test]
    fn invalid_geometry_leaves_surface_untouched() {
        let mut surface = white(4, 4);
        let before = surface.clone();
        let bad = DrawingObject::polygon(vec![Point::new(0, 0)], 1, Some(Color::BLACK), None);
        assert!(draw_object(&mut surface, &bad, CRISP).is_err());
        assert_eq!(surface, before);
    }

    #[test]
    fn text_with_missing_font_is_io_error() {
        let mut surface = white(4, 4);
        let err = draw_text(
            &mut surface,
            &TextParams::new("hi"),
            Path::new("/no/such/font.ttf"),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, GrafikaError::Io { .. }));
    }

    #[test]
    fn text_with_non_font_file_is_font_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("bogus.ttf");
        std::fs::write(&path, b"definitely not a font").unwrap();
        let mut surface = white(4, 4);
        let err = draw_text(&mut surface, &TextParams::new("hi"), &path, true).unwrap_err();
        assert!(matches!(err, GrafikaError::Font { .. }));
    }

    #[test]
    fn rotate_about_fixes_its_origin() {
        let t = rotate_about(90.0, 10.0, 20.0);
        let mut p = [tiny_skia::Point::from_xy(10.0, 20.0), tiny_skia::Point::from_xy(11.0, 20.0)];
        t.map_points(&mut p);
        assert!((p[0].x - 10.0).abs() < 1e-4 && (p[0].y - 20.0).abs() < 1e-4);
        // one unit right of the origin turns to one unit up
        assert!((p[1].x - 10.0).abs() < 1e-4 && (p[1].y - 19.0).abs() < 1e-4);
    }
}
