//! Value types for editing operations.
//!
//! These describe *what* to do, not *how*. They are shared by the pure
//! [`calculations`](super::calculations), the [`Editor`](crate::Editor) and the
//! [`backend`](super::backend) implementations.
//!
//! ## Types
//!
//! - [`Color`] — RGB plus a 0.0–1.0 alpha. Parsed from `#RRGGBB` / `#RGB`.
//! - [`Position`] — per-axis placement: `left|top`, `center`, `right|bottom` or a pixel offset.
//! - [`ResizeMode`] — one of `exact`, `exactWidth`, `exactHeight`, `fit`, `fill`.
//! - [`Dimension`] — a pixel count or a percentage of a base extent (`"50%"`).
//! - [`ImageType`] / [`PixelFormat`] — encoded file type and in-memory pixel layout.
//! - [`Quality`] — JPEG quality (0–100, default 75). Clamped on construction.
//! - [`SaveOptions`] / [`TextParams`] — bundled arguments for `save` and `text`.

use crate::error::{GrafikaError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// An RGB color with an alpha channel (0.0 = fully transparent, 1.0 = fully opaque).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
    alpha: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    /// Fully opaque color.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self {
            r,
            g,
            b,
            alpha: 1.0,
        }
    }

    /// Same color with a different alpha, clamped to 0.0–1.0.
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Parse `#RRGGBB` or `#RGB` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(GrafikaError::invalid(format!("invalid hex color '{hex}'"))),
        };
        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .map_err(|_| GrafikaError::invalid(format!("invalid hex color '{hex}'")))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn r(&self) -> u8 {
        self.r
    }

    pub fn g(&self) -> u8 {
        self.g
    }

    pub fn b(&self) -> u8 {
        self.b
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Alpha on the 0–255 scale used by RGBA8 buffers.
    pub fn alpha_u8(&self) -> u8 {
        (self.alpha * 255.0).round() as u8
    }

    /// Straight (non-premultiplied) RGBA8 channels.
    pub fn to_rgba8(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.alpha_u8()]
    }

    /// Alpha on an inverted backend scale where 0 is opaque and `max` is transparent.
    pub fn native_alpha(&self, max: u8) -> u8 {
        max - (max as f32 * self.alpha).round() as u8
    }
}

impl FromStr for Color {
    type Err = GrafikaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)?;
        if self.alpha < 1.0 {
            write!(f, " @ {:.2}", self.alpha)?;
        }
        Ok(())
    }
}

/// Placement along one axis.
///
/// Keywords are axis-agnostic: `left` and `top` both mean start-aligned,
/// `right` and `bottom` both mean end-aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    Start,
    #[default]
    Center,
    End,
    /// Pixel offset from the start edge. May be negative or out of range.
    Offset(i64),
}

impl FromStr for Position {
    type Err = GrafikaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "left" | "top" => Ok(Self::Start),
            "center" => Ok(Self::Center),
            "right" | "bottom" => Ok(Self::End),
            other => other.parse::<i64>().map(Self::Offset).map_err(|_| {
                GrafikaError::invalid(format!(
                    "invalid position '{other}'. Expected left, top, center, right, bottom or a pixel offset"
                ))
            }),
        }
    }
}

impl From<i64> for Position {
    fn from(offset: i64) -> Self {
        Self::Offset(offset)
    }
}

impl From<i32> for Position {
    fn from(offset: i32) -> Self {
        Self::Offset(offset as i64)
    }
}

/// Aspect-ratio policy for [`Editor::resize`](crate::Editor::resize).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeMode {
    /// Target width and height verbatim; distortion allowed.
    Exact,
    /// Width fixed, height follows the aspect ratio.
    ExactWidth,
    /// Height fixed, width follows the aspect ratio.
    ExactHeight,
    /// Whole image inside the box, at least one side exact.
    #[default]
    Fit,
    /// Box fully covered, excess center-cropped.
    Fill,
}

impl ResizeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::ExactWidth => "exactWidth",
            Self::ExactHeight => "exactHeight",
            Self::Fit => "fit",
            Self::Fill => "fill",
        }
    }
}

impl FromStr for ResizeMode {
    type Err = GrafikaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "exact" => Ok(Self::Exact),
            "exactWidth" | "exact-width" => Ok(Self::ExactWidth),
            "exactHeight" | "exact-height" => Ok(Self::ExactHeight),
            "fit" => Ok(Self::Fit),
            "fill" => Ok(Self::Fill),
            other => Err(GrafikaError::invalid(format!(
                "invalid resize mode \"{other}\""
            ))),
        }
    }
}

impl fmt::Display for ResizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A size given either in pixels or as a percentage of a base extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Pixels(u32),
    Percent(f64),
}

impl Dimension {
    /// Resolve against the base extent. Percentages truncate to whole pixels.
    pub fn resolve(self, base: u32) -> u32 {
        match self {
            Self::Pixels(px) => px,
            Self::Percent(pct) => (pct / 100.0 * base as f64) as u32,
        }
    }
}

impl FromStr for Dimension {
    type Err = GrafikaError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let parsed = match s.strip_suffix('%') {
            Some(pct) => pct.trim().parse::<f64>().ok().map(Self::Percent),
            None => s.parse::<u32>().ok().map(Self::Pixels),
        };
        parsed.ok_or_else(|| GrafikaError::invalid(format!("invalid dimension '{s}'")))
    }
}

impl From<u32> for Dimension {
    fn from(px: u32) -> Self {
        Self::Pixels(px)
    }
}

/// Integer point in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned region. The origin may lie outside the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rect at the origin covering `width` x `height`.
    pub fn sized(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// The part of this rect inside a `width` x `height` surface, if any.
    pub fn clip_to(&self, width: u32, height: u32) -> Option<Rect> {
        let left = self.x.max(0);
        let top = self.y.max(0);
        let right = (self.x + self.width as i64).min(width as i64);
        let bottom = (self.y + self.height as i64).min(height as i64);
        (right > left && bottom > top).then(|| {
            Rect::new(left, top, (right - left) as u32, (bottom - top) as u32)
        })
    }
}

/// Encoded file type of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Jpeg,
    Png,
    Gif,
    Unknown,
}

impl ImageType {
    /// Guess from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Self::Jpeg,
            "png" => Self::Png,
            "gif" => Self::Gif,
            _ => Self::Unknown,
        }
    }

    /// Whether saving to this type keeps an alpha channel.
    pub fn supports_alpha(self) -> bool {
        matches!(self, Self::Png)
    }
}

impl FromStr for ImageType {
    type Err = GrafikaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "JPEG" | "JPG" => Ok(Self::Jpeg),
            "PNG" => Ok(Self::Png),
            "GIF" => Ok(Self::Gif),
            other => Err(GrafikaError::invalid(format!("unsupported image type '{other}'"))),
        }
    }
}

/// In-memory pixel layout the image was decoded from or created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    Rgba,
    Indexed,
}

/// JPEG quality (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.min(100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(75)
    }
}

/// Options for [`Editor::save`](crate::Editor::save).
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOptions {
    /// Output type. `None` infers from the extension, then the source type.
    pub image_type: Option<ImageType>,
    pub quality: Quality,
    /// Progressive JPEG request. The encoder has no progressive mode; logged and ignored.
    pub interlace: bool,
    /// Unix mode for directories created on the way to the target.
    pub permissions: u32,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            image_type: None,
            quality: Quality::default(),
            interlace: false,
            permissions: 0o755,
        }
    }
}

/// Arguments for [`Editor::text`](crate::Editor::text).
#[derive(Debug, Clone, PartialEq)]
pub struct TextParams {
    pub text: String,
    /// Font size in pixels.
    pub size: f32,
    /// Distance from the left edge to the start of the text.
    pub x: i32,
    /// Distance from the top edge to the top of the text; the baseline sits at `y + size`.
    pub y: i32,
    pub color: Color,
    /// TrueType/OpenType font file. `None` uses the editor default.
    pub font: Option<PathBuf>,
    /// Counter-clockwise rotation in degrees around the text origin.
    pub angle: f32,
}

impl TextParams {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            size: 12.0,
            x: 0,
            y: 0,
            color: Color::BLACK,
            font: None,
            angle: 0.0,
        }
    }

    pub fn size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn font(mut self, font: impl Into<PathBuf>) -> Self {
        self.font = Some(font.into());
        self
    }

    pub fn angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Color
    // =========================================================================

    #[test]
    fn color_parses_long_and_short_hex() {
        assert_eq!(Color::from_hex("#FF8000").unwrap(), Color::new(255, 128, 0));
        assert_eq!(Color::from_hex("fff").unwrap(), Color::WHITE);
        assert_eq!("#000".parse::<Color>().unwrap(), Color::BLACK);
    }

    #[test]
    fn color_rejects_malformed_hex() {
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#GGGGGG").is_err());
        assert!(Color::from_hex("").is_err());
    }

    #[test]
    fn color_alpha_is_clamped() {
        assert_eq!(Color::BLACK.with_alpha(2.0).alpha(), 1.0);
        assert_eq!(Color::BLACK.with_alpha(-1.0).alpha(), 0.0);
    }

    #[test]
    fn native_alpha_inverts_scale() {
        // 0 = opaque, max = transparent
        assert_eq!(Color::BLACK.native_alpha(127), 0);
        assert_eq!(Color::BLACK.with_alpha(0.0).native_alpha(127), 127);
        assert_eq!(Color::BLACK.with_alpha(0.5).native_alpha(127), 63);
        assert_eq!(Color::BLACK.with_alpha(0.5).native_alpha(255), 127);
    }

    #[test]
    fn color_display_is_hex() {
        assert_eq!(Color::new(1, 2, 255).to_string(), "#0102FF");
    }

    // =========================================================================
    // Position / ResizeMode / Dimension
    // =========================================================================

    #[test]
    fn position_keywords_are_axis_agnostic() {
        assert_eq!("left".parse::<Position>().unwrap(), Position::Start);
        assert_eq!("top".parse::<Position>().unwrap(), Position::Start);
        assert_eq!("bottom".parse::<Position>().unwrap(), Position::End);
        assert_eq!("center".parse::<Position>().unwrap(), Position::Center);
        assert_eq!("-15".parse::<Position>().unwrap(), Position::Offset(-15));
        assert!("middle".parse::<Position>().is_err());
    }

    #[test]
    fn resize_mode_round_trips_names() {
        for mode in [
            ResizeMode::Exact,
            ResizeMode::ExactWidth,
            ResizeMode::ExactHeight,
            ResizeMode::Fit,
            ResizeMode::Fill,
        ] {
            assert_eq!(mode.as_str().parse::<ResizeMode>().unwrap(), mode);
        }
        assert!("stretch".parse::<ResizeMode>().is_err());
    }

    #[test]
    fn dimension_resolves_percentages() {
        assert_eq!("50%".parse::<Dimension>().unwrap().resolve(300), 150);
        assert_eq!("33%".parse::<Dimension>().unwrap().resolve(100), 33);
        assert_eq!("120".parse::<Dimension>().unwrap().resolve(10), 120);
        assert!("wide".parse::<Dimension>().is_err());
    }

    #[test]
    fn rect_clip_to_surface() {
        assert_eq!(Rect::new(-5, 2, 10, 10).clip_to(8, 8), Some(Rect::new(0, 2, 5, 6)));
        assert_eq!(Rect::new(8, 0, 4, 4).clip_to(8, 8), None);
        assert_eq!(Rect::sized(3, 3).clip_to(8, 8), Some(Rect::sized(3, 3)));
    }

    // =========================================================================
    // ImageType / Quality
    // =========================================================================

    #[test]
    fn image_type_from_extension() {
        assert_eq!(ImageType::from_path(Path::new("a/b.JPG")), ImageType::Jpeg);
        assert_eq!(ImageType::from_path(Path::new("b.jpeg")), ImageType::Jpeg);
        assert_eq!(ImageType::from_path(Path::new("b.png")), ImageType::Png);
        assert_eq!(ImageType::from_path(Path::new("b.gif")), ImageType::Gif);
        assert_eq!(ImageType::from_path(Path::new("b.webp")), ImageType::Unknown);
        assert_eq!(ImageType::from_path(Path::new("noext")), ImageType::Unknown);
    }

    #[test]
    fn quality_clamps_and_defaults() {
        assert_eq!(Quality::new(150).value(), 100);
        assert_eq!(Quality::new(0).value(), 0);
        assert_eq!(Quality::default().value(), 75);
    }
}
