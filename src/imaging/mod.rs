//! Pixel-level machinery behind the [`Editor`](crate::Editor).
//!
//! | Concern | Module |
//! |---|---|
//! | **Positions, resize math, rotation geometry** | [`calculations`] (pure) |
//! | **Value types** (colors, modes, rects, save options) | [`params`] |
//! | **Owned pixel buffer** | [`surface`] |
//! | **Backend seam** | [`backend`]: [`GraphicsBackend`] trait |
//! | **Implementations** | [`SkiaBackend`] (anti-aliased, bicubic), [`RasterBackend`] (aliased, triangle) |
//! | **Shapes** | [`drawing`]: [`DrawingObject`] |
//! | **Filters** | [`filter`]: dither, grayscale, Sobel |
//! | **Comparison** | [`compare`]: dHash + Hamming distance, exact equality |
//! | **Files** | [`io`]: decode, encode, directory creation |
//!
//! The split mirrors the editing flow: the editor resolves geometry with
//! `calculations`, then asks a backend for primitive operations on a
//! `Surface`. Nothing in `calculations` or `params` touches pixels.

pub mod backend;
pub mod calculations;
pub mod compare;
pub mod drawing;
pub mod filter;
pub mod io;
mod paint;
pub mod params;
pub mod raster_backend;
pub mod skia_backend;
pub mod surface;

pub use backend::{BackendKind, GraphicsBackend, NativePixel};
pub use calculations::resolve_axis;
pub use compare::{ImageSource, PerceptualHash, Similarity};
pub use drawing::{DrawingObject, ShapeArgs};
pub use filter::Filter;
pub use params::{
    Color, Dimension, ImageType, PixelFormat, Point, Position, Quality, Rect, ResizeMode,
    SaveOptions, TextParams,
};
pub use raster_backend::RasterBackend;
pub use skia_backend::SkiaBackend;
pub use surface::{CompositeMode, Surface};
