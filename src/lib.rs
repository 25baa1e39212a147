//! # Grafika
//!
//! Backend-agnostic image editing. Open or create an image, transform it with
//! chained calls, draw on it, compare it with another image, and save it.
//!
//! ```no_run
//! use grafika::{BackendRegistry, Color, Position};
//!
//! # fn main() -> grafika::Result<()> {
//! let registry = BackendRegistry::new();
//! registry
//!     .create_image("portrait.jpg")?
//!     .resize_fit(800, 800)?
//!     .rectangle(120, 40, (10, 10), 2, Some(Color::BLACK), Some(Color::WHITE))?
//!     .save("portrait-small.png")?;
//!
//! let distance = registry.create_editor()?.compare("a.jpg", "b.jpg")?;
//! println!("{distance} bits apart");
//! # Ok(())
//! # }
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`editor`] | [`Editor`]: the fluent single-image mutator |
//! | [`registry`] | [`BackendRegistry`]: backend priority, capability probing, factories |
//! | [`imaging`] | Geometry, value types, surfaces, the backend trait and its two implementations |
//! | [`config`] | `grafika.toml` loading, validation and merging |
//! | [`error`] | [`GrafikaError`] and its four-way [`ErrorCategory`] |
//!
//! # Design Decisions
//!
//! ## Geometry Before Pixels
//!
//! Every size and offset is computed by pure functions in
//! [`imaging::calculations`] before a backend is called. Backends only see
//! integer rects, so resize and crop behave the same on every backend and the
//! math is unit tested without any images.
//!
//! ## Backends Are Selected At Runtime
//!
//! Backends implement [`GraphicsBackend`] and are picked by probing in
//! priority order rather than by compile-time feature. The editor and the
//! comparison code take the resolved backend as a parameter and never look it
//! up themselves.
//!
//! ## Replace, Don't Patch
//!
//! Operations that change the image size build a complete new surface and only
//! then swap it in. A failed call leaves the previous image intact.

pub mod config;
pub mod editor;
pub mod error;
pub mod imaging;
pub mod registry;

pub use config::GrafikaConfig;
pub use editor::{Editor, EditorDefaults};
pub use error::{ErrorCategory, GrafikaError, Result};
pub use imaging::{
    BackendKind, Color, Dimension, DrawingObject, Filter, GraphicsBackend, ImageSource, ImageType,
    PerceptualHash, Point, Position, RasterBackend, ResizeMode, SaveOptions, ShapeArgs,
    Similarity, SkiaBackend, Surface, TextParams,
};
pub use registry::{BackendRegistry, default_backend_order, set_default_backend_order};
