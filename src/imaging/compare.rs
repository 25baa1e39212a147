//! Perceptual and exact image comparison.
//!
//! [`difference_hash`] implements dHash: downsample to 9x8, convert to gray,
//! and set one bit per horizontally adjacent pair where the left pixel is
//! brighter than the right. Bits are packed row-major, most significant
//! first. Similar images produce hashes a small Hamming distance apart; a
//! distance of [`SIMILARITY_THRESHOLD`] or less usually means "same picture".
//!
//! [`equal`] is the strict counterpart: same dimensions and identical RGB at
//! every pixel. Alpha is not compared.

use super::backend::{GraphicsBackend, NativePixel};
use super::params::Rect;
use super::surface::Surface;
use crate::error::Result;
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

const HASH_WIDTH: u32 = 9;
const HASH_HEIGHT: u32 = 8;

/// Largest distance still treated as the same picture with variations.
pub const SIMILARITY_THRESHOLD: u32 = 10;

/// Rough reading of a Hamming distance between two dHashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Similarity {
    /// Distance 0.
    Identical,
    /// Distance 1 to [`SIMILARITY_THRESHOLD`].
    Similar,
    Different,
}

impl Similarity {
    pub fn from_distance(distance: u32) -> Self {
        match distance {
            0 => Self::Identical,
            d if d <= SIMILARITY_THRESHOLD => Self::Similar,
            _ => Self::Different,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Identical => "identical",
            Self::Similar => "similar",
            Self::Different => "different",
        }
    }
}

/// Something that can be compared: a file on disk or an in-memory surface.
#[derive(Debug, Clone, Copy)]
pub enum ImageSource<'a> {
    Path(&'a Path),
    Surface(&'a Surface),
}

impl<'a> From<&'a Path> for ImageSource<'a> {
    fn from(path: &'a Path) -> Self {
        Self::Path(path)
    }
}

impl<'a> From<&'a PathBuf> for ImageSource<'a> {
    fn from(path: &'a PathBuf) -> Self {
        Self::Path(path)
    }
}

impl<'a> From<&'a str> for ImageSource<'a> {
    fn from(path: &'a str) -> Self {
        Self::Path(Path::new(path))
    }
}

impl<'a> From<&'a Surface> for ImageSource<'a> {
    fn from(surface: &'a Surface) -> Self {
        Self::Surface(surface)
    }
}

impl<'a> ImageSource<'a> {
    pub(crate) fn load(self, backend: &dyn GraphicsBackend) -> Result<Cow<'a, Surface>> {
        match self {
            Self::Path(path) => backend.open(path).map(Cow::Owned),
            Self::Surface(surface) => Ok(Cow::Borrowed(surface)),
        }
    }
}

/// 64-bit difference hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PerceptualHash(u64);

impl PerceptualHash {
    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u64 {
        self.0
    }

    /// Number of differing bits, 0–64.
    pub fn hamming_distance(self, other: PerceptualHash) -> u32 {
        (self.0 ^ other.0).count_ones()
    }
}

/// Renders as the 64-character `0`/`1` string, row-major.
impl fmt::Display for PerceptualHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:064b}", self.0)
    }
}

fn gray(pixel: Option<NativePixel>) -> u32 {
    pixel.map_or(0, |p| (p.r as u32 + p.g as u32 + p.b as u32) / 3)
}

/// dHash of `surface`. The input is not modified; sampling happens on a
/// separate 9x8 surface.
pub fn difference_hash(backend: &dyn GraphicsBackend, surface: &Surface) -> Result<PerceptualHash> {
    let mut small = backend.create_surface(HASH_WIDTH, HASH_HEIGHT)?;
    backend.copy_resampled(
        &mut small,
        surface,
        Rect::sized(surface.width(), surface.height()),
        Rect::sized(HASH_WIDTH, HASH_HEIGHT),
        surface.resample_mode(),
    )?;
    let mut bits = 0u64;
    for y in 0..HASH_HEIGHT {
        for x in 0..HASH_WIDTH - 1 {
            let left = gray(backend.pixel(&small, x, y));
            let right = gray(backend.pixel(&small, x + 1, y));
            bits = (bits << 1) | u64::from(left > right);
        }
    }
    Ok(PerceptualHash(bits))
}

/// Hamming distance between the dHashes of two images. 0 means
/// perceptually identical.
pub fn compare<'a, 'b>(
    backend: &dyn GraphicsBackend,
    a: impl Into<ImageSource<'a>>,
    b: impl Into<ImageSource<'b>>,
) -> Result<u32> {
    let a = a.into().load(backend)?;
    let b = b.into().load(backend)?;
    Ok(difference_hash(backend, &a)?.hamming_distance(difference_hash(backend, &b)?))
}

/// Pixel-exact RGB equality. Different dimensions are never equal.
pub fn equal<'a, 'b>(
    backend: &dyn GraphicsBackend,
    a: impl Into<ImageSource<'a>>,
    b: impl Into<ImageSource<'b>>,
) -> Result<bool> {
    let a = a.into().load(backend)?;
    let b = b.into().load(backend)?;
    if a.dimensions() != b.dimensions() {
        return Ok(false);
    }
    let (w, h) = a.dimensions();
    for y in 0..h {
        for x in 0..w {
            let pa = backend.pixel(&a, x, y);
            let pb = backend.pixel(&b, x, y);
            let rgb = |p: Option<NativePixel>| p.map(|p| (p.r, p.g, p.b));
            if rgb(pa) != rgb(pb) {
                return Ok(false);
            }
        }
    }
    Ok(true)
}
