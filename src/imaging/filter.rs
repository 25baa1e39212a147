//! Whole-image filters.
//!
//! Filters operate on luminance and never touch the alpha channel.

use crate::error::{GrafikaError, Result};
use image::imageops::{self, BiLevel};
use image::{GrayImage, Luma, Rgba, RgbaImage};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// Floyd-Steinberg dither down to black and white.
    Dither,
    Grayscale,
    /// Sobel edge magnitude, as grayscale.
    Sobel,
}

impl Filter {
    pub fn name(self) -> &'static str {
        match self {
            Self::Dither => "Dither",
            Self::Grayscale => "Grayscale",
            Self::Sobel => "Sobel",
        }
    }

    pub fn apply(self, img: &mut RgbaImage) {
        let mut luma = imageops::grayscale(img);
        match self {
            Self::Grayscale => {}
            Self::Dither => imageops::dither(&mut luma, &BiLevel),
            Self::Sobel => luma = sobel(&luma),
        }
        write_luma(img, &luma);
    }
}

impl FromStr for Filter {
    type Err = GrafikaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dither" => Ok(Self::Dither),
            "grayscale" | "greyscale" => Ok(Self::Grayscale),
            "sobel" => Ok(Self::Sobel),
            _ => Err(GrafikaError::invalid(format!("invalid filter name '{s}'"))),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn write_luma(img: &mut RgbaImage, luma: &GrayImage) {
    for (dst, src) in img.pixels_mut().zip(luma.pixels()) {
        let v = src.0[0];
        *dst = Rgba([v, v, v, dst.0[3]]);
    }
}

/// Gradient magnitude with edge pixels clamped to the border.
fn sobel(luma: &GrayImage) -> GrayImage {
    let (w, h) = luma.dimensions();
    let at = |x: i64, y: i64| {
        let cx = x.clamp(0, w as i64 - 1) as u32;
        let cy = y.clamp(0, h as i64 - 1) as u32;
        luma.get_pixel(cx, cy).0[0] as i32
    };
    GrayImage::from_fn(w, h, |x, y| {
        let (x, y) = (x as i64, y as i64);
        let gx = at(x + 1, y - 1) + 2 * at(x + 1, y) + at(x + 1, y + 1)
            - at(x - 1, y - 1)
            - 2 * at(x - 1, y)
            - at(x - 1, y + 1);
        let gy = at(x - 1, y + 1) + 2 * at(x, y + 1) + at(x + 1, y + 1)
            - at(x - 1, y - 1)
            - 2 * at(x, y - 1)
            - at(x + 1, y - 1);
        let magnitude = ((gx * gx + gy * gy) as f64).sqrt().min(255.0);
        Luma([magnitude as u8])
    })
}
