//! Decoding and encoding of image files.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF) | `image::ImageReader` with content sniffing |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality 0–100, alpha dropped) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (RGBA when the image has alpha) |
//! | Encode → GIF | `image::codecs::gif::GifEncoder` (quality ignored) |
//!
//! Parent directories are created on demand with the configured Unix mode.

use super::backend::BackendKind;
use super::params::{ImageType, PixelFormat, SaveOptions};
use super::surface::Surface;
use crate::error::{GrafikaError, Result};
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, ImageReader};
use std::fs::{DirBuilder, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Decode `path` into a surface owned by `allocated_by`.
///
/// The format is sniffed from the file contents, not the extension.
pub fn read_image(path: &Path, allocated_by: BackendKind) -> Result<Surface> {
    let reader = ImageReader::open(path)
        .map_err(|e| GrafikaError::io(path, e))?
        .with_guessed_format()
        .map_err(|e| GrafikaError::io(path, e))?;
    let image_type = match reader.format() {
        Some(ImageFormat::Jpeg) => ImageType::Jpeg,
        Some(ImageFormat::Png) => ImageType::Png,
        Some(ImageFormat::Gif) => ImageType::Gif,
        _ => ImageType::Unknown,
    };
    let decoded = reader.decode().map_err(|source| GrafikaError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let format = if image_type == ImageType::Gif {
        PixelFormat::Indexed
    } else if decoded.color().has_alpha() {
        PixelFormat::Rgba
    } else {
        PixelFormat::Rgb
    };
    debug!(
        path = %path.display(),
        width = decoded.width(),
        height = decoded.height(),
        ?image_type,
        "decoded image"
    );
    Ok(Surface::from_rgba(decoded.to_rgba8(), allocated_by)?.with_origin(
        format,
        image_type,
        Some(path.to_path_buf()),
    ))
}

/// Create `dir` and any missing parents. `mode` applies on Unix only.
pub fn ensure_directory(dir: &Path, mode: u32) -> Result<()> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;
    builder.create(dir).map_err(|e| GrafikaError::io(dir, e))
}

/// Output type for `path`: the extension wins, then `fallback`.
pub fn infer_format(path: &Path, fallback: ImageType) -> ImageType {
    match ImageType::from_path(path) {
        ImageType::Unknown => fallback,
        known => known,
    }
}

/// Encode `surface` as `image_type` and write it to `path`.
///
/// The file is only created once encoding has succeeded.
pub fn encode_and_write(
    surface: &Surface,
    path: &Path,
    image_type: ImageType,
    options: &SaveOptions,
) -> Result<()> {
    let encode_err = |source| GrafikaError::Encode {
        path: path.to_path_buf(),
        source,
    };
    let (width, height) = surface.dimensions();
    let mut buf = Vec::new();

    match image_type {
        ImageType::Jpeg => {
            if options.interlace {
                warn!(path = %path.display(), "progressive JPEG not supported, writing baseline");
            }
            let rgb = DynamicImage::ImageRgba8(surface.pixels().clone()).to_rgb8();
            // The encoder rejects quality 0.
            let quality = options.quality.value().max(1);
            JpegEncoder::new_with_quality(&mut buf, quality)
                .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(encode_err)?;
        }
        ImageType::Png => {
            let encoder = PngEncoder::new(&mut buf);
            if surface.full_alpha() || surface.format() == PixelFormat::Rgba {
                encoder
                    .write_image(surface.pixels().as_raw(), width, height, ExtendedColorType::Rgba8)
                    .map_err(encode_err)?;
            } else {
                let rgb = DynamicImage::ImageRgba8(surface.pixels().clone()).to_rgb8();
                encoder
                    .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                    .map_err(encode_err)?;
            }
        }
        ImageType::Gif => {
            GifEncoder::new(&mut buf)
                .encode(surface.pixels().as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(encode_err)?;
        }
        ImageType::Unknown => {
            return Err(GrafikaError::invalid(format!(
                "cannot determine output type for '{}'",
                path.display()
            )));
        }
    }

    if let Some(parent) = path.parent() {
        ensure_directory(parent, options.permissions)?;
    }
    let mut writer = BufWriter::new(File::create(path).map_err(|e| GrafikaError::io(path, e))?);
    writer
        .write_all(&buf)
        .and_then(|()| writer.flush())
        .map_err(|e| GrafikaError::io(path, e))?;
    debug!(path = %path.display(), ?image_type, width, height, "saved image");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Quality;
    use image::{Rgba, RgbaImage};

    fn checker(width: u32, height: u32) -> Surface {
        let pixels = RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 128])
            }
        });
        Surface::from_rgba(pixels, BackendKind::Raster).unwrap()
    }

    #[test]
    fn png_round_trip_keeps_alpha() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.png");
        let surface = checker(6, 4);
        encode_and_write(&surface, &path, ImageType::Png, &SaveOptions::default()).unwrap();

        let back = read_image(&path, BackendKind::Skia).unwrap();
        assert_eq!(back.dimensions(), (6, 4));
        assert_eq!(back.image_type(), ImageType::Png);
        assert_eq!(back.format(), PixelFormat::Rgba);
        assert_eq!(back.rgba_at(1, 0), Some([0, 0, 255, 128]));
        assert_eq!(back.source_path(), Some(path.as_path()));
        assert_eq!(back.allocated_by(), BackendKind::Skia);
    }

    #[test]
    fn jpeg_is_written_without_alpha() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.jpg");
        let options = SaveOptions {
            quality: Quality::new(0),
            interlace: true,
            ..SaveOptions::default()
        };
        encode_and_write(&checker(8, 8), &path, ImageType::Jpeg, &options).unwrap();

        let back = read_image(&path, BackendKind::Raster).unwrap();
        assert_eq!(back.image_type(), ImageType::Jpeg);
        assert_eq!(back.format(), PixelFormat::Rgb);
        assert_eq!(back.dimensions(), (8, 8));
    }

    #[test]
    fn gif_decodes_as_indexed() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.gif");
        encode_and_write(&checker(3, 3), &path, ImageType::Gif, &SaveOptions::default()).unwrap();
        let back = read_image(&path, BackendKind::Raster).unwrap();
        assert_eq!(back.format(), PixelFormat::Indexed);
        assert_eq!(back.image_type(), ImageType::Gif);
    }

    #[test]
    fn missing_parent_directories_are_created() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("a/b/c/out.png");
        encode_and_write(&checker(2, 2), &path, ImageType::Png, &SaveOptions::default()).unwrap();
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn created_directories_use_requested_mode() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("restricted");
        ensure_directory(&dir, 0o700).unwrap();
        let mode = std::fs::metadata(&dir).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.bin");
        let err = encode_and_write(&checker(2, 2), &path, ImageType::Unknown, &SaveOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("cannot determine output type"));
    }

    #[test]
    fn infer_format_prefers_extension() {
        assert_eq!(infer_format(Path::new("x.gif"), ImageType::Png), ImageType::Gif);
        assert_eq!(infer_format(Path::new("x.out"), ImageType::Png), ImageType::Png);
    }

    #[test]
    fn reading_missing_file_is_io_error() {
        let err = read_image(Path::new("/definitely/not/here.png"), BackendKind::Raster).unwrap_err();
        assert!(matches!(err, GrafikaError::Io { .. }));
    }

    #[test]
    fn reading_garbage_is_decode_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("junk.png");
        std::fs::write(&path, b"not an image at all").unwrap();
        let err = read_image(&path, BackendKind::Raster).unwrap_err();
        assert!(matches!(err, GrafikaError::Decode { .. }));
    }
}
