use crate::constants::{
    HIGH_EFFORT_QUALITY_THRESHOLD, LIBDEFLATER_HIGH_LEVEL, LIBDEFLATER_LOW_LEVEL, OXIPNG_PRESET,
    ZOPFLI_ITERATIONS, ZOPFLI_QUALITY_THRESHOLD,
};
use crate::error::{MirrorError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageFormat, ImageReader};
use oxipng::{Deflaters, Options};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::num::NonZeroU8;
use std::path::Path;

/// Reads just enough of `path` to confirm it is a decodable image and returns
/// its dimensions. The format is sniffed from the content, not the extension.
pub fn probe_image(path: &Path) -> Result<(u32, u32)> {
    let reader = ImageReader::open(path)
        .map_err(|e| MirrorError::filesystem(path, e))?
        .with_guessed_format()
        .map_err(|e| MirrorError::filesystem(path, e))?;

    reader.into_dimensions().map_err(|e| MirrorError::Decode {
        path: path.to_path_buf(),
        source: e,
    })
}

pub fn load_image(path: &Path) -> Result<DynamicImage> {
    let reader = ImageReader::open(path)
        .map_err(|e| MirrorError::filesystem(path, e))?
        .with_guessed_format()
        .map_err(|e| MirrorError::filesystem(path, e))?;

    reader.decode().map_err(|e| MirrorError::Decode {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Flattens any color model to 8-bit RGB. Alpha and palette information is
/// discarded, so transparent regions come out with whatever color the
/// decoder stored under them.
pub fn normalize(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageRgb8(_) => img,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// Picks the encoder from the target's extension.
pub fn output_format(target: &Path) -> Result<ImageFormat> {
    let extension = target
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();

    ImageFormat::from_extension(extension).ok_or_else(|| MirrorError::UnsupportedFormat {
        path: target.to_path_buf(),
        extension: extension.to_string(),
    })
}

/// Decodes `source`, normalizes it to RGB and writes it to `target` at
/// `quality`, replacing any existing file.
///
/// # Arguments
/// * `source` - Image to read; the format is sniffed from its content
/// * `target` - Output path; its extension selects the output format
/// * `quality` - JPEG quality, or oxipng effort for PNG (1-100)
///
/// # Returns
/// * `Ok(bytes)` - Size of the written file
/// * `Err(MirrorError)` - If decoding, encoding or writing fails
pub fn compress_image(source: &Path, target: &Path, quality: u8) -> Result<u64> {
    let format = output_format(target)?;
    let img = normalize(load_image(source)?);

    save_image(&img, target, format, quality)?;

    let written = fs::metadata(target)
        .map_err(|e| MirrorError::filesystem(target, e))?
        .len();
    Ok(written)
}

pub fn save_image(img: &DynamicImage, target: &Path, format: ImageFormat, quality: u8) -> Result<()> {
    let encode_err = |e: image::ImageError| MirrorError::Encode {
        path: target.to_path_buf(),
        source: e,
    };

    match format {
        ImageFormat::Jpeg => {
            let file = File::create(target).map_err(|e| MirrorError::filesystem(target, e))?;
            let mut writer = BufWriter::new(file);
            img.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, quality))
                .map_err(encode_err)?;
            writer
                .flush()
                .map_err(|e| MirrorError::filesystem(target, e))?;
        }
        ImageFormat::Png => {
            let mut encoded = Vec::new();
            img.write_with_encoder(PngEncoder::new(&mut encoded))
                .map_err(encode_err)?;

            let optimized = oxipng::optimize_from_memory(&encoded, &png_options(quality)).map_err(
                |e| MirrorError::PngOptimization {
                    path: target.to_path_buf(),
                    message: e.to_string(),
                },
            )?;
            fs::write(target, optimized).map_err(|e| MirrorError::filesystem(target, e))?;
        }
        other => {
            // Lossless or palette formats; quality does not apply.
            img.save_with_format(target, other).map_err(encode_err)?;
        }
    }

    Ok(())
}

/// Maps quality to oxipng effort. PNG stays lossless, so a higher value only
/// buys a smaller file at the cost of time.
pub fn png_options(quality: u8) -> Options {
    let mut options = Options::from_preset(OXIPNG_PRESET);
    options.force = true;

    options.deflate = if quality >= ZOPFLI_QUALITY_THRESHOLD {
        Deflaters::Zopfli {
            iterations: NonZeroU8::new(ZOPFLI_ITERATIONS).unwrap_or(NonZeroU8::MIN),
        }
    } else if quality >= HIGH_EFFORT_QUALITY_THRESHOLD {
        Deflaters::Libdeflater {
            compression: LIBDEFLATER_HIGH_LEVEL,
        }
    } else {
        Deflaters::Libdeflater {
            compression: LIBDEFLATER_LOW_LEVEL,
        }
    };

    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn noisy_image(width: u32, height: u32) -> DynamicImage {
        let mut state: u32 = 0x1234_5678;
        let img = RgbImage::from_fn(width, height, |x, y| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let noise = (state >> 24) as u8;
            Rgb([
                (x as u8).wrapping_add(noise / 4),
                (y as u8).wrapping_add(noise / 3),
                noise,
            ])
        });
        DynamicImage::ImageRgb8(img)
    }

    fn write_source(dir: &Path, name: &str, img: &DynamicImage) -> PathBuf {
        let path = dir.join(name);
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_output_format_from_extension() {
        assert_eq!(output_format(Path::new("a.jpg")).unwrap(), ImageFormat::Jpeg);
        assert_eq!(output_format(Path::new("a.JPEG")).unwrap(), ImageFormat::Jpeg);
        assert_eq!(output_format(Path::new("a.png")).unwrap(), ImageFormat::Png);
        assert_eq!(output_format(Path::new("a.bmp")).unwrap(), ImageFormat::Bmp);
        assert_eq!(output_format(Path::new("a.gif")).unwrap(), ImageFormat::Gif);
    }

    #[test]
    fn test_output_format_unsupported() {
        let result = output_format(Path::new("a.xyz"));
        assert!(matches!(result, Err(MirrorError::UnsupportedFormat { .. })));

        let result = output_format(Path::new("no_extension"));
        assert!(matches!(result, Err(MirrorError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_normalize_drops_alpha() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 0])));
        let normalized = normalize(rgba);

        assert_eq!(normalized.color(), image::ColorType::Rgb8);
        assert_eq!(normalized.get_pixel(0, 0), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_normalize_keeps_rgb() {
        let img = noisy_image(8, 8);
        let normalized = normalize(img.clone());
        assert_eq!(normalized, img);
    }

    #[test]
    fn test_probe_rejects_non_image() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fake.jpg");
        fs::write(&path, b"fake image data").unwrap();

        let result = probe_image(&path);
        assert!(matches!(result, Err(MirrorError::Decode { .. })));
    }

    #[test]
    fn test_probe_reads_dimensions() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_source(temp_dir.path(), "src.png", &noisy_image(32, 16));

        assert_eq!(probe_image(&path).unwrap(), (32, 16));
    }

    #[test]
    fn test_probe_missing_file() {
        let result = probe_image(Path::new("nonexistent.jpg"));
        assert!(matches!(result, Err(MirrorError::Filesystem { .. })));
    }

    #[test]
    fn test_compress_jpeg_roundtrip_dimensions() {
        let temp_dir = TempDir::new().unwrap();
        let source = write_source(temp_dir.path(), "src.png", &noisy_image(64, 48));
        let target = temp_dir.path().join("out.jpg");

        let written = compress_image(&source, &target, 70).unwrap();

        assert!(written > 0);
        let decoded = image::open(&target).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
    }

    #[test]
    fn test_compress_png_with_alpha_becomes_rgb() {
        let temp_dir = TempDir::new().unwrap();
        let mut rgba = noisy_image(32, 32).to_rgba8();
        for pixel in rgba.pixels_mut() {
            pixel[3] = 128;
        }
        let rgba = DynamicImage::ImageRgba8(rgba);
        let source = write_source(temp_dir.path(), "alpha.png", &rgba);
        let target = temp_dir.path().join("alpha_out.png");

        compress_image(&source, &target, 50).unwrap();

        let decoded = image::open(&target).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn test_compress_bmp_and_gif() {
        let temp_dir = TempDir::new().unwrap();
        let source = write_source(temp_dir.path(), "src.png", &noisy_image(20, 20));

        for name in ["out.bmp", "out.gif"] {
            let target = temp_dir.path().join(name);
            compress_image(&source, &target, 70).unwrap();
            assert_eq!(image::open(&target).unwrap().dimensions(), (20, 20));
        }
    }

    #[test]
    fn test_compress_overwrites_existing_target() {
        let temp_dir = TempDir::new().unwrap();
        let source = write_source(temp_dir.path(), "src.png", &noisy_image(32, 32));
        let target = temp_dir.path().join("out.jpg");
        fs::write(&target, b"stale").unwrap();

        compress_image(&source, &target, 70).unwrap();

        assert!(image::open(&target).is_ok());
    }

    #[test]
    fn test_compress_decode_error() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("broken.jpg");
        fs::write(&source, b"fake image data").unwrap();
        let target = temp_dir.path().join("out.jpg");

        let result = compress_image(&source, &target, 70);

        assert!(matches!(result, Err(MirrorError::Decode { .. })));
        assert!(!target.exists());
    }

    #[test]
    fn test_jpeg_size_grows_with_quality() {
        let temp_dir = TempDir::new().unwrap();
        let source = write_source(temp_dir.path(), "src.png", &noisy_image(128, 128));

        let low = compress_image(&source, &temp_dir.path().join("low.jpg"), 20).unwrap();
        let high = compress_image(&source, &temp_dir.path().join("high.jpg"), 90).unwrap();

        assert!(high >= low, "q90 produced {} bytes, q20 produced {}", high, low);
    }

    #[test]
    fn test_png_options_by_quality() {
        assert!(matches!(png_options(95).deflate, Deflaters::Zopfli { .. }));
        assert!(matches!(
            png_options(75).deflate,
            Deflaters::Libdeflater { compression } if compression == LIBDEFLATER_HIGH_LEVEL
        ));
        assert!(matches!(
            png_options(30).deflate,
            Deflaters::Libdeflater { compression } if compression == LIBDEFLATER_LOW_LEVEL
        ));
    }
}
