//! OCR preprocessing.
//!
//! OCR engines are sensitive to input quality, and UI fonts are small. The
//! fixed pipeline (binarize, upscale, blur) matches what the engine is
//! tuned for; the step order must not change:
//!
//! 1. binarize to pure black/white on the mean of the color channels,
//! 2. upscale by an integer multiplier with bicubic (Catmull-Rom) filtering,
//! 3. Gaussian-blur to smooth the aliasing the first two steps introduce.
//!
//! The result is persisted to a fixed process-local temp file because the
//! OCR tool only accepts file input. The path being fixed (not per-call
//! unique) means OCR passes must not run concurrently.

use std::path::PathBuf;

use image::{GrayImage, Luma};

use crate::error::{Error, Result};
use crate::pixel::PixelBuffer;

/// Tunables for the OCR pipeline.
///
/// `black_threshold` is carried as an `i32` because it arrives from JSON
/// configuration; [`validate`](OcrSettings::validate) pins it to [0, 255].
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Integer upscale factor applied before OCR.
    pub multiplier: u32,
    /// Gaussian blur deviation applied after upscaling.
    pub blur_deviation: f32,
    /// Black/white cutoff for binarization. Pixels whose channel mean is
    /// *strictly below* this become black, everything else white.
    pub black_threshold: i32,
    /// Horizontal gap (in OCR-image pixels) that separates two words into
    /// distinct labels during merging.
    pub word_spacing: u32,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            multiplier: 3,
            blur_deviation: 0.7,
            black_threshold: 128,
            word_spacing: 25,
        }
    }
}

impl OcrSettings {
    pub fn validate(&self) -> Result<()> {
        if !(0..=255).contains(&self.black_threshold) {
            return Err(Error::InvalidInput(format!(
                "black threshold {} outside 0-255",
                self.black_threshold
            )));
        }
        if self.multiplier == 0 {
            return Err(Error::InvalidInput("size multiplier must be at least 1".into()));
        }
        if !(self.blur_deviation > 0.0) || !self.blur_deviation.is_finite() {
            return Err(Error::InvalidInput(format!(
                "blur deviation {} must be a positive number",
                self.blur_deviation
            )));
        }
        Ok(())
    }
}

/// Run the full pipeline and persist the result for the OCR tool.
pub fn prepare_for_ocr(image: &PixelBuffer, settings: &OcrSettings) -> Result<PathBuf> {
    settings.validate()?;
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::InvalidInput("cannot preprocess an empty image".into()));
    }

    let bw = binarize(image, settings.black_threshold as u8);
    let big = upscale(&bw, settings.multiplier);
    let smooth = imageproc::filter::gaussian_blur_f32(&big, settings.blur_deviation);

    let path = ocr_input_path();
    smooth.save_with_format(&path, image::ImageFormat::Png)?;
    tracing::debug!(path = %path.display(), "wrote OCR input image");
    Ok(path)
}

/// The fixed OCR input path. Shared by every pass in this process.
pub fn ocr_input_path() -> PathBuf {
    std::env::temp_dir().join("uiseek_ocr_input.png")
}

/// Binarize on the per-pixel mean of the color channels.
///
/// `mean < threshold` compares exactly as `r + g + b < 3 * threshold`, so a
/// mean exactly equal to the threshold lands on white.
pub fn binarize(image: &PixelBuffer, threshold: u8) -> GrayImage {
    let cutoff = 3 * threshold as u32;
    let mut out = GrayImage::new(image.width(), image.height());
    for y in 0..image.height() {
        for x in 0..image.width() {
            let (r, g, b) = image.rgb(x, y);
            let v = if (r as u32 + g as u32 + b as u32) < cutoff {
                0
            } else {
                255
            };
            out.put_pixel(x, y, Luma([v]));
        }
    }
    out
}

/// Upscale a grayscale image by an integer factor (Catmull-Rom bicubic).
pub fn upscale(gray: &GrayImage, multiplier: u32) -> GrayImage {
    if multiplier <= 1 {
        return gray.clone();
    }

    let (w, h) = gray.dimensions();
    let src = fast_image_resize::images::ImageRef::new(
        w,
        h,
        gray.as_raw(),
        fast_image_resize::PixelType::U8,
    )
    .expect("fast_image_resize: ImageRef::new failed");

    let mut dst = fast_image_resize::images::Image::new(
        w * multiplier,
        h * multiplier,
        fast_image_resize::PixelType::U8,
    );

    let mut resizer = fast_image_resize::Resizer::new();
    let options = fast_image_resize::ResizeOptions::new().resize_alg(
        fast_image_resize::ResizeAlg::Interpolation(fast_image_resize::FilterType::CatmullRom),
    );

    resizer
        .resize(&src, &mut dst, &Some(options))
        .expect("fast_image_resize: resize failed");

    GrayImage::from_raw(w * multiplier, h * multiplier, dst.into_vec())
        .expect("resized buffer has the advertised length")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::PixelFormat;

    fn one_pixel(r: u8, g: u8, b: u8) -> PixelBuffer {
        PixelBuffer::new(1, 1, PixelFormat::Rgb24, vec![r, g, b]).unwrap()
    }

    #[test]
    fn binarize_boundary_is_exclusive_on_the_black_side() {
        // Mean exactly at the threshold stays white.
        assert_eq!(binarize(&one_pixel(128, 128, 128), 128).get_pixel(0, 0).0[0], 255);
        assert_eq!(binarize(&one_pixel(126, 128, 130), 128).get_pixel(0, 0).0[0], 255);
        // Mean strictly below goes black.
        assert_eq!(binarize(&one_pixel(127, 127, 127), 128).get_pixel(0, 0).0[0], 0);
        assert_eq!(binarize(&one_pixel(0, 0, 255), 128).get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn upscale_multiplies_both_dimensions() {
        let gray = GrayImage::new(16, 12);
        let big = upscale(&gray, 3);
        assert_eq!(big.dimensions(), (48, 36));

        // Multiplier 1 is the identity.
        assert_eq!(upscale(&gray, 1).dimensions(), (16, 12));
    }

    #[test]
    fn settings_validation_rejects_bad_ranges() {
        let bad = OcrSettings {
            black_threshold: 300,
            ..OcrSettings::default()
        };
        assert!(matches!(bad.validate(), Err(Error::InvalidInput(_))));

        let bad = OcrSettings {
            black_threshold: -1,
            ..OcrSettings::default()
        };
        assert!(matches!(bad.validate(), Err(Error::InvalidInput(_))));

        let bad = OcrSettings {
            multiplier: 0,
            ..OcrSettings::default()
        };
        assert!(matches!(bad.validate(), Err(Error::InvalidInput(_))));

        assert!(OcrSettings::default().validate().is_ok());
    }

    #[test]
    fn prepare_writes_an_upscaled_image() {
        let mut data = vec![255u8; 16 * 12 * 3];
        // A dark block so the output is not uniform.
        for i in 0..12 {
            data[i] = 10;
        }
        let image = PixelBuffer::new(16, 12, PixelFormat::Rgb24, data).unwrap();

        let path = prepare_for_ocr(&image, &OcrSettings::default()).unwrap();
        let written = image::open(&path).unwrap();
        assert_eq!((written.width(), written.height()), (48, 36));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn prepare_rejects_out_of_range_threshold() {
        let image = one_pixel(0, 0, 0);
        let settings = OcrSettings {
            black_threshold: 256,
            ..OcrSettings::default()
        };
        assert!(matches!(
            prepare_for_ocr(&image, &settings),
            Err(Error::InvalidInput(_))
        ));
    }
}
