//! Raw pixel buffers.
//!
//! Screen captures arrive as raw byte planes in one of two depths. All access
//! goes through bounds-checked row/pixel accessors so the matcher and the
//! binarizer never do stride arithmetic on raw memory themselves.
//!
//! Buffers are immutable once built; ownership transfers between pipeline
//! stages, they are never shared mutably.

use image::{GrayImage, RgbImage};

use crate::error::{Error, Result};
use crate::geom::Rect;

/// The two supported pixel depths.
///
/// For both, the first three bytes of a pixel are the color channels; the
/// fourth byte of [`Rgba32`](PixelFormat::Rgba32) is ignored by every
/// luminance computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum PixelFormat {
    Rgb24,
    Rgba32,
}

impl PixelFormat {
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb24 => 3,
            PixelFormat::Rgba32 => 4,
        }
    }

    pub fn from_bits(bits: u16) -> Result<Self> {
        match bits {
            24 => Ok(PixelFormat::Rgb24),
            32 => Ok(PixelFormat::Rgba32),
            other => Err(Error::UnsupportedFormat(other)),
        }
    }
}

/// Owned raw image: width, height, format, row stride and a byte plane in
/// row-major order.
///
/// Invariants, enforced at construction:
/// `stride >= width * bytes_per_pixel` and `data.len() >= stride * height`.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    stride: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Build a tightly packed buffer (`stride == width * bytes_per_pixel`).
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        let stride = width as usize * format.bytes_per_pixel();
        Self::with_stride(width, height, format, stride, data)
    }

    /// Build a buffer with an explicit row stride (captures may pad rows).
    pub fn with_stride(
        width: u32,
        height: u32,
        format: PixelFormat,
        stride: usize,
        data: Vec<u8>,
    ) -> Result<Self> {
        let row_bytes = width as usize * format.bytes_per_pixel();
        if stride < row_bytes {
            return Err(Error::InvalidInput(format!(
                "stride {stride} is smaller than row width {row_bytes}"
            )));
        }
        if data.len() < stride * height as usize {
            return Err(Error::InvalidInput(format!(
                "buffer holds {} bytes, needs at least {}",
                data.len(),
                stride * height as usize
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            stride,
            data,
        })
    }

    /// Build from a tightly packed RGBA capture (e.g. a window screenshot).
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        Self::new(width, height, PixelFormat::Rgba32, data)
    }

    /// Build from a decoded image. Only 8-bit RGB and RGBA inputs are
    /// accepted; anything else is an unsupported depth.
    pub fn from_dynamic(img: image::DynamicImage) -> Result<Self> {
        let bits = img.color().bits_per_pixel();
        match img {
            image::DynamicImage::ImageRgb8(rgb) => {
                let (w, h) = rgb.dimensions();
                Self::new(w, h, PixelFormat::Rgb24, rgb.into_raw())
            }
            image::DynamicImage::ImageRgba8(rgba) => {
                let (w, h) = rgba.dimensions();
                Self::new(w, h, PixelFormat::Rgba32, rgba.into_raw())
            }
            _ => Err(Error::UnsupportedFormat(bits)),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// One image row, without any stride padding.
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        assert!(y < self.height, "row {y} out of bounds (height {})", self.height);
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize * self.format.bytes_per_pixel()]
    }

    /// A horizontal run of `len` pixels starting at `(x, y)`.
    ///
    /// Panics if the run leaves the image.
    #[inline]
    pub fn row_window(&self, x: u32, y: u32, len: u32) -> &[u8] {
        assert!(
            x + len <= self.width,
            "window {x}+{len} out of bounds (width {})",
            self.width
        );
        let bpp = self.format.bytes_per_pixel();
        let row = self.row(y);
        &row[x as usize * bpp..(x + len) as usize * bpp]
    }

    /// One pixel as its raw channel bytes.
    ///
    /// Panics if `(x, y)` is out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        self.row_window(x, y, 1)
    }

    /// Color channels of one pixel (alpha dropped for 32-bit buffers).
    #[inline]
    pub fn rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let px = self.pixel(x, y);
        (px[0], px[1], px[2])
    }

    /// Copy out a sub-rectangle. Coordinates are clamped to the image.
    pub fn crop(&self, area: Rect) -> Result<Self> {
        let x = area.x.max(0) as u32;
        let y = area.y.max(0) as u32;
        let x = x.min(self.width);
        let y = y.min(self.height);
        let w = (area.width.max(0) as u32).min(self.width - x);
        let h = (area.height.max(0) as u32).min(self.height - y);

        let bpp = self.format.bytes_per_pixel();
        let mut data = Vec::with_capacity(w as usize * h as usize * bpp);
        for row in y..y + h {
            data.extend_from_slice(self.row_window(x, row, w));
        }
        Self::new(w, h, self.format, data)
    }

    /// Grayscale conversion (integer luma, 299/587/114).
    pub fn to_gray_image(&self) -> GrayImage {
        let mut out = GrayImage::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let (r, g, b) = self.rgb(x, y);
                out.put_pixel(x, y, image::Luma([luma(r, g, b)]));
            }
        }
        out
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        let mut out = RgbImage::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let (r, g, b) = self.rgb(x, y);
                out.put_pixel(x, y, image::Rgb([r, g, b]));
            }
        }
        out
    }

    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        self.to_rgb_image()
            .save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}

/// Grayscale intensity of one pixel.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000) as u8
}
