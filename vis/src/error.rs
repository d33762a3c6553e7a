use crate::pixel::PixelFormat;

/// Error taxonomy for the visual engine.
///
/// "Not found" is deliberately *not* an error at the matcher layer: search
/// functions return `Ok(None)` for a well-formed search that found nothing.
/// The [`NotFound`](Error::NotFound) variant exists for composed lookups that
/// were asked to treat absence as fatal.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed caller input: bad buffer geometry, out-of-range settings,
    /// unparseable OCR element ids, invalid patterns.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The two buffers being compared use different pixel formats.
    #[error("pixel format mismatch: {left:?} vs {right:?}")]
    FormatMismatch {
        left: PixelFormat,
        right: PixelFormat,
    },

    /// Pixel depth outside the supported 24/32-bit formats.
    #[error("unsupported pixel format: {0} bits per pixel")]
    UnsupportedFormat(u16),

    /// The OCR tool failed to launch or produced no output file.
    #[error("ocr engine failure: {0}")]
    ExternalTool(String),

    /// Screen capture failed in the screenshot provider.
    #[error("screen capture failed: {0}")]
    Capture(String),

    /// A lookup that was asked to treat absence as fatal found nothing.
    ///
    /// `labels` is a pre-rendered diagnostic suffix (the candidate label
    /// dump for OCR lookups, empty for bitmap lookups).
    #[error("no visual match for {target:?}{labels}")]
    NotFound { target: String, labels: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
