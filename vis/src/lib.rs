//! Visual location engine.
//!
//! Everything needed to find a point of interest in a captured screen image:
//! raw pixel buffers, exact and correlation-based template matching, OCR
//! preprocessing, hOCR parsing and label-index reconstruction. Platform
//! concerns (capturing screens, enumerating UI controls) live with the
//! caller; this crate only ever sees pixel buffers and file paths.

mod error;
pub use error::{Error, Result};

mod geom;
pub use geom::{Point, Rect};

mod pixel;
pub use pixel::{PixelBuffer, PixelFormat, luma};

pub mod matcher;

pub mod preprocess;
pub use preprocess::OcrSettings;

pub mod hocr;

pub mod labels;
pub use labels::{Label, LabelIndex};

mod ocr;
pub use ocr::OcrEngine;
