//! OCR engine invocation.
//!
//! The engine is an external command-line tool (tesseract-compatible): it
//! takes an input image path, an output path stem, a language code and an
//! output-format flag, and writes an hOCR document next to the stem. The
//! call blocks until the tool exits; there is no timeout, a hung tool
//! hangs the caller. The output stem is fixed per engine instance, so label
//! extraction must not run concurrently.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};
use crate::hocr;
use crate::labels::{self, LabelIndex};
use crate::preprocess::OcrSettings;

pub struct OcrEngine {
    command: PathBuf,
    language: String,
    output_stem: PathBuf,
}

impl OcrEngine {
    /// `command` is the OCR tool binary, `language` the recognition language
    /// code passed through to it (e.g. `"eng"`).
    pub fn new(command: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            language: language.into(),
            output_stem: std::env::temp_dir().join("uiseek_ocr_out"),
        }
    }

    /// Override the output path stem (the default lives in the temp dir).
    pub fn with_output_stem(mut self, stem: impl Into<PathBuf>) -> Self {
        self.output_stem = stem.into();
        self
    }

    /// Run the tool on a preprocessed image and index the recognized labels.
    ///
    /// `settings` must be the same settings the image was prepared with: the
    /// word spacing drives label merging and the multiplier is recorded on
    /// the returned index so lookups can map centers back to screen space.
    ///
    /// No recognized text is a valid outcome and yields an empty index.
    pub fn extract_labels(&self, image: &Path, settings: &OcrSettings) -> Result<LabelIndex> {
        settings.validate()?;
        let document = self.run(image)?;
        let lines = hocr::parse_document(&document)?;
        let merged = labels::labels_from_lines(&lines, settings.word_spacing);
        tracing::debug!(lines = lines.len(), labels = merged.len(), "OCR pass done");
        Ok(LabelIndex::from_labels(merged, settings.multiplier))
    }

    fn run(&self, image: &Path) -> Result<String> {
        tracing::debug!(command = %self.command.display(), image = %image.display(), "invoking OCR tool");
        let status = Command::new(&self.command)
            .arg(image)
            .arg(&self.output_stem)
            .args(["-l", &self.language, "hocr"])
            .status()
            .map_err(|e| {
                Error::ExternalTool(format!("failed to launch {:?}: {e}", self.command))
            })?;
        if !status.success() {
            tracing::warn!(%status, "OCR tool exited with non-zero status");
        }

        // Tesseract 4+ writes `<stem>.hocr`; 3.x wrote `<stem>.html`.
        for ext in ["hocr", "html"] {
            let path = self.output_stem.with_extension(ext);
            if path.is_file() {
                return Ok(std::fs::read_to_string(&path)?);
            }
        }
        Err(Error::ExternalTool(format!(
            "no output file next to {} after the tool exited",
            self.output_stem.display()
        )))
    }
}
