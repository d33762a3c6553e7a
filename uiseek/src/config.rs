//! Persistent application configuration.
//!
//! Stored as JSON in a platform-appropriate config directory.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// On-disk configuration for the lookup pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	/// OCR tool binary. A bare name resolves through `PATH`.
	pub ocr_command: PathBuf,

	/// Recognition language code passed to the OCR tool.
	pub ocr_language: String,

	/// Preprocessing and label-merge tunables.
	pub ocr: vis::OcrSettings,

	/// Directory holding the reference model images.
	pub bitmap_dir: PathBuf,

	/// Target window application name (from `xcap::Window::app_name()`).
	///
	/// Optional: the `labels` binary takes the name on the command line and
	/// falls back to this.
	pub app_name: Option<String>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			ocr_command: PathBuf::from("tesseract"),
			ocr_language: "eng".to_string(),
			ocr: vis::OcrSettings::default(),
			bitmap_dir: PathBuf::from("models"),
			app_name: None,
		}
	}
}

impl Config {
	/// Path to the config file.
	pub fn path() -> Result<PathBuf> {
		let base = dirs::config_dir().context("config_dir() unavailable")?;
		Ok(base.join("uiseek.json"))
	}

	/// Load configuration from disk, falling back to defaults on missing file.
	pub fn load_or_default() -> Self {
		match Self::try_load() {
			Ok(cfg) => cfg,
			Err(err) => {
				tracing::warn!(error = %err, "failed to load config; using defaults");
				Self::default()
			}
		}
	}

	/// Try to load configuration from disk.
	pub fn try_load() -> Result<Self> {
		let path = Self::path()?;
		if !path.exists() {
			return Ok(Self::default());
		}
		let json = fs::read_to_string(&path).with_context(|| format!("read {:?}", path))?;
		let cfg = serde_json::from_str(&json).with_context(|| format!("parse {:?}", path))?;
		Ok(cfg)
	}

	/// Save configuration to disk.
	pub fn save(&self) -> Result<()> {
		let path = Self::path()?;
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
		}
		let json = serde_json::to_string_pretty(self).context("serialize config")?;
		fs::write(&path, json).with_context(|| format!("write {:?}", path))?;
		Ok(())
	}
}
