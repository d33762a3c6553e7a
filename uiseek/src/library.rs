//! Reference bitmap library.
//!
//! Model images live in a named directory on durable storage; lookups
//! resolve a user-supplied file name against it. A missing model is a
//! caller mistake (fatal I/O error), never a "bitmap not on screen" result.

use std::path::{Path, PathBuf};

use vis::PixelBuffer;

pub struct BitmapLibrary {
	root: PathBuf,
}

impl BitmapLibrary {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Load a model image by file name.
	pub fn load(&self, name: &str) -> vis::Result<PixelBuffer> {
		let path = self.root.join(name);
		let img = image::open(&path).map_err(|e| match e {
			image::ImageError::IoError(io) => vis::Error::Io(io),
			other => vis::Error::Image(other),
		})?;
		tracing::debug!(path = %path.display(), "loaded model image");
		PixelBuffer::from_dynamic(img)
	}
}
