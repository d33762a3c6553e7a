//! Screenshot capture.
//!
//! The resolver only needs "give me the pixels for these bounds"; the
//! [`ScreenshotSource`] trait is that seam. Production captures go through
//! `xcap`; tests inject synthetic buffers.

use vis::{PixelBuffer, Rect};

/// Geometry of the captured application window, in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
	pub x: i32,
	pub y: i32,
	pub width: i32,
	pub height: i32,
}

impl WindowBounds {
	#[inline]
	pub fn top_left(&self) -> vis::Point {
		vis::Point::new(self.x, self.y)
	}
}

/// Supplies pixel buffers for the full screen or a window's bounds.
///
/// Implementations are pure captures: no side effects observable to this
/// subsystem.
pub trait ScreenshotSource {
	fn capture_screen(&self) -> vis::Result<PixelBuffer>;
	fn capture_window(&self, bounds: WindowBounds) -> vis::Result<PixelBuffer>;
}

/// `xcap`-backed capture of the primary monitor.
pub struct XcapSource;

impl ScreenshotSource for XcapSource {
	fn capture_screen(&self) -> vis::Result<PixelBuffer> {
		let monitor = primary_monitor()?;
		let img = monitor.capture_image().map_err(capture_err)?;
		PixelBuffer::from_rgba(img.width(), img.height(), img.into_raw())
	}

	fn capture_window(&self, bounds: WindowBounds) -> vis::Result<PixelBuffer> {
		let monitor = primary_monitor()?;
		let mx = monitor.x().map_err(capture_err)?;
		let my = monitor.y().map_err(capture_err)?;
		let img = monitor.capture_image().map_err(capture_err)?;
		let screen = PixelBuffer::from_rgba(img.width(), img.height(), img.into_raw())?;
		screen.crop(Rect::new(
			bounds.x - mx,
			bounds.y - my,
			bounds.width,
			bounds.height,
		))
	}
}

fn primary_monitor() -> vis::Result<xcap::Monitor> {
	let monitors = xcap::Monitor::all().map_err(capture_err)?;
	let mut monitors = monitors.into_iter();
	let first = monitors
		.next()
		.ok_or_else(|| vis::Error::Capture("no monitors found".into()))?;
	for monitor in monitors {
		if monitor.is_primary().unwrap_or(false) {
			return Ok(monitor);
		}
	}
	Ok(first)
}

fn capture_err(e: xcap::XCapError) -> vis::Error {
	vis::Error::Capture(e.to_string())
}

pub fn find_window(app_name: &str) -> Option<xcap::Window> {
	let windows = xcap::Window::all().ok()?;
	windows
		.into_iter()
		.find(|window| window.app_name().ok().as_deref() == Some(app_name))
}

pub fn window_bounds(app_name: &str) -> Option<WindowBounds> {
	let window = find_window(app_name)?;
	Some(WindowBounds {
		x: window.x().ok()?,
		y: window.y().ok()?,
		width: window.width().ok()? as i32,
		height: window.height().ok()? as i32,
	})
}
