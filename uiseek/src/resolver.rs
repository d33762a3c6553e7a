//! Coordinate-to-control resolution.
//!
//! The [`Resolver`] ties the pipeline together: capture a window, find a
//! point of interest (by OCR label or by reference bitmap), then resolve
//! that point to the interactive control whose bounds contain it.
//!
//! Coordinate spaces involved:
//! - control bounds are in *screen* space; subtracting the window top-left
//!   makes them window-relative,
//! - OCR label centers are in the *upscaled OCR image*; dividing by the
//!   index's multiplier maps them back to window-relative pixels,
//! - bitmap match points come from a window screenshot and are already
//!   window-relative (multiplier 1).
//!
//! Everything here is synchronous and single-caller: the OCR round trip
//! goes through fixed temp paths, so two lookups must not run concurrently.

use std::path::Path;

use vis::labels::{self, LabelIndex};
use vis::{Error, OcrEngine, OcrSettings, PixelBuffer, Point, Rect, matcher, preprocess};

use crate::capture::{ScreenshotSource, WindowBounds};
use crate::controls::{Control, ControlKind};
use crate::library::BitmapLibrary;
use crate::config::Config;

/// How a reference bitmap is compared against the screenshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
	/// Byte-for-byte equality.
	Exact,
	/// Normalized cross-correlation with a fixed acceptance threshold.
	#[default]
	Partial,
}

/// Options for a control lookup.
#[derive(Debug, Clone)]
pub struct ControlQuery {
	/// Only consider controls with this tag; `None` accepts any control.
	pub kind: Option<ControlKind>,
	/// Added to the candidate point's x before the containment test.
	pub x_offset: i32,
	/// Added to the candidate point's y before the containment test.
	pub y_offset: i32,
	/// 1-based rank among qualifying controls. `0` means "first hit,
	/// short-circuit"; `n >= 1` runs a counting pass and returns the nth.
	/// Ignored by the bitmap lookup (see [`Resolver::find_control_for_bitmap`]).
	pub order: u32,
	/// When true, a miss raises [`Error::NotFound`] with a label dump;
	/// when false, a miss is an empty result.
	pub throw_on_miss: bool,
}

impl Default for ControlQuery {
	fn default() -> Self {
		Self {
			kind: None,
			x_offset: 0,
			y_offset: 0,
			order: 0,
			throw_on_miss: true,
		}
	}
}

pub struct Resolver<S> {
	screens: S,
	ocr: OcrEngine,
	library: BitmapLibrary,
	settings: OcrSettings,
}

impl<S: ScreenshotSource> Resolver<S> {
	pub fn new(screens: S, ocr: OcrEngine, library: BitmapLibrary, settings: OcrSettings) -> Self {
		Self {
			screens,
			ocr,
			library,
			settings,
		}
	}

	pub fn from_config(cfg: &Config, screens: S) -> Self {
		Self::new(
			screens,
			OcrEngine::new(&cfg.ocr_command, &cfg.ocr_language),
			BitmapLibrary::new(&cfg.bitmap_dir),
			cfg.ocr.clone(),
		)
	}

	/// Capture a window and index every label in it.
	///
	/// `window` is required; `None` fails before any capture is attempted.
	/// `save` optionally persists the raw screenshot (before preprocessing)
	/// for debugging.
	pub fn find_all_labels(
		&self,
		window: Option<WindowBounds>,
		save: Option<&Path>,
	) -> vis::Result<LabelIndex> {
		let Some(bounds) = window else {
			return Err(Error::InvalidInput(
				"window is required to capture labels".into(),
			));
		};
		let shot = self.screens.capture_window(bounds)?;
		self.find_all_labels_in(&shot, save)
	}

	/// Index every label in a pre-supplied window screenshot.
	pub fn find_all_labels_in(
		&self,
		shot: &PixelBuffer,
		save: Option<&Path>,
	) -> vis::Result<LabelIndex> {
		if let Some(path) = save {
			shot.save_png(path)?;
		}
		let prepared = preprocess::prepare_for_ocr(shot, &self.settings)?;
		self.ocr.extract_labels(&prepared, &self.settings)
	}

	/// Find the control a matching label points at.
	///
	/// Filters `labels` by the (case- and diacritic-insensitive) pattern,
	/// then walks `controls`: one qualifies when any candidate center,
	/// mapped to window-relative space and offset, lies inside its bounds,
	/// edges inclusive.
	pub fn find_control_for_label<'c>(
		&self,
		pattern: &str,
		window: WindowBounds,
		labels: &LabelIndex,
		controls: &'c [Control],
		query: &ControlQuery,
	) -> vis::Result<Option<&'c Control>> {
		let re = labels::label_pattern(pattern)?;
		let candidates: Vec<Point> = labels.matching_points(&re).collect();
		tracing::debug!(pattern, candidates = candidates.len(), "label lookup");

		let mut rank = 0u32;
		for control in controls {
			if !kind_matches(query.kind, control.kind) {
				continue;
			}
			let hit = candidates
				.iter()
				.any(|&p| point_hits_control(window, p, labels.multiplier(), control, query));
			if hit {
				if query.order == 0 {
					return Ok(Some(control));
				}
				rank += 1;
				if rank == query.order {
					return Ok(Some(control));
				}
			}
		}

		if query.throw_on_miss {
			Err(not_found(pattern, labels))
		} else {
			Ok(None)
		}
	}

	/// Nth (0-based) center point whose label matches the pattern.
	pub fn find_click_point_for_label(
		&self,
		pattern: &str,
		labels: &LabelIndex,
		order: usize,
	) -> vis::Result<Option<Point>> {
		let re = labels::label_pattern(pattern)?;
		Ok(labels.matching_points(&re).nth(order))
	}

	/// Find the control a reference bitmap points at.
	///
	/// Captures a fresh screenshot of the window, matches the named model
	/// against it, then returns the *first* control containing the match
	/// point. Unlike the label lookup there is no ordering/counting here:
	/// `query.order` is deliberately not consulted. `query.throw_on_miss`
	/// governs the template-not-found case; a found point that no control
	/// contains is always an empty result.
	pub fn find_control_for_bitmap<'c>(
		&self,
		name: &str,
		mode: MatchMode,
		window: WindowBounds,
		controls: &'c [Control],
		query: &ControlQuery,
	) -> vis::Result<Option<&'c Control>> {
		let Some(point) = self.match_bitmap(name, mode, window)? else {
			return if query.throw_on_miss {
				Err(Error::NotFound {
					target: name.to_string(),
					labels: String::new(),
				})
			} else {
				Ok(None)
			};
		};

		for control in controls {
			if !kind_matches(query.kind, control.kind) {
				continue;
			}
			if point_hits_control(window, point, 1, control, query) {
				return Ok(Some(control));
			}
		}
		Ok(None)
	}

	/// Center of the named model in a fresh window screenshot, or `None` if
	/// the model is not on screen.
	pub fn find_click_point_for_bitmap(
		&self,
		name: &str,
		mode: MatchMode,
		window: WindowBounds,
	) -> vis::Result<Option<Point>> {
		self.match_bitmap(name, mode, window)
	}

	fn match_bitmap(
		&self,
		name: &str,
		mode: MatchMode,
		window: WindowBounds,
	) -> vis::Result<Option<Point>> {
		let model = self.library.load(name)?;
		let shot = self.screens.capture_window(window)?;
		let hit = match mode {
			MatchMode::Exact => matcher::find_exact(&shot, &model)?,
			MatchMode::Partial => matcher::find_partial(&shot, &model)?,
		};
		tracing::debug!(name, ?mode, ?hit, "bitmap lookup");
		Ok(hit)
	}
}

fn kind_matches(filter: Option<ControlKind>, kind: ControlKind) -> bool {
	filter.is_none_or(|k| k == kind)
}

/// Does the candidate point land inside the control?
///
/// The control's screen bounds are shifted into window-relative space; the
/// point is divided by the OCR multiplier and shifted by the query offsets.
/// Edges are inclusive on all four sides.
fn point_hits_control(
	window: WindowBounds,
	point: Point,
	multiplier: u32,
	control: &Control,
	query: &ControlQuery,
) -> bool {
	let relative = Rect::new(
		control.bounds.x - window.x,
		control.bounds.y - window.y,
		control.bounds.width,
		control.bounds.height,
	);
	let candidate = Point::new(
		point.x / multiplier as i32 + query.x_offset,
		point.y / multiplier as i32 + query.y_offset,
	);
	relative.contains_inclusive(candidate)
}

fn not_found(pattern: &str, labels: &LabelIndex) -> Error {
	Error::NotFound {
		target: pattern.to_string(),
		labels: format!(", all OCR labels:\n{}", labels.dump()),
	}
}
