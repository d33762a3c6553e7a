//! Debug helper: OCR a window and print every label with its center point.
//!
//! Usage: `labels <app-name> [screenshot.png]`. The optional second argument
//! persists the raw capture next to the OCR result for inspection.

use std::path::PathBuf;

use anyhow::{Context, Result};

use uiseek::{Config, Resolver, XcapSource, capture};

fn main() -> Result<()> {
	// Structured logging. Use `RUST_LOG=debug` etc.
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.init();

	let cfg = Config::load_or_default();

	let app_name = std::env::args()
		.nth(1)
		.or_else(|| cfg.app_name.clone())
		.context("usage: labels <app-name> [screenshot.png]")?;
	let save = std::env::args().nth(2).map(PathBuf::from);

	let bounds = capture::window_bounds(&app_name)
		.with_context(|| format!("no window found for app {app_name:?}"))?;

	let resolver = Resolver::from_config(&cfg, XcapSource);
	let labels = resolver.find_all_labels(Some(bounds), save.as_deref())?;

	println!("{} labels in {app_name:?} at {bounds:?}", labels.len());
	for (point, text) in labels.iter() {
		println!("({:>5}, {:>5})  {text}", point.x, point.y);
	}
	Ok(())
}
