//! Locate interactive UI controls by how they look on screen.
//!
//! Two independent routes to a screen coordinate (template matching against
//! a library of reference bitmaps, and OCR of on-screen text), followed by
//! resolution of that coordinate to the control whose bounds contain it.
//! The pixel-level machinery lives in the `vis` crate; this crate adds
//! screen capture, the control/window model, configuration and the
//! orchestrating [`Resolver`].

pub mod capture;
pub mod config;
pub mod controls;
pub mod library;
pub mod resolver;

pub use capture::{ScreenshotSource, WindowBounds, XcapSource};
pub use config::Config;
pub use controls::{Control, ControlKind};
pub use library::BitmapLibrary;
pub use resolver::{ControlQuery, MatchMode, Resolver};
