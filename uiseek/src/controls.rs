//! Interactive controls as reported by the UI-automation host.
//!
//! The host owns the live control tree; this subsystem only ever consumes a
//! snapshot of bounding rectangles and capability tags. Kind filtering is an
//! explicit tag comparison over a closed enum; there is no subtype
//! hierarchy to reflect over.

use vis::Rect;

/// Capability tag of a control, one per concrete kind the host exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum ControlKind {
	Button,
	CheckBox,
	ComboBox,
	Edit,
	Hyperlink,
	Image,
	Label,
	ListItem,
	Menu,
	MenuItem,
	ProgressBar,
	RadioButton,
	Slider,
	Tab,
	Table,
	Tree,
	Custom,
}

/// One interactive control: its host identifier, capability tag and
/// screen-space bounds.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Control {
	/// Automation id assigned by the host; used for logging and correlation
	/// only, never interpreted.
	pub id: String,
	pub kind: ControlKind,
	pub bounds: Rect,
}

impl Control {
	pub fn new(id: impl Into<String>, kind: ControlKind, bounds: Rect) -> Self {
		Self {
			id: id.into(),
			kind,
			bounds,
		}
	}
}
