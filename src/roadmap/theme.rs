//! Light/dark palettes, status colors and the persisted theme flag.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::warn;

use super::document::Status;

/// Preference key holding `"light"` or `"dark"`.
pub const THEME_KEY: &str = "theme";

/// Color scheme of the whole app.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
	/// Default when nothing is stored.
	#[default]
	Light,
	/// Persisted as `"dark"`.
	Dark,
}

/// Colors used wherever the roadmap is drawn outside of CSS (connectors, exports).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
	/// Surface fill.
	pub background: &'static str,
	/// Connector stroke, arrow and disc.
	pub connector: &'static str,
	/// Node card fill.
	pub card: &'static str,
	/// Node card outline.
	pub card_border: &'static str,
	/// Node titles.
	pub title: &'static str,
	/// Node descriptions.
	pub text: &'static str,
	/// `Level N` captions.
	pub label: &'static str,
}

const LIGHT: Palette = Palette {
	background: "#f1f5f9",
	connector: "rgba(148, 163, 184, 0.8)",
	card: "#ffffff",
	card_border: "#e2e8f0",
	title: "#1e293b",
	text: "#64748b",
	label: "#94a3b8",
};

const DARK: Palette = Palette {
	background: "#020617",
	connector: "rgba(100, 116, 139, 0.8)",
	card: "#1e293b",
	card_border: "#334155",
	title: "#f1f5f9",
	text: "#94a3b8",
	label: "#64748b",
};

impl Theme {
	/// `true` for [`Theme::Dark`].
	pub fn is_dark(self) -> bool {
		self == Self::Dark
	}

	/// The other theme.
	pub fn toggled(self) -> Self {
		match self {
			Self::Light => Self::Dark,
			Self::Dark => Self::Light,
		}
	}

	/// Colors for drawing outside of CSS.
	pub fn palette(self) -> &'static Palette {
		match self {
			Self::Light => &LIGHT,
			Self::Dark => &DARK,
		}
	}

	/// Persisted form.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Light => "light",
			Self::Dark => "dark",
		}
	}

	/// Reads the persisted flag; anything but `"dark"` means light.
	pub fn load(store: &dyn PreferenceStore) -> Self {
		match store.get(THEME_KEY).as_deref() {
			Some("dark") => Self::Dark,
			_ => Self::Light,
		}
	}

	/// Persists the flag. A failing store is logged, not fatal.
	pub fn save(self, store: &mut dyn PreferenceStore) {
		if let Err(err) = store.set(THEME_KEY, self.as_str()) {
			warn!("could not persist theme: {err}");
		}
	}
}

/// Status dot color, identical in both themes.
pub fn status_color(status: Status) -> &'static str {
	match status {
		Status::Completed => "#22c55e",
		Status::InProgress => "#3b82f6",
		Status::Planned => "#94a3b8",
		Status::OnHold => "#f59e0b",
	}
}

/// Key-value store that outlives the session (localStorage in the browser).
pub trait PreferenceStore {
	/// Stored value, if any.
	fn get(&self, key: &str) -> Option<String>;
	/// Stores `value`, or explains why it could not.
	fn set(&mut self, key: &str, value: &str) -> Result<(), String>;
}

/// Shared in-memory store. Clones see the same entries.
#[derive(Clone, Debug, Default)]
pub struct MemoryPreferences {
	entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryPreferences {
	/// Empty store.
	pub fn new() -> Self {
		Self::default()
	}
}

impl PreferenceStore for MemoryPreferences {
	fn get(&self, key: &str) -> Option<String> {
		self.entries.borrow().get(key).cloned()
	}

	fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
		self.entries
			.borrow_mut()
			.insert(key.to_string(), value.to_string());
		Ok(())
	}
}
