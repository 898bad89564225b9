//! Tunables, with defaults matching the shipped app.

use serde::Deserialize;

/// Tunables for layout, viewport behaviour, event coalescing and export.
///
/// All durations are milliseconds. Missing fields fall back to [`RoadmapConfig::default`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoadmapConfig {
	/// Viewports narrower than this use the stacked single-column layout.
	pub narrow_breakpoint: f64,
	/// Lower zoom bound.
	pub min_zoom: f64,
	/// Upper zoom bound.
	pub max_zoom: f64,
	/// Factor of the zoom-in button.
	pub zoom_in_step: f64,
	/// Factor of the zoom-out button.
	pub zoom_out_step: f64,
	/// Factor per wheel notch scrolled up.
	pub wheel_in_step: f64,
	/// Factor per wheel notch scrolled down.
	pub wheel_out_step: f64,
	/// Extra zoom applied on double click. 1.0 means no change.
	pub double_click_multiplier: f64,
	/// Debounce and settle windows.
	pub windows: SyncWindows,
	/// Connector stroke below the narrow breakpoint.
	pub stroke_width_narrow: f64,
	/// Connector stroke at or above the narrow breakpoint.
	pub stroke_width_wide: f64,
	/// Level labels are forced on once the roadmap has more levels than this.
	pub level_label_threshold: usize,
	/// Device pixels per surface pixel in exported bitmaps.
	pub capture_scale: f64,
	/// PDF page size.
	pub page: PageSize,
	/// How long a toast stays up.
	pub toast_duration: f64,
}

/// Quiet periods, per event class, before connectors are refreshed.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncWindows {
	/// Pan and zoom.
	pub transform: f64,
	/// Window resize.
	pub resize: f64,
	/// Theme toggle.
	pub theme: f64,
	/// Sidebar open/close; covers its slide transition.
	pub sidebar: f64,
	/// Zoom reset button.
	pub zoom_reset: f64,
	/// Wait after the first frame before a full reroute.
	pub reroute_settle: f64,
	/// Wait after an export request before the identity redraw.
	pub export_settle: f64,
	/// Wait after that redraw before capture.
	pub export_redraw: f64,
}

/// Page dimensions in millimetres.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageSize {
	/// Horizontal extent.
	pub width: f64,
	/// Vertical extent.
	pub height: f64,
}

impl Default for RoadmapConfig {
	fn default() -> Self {
		Self {
			narrow_breakpoint: 768.0,
			min_zoom: 0.1,
			max_zoom: 3.0,
			zoom_in_step: 1.2,
			zoom_out_step: 0.8,
			wheel_in_step: 1.1,
			wheel_out_step: 0.9,
			double_click_multiplier: 1.0,
			windows: SyncWindows::default(),
			stroke_width_narrow: 2.0,
			stroke_width_wide: 3.0,
			level_label_threshold: 3,
			capture_scale: 2.0,
			page: PageSize::default(),
			toast_duration: 3000.0,
		}
	}
}

impl Default for SyncWindows {
	fn default() -> Self {
		Self {
			transform: 30.0,
			resize: 150.0,
			theme: 50.0,
			sidebar: 300.0,
			zoom_reset: 100.0,
			reroute_settle: 100.0,
			export_settle: 200.0,
			export_redraw: 100.0,
		}
	}
}

impl Default for PageSize {
	/// A4 landscape.
	fn default() -> Self {
		Self {
			width: 297.0,
			height: 210.0,
		}
	}
}

impl RoadmapConfig {
	/// Partial JSON overrides on top of the defaults, keys in camelCase.
	pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(text)
	}

	/// Whether `viewport_width` falls below the narrow breakpoint.
	pub fn is_narrow(&self, viewport_width: f64) -> bool {
		viewport_width < self.narrow_breakpoint
	}

	/// Connector stroke for the given viewport width.
	pub fn stroke_width(&self, viewport_width: f64) -> f64 {
		if self.is_narrow(viewport_width) {
			self.stroke_width_narrow
		} else {
			self.stroke_width_wide
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_json_keeps_defaults() {
		let cfg = RoadmapConfig::from_json(r#"{"maxZoom": 5.0, "windows": {"transform": 16}}"#)
			.unwrap();
		assert_eq!(cfg.max_zoom, 5.0);
		assert_eq!(cfg.min_zoom, 0.1);
		assert_eq!(cfg.windows.transform, 16.0);
		assert_eq!(cfg.windows.resize, 150.0);
		assert_eq!(cfg.page, PageSize::default());
	}

	#[test]
	fn stroke_width_follows_breakpoint() {
		let cfg = RoadmapConfig::default();
		assert_eq!(cfg.stroke_width(500.0), 2.0);
		assert_eq!(cfg.stroke_width(767.9), 2.0);
		assert_eq!(cfg.stroke_width(768.0), 3.0);
	}
}
