//! One editing session: the current render plus everything that reacts to input.

use std::cell::Cell;
use std::rc::Rc;

use log::{debug, info};

use super::config::RoadmapConfig;
use super::connector::{ConnectorSet, ConnectorStyle};
use super::document::{ParsedInput, RoadmapDocument, parse_document};
use super::error::ExportError;
use super::export::{ExportFormat, ExportPipeline, FlattenedSurface};
use super::geometry::{Point, RegionLookup};
use super::levels::LevelLayout;
use super::scheduler::{SyncAction, SyncEvent, SyncScheduler};
use super::theme::{PreferenceStore, Theme};
use super::toast::{Notifier, Toast};
use super::viewport::{ViewportController, ViewportTransform};

/// Canvas text when the editor is blank.
pub const BLANK_PLACEHOLDER: &str = "Paste your JSON in the sidebar to generate a roadmap.";
/// Canvas text when the document has no nodes.
pub const EMPTY_PLACEHOLDER: &str =
	"Your roadmap is empty. Add some nodes to the JSON configuration.";

/// What the canvas area should show.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CanvasView<'a> {
	/// Message instead of a roadmap.
	Placeholder(&'static str),
	/// Level groups to materialize.
	Roadmap(&'a LevelLayout),
}

/// Everything tied to one successful render. Replaced wholesale on the next render.
struct RenderContext {
	document: RoadmapDocument,
	layout: LevelLayout,
	viewport: ViewportController,
	connectors: ConnectorSet,
}

impl RenderContext {
	fn dispose(&mut self) {
		self.viewport.dispose();
		self.connectors.clear();
	}
}

/// What a [`RenderSession::tick`] did, so the surface knows what to redraw.
#[derive(Debug, Default, PartialEq)]
pub struct TickReport {
	/// Connectors were rebuilt with new ids.
	pub rerouted: bool,
	/// Existing connectors got new geometry or style.
	pub repositioned: bool,
	/// Outcome of a capture that ran in this tick.
	pub export: Option<Result<ExportFormat, ExportError>>,
	/// The toast expired.
	pub toast_dismissed: bool,
}

impl TickReport {
	/// The connector overlay needs redrawing.
	pub fn connectors_changed(&self) -> bool {
		self.rerouted || self.repositioned
	}
}

/// Owns the current document, connectors and transform, plus the scheduler and export
/// pipeline that act on them. All time-dependent calls take `now` in milliseconds.
pub struct RenderSession {
	config: RoadmapConfig,
	theme: Theme,
	prefs: Box<dyn PreferenceStore>,
	viewport_width: f64,
	sidebar_open: bool,
	placeholder: &'static str,
	error_text: Option<String>,
	context: Option<RenderContext>,
	renders: u64,
	transform_dirty: Rc<Cell<bool>>,
	scheduler: SyncScheduler,
	export: ExportPipeline,
	notifier: Notifier,
}

impl RenderSession {
	/// Loads the stored theme; the sidebar starts open unless the viewport is narrow.
	pub fn new(
		config: RoadmapConfig,
		prefs: Box<dyn PreferenceStore>,
		export: ExportPipeline,
		viewport_width: f64,
	) -> Self {
		let theme = Theme::load(prefs.as_ref());
		info!("session started with {} theme", theme.as_str());
		Self {
			scheduler: SyncScheduler::new(config.windows),
			notifier: Notifier::new(config.toast_duration),
			sidebar_open: !config.is_narrow(viewport_width),
			config,
			theme,
			prefs,
			viewport_width,
			placeholder: BLANK_PLACEHOLDER,
			error_text: None,
			context: None,
			renders: 0,
			transform_dirty: Rc::new(Cell::new(false)),
			export,
		}
	}

	/// Validates `text` and replaces the current render. The previous viewport controller and
	/// connectors are disposed before anything new is created.
	pub fn render(&mut self, text: &str, now: f64) -> CanvasView<'_> {
		if let Some(mut old) = self.context.take() {
			old.dispose();
		}
		self.scheduler.reset();
		self.transform_dirty.set(false);
		self.error_text = None;

		match parse_document(text) {
			Ok(ParsedInput::Blank) => self.placeholder = BLANK_PLACEHOLDER,
			Ok(ParsedInput::Empty) => self.placeholder = EMPTY_PLACEHOLDER,
			Ok(ParsedInput::Roadmap(document)) => self.install(document),
			Err(err) => {
				info!("render rejected: {err}");
				self.error_text = Some(err.user_message());
				self.placeholder = err.placeholder();
				self.notifier.show(err.toast(), now);
			}
		}
		self.canvas()
	}

	fn install(&mut self, document: RoadmapDocument) {
		self.renders += 1;
		let mut viewport = ViewportController::new(&self.config);
		let dirty = Rc::clone(&self.transform_dirty);
		viewport.subscribe(move |_| dirty.set(true));

		let layout = LevelLayout::new(&document.nodes, self.viewport_width, &self.config);
		info!(
			"render #{}: {} nodes in {} levels ({:?})",
			self.renders,
			document.nodes.len(),
			layout.groups.len(),
			layout.orientation
		);
		self.context = Some(RenderContext {
			document,
			layout,
			viewport,
			connectors: ConnectorSet::new(),
		});
		self.scheduler.request_reroute();
	}

	/// What the canvas shows right now.
	pub fn canvas(&self) -> CanvasView<'_> {
		match &self.context {
			Some(ctx) => CanvasView::Roadmap(&ctx.layout),
			None => CanvasView::Placeholder(self.placeholder),
		}
	}

	/// Document of the current render.
	pub fn document(&self) -> Option<&RoadmapDocument> {
		self.context.as_ref().map(|c| &c.document)
	}

	/// Level groups of the current render.
	pub fn layout(&self) -> Option<&LevelLayout> {
		self.context.as_ref().map(|c| &c.layout)
	}

	/// Connectors of the current render.
	pub fn connectors(&self) -> Option<&ConnectorSet> {
		self.context.as_ref().map(|c| &c.connectors)
	}

	/// `": <title>"`, or empty.
	pub fn title(&self) -> String {
		self.document()
			.map(RoadmapDocument::display_title)
			.unwrap_or_default()
	}

	/// Validation message for the editor, cleared by the next render.
	pub fn error_text(&self) -> Option<&str> {
		self.error_text.as_deref()
	}

	/// Toast on screen, if any.
	pub fn toast(&self) -> Option<&Toast> {
		self.notifier.current()
	}

	/// Shows a toast, replacing the current one.
	pub fn notify(&mut self, message: impl Into<String>, now: f64) {
		self.notifier.show(message, now);
	}

	/// Active theme.
	pub fn theme(&self) -> Theme {
		self.theme
	}

	/// Tunables the session was built with.
	pub fn config(&self) -> &RoadmapConfig {
		&self.config
	}

	/// Viewport is below the narrow breakpoint.
	pub fn is_narrow(&self) -> bool {
		self.config.is_narrow(self.viewport_width)
	}

	/// Editor sidebar visibility.
	pub fn sidebar_open(&self) -> bool {
		self.sidebar_open
	}

	/// An export has been requested and not finished.
	pub fn export_in_flight(&self) -> bool {
		self.export.in_flight()
	}

	/// Node hover/transition effects are off while an export is in flight.
	pub fn effects_enabled(&self) -> bool {
		!self.export.effects_suspended()
	}

	/// A reroute is waiting for the next animation frame.
	pub fn needs_frame(&self) -> bool {
		self.scheduler.awaiting_frame()
	}

	/// Live transform subscriptions held by viewport controllers. Stays at one per render.
	pub fn transform_subscriptions(&self) -> usize {
		Rc::strong_count(&self.transform_dirty) - 1
	}

	/// Current viewport transform; identity without a render.
	pub fn transform(&self) -> ViewportTransform {
		self.context
			.as_ref()
			.map(|c| c.viewport.transform())
			.unwrap_or_default()
	}

	/// Style for connectors under the current theme and width.
	pub fn connector_style(&self) -> ConnectorStyle {
		ConnectorStyle::new(self.theme, self.viewport_width, &self.config)
	}

	fn with_viewport(
		&mut self,
		now: f64,
		f: impl FnOnce(&mut ViewportController, &RoadmapConfig),
	) {
		if self.export.in_flight() {
			return;
		}
		let Some(ctx) = self.context.as_mut() else {
			return;
		};
		f(&mut ctx.viewport, &self.config);
		if self.transform_dirty.replace(false) {
			self.scheduler.notify(SyncEvent::Transform, now);
		}
	}

	/// Mouse down on the canvas.
	pub fn begin_pan(&mut self, x: f64, y: f64) {
		if let Some(ctx) = self.context.as_mut() {
			ctx.viewport.begin_pan(x, y);
		}
	}

	/// Mouse move during a drag.
	pub fn pan_to(&mut self, x: f64, y: f64, now: f64) {
		self.with_viewport(now, |vp, _| vp.pan_to(x, y));
	}

	/// Mouse up or leave.
	pub fn end_pan(&mut self) {
		if let Some(ctx) = self.context.as_mut() {
			ctx.viewport.end_pan();
		}
	}

	/// A drag is in progress.
	pub fn is_panning(&self) -> bool {
		self.context.as_ref().is_some_and(|c| c.viewport.is_panning())
	}

	/// Shifts the view by `(dx, dy)`.
	pub fn pan_by(&mut self, dx: f64, dy: f64, now: f64) {
		self.with_viewport(now, |vp, _| vp.pan_by(dx, dy));
	}

	/// Sets the translation, keeping the scale.
	pub fn move_to(&mut self, x: f64, y: f64, now: f64) {
		self.with_viewport(now, |vp, _| vp.move_to(x, y));
	}

	/// Scales around `anchor`.
	pub fn zoom_by(&mut self, factor: f64, anchor: Point, now: f64) {
		self.with_viewport(now, |vp, _| vp.zoom_by(factor, anchor));
	}

	/// Wheel over the canvas; see [`ViewportController::zoom_with_wheel`].
	pub fn wheel(&mut self, delta_y: f64, anchor: Point, now: f64) {
		self.with_viewport(now, |vp, _| vp.zoom_with_wheel(delta_y, anchor));
	}

	/// Double click over the canvas.
	pub fn double_click(&mut self, anchor: Point, now: f64) {
		self.with_viewport(now, |vp, _| vp.double_click(anchor));
	}

	/// Zoom-in button, around the container center.
	pub fn zoom_in(&mut self, center: Point, now: f64) {
		self.with_viewport(now, |vp, cfg| vp.zoom_by(cfg.zoom_in_step, center));
	}

	/// Zoom-out button, around the container center.
	pub fn zoom_out(&mut self, center: Point, now: f64) {
		self.with_viewport(now, |vp, cfg| vp.zoom_by(cfg.zoom_out_step, center));
	}

	/// Zoom reset button.
	pub fn reset_zoom(&mut self, now: f64) {
		if self.context.is_none() || self.export.in_flight() {
			return;
		}
		self.with_viewport(now, |vp, _| vp.reset());
		self.scheduler.notify(SyncEvent::ZoomReset, now);
	}

	/// Re-evaluates the layout orientation right away; connectors follow after the resize
	/// debounce. Returns `true` when the orientation changed.
	///
	/// Crossing the narrow breakpoint opens the sidebar (wide) or collapses it (narrow). A
	/// resize that stays narrow leaves the user's choice alone.
	pub fn on_resize(&mut self, viewport_width: f64, now: f64) -> bool {
		let was_narrow = self.is_narrow();
		self.viewport_width = viewport_width;
		match (was_narrow, self.is_narrow()) {
			(_, false) => self.sidebar_open = true,
			(false, true) => self.sidebar_open = false,
			(true, true) => {}
		}
		let Some(ctx) = self.context.as_mut() else {
			return false;
		};
		let changed = ctx.layout.relayout(viewport_width, &self.config);
		if changed {
			debug!("orientation -> {:?}", ctx.layout.orientation);
		}
		self.scheduler.notify(SyncEvent::Resize, now);
		changed
	}

	/// Switches and persists the theme; connectors restyle after the theme window.
	pub fn toggle_theme(&mut self, now: f64) -> Theme {
		self.theme = self.theme.toggled();
		self.theme.save(self.prefs.as_mut());
		self.scheduler.notify(SyncEvent::Theme, now);
		self.theme
	}

	/// Opens or closes the sidebar; connectors follow after its transition.
	pub fn set_sidebar_open(&mut self, open: bool, now: f64) {
		if self.sidebar_open == open {
			return;
		}
		self.sidebar_open = open;
		self.scheduler.notify(SyncEvent::Sidebar, now);
	}

	/// Called once per animation frame, before [`tick`](Self::tick).
	pub fn on_animation_frame(&mut self, now: f64) {
		self.scheduler.on_animation_frame(now);
	}

	/// Starts an export: freezes the viewport at identity and suspends node effects. Capture
	/// happens in a later [`tick`](Self::tick) once the settle windows have passed.
	pub fn request_export(&mut self, format: ExportFormat, now: f64) -> Result<(), ExportError> {
		let result = self.start_export(format, now);
		if let Err(err) = &result {
			self.notifier.show(err.to_string(), now);
		}
		result
	}

	fn start_export(&mut self, format: ExportFormat, now: f64) -> Result<(), ExportError> {
		let Some(ctx) = self.context.as_mut() else {
			return Err(ExportError::NothingToExport);
		};
		self.export.begin(format)?;
		ctx.viewport.end_pan();
		ctx.viewport.reset();
		if self.transform_dirty.replace(false) {
			self.scheduler.notify(SyncEvent::Transform, now);
		}
		self.scheduler.begin_export(now);
		Ok(())
	}

	/// Runs everything due at `now`. `regions` must reflect the surface as currently drawn.
	pub fn tick(&mut self, now: f64, regions: &dyn RegionLookup) -> TickReport {
		let mut report = TickReport::default();
		let style = self.connector_style();

		for action in self.scheduler.poll(now) {
			match action {
				SyncAction::Reroute => {
					if let Some(ctx) = self.context.as_mut() {
						ctx.connectors
							.reroute(&ctx.document.dependencies, regions, style);
						report.rerouted = true;
					}
				}
				SyncAction::Reposition | SyncAction::ExportRedraw => {
					if let Some(ctx) = self.context.as_mut() {
						ctx.connectors.reposition(regions, style);
						report.repositioned = true;
					}
				}
				SyncAction::ExportCapture => {
					report.export = Some(self.capture_export(regions, now));
				}
			}
		}

		report.toast_dismissed = self.notifier.tick(now);
		report
	}

	fn capture_export(
		&mut self,
		regions: &dyn RegionLookup,
		now: f64,
	) -> Result<ExportFormat, ExportError> {
		let format = self.export.format().unwrap_or(ExportFormat::Png);
		let result = match &self.context {
			Some(ctx) => {
				let surface = FlattenedSurface::capture(
					&ctx.document,
					&ctx.layout,
					regions,
					&ctx.connectors,
					self.theme,
				);
				self.export.capture(&surface, ctx.document.title.as_deref())
			}
			None => {
				let err = ExportError::NothingToExport;
				self.export.abort(&err);
				Err(err)
			}
		};
		match &result {
			Ok(format) => self.notifier.show(format.success_message(), now),
			Err(_) => self.notifier.show(format.failure_message(), now),
		}
		result
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::roadmap::config::PageSize;
	use crate::roadmap::error::CaptureError;
	use crate::roadmap::export::{Bitmap, ExportSink, PaginatedDocumentWriter, Rasterizer};
	use crate::roadmap::geometry::{Rect, RegionMap};
	use crate::roadmap::theme::{MemoryPreferences, THEME_KEY};
	use serde_json::json;

	struct Raster;
	struct Sink;

	impl Rasterizer for Raster {
		fn rasterize(&mut self, _: &FlattenedSurface, _: f64) -> Result<Bitmap, CaptureError> {
			Ok(Bitmap {
				width: 100,
				height: 100,
				data_url: String::new(),
			})
		}
	}

	impl ExportSink for Sink {
		fn save_png(&mut self, _: &str, _: &Bitmap) -> Result<(), ExportError> {
			Ok(())
		}

		fn save_svg(&mut self, _: &str, svg: &str) -> Result<(), ExportError> {
			assert!(svg.starts_with("<svg"));
			Ok(())
		}

		fn create_document(
			&mut self,
			_: PageSize,
		) -> Result<Box<dyn PaginatedDocumentWriter>, ExportError> {
			Err(ExportError::Write("no pdf in tests".into()))
		}
	}

	fn session_with(prefs: MemoryPreferences) -> RenderSession {
		let config = RoadmapConfig::default();
		let export =
			ExportPipeline::new(Box::new(Raster), Box::new(Sink), config.page, config.capture_scale);
		RenderSession::new(config, Box::new(prefs), export, 1280.0)
	}

	fn two_level_doc() -> String {
		json!({
			"title": "Two",
			"nodes": [
				{"id": "a", "title": "A", "description": "", "level": 0},
				{"id": "b", "title": "B", "description": "", "level": 1}
			],
			"dependencies": [{"from": "a", "to": "b"}]
		})
		.to_string()
	}

	fn regions() -> RegionMap {
		RegionMap::new()
			.with("a", Rect::new(0.0, 0.0, 288.0, 120.0))
			.with("b", Rect::new(0.0, 240.0, 288.0, 120.0))
	}

	#[test]
	fn rerender_keeps_one_transform_subscription() {
		let mut s = session_with(MemoryPreferences::new());
		assert_eq!(s.transform_subscriptions(), 0);
		s.render(&two_level_doc(), 0.0);
		assert_eq!(s.transform_subscriptions(), 1);
		s.render(&two_level_doc(), 10.0);
		s.render(&two_level_doc(), 20.0);
		assert_eq!(s.transform_subscriptions(), 1);
		s.render("{", 30.0);
		assert_eq!(s.transform_subscriptions(), 0);
	}

	#[test]
	fn full_reroute_waits_for_frame_and_settle() {
		let mut s = session_with(MemoryPreferences::new());
		s.render(&two_level_doc(), 0.0);
		assert!(s.needs_frame());
		assert!(!s.tick(500.0, &regions()).rerouted);
		s.on_animation_frame(16.0);
		assert!(!s.tick(115.0, &regions()).rerouted);
		let report = s.tick(116.0, &regions());
		assert!(report.rerouted);
		assert_eq!(s.connectors().unwrap().len(), 1);
	}

	#[test]
	fn theme_toggle_persists_and_repositions() {
		let prefs = MemoryPreferences::new();
		let mut s = session_with(prefs.clone());
		s.render(&two_level_doc(), 0.0);
		s.on_animation_frame(0.0);
		s.tick(100.0, &regions());
		let before = s.connectors().unwrap().iter().next().unwrap().clone();

		assert_eq!(s.toggle_theme(200.0), Theme::Dark);
		assert_eq!(prefs.get(THEME_KEY).as_deref(), Some("dark"));
		assert!(!s.tick(249.0, &regions()).repositioned);
		assert!(s.tick(250.0, &regions()).repositioned);
		let after = s.connectors().unwrap().iter().next().unwrap();
		assert_eq!(after.id, before.id);
		assert_eq!(after.style.color, Theme::Dark.palette().connector);

		assert_eq!(session_with(prefs).theme(), Theme::Dark);
	}

	#[test]
	fn narrow_resize_thins_strokes_and_stacks_levels() {
		use crate::roadmap::levels::Orientation;

		let mut s = session_with(MemoryPreferences::new());
		s.render(&two_level_doc(), 0.0);
		s.on_animation_frame(0.0);
		s.tick(100.0, &regions());
		assert!(s.on_resize(600.0, 200.0));
		assert_eq!(s.layout().unwrap().orientation, Orientation::Stacked);
		assert!(s.tick(349.0, &regions()) == TickReport::default());
		assert!(s.tick(350.0, &regions()).repositioned);
		let c = s.connectors().unwrap().iter().next().unwrap();
		assert_eq!(c.style.width, 2.0);
	}

	#[test]
	fn sidebar_collapses_when_the_window_turns_narrow() {
		let mut s = session_with(MemoryPreferences::new());
		assert!(s.sidebar_open());
		s.on_resize(600.0, 0.0);
		assert!(s.is_narrow());
		assert!(!s.sidebar_open());

		s.set_sidebar_open(true, 10.0);
		s.on_resize(500.0, 20.0);
		assert!(s.sidebar_open());

		s.set_sidebar_open(false, 30.0);
		s.on_resize(1024.0, 40.0);
		assert!(s.sidebar_open());
	}

	#[test]
	fn export_needs_a_roadmap_and_rejects_overlap() {
		let mut s = session_with(MemoryPreferences::new());
		assert_eq!(
			s.request_export(ExportFormat::Png, 0.0),
			Err(ExportError::NothingToExport)
		);
		assert_eq!(s.toast().unwrap().message, "Please generate a roadmap first!");

		s.render(&two_level_doc(), 0.0);
		s.pan_by(40.0, 40.0, 0.0);
		s.request_export(ExportFormat::Png, 10.0).unwrap();
		assert!(s.transform().is_identity());
		assert!(!s.effects_enabled());
		assert_eq!(
			s.request_export(ExportFormat::Pdf, 20.0),
			Err(ExportError::Busy)
		);

		// viewport input is ignored while exporting
		s.pan_by(5.0, 5.0, 30.0);
		assert!(s.transform().is_identity());

		s.on_animation_frame(40.0);
		let report = s.tick(210.0, &regions());
		assert!(report.rerouted);
		assert!(report.export.is_none());
		let report = s.tick(310.0, &regions());
		assert_eq!(report.export, Some(Ok(ExportFormat::Png)));
		assert!(s.effects_enabled());
		assert_eq!(s.toast().unwrap().message, "PNG exported successfully!");
	}

	#[test]
	fn failed_export_restores_effects_and_notifies() {
		let mut s = session_with(MemoryPreferences::new());
		s.render(&two_level_doc(), 0.0);
		s.request_export(ExportFormat::Pdf, 0.0).unwrap();
		s.tick(200.0, &regions());
		let report = s.tick(300.0, &regions());
		assert!(matches!(report.export, Some(Err(ExportError::Write(_)))));
		assert!(s.effects_enabled());
		assert!(!s.export_in_flight());
		assert_eq!(
			s.toast().unwrap().message,
			"Error exporting PDF. Please try again."
		);
	}

	#[test]
	fn errors_replace_canvas_but_not_input() {
		let mut s = session_with(MemoryPreferences::new());
		s.render(&two_level_doc(), 0.0);
		assert_eq!(s.title(), ": Two");
		let view = s.render(r#"{"nodes": 1}"#, 10.0);
		assert!(matches!(view, CanvasView::Placeholder(p) if p.starts_with("Invalid roadmap structure")));
		assert_eq!(s.title(), "");
		assert!(s.connectors().is_none());
		assert_eq!(
			s.error_text(),
			Some("JSON must contain \"nodes\" and \"dependencies\" arrays.")
		);
		s.render("", 20.0);
		assert_eq!(s.canvas(), CanvasView::Placeholder(BLANK_PLACEHOLDER));
		assert_eq!(s.error_text(), None);
	}
}
