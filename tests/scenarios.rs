//! End-to-end session behaviour with fake rasterizer and export sinks.

use std::cell::RefCell;
use std::rc::Rc;

use roadmap_canvas::roadmap::*;
use serde_json::json;

#[derive(Default)]
struct Exports {
	pngs: Vec<(String, u32, u32)>,
	svgs: Vec<(String, String)>,
	pages: usize,
}

struct FixedRaster;

impl Rasterizer for FixedRaster {
	fn rasterize(&mut self, surface: &FlattenedSurface, scale: f64) -> Result<Bitmap, CaptureError> {
		Ok(Bitmap {
			width: (surface.width * scale) as u32,
			height: (surface.height * scale) as u32,
			data_url: "data:image/png;base64,".into(),
		})
	}
}

struct Recorder(Rc<RefCell<Exports>>);

struct CountingDoc(Rc<RefCell<Exports>>);

impl ExportSink for Recorder {
	fn save_png(&mut self, file_name: &str, bitmap: &Bitmap) -> Result<(), ExportError> {
		self.0
			.borrow_mut()
			.pngs
			.push((file_name.to_string(), bitmap.width, bitmap.height));
		Ok(())
	}

	fn save_svg(&mut self, file_name: &str, svg: &str) -> Result<(), ExportError> {
		self.0
			.borrow_mut()
			.svgs
			.push((file_name.to_string(), svg.to_string()));
		Ok(())
	}

	fn create_document(
		&mut self,
		_: PageSize,
	) -> Result<Box<dyn PaginatedDocumentWriter>, ExportError> {
		self.0.borrow_mut().pages = 1;
		Ok(Box::new(CountingDoc(Rc::clone(&self.0))))
	}
}

impl PaginatedDocumentWriter for CountingDoc {
	fn add_page(&mut self) -> Result<(), ExportError> {
		self.0.borrow_mut().pages += 1;
		Ok(())
	}

	fn place_image(&mut self, _: &Bitmap, _: &PagePlacement) -> Result<(), ExportError> {
		Ok(())
	}

	fn save(&mut self, _: &str) -> Result<(), ExportError> {
		Ok(())
	}
}

fn session() -> (RenderSession, Rc<RefCell<Exports>>) {
	let exports = Rc::new(RefCell::new(Exports::default()));
	let config = RoadmapConfig::default();
	let pipeline = ExportPipeline::new(
		Box::new(FixedRaster),
		Box::new(Recorder(Rc::clone(&exports))),
		config.page,
		config.capture_scale,
	);
	let s = RenderSession::new(config, Box::new(MemoryPreferences::new()), pipeline, 1280.0);
	(s, exports)
}

/// Renders and lets the full reroute fire.
fn settle(s: &mut RenderSession, text: &str, regions: &dyn RegionLookup) {
	s.render(text, 0.0);
	s.on_animation_frame(16.0);
	let report = s.tick(116.0, regions);
	assert!(report.rerouted);
}

#[test]
fn scenario_a_empty_roadmap_shows_placeholder_without_error() {
	let (mut s, _) = session();
	let view = s.render(r#"{"nodes":[],"dependencies":[]}"#, 0.0);
	assert_eq!(
		view,
		CanvasView::Placeholder(
			"Your roadmap is empty. Add some nodes to the JSON configuration."
		)
	);
	assert_eq!(s.error_text(), None);
	assert!(s.toast().is_none());
}

#[test]
fn scenario_b_dangling_edge_draws_nothing_and_stays_quiet() {
	let (mut s, _) = session();
	let text = json!({
		"nodes": [{"id": "a", "level": 0, "title": "A", "description": "d"}],
		"dependencies": [{"from": "a", "to": "missing"}]
	})
	.to_string();
	let regions = RegionMap::new().with("a", Rect::new(0.0, 0.0, 288.0, 120.0));
	settle(&mut s, &text, &regions);

	let CanvasView::Roadmap(layout) = s.canvas() else {
		panic!("expected a roadmap");
	};
	assert_eq!(layout.node_count(), 1);
	assert_eq!(s.connectors().map(ConnectorSet::len), Some(0));
	assert_eq!(s.error_text(), None);
	assert!(s.toast().is_none());
}

#[test]
fn scenario_c_malformed_text_reports_invalid_json() {
	let (mut s, _) = session();
	let input = String::from("{");
	let view = s.render(&input, 0.0);
	assert_eq!(
		view,
		CanvasView::Placeholder("Could not render roadmap due to invalid JSON.")
	);
	assert_eq!(s.error_text(), Some("Invalid JSON format."));
	assert_eq!(s.toast().unwrap().message, "Error: Could not parse the JSON.");
	assert_eq!(input, "{");
}

#[test]
fn scenario_d_pan_repositions_in_place_within_one_window() {
	let (mut s, _) = session();
	let text = json!({
		"nodes": [
			{"id": "a", "level": 0, "title": "A", "description": ""},
			{"id": "b", "level": 1, "title": "B", "description": ""}
		],
		"dependencies": [{"from": "a", "to": "b"}]
	})
	.to_string();
	let surface = RegionMap::new()
		.with("a", Rect::new(100.0, 40.0, 288.0, 120.0))
		.with("b", Rect::new(100.0, 300.0, 288.0, 120.0));
	let view = |s: &RenderSession| TransformedRegions {
		inner: &surface,
		transform: s.transform(),
	};

	s.render(&text, 0.0);
	s.on_animation_frame(16.0);
	let report = s.tick(116.0, &view(&s));
	assert!(report.rerouted);

	let before = s.connectors().unwrap().iter().next().unwrap().clone();
	let before_path = before.path.unwrap();

	s.pan_by(50.0, 50.0, 200.0);
	assert!(!s.tick(229.0, &view(&s)).connectors_changed());
	let report = s.tick(230.0, &view(&s));
	assert!(report.repositioned);
	assert!(!report.rerouted);

	let connectors = s.connectors().unwrap();
	assert_eq!(connectors.len(), 1);
	let after = connectors.iter().next().unwrap();
	assert_eq!(after.id, before.id);
	let after_path = after.path.unwrap();
	assert_eq!(after_path.start, before_path.start.offset(50.0, 50.0));
	assert_eq!(after_path.tip, before_path.tip.offset(50.0, 50.0));
}

#[test]
fn continuous_drag_coalesces_and_reads_latest_transform() {
	let (mut s, _) = session();
	let surface = RegionMap::new()
		.with("html_css", Rect::new(0.0, 0.0, 288.0, 120.0))
		.with("js_basics", Rect::new(0.0, 200.0, 288.0, 120.0));
	let view = |s: &RenderSession| TransformedRegions {
		inner: &surface,
		transform: s.transform(),
	};
	s.render(&sample::sample_text(), 0.0);
	s.on_animation_frame(0.0);
	s.tick(100.0, &view(&s));

	s.begin_pan(0.0, 0.0);
	let mut repositions = 0;
	for step in 1..=20 {
		let now = 100.0 + step as f64 * 5.0;
		s.pan_to(step as f64, 0.0, now);
		if s.tick(now, &view(&s)).repositioned {
			repositions += 1;
		}
	}
	s.end_pan();
	assert_eq!(repositions, 0);
	assert!(s.tick(230.0, &view(&s)).repositioned);

	let start = s
		.connectors()
		.unwrap()
		.iter()
		.find_map(|c| c.path)
		.unwrap()
		.start;
	assert_eq!(start.x, 144.0 + 20.0);
}

#[test]
fn rerendering_is_idempotent_by_endpoints() {
	let (mut s, _) = session();
	let text = sample::sample_text();
	let mut regions = RegionMap::new();
	for (i, id) in [
		"html_css", "js_basics", "git", "framework", "react", "vue", "styling", "testing",
		"typescript", "deployment",
	]
	.iter()
	.enumerate()
	{
		regions.insert(*id, Rect::new(0.0, i as f64 * 200.0, 288.0, 120.0));
	}

	settle(&mut s, &text, &regions);
	let first_layout = s.layout().unwrap().clone();
	let mut first_pairs = s.connectors().unwrap().endpoint_pairs();
	let first_ids: Vec<ConnectorId> = s.connectors().unwrap().iter().map(|c| c.id).collect();

	settle(&mut s, &text, &regions);
	let mut second_pairs = s.connectors().unwrap().endpoint_pairs();
	assert_eq!(s.layout().unwrap(), &first_layout);
	first_pairs.sort();
	second_pairs.sort();
	assert_eq!(first_pairs, second_pairs);
	assert_eq!(first_pairs.len(), 9);
	assert!(
		s.connectors()
			.unwrap()
			.iter()
			.all(|c| !first_ids.contains(&c.id))
	);
}

#[test]
fn export_captures_at_identity_and_names_file_from_title() {
	let (mut s, exports) = session();
	let surface = RegionMap::new()
		.with("a", Rect::new(100.0, 40.0, 288.0, 120.0))
		.with("b", Rect::new(100.0, 300.0, 288.0, 120.0));
	let view = |s: &RenderSession| TransformedRegions {
		inner: &surface,
		transform: s.transform(),
	};
	let text = json!({
		"title": "Release plan: v2",
		"nodes": [
			{"id": "a", "level": 0, "title": "A", "description": ""},
			{"id": "b", "level": 1, "title": "B", "description": ""}
		],
		"dependencies": [{"from": "a", "to": "b"}]
	})
	.to_string();
	s.render(&text, 0.0);
	s.on_animation_frame(0.0);
	s.tick(100.0, &view(&s));
	s.zoom_in(Point::new(400.0, 300.0), 150.0);
	assert!(!s.transform().is_identity());

	s.request_export(ExportFormat::Png, 200.0).unwrap();
	assert!(s.transform().is_identity());
	s.tick(400.0, &view(&s));
	let report = s.tick(500.0, &view(&s));
	assert_eq!(report.export, Some(Ok(ExportFormat::Png)));

	let exports = exports.borrow();
	assert_eq!(
		exports.pngs,
		vec![("Release_plan__v2.png".to_string(), 856, 920)]
	);
}

#[test]
fn pdf_export_adds_pages_for_tall_roadmaps() {
	let (mut s, exports) = session();
	let mut regions = RegionMap::new();
	let mut nodes = Vec::new();
	for i in 0..12 {
		let id = format!("n{i}");
		regions.insert(id.clone(), Rect::new(0.0, i as f64 * 200.0, 288.0, 120.0));
		nodes.push(json!({"id": id, "level": i, "title": id, "description": ""}));
	}
	let text = json!({"nodes": nodes, "dependencies": []}).to_string();
	settle(&mut s, &text, &regions);

	s.request_export(ExportFormat::Pdf, 200.0).unwrap();
	s.tick(400.0, &regions);
	let report = s.tick(500.0, &regions);
	assert_eq!(report.export, Some(Ok(ExportFormat::Pdf)));
	// 328 x 2360 surface -> 297 x ~2137mm -> 11 pages
	assert_eq!(exports.borrow().pages, 11);
}

#[test]
fn svg_export_keeps_level_labels() {
	let (mut s, exports) = session();
	let regions = RegionMap::new()
		.with("a", Rect::new(200.0, 60.0, 288.0, 120.0))
		.with("b", Rect::new(40.0, 300.0, 288.0, 120.0))
		.with("c", Rect::new(360.0, 300.0, 288.0, 120.0));
	let text = json!({
		"nodes": [
			{"id": "a", "level": 0, "title": "A", "description": ""},
			{"id": "b", "level": 1, "title": "B", "description": ""},
			{"id": "c", "level": 1, "title": "C", "description": ""}
		],
		"dependencies": [{"from": "a", "to": "b"}, {"from": "a", "to": "c"}]
	})
	.to_string();
	settle(&mut s, &text, &regions);

	s.request_export(ExportFormat::Svg, 200.0).unwrap();
	s.tick(400.0, &regions);
	let report = s.tick(500.0, &regions);
	assert_eq!(report.export, Some(Ok(ExportFormat::Svg)));
	assert_eq!(s.toast().unwrap().message, "SVG exported successfully!");

	let exports = exports.borrow();
	assert!(exports.pngs.is_empty());
	let (name, svg) = &exports.svgs[0];
	assert_eq!(name, "roadmap.svg");
	assert!(svg.contains(">LEVEL 1</text>"));
	assert!(!svg.contains(">LEVEL 0</text>"));
	assert_eq!(svg.matches("<g class=\"node\">").count(), 3);
}

#[test]
fn flat_wheel_event_schedules_nothing() {
	let (mut s, _) = session();
	let regions = RegionMap::new()
		.with("a", Rect::new(0.0, 0.0, 288.0, 120.0))
		.with("b", Rect::new(0.0, 200.0, 288.0, 120.0));
	let text = json!({
		"nodes": [
			{"id": "a", "level": 0, "title": "A", "description": ""},
			{"id": "b", "level": 1, "title": "B", "description": ""}
		],
		"dependencies": [{"from": "a", "to": "b"}]
	})
	.to_string();
	settle(&mut s, &text, &regions);

	s.wheel(0.0, Point::new(100.0, 100.0), 200.0);
	assert!(s.transform().is_identity());
	assert!(!s.tick(1_000.0, &regions).connectors_changed());

	s.wheel(-1.0, Point::new(0.0, 0.0), 1_100.0);
	assert_eq!(s.transform().k, 1.1);
}
