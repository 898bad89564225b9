//! Curved dependency connectors between materialized node regions.

use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;

use super::config::RoadmapConfig;
use super::document::Edge;
use super::geometry::{Point, Rect, RegionLookup};
use super::theme::Theme;

/// Shortest control-arm length, so near-adjacent nodes still get a visible curve.
const MIN_GRAVITY: f64 = 40.0;
const ARROW_SCALE: f64 = 3.0;
const DISC_SCALE: f64 = 1.5;

/// Unique for the lifetime of the process, so a rebuilt connector never reuses an id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectorId(u64);

impl ConnectorId {
	fn next() -> Self {
		static NEXT: AtomicU64 = AtomicU64::new(0);
		Self(NEXT.fetch_add(1, Ordering::Relaxed))
	}
}

/// Stroke shared by every connector of a render.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConnectorStyle {
	/// Stroke and fill color from the theme palette.
	pub color: &'static str,
	/// Stroke width; 2 on narrow viewports, 3 otherwise.
	pub width: f64,
}

impl ConnectorStyle {
	/// Style for the current theme and viewport width.
	pub fn new(theme: Theme, viewport_width: f64, config: &RoadmapConfig) -> Self {
		Self {
			color: theme.palette().connector,
			width: config.stroke_width(viewport_width),
		}
	}
}

/// Cubic curve from the bottom-center of the source to the arrow base above the target,
/// plus the arrow head and the start disc.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConnectorPath {
	/// Bottom-center of the source.
	pub start: Point,
	/// Below `start`.
	pub control_start: Point,
	/// Above `end`.
	pub control_end: Point,
	/// Base of the arrow head.
	pub end: Point,
	/// Top-center of the target.
	pub tip: Point,
	/// Left corner of the arrow base.
	pub arrow_left: Point,
	/// Right corner of the arrow base.
	pub arrow_right: Point,
	/// Radius of the disc drawn at `start`.
	pub disc_radius: f64,
}

impl ConnectorPath {
	/// Geometry for a connector from `source` to `target`, sized by `stroke_width`.
	pub fn route(source: Rect, target: Rect, stroke_width: f64) -> Self {
		let start = source.bottom_center();
		let tip = target.top_center();
		let arrow_size = stroke_width * ARROW_SCALE;

		// Sockets are bottom -> top, so the curve always enters the target heading down.
		let end = tip.offset(0.0, -arrow_size);
		let (dx, dy) = (end.x - start.x, end.y - start.y);
		let gravity = ((dx * dx + dy * dy).sqrt() * 0.5).max(MIN_GRAVITY);

		let half = arrow_size * 0.5;
		Self {
			start,
			control_start: start.offset(0.0, gravity),
			control_end: end.offset(0.0, -gravity),
			end,
			tip,
			arrow_left: end.offset(-half, 0.0),
			arrow_right: end.offset(half, 0.0),
			disc_radius: stroke_width * DISC_SCALE,
		}
	}

	/// SVG path data for the curve body.
	pub fn svg_d(&self) -> String {
		format!(
			"M{} {} C{} {} {} {} {} {}",
			fmt(self.start.x),
			fmt(self.start.y),
			fmt(self.control_start.x),
			fmt(self.control_start.y),
			fmt(self.control_end.x),
			fmt(self.control_end.y),
			fmt(self.end.x),
			fmt(self.end.y),
		)
	}

	/// Closed triangle for the arrow head.
	pub fn arrow_d(&self) -> String {
		format!(
			"M{} {} L{} {} L{} {} Z",
			fmt(self.tip.x),
			fmt(self.tip.y),
			fmt(self.arrow_left.x),
			fmt(self.arrow_left.y),
			fmt(self.arrow_right.x),
			fmt(self.arrow_right.y),
		)
	}
}

fn fmt(v: f64) -> String {
	let v = (v * 100.0).round() / 100.0;
	if v == 0.0 { "0".to_string() } else { v.to_string() }
}

/// Drawn form of one dependency edge.
#[derive(Clone, Debug, PartialEq)]
pub struct Connector {
	/// Kept across repositions, replaced on reroute.
	pub id: ConnectorId,
	/// Source node id.
	pub source: String,
	/// Target node id.
	pub target: String,
	/// `None` while an endpoint is not materialized.
	pub path: Option<ConnectorPath>,
	/// Style the path was last computed with.
	pub style: ConnectorStyle,
}

impl Connector {
	fn refresh(&mut self, regions: &dyn RegionLookup, style: ConnectorStyle) {
		self.style = style;
		self.path = match (regions.region(&self.source), regions.region(&self.target)) {
			(Some(from), Some(to)) => Some(ConnectorPath::route(from, to, style.width)),
			_ => None,
		};
	}
}

/// All connectors of the current render.
#[derive(Debug, Default)]
pub struct ConnectorSet {
	connectors: Vec<Connector>,
}

impl ConnectorSet {
	/// No connectors.
	pub fn new() -> Self {
		Self::default()
	}

	/// Drops every connector and builds one per edge whose endpoints are both materialized.
	pub fn reroute(
		&mut self,
		edges: &[Edge],
		regions: &dyn RegionLookup,
		style: ConnectorStyle,
	) -> usize {
		self.connectors.clear();
		for edge in edges {
			let (Some(from), Some(to)) = (regions.region(&edge.from), regions.region(&edge.to))
			else {
				debug!("skipping dangling dependency {} -> {}", edge.from, edge.to);
				continue;
			};
			self.connectors.push(Connector {
				id: ConnectorId::next(),
				source: edge.from.clone(),
				target: edge.to.clone(),
				path: Some(ConnectorPath::route(from, to, style.width)),
				style,
			});
		}
		debug!("rerouted {} connectors", self.connectors.len());
		self.connectors.len()
	}

	/// Recomputes geometry and style of the existing connectors in place.
	pub fn reposition(&mut self, regions: &dyn RegionLookup, style: ConnectorStyle) -> usize {
		for connector in &mut self.connectors {
			connector.refresh(regions, style);
		}
		let placed = self.connectors.iter().filter(|c| c.path.is_some()).count();
		debug!("repositioned {placed}/{} connectors", self.connectors.len());
		placed
	}

	/// Drops every connector.
	pub fn clear(&mut self) {
		self.connectors.clear();
	}

	/// Connectors, including ones without geometry.
	pub fn len(&self) -> usize {
		self.connectors.len()
	}

	/// `true` when there are no connectors.
	pub fn is_empty(&self) -> bool {
		self.connectors.is_empty()
	}

	/// In edge order.
	pub fn iter(&self) -> impl Iterator<Item = &Connector> {
		self.connectors.iter()
	}

	/// Connector with the given id.
	pub fn get(&self, id: ConnectorId) -> Option<&Connector> {
		self.connectors.iter().find(|c| c.id == id)
	}

	/// `(source, target)` of every connector, in order.
	pub fn endpoint_pairs(&self) -> Vec<(String, String)> {
		self.connectors
			.iter()
			.map(|c| (c.source.clone(), c.target.clone()))
			.collect()
	}
}
