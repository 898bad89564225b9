//! Image, vector and paginated-document export.
//!
//! The pipeline decides what is captured and how it is laid out on pages. Rasterization and
//! file/document output are capabilities supplied by the host ([`Rasterizer`], [`ExportSink`],
//! [`PaginatedDocumentWriter`]).

use std::fmt::Write as _;

use log::{debug, warn};

use super::config::PageSize;
use super::connector::{Connector, ConnectorSet};
use super::document::{RoadmapDocument, Status};
use super::error::{CaptureError, ExportError};
use super::geometry::{Point, Rect, RegionLookup};
use super::levels::{LevelGroup, LevelLayout};
use super::theme::{Palette, Theme, status_color};

/// Blank border around the captured nodes, in surface pixels.
const SURFACE_MARGIN: f64 = 40.0;
/// Distance from a level label's baseline to the top of its first node row.
const LABEL_GAP: f64 = 12.0;

/// Output file type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
	/// Single bitmap.
	Png,
	/// Bitmap tiled over A4 landscape pages.
	Pdf,
	/// Vector snapshot; skips the rasterizer.
	Svg,
}

impl ExportFormat {
	/// File extension, without the dot.
	pub fn extension(self) -> &'static str {
		match self {
			Self::Png => "png",
			Self::Pdf => "pdf",
			Self::Svg => "svg",
		}
	}

	/// Toast after a successful export.
	pub fn success_message(self) -> &'static str {
		match self {
			Self::Png => "PNG exported successfully!",
			Self::Pdf => "PDF exported successfully!",
			Self::Svg => "SVG exported successfully!",
		}
	}

	/// Toast after a failed export.
	pub fn failure_message(self) -> &'static str {
		match self {
			Self::Png => "Error exporting PNG. Please try again.",
			Self::Pdf => "Error exporting PDF. Please try again.",
			Self::Svg => "Error exporting SVG. Please try again.",
		}
	}
}

/// Where the pipeline is in an export.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportState {
	/// No export in flight.
	Idle,
	/// Viewport reset, waiting for the surface to settle.
	Preparing,
	/// Rendering the snapshot.
	Capturing,
	/// Writing the file.
	Finalizing,
	/// Passed through on error, on the way back to `Idle`.
	Failed,
}

/// Encoded image as returned by the rasterizer.
#[derive(Clone, Debug, PartialEq)]
pub struct Bitmap {
	/// Pixels across.
	pub width: u32,
	/// Pixels down.
	pub height: u32,
	/// `data:image/png;base64,...` in the browser.
	pub data_url: String,
}

/// Node card as drawn in a snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct FlatNode {
	/// Card box in surface pixels.
	pub rect: Rect,
	/// Heading.
	pub title: String,
	/// Body text.
	pub description: String,
	/// Picks the dot color.
	pub status: Status,
}

/// Connector re-expressed as SVG path data.
#[derive(Clone, Debug, PartialEq)]
pub struct FlatConnector {
	/// Curve body.
	pub d: String,
	/// Arrow head triangle.
	pub arrow_d: String,
	/// Center of the start disc.
	pub start: Point,
	/// Radius of the start disc.
	pub disc_radius: f64,
	/// Stroke and fill color.
	pub color: &'static str,
	/// Stroke width.
	pub width: f64,
}

impl FlatConnector {
	/// `None` while the connector has no geometry.
	pub fn from_connector(connector: &Connector) -> Option<Self> {
		connector.path.map(|path| Self {
			d: path.svg_d(),
			arrow_d: path.arrow_d(),
			start: path.start,
			disc_radius: path.disc_radius,
			color: connector.style.color,
			width: connector.style.width,
		})
	}
}

/// `"Level N"` caption drawn centered above a level's nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct FlatLabel {
	/// Horizontal center of the text on its baseline.
	pub anchor: Point,
	/// `"Level N"`.
	pub text: String,
}

impl FlatLabel {
	/// `None` when the group hides its label or none of its nodes are materialized.
	fn for_group(group: &LevelGroup, regions: &dyn RegionLookup) -> Option<Self> {
		if !group.show_label {
			return None;
		}
		let bounds = group
			.nodes
			.iter()
			.filter_map(|n| regions.region(&n.id))
			.reduce(|a, b| a.union(&b))?;
		Some(Self {
			anchor: Point::new(bounds.x + bounds.width / 2.0, bounds.y - LABEL_GAP),
			text: group.label(),
		})
	}
}

/// Static snapshot of the surface: node boxes, level labels and connectors as plain vector
/// path data.
#[derive(Clone, Debug, PartialEq)]
pub struct FlattenedSurface {
	/// Extent in surface pixels, including the margin.
	pub width: f64,
	/// Extent in surface pixels, including the margin.
	pub height: f64,
	/// Colors of the theme at capture time.
	pub palette: &'static Palette,
	/// Captions of labelled levels.
	pub labels: Vec<FlatLabel>,
	/// Materialized nodes in document order.
	pub nodes: Vec<FlatNode>,
	/// Connectors that have geometry.
	pub connectors: Vec<FlatConnector>,
}

impl FlattenedSurface {
	/// `regions` must be read with the viewport at identity.
	pub fn capture(
		doc: &RoadmapDocument,
		layout: &LevelLayout,
		regions: &dyn RegionLookup,
		connectors: &ConnectorSet,
		theme: Theme,
	) -> Self {
		let labels: Vec<FlatLabel> = layout
			.groups
			.iter()
			.filter_map(|g| FlatLabel::for_group(g, regions))
			.collect();

		let nodes: Vec<FlatNode> = doc
			.nodes
			.iter()
			.filter_map(|node| {
				regions.region(&node.id).map(|rect| FlatNode {
					rect,
					title: node.title.clone(),
					description: node.description.clone(),
					status: node.status,
				})
			})
			.collect();

		let connectors: Vec<FlatConnector> = connectors
			.iter()
			.filter_map(FlatConnector::from_connector)
			.collect();

		let bounds = nodes
			.iter()
			.map(|n| n.rect)
			.reduce(|a, b| a.union(&b))
			.unwrap_or_default();

		Self {
			width: (bounds.right() + SURFACE_MARGIN).max(1.0),
			height: (bounds.bottom() + SURFACE_MARGIN).max(1.0),
			palette: theme.palette(),
			labels,
			nodes,
			connectors,
		}
	}

	/// Standalone SVG rendition of the snapshot.
	pub fn to_svg(&self) -> String {
		let p = self.palette;
		let mut out = String::new();
		let _ = write!(
			out,
			r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
			w = self.width,
			h = self.height
		);
		let _ = write!(
			out,
			r#"<rect width="100%" height="100%" fill="{}"/>"#,
			p.background
		);
		for l in &self.labels {
			let _ = write!(
				out,
				r#"<text x="{}" y="{}" text-anchor="middle" font-size="12" letter-spacing="1" fill="{}">{}</text>"#,
				l.anchor.x,
				l.anchor.y,
				p.label,
				escape_xml(&l.text.to_uppercase())
			);
		}
		for n in &self.nodes {
			let r = n.rect;
			let _ = write!(
				out,
				r#"<g class="node"><rect x="{}" y="{}" width="{}" height="{}" rx="12" fill="{}" stroke="{}"/>"#,
				r.x, r.y, r.width, r.height, p.card, p.card_border
			);
			let _ = write!(
				out,
				r#"<circle cx="{}" cy="{}" r="6" fill="{}"/>"#,
				r.right() - 20.0,
				r.y + 24.0,
				status_color(n.status)
			);
			let _ = write!(
				out,
				r#"<text x="{}" y="{}" font-weight="bold" fill="{}">{}</text>"#,
				r.x + 20.0,
				r.y + 30.0,
				p.title,
				escape_xml(&n.title)
			);
			let _ = write!(
				out,
				r#"<text x="{}" y="{}" font-size="12" fill="{}">{}</text></g>"#,
				r.x + 20.0,
				r.y + 54.0,
				p.text,
				escape_xml(&n.description)
			);
		}
		for c in &self.connectors {
			let _ = write!(
				out,
				r#"<path d="{}" stroke="{}" stroke-width="{}" fill="none" stroke-linecap="round" stroke-linejoin="round"/>"#,
				c.d, c.color, c.width
			);
			let _ = write!(out, r#"<path d="{}" fill="{}"/>"#, c.arrow_d, c.color);
			let _ = write!(
				out,
				r#"<circle cx="{}" cy="{}" r="{}" fill="{}"/>"#,
				c.start.x, c.start.y, c.disc_radius, c.color
			);
		}
		out.push_str("</svg>");
		out
	}
}

fn escape_xml(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for ch in text.chars() {
		match ch {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			_ => out.push(ch),
		}
	}
	out
}

/// Where one copy of the image sits on a page, in millimetres from the page's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PagePlacement {
	/// Zero-based page index.
	pub page: usize,
	/// Always 0.
	pub x: f64,
	/// 0 on the first page, negative after.
	pub y: f64,
	/// Full page width.
	pub width: f64,
	/// Proportional to `width`.
	pub height: f64,
}

/// Tiles an image across pages: full page width, proportional height, and each further page
/// shows the same image shifted up by one page height until it is covered.
pub fn paginate(image_width: u32, image_height: u32, page: PageSize) -> Vec<PagePlacement> {
	if image_width == 0 {
		return Vec::new();
	}
	let width = page.width;
	let height = f64::from(image_height) * width / f64::from(image_width);

	let mut placements = vec![PagePlacement {
		page: 0,
		x: 0.0,
		y: 0.0,
		width,
		height,
	}];
	let mut remaining = height - page.height;
	while remaining > 1e-6 {
		let index = placements.len();
		placements.push(PagePlacement {
			page: index,
			x: 0.0,
			y: -(index as f64) * page.height,
			width,
			height,
		});
		remaining -= page.height;
	}
	placements
}

/// `"Frontend Roadmap 2025"` -> `"Frontend_Roadmap_2025.pdf"`.
pub fn export_file_name(title: Option<&str>, format: ExportFormat) -> String {
	let stem = match title {
		Some(t) if !t.is_empty() => t,
		_ => "roadmap",
	};
	let stem: String = stem
		.chars()
		.map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
		.collect();
	format!("{stem}.{}", format.extension())
}

/// Turns a snapshot into a PNG bitmap (an off-screen canvas in the browser).
pub trait Rasterizer {
	/// `scale` device pixels per surface pixel.
	fn rasterize(&mut self, surface: &FlattenedSurface, scale: f64) -> Result<Bitmap, CaptureError>;
}

/// Multi-page document being assembled (jsPDF in the browser).
pub trait PaginatedDocumentWriter {
	/// Starts a new page after the current one. The first page exists from creation.
	fn add_page(&mut self) -> Result<(), ExportError>;
	/// Draws `bitmap` on the current page.
	fn place_image(&mut self, bitmap: &Bitmap, placement: &PagePlacement) -> Result<(), ExportError>;
	/// Hands the finished document to the user.
	fn save(&mut self, file_name: &str) -> Result<(), ExportError>;
}

/// Where finished exports go (browser downloads).
pub trait ExportSink {
	/// Saves a bitmap as a PNG file.
	fn save_png(&mut self, file_name: &str, bitmap: &Bitmap) -> Result<(), ExportError>;
	/// Saves an SVG document.
	fn save_svg(&mut self, file_name: &str, svg: &str) -> Result<(), ExportError>;
	/// Opens a paginated document with one blank page of size `page`.
	fn create_document(
		&mut self,
		page: PageSize,
	) -> Result<Box<dyn PaginatedDocumentWriter>, ExportError>;
}

/// Drives one export at a time through `Idle -> Preparing -> Capturing -> Finalizing -> Idle`.
/// Node effects stay suspended for as long as the pipeline is not idle.
pub struct ExportPipeline {
	state: ExportState,
	format: Option<ExportFormat>,
	rasterizer: Box<dyn Rasterizer>,
	sink: Box<dyn ExportSink>,
	page: PageSize,
	capture_scale: f64,
}

impl ExportPipeline {
	/// Idle pipeline writing `page`-sized PDFs and capturing at `capture_scale`.
	pub fn new(
		rasterizer: Box<dyn Rasterizer>,
		sink: Box<dyn ExportSink>,
		page: PageSize,
		capture_scale: f64,
	) -> Self {
		Self {
			state: ExportState::Idle,
			format: None,
			rasterizer,
			sink,
			page,
			capture_scale,
		}
	}

	/// Current state.
	pub fn state(&self) -> ExportState {
		self.state
	}

	/// Format of the export in flight.
	pub fn format(&self) -> Option<ExportFormat> {
		self.format
	}

	/// Not idle.
	pub fn in_flight(&self) -> bool {
		self.state != ExportState::Idle
	}

	/// Node hover and transition effects must stay off.
	pub fn effects_suspended(&self) -> bool {
		self.in_flight()
	}

	/// Enters `Preparing`. A second request while one is in flight is rejected.
	pub fn begin(&mut self, format: ExportFormat) -> Result<(), ExportError> {
		if self.in_flight() {
			return Err(ExportError::Busy);
		}
		self.format = Some(format);
		self.transition(ExportState::Preparing);
		Ok(())
	}

	/// Captures and writes the export, then returns to `Idle` whatever the outcome.
	pub fn capture(
		&mut self,
		surface: &FlattenedSurface,
		title: Option<&str>,
	) -> Result<ExportFormat, ExportError> {
		let Some(format) = self.format.filter(|_| self.state == ExportState::Preparing) else {
			return Err(ExportError::NothingToExport);
		};
		let result = self.run(format, surface, title);
		self.finish(result.as_ref().err());
		result.map(|()| format)
	}

	/// Abandons the in-flight export (e.g. the roadmap vanished before capture).
	pub fn abort(&mut self, err: &ExportError) {
		if self.in_flight() {
			self.finish(Some(err));
		}
	}

	fn run(
		&mut self,
		format: ExportFormat,
		surface: &FlattenedSurface,
		title: Option<&str>,
	) -> Result<(), ExportError> {
		self.transition(ExportState::Capturing);
		let file_name = export_file_name(title, format);
		match format {
			ExportFormat::Svg => {
				let svg = surface.to_svg();
				self.transition(ExportState::Finalizing);
				self.sink.save_svg(&file_name, &svg)
			}
			ExportFormat::Png => {
				let bitmap = self.rasterize(surface)?;
				self.sink.save_png(&file_name, &bitmap)
			}
			ExportFormat::Pdf => {
				let bitmap = self.rasterize(surface)?;
				let mut doc = self.sink.create_document(self.page)?;
				for placement in paginate(bitmap.width, bitmap.height, self.page) {
					if placement.page > 0 {
						doc.add_page()?;
					}
					doc.place_image(&bitmap, &placement)?;
				}
				doc.save(&file_name)
			}
		}
	}

	fn rasterize(&mut self, surface: &FlattenedSurface) -> Result<Bitmap, ExportError> {
		let bitmap = self.rasterizer.rasterize(surface, self.capture_scale)?;
		self.transition(ExportState::Finalizing);
		Ok(bitmap)
	}

	fn finish(&mut self, err: Option<&ExportError>) {
		if let Some(err) = err {
			warn!("export failed: {err}");
			self.transition(ExportState::Failed);
		}
		self.transition(ExportState::Idle);
		self.format = None;
	}

	fn transition(&mut self, next: ExportState) {
		debug!("export {:?} -> {:?}", self.state, next);
		self.state = next;
	}
}
