use std::f64::consts::PI;

use log::debug;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, Path2d};

use crate::roadmap::{
	Bitmap, CaptureError, FlatConnector, FlatLabel, FlatNode, FlattenedSurface, Palette,
	Rasterizer,
};
use crate::roadmap::theme::status_color;

const CARD_RADIUS: f64 = 12.0;
const PADDING: f64 = 20.0;
const STATUS_DOT: f64 = 6.0;
const DESCRIPTION_LINE: f64 = 18.0;

pub(super) fn js_message(value: &JsValue) -> String {
	value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

/// Draws a flattened surface onto an off-screen 2D canvas and encodes it as PNG.
pub struct CanvasRasterizer {
	document: web_sys::Document,
}

impl CanvasRasterizer {
	pub fn new(document: web_sys::Document) -> Self {
		Self { document }
	}

	fn canvas(&self, width: u32, height: u32) -> Result<HtmlCanvasElement, CaptureError> {
		let canvas = self
			.document
			.create_element("canvas")
			.map_err(|e| CaptureError::new(js_message(&e)))?
			.dyn_into::<HtmlCanvasElement>()
			.map_err(|_| CaptureError::new("canvas element unavailable"))?;
		canvas.set_width(width);
		canvas.set_height(height);
		Ok(canvas)
	}
}

impl Rasterizer for CanvasRasterizer {
	fn rasterize(&mut self, surface: &FlattenedSurface, scale: f64) -> Result<Bitmap, CaptureError> {
		let width = (surface.width * scale).ceil() as u32;
		let height = (surface.height * scale).ceil() as u32;
		let canvas = self.canvas(width, height)?;
		let ctx = canvas
			.get_context("2d")
			.map_err(|e| CaptureError::new(js_message(&e)))?
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
			.ok_or_else(|| CaptureError::new("2d context unavailable"))?;

		ctx.scale(scale, scale)
			.map_err(|e| CaptureError::new(js_message(&e)))?;
		ctx.set_fill_style_str(surface.palette.background);
		ctx.fill_rect(0.0, 0.0, surface.width, surface.height);

		for label in &surface.labels {
			draw_label(&ctx, label, surface.palette);
		}
		for connector in &surface.connectors {
			draw_connector(&ctx, connector)?;
		}
		for node in &surface.nodes {
			draw_node(&ctx, node, surface.palette);
		}

		let data_url = canvas
			.to_data_url_with_type("image/png")
			.map_err(|e| CaptureError::new(js_message(&e)))?;
		debug!("rasterized {width}x{height} at {scale}x");
		Ok(Bitmap {
			width,
			height,
			data_url,
		})
	}
}

fn draw_label(ctx: &CanvasRenderingContext2d, label: &FlatLabel, palette: &Palette) {
	ctx.set_fill_style_str(palette.label);
	ctx.set_font("12px sans-serif");
	ctx.set_text_align("center");
	let _ = ctx.fill_text(&label.text.to_uppercase(), label.anchor.x, label.anchor.y);
	ctx.set_text_align("start");
}

fn draw_connector(ctx: &CanvasRenderingContext2d, c: &FlatConnector) -> Result<(), CaptureError> {
	let path = |d: &str| Path2d::new_with_path_string(d).map_err(|e| CaptureError::new(js_message(&e)));

	ctx.set_stroke_style_str(c.color);
	ctx.set_fill_style_str(c.color);
	ctx.set_line_width(c.width);
	ctx.set_line_cap("round");
	ctx.set_line_join("round");
	ctx.stroke_with_path(&path(&c.d)?);
	ctx.fill_with_path_2d(&path(&c.arrow_d)?);

	ctx.begin_path();
	let _ = ctx.arc(c.start.x, c.start.y, c.disc_radius, 0.0, 2.0 * PI);
	ctx.fill();
	Ok(())
}

fn draw_node(ctx: &CanvasRenderingContext2d, node: &FlatNode, palette: &Palette) {
	let r = node.rect;
	rounded_rect(ctx, r.x, r.y, r.width, r.height, CARD_RADIUS);
	ctx.set_fill_style_str(palette.card);
	ctx.fill();
	ctx.set_stroke_style_str(palette.card_border);
	ctx.set_line_width(1.0);
	ctx.stroke();

	ctx.begin_path();
	let _ = ctx.arc(r.right() - PADDING, r.y + PADDING + 4.0, STATUS_DOT, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(status_color(node.status));
	ctx.fill();

	ctx.set_fill_style_str(palette.title);
	ctx.set_font("bold 16px sans-serif");
	let _ = ctx.fill_text_with_max_width(
		&node.title,
		r.x + PADDING,
		r.y + PADDING + 10.0,
		r.width - PADDING * 3.0,
	);

	ctx.set_fill_style_str(palette.text);
	ctx.set_font("13px sans-serif");
	let max_width = r.width - PADDING * 2.0;
	let mut y = r.y + PADDING + 36.0;
	for line in wrap(ctx, &node.description, max_width) {
		if y > r.bottom() - PADDING / 2.0 {
			break;
		}
		let _ = ctx.fill_text(&line, r.x + PADDING, y);
		y += DESCRIPTION_LINE;
	}
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, radius: f64) {
	let radius = radius.min(w / 2.0).min(h / 2.0);
	ctx.begin_path();
	ctx.move_to(x + radius, y);
	let _ = ctx.arc_to(x + w, y, x + w, y + h, radius);
	let _ = ctx.arc_to(x + w, y + h, x, y + h, radius);
	let _ = ctx.arc_to(x, y + h, x, y, radius);
	let _ = ctx.arc_to(x, y, x + w, y, radius);
	ctx.close_path();
}

fn wrap(ctx: &CanvasRenderingContext2d, text: &str, max_width: f64) -> Vec<String> {
	let mut lines = Vec::new();
	let mut line = String::new();
	for word in text.split_whitespace() {
		let candidate = if line.is_empty() {
			word.to_string()
		} else {
			format!("{line} {word}")
		};
		let fits = ctx
			.measure_text(&candidate)
			.map(|m| m.width() <= max_width)
			.unwrap_or(true);
		if fits || line.is_empty() {
			line = candidate;
		} else {
			lines.push(std::mem::replace(&mut line, word.to_string()));
		}
	}
	if !line.is_empty() {
		lines.push(line);
	}
	lines
}
