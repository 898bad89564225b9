use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlAnchorElement};

use super::render::js_message;
use crate::roadmap::{
	Bitmap, ExportError, ExportSink, PagePlacement, PageSize, PaginatedDocumentWriter,
	Point, PreferenceStore, Rect, RegionLookup,
};

pub fn now_ms() -> f64 {
	js_sys::Date::now()
}

pub fn window_width() -> f64 {
	web_sys::window()
		.and_then(|w| w.inner_width().ok())
		.and_then(|v| v.as_f64())
		.unwrap_or(1024.0)
}

pub(super) const CANVAS_ID: &str = "roadmap-canvas";

/// Center of the canvas container in its own coordinates.
pub fn canvas_center() -> Point {
	web_sys::window()
		.and_then(|w| w.document())
		.and_then(|d| d.get_element_by_id(CANVAS_ID))
		.map(|el| {
			Point::new(
				f64::from(el.client_width()) / 2.0,
				f64::from(el.client_height()) / 2.0,
			)
		})
		.unwrap_or_default()
}

pub(super) fn node_dom_id(node_id: &str) -> String {
	format!("node-{node_id}")
}

/// Node boxes as currently laid out, relative to the canvas container's top-left corner.
pub(super) struct DomRegions {
	document: web_sys::Document,
	origin: Rect,
}

impl DomRegions {
	pub(super) fn new(container: &Element) -> Option<Self> {
		let document = web_sys::window()?.document()?;
		Some(Self {
			document,
			origin: rect_of(container),
		})
	}
}

impl RegionLookup for DomRegions {
	fn region(&self, node_id: &str) -> Option<Rect> {
		let element = self.document.get_element_by_id(&node_dom_id(node_id))?;
		let r = rect_of(&element);
		Some(Rect::new(
			r.x - self.origin.x,
			r.y - self.origin.y,
			r.width,
			r.height,
		))
	}
}

fn rect_of(element: &Element) -> Rect {
	let r = element.get_bounding_client_rect();
	Rect::new(r.left(), r.top(), r.width(), r.height())
}

/// Theme flag persisted in `window.localStorage`.
pub struct LocalStoragePreferences;

impl LocalStoragePreferences {
	fn storage() -> Option<web_sys::Storage> {
		web_sys::window()?.local_storage().ok().flatten()
	}
}

impl PreferenceStore for LocalStoragePreferences {
	fn get(&self, key: &str) -> Option<String> {
		Self::storage()?.get_item(key).ok().flatten()
	}

	fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
		let storage = Self::storage().ok_or("localStorage unavailable")?;
		storage.set_item(key, value).map_err(|e| js_message(&e))
	}
}

// `window.jspdf.jsPDF`, loaded from a script tag.
#[wasm_bindgen(js_namespace = jspdf)]
extern "C" {
	#[wasm_bindgen(js_name = jsPDF)]
	type JsPdf;

	#[wasm_bindgen(constructor, js_class = "jsPDF", catch)]
	fn new(orientation: &str, unit: &str, format: &JsValue) -> Result<JsPdf, JsValue>;

	#[wasm_bindgen(method, js_name = addImage, catch)]
	fn add_image(
		this: &JsPdf,
		data_url: &str,
		kind: &str,
		x: f64,
		y: f64,
		width: f64,
		height: f64,
	) -> Result<(), JsValue>;

	#[wasm_bindgen(method, js_name = addPage, catch)]
	fn add_page(this: &JsPdf) -> Result<(), JsValue>;

	#[wasm_bindgen(method, catch)]
	fn save(this: &JsPdf, file_name: &str) -> Result<(), JsValue>;
}

struct JsPdfWriter {
	pdf: JsPdf,
}

impl PaginatedDocumentWriter for JsPdfWriter {
	fn add_page(&mut self) -> Result<(), ExportError> {
		self.pdf.add_page().map_err(write_error)
	}

	fn place_image(&mut self, bitmap: &Bitmap, placement: &PagePlacement) -> Result<(), ExportError> {
		self.pdf
			.add_image(
				&bitmap.data_url,
				"PNG",
				placement.x,
				placement.y,
				placement.width,
				placement.height,
			)
			.map_err(write_error)
	}

	fn save(&mut self, file_name: &str) -> Result<(), ExportError> {
		self.pdf.save(file_name).map_err(write_error)
	}
}

fn write_error(err: JsValue) -> ExportError {
	ExportError::Write(js_message(&err))
}

/// Downloads PNG and SVG files through a temporary anchor and builds PDFs with jsPDF.
pub struct BrowserExportSink {
	document: web_sys::Document,
}

impl BrowserExportSink {
	pub fn new(document: web_sys::Document) -> Self {
		Self { document }
	}

	fn download(&self, file_name: &str, href: &str) -> Result<(), ExportError> {
		let link = self
			.document
			.create_element("a")
			.map_err(write_error)?
			.dyn_into::<HtmlAnchorElement>()
			.map_err(|_| ExportError::Write("anchor element unavailable".into()))?;
		link.set_download(file_name);
		link.set_href(href);
		link.click();
		debug!("downloaded {file_name}");
		Ok(())
	}
}

impl ExportSink for BrowserExportSink {
	fn save_png(&mut self, file_name: &str, bitmap: &Bitmap) -> Result<(), ExportError> {
		self.download(file_name, &bitmap.data_url)
	}

	fn save_svg(&mut self, file_name: &str, svg: &str) -> Result<(), ExportError> {
		let encoded = String::from(js_sys::encode_uri_component(svg));
		self.download(
			file_name,
			&format!("data:image/svg+xml;charset=utf-8,{encoded}"),
		)
	}

	fn create_document(
		&mut self,
		page: PageSize,
	) -> Result<Box<dyn PaginatedDocumentWriter>, ExportError> {
		let format = js_sys::Array::of2(
			&JsValue::from_f64(page.width),
			&JsValue::from_f64(page.height),
		);
		let pdf = JsPdf::new("l", "mm", &format.into()).map_err(|err| {
			warn!("jsPDF is not available: {}", js_message(&err));
			write_error(err)
		})?;
		Ok(Box::new(JsPdfWriter { pdf }))
	}
}
