use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;

use crate::roadmap::{CanvasView, FlatConnector, LevelLayout, RenderSession, ViewportTransform};

/// The session is shared between the page controls and the canvas loop.
pub type SessionHandle = Rc<RefCell<RenderSession>>;

#[derive(Clone, Debug, PartialEq)]
pub enum CanvasModel {
	Placeholder(String),
	Roadmap(LevelLayout),
}

/// Reactive mirror of the session. View code reads these, never the session itself.
#[derive(Clone, Copy)]
pub struct SessionSignals {
	pub canvas: RwSignal<CanvasModel>,
	pub connectors: RwSignal<Vec<FlatConnector>>,
	pub transform: RwSignal<ViewportTransform>,
	pub title: RwSignal<String>,
	pub error: RwSignal<Option<String>>,
	pub toast: RwSignal<Option<String>>,
	pub dark: RwSignal<bool>,
	pub exporting: RwSignal<bool>,
	pub sidebar_open: RwSignal<bool>,
	pub narrow: RwSignal<bool>,
}

impl SessionSignals {
	pub fn new(session: &RenderSession) -> Self {
		let signals = Self {
			canvas: RwSignal::new(CanvasModel::Placeholder(String::new())),
			connectors: RwSignal::new(Vec::new()),
			transform: RwSignal::new(ViewportTransform::IDENTITY),
			title: RwSignal::new(String::new()),
			error: RwSignal::new(None),
			toast: RwSignal::new(None),
			dark: RwSignal::new(false),
			exporting: RwSignal::new(false),
			sidebar_open: RwSignal::new(true),
			narrow: RwSignal::new(false),
		};
		signals.sync(session);
		signals
	}

	/// Copies everything the view shows out of the session.
	pub fn sync(&self, session: &RenderSession) {
		let canvas = match session.canvas() {
			CanvasView::Placeholder(text) => CanvasModel::Placeholder(text.to_string()),
			CanvasView::Roadmap(layout) => CanvasModel::Roadmap(layout.clone()),
		};
		set_if_changed(self.canvas, canvas);
		self.sync_connectors(session);
		self.sync_transform(session);
		set_if_changed(self.title, session.title());
		set_if_changed(self.error, session.error_text().map(str::to_string));
		set_if_changed(self.toast, session.toast().map(|t| t.message.clone()));
		set_if_changed(self.dark, session.theme().is_dark());
		set_if_changed(self.exporting, session.export_in_flight());
		set_if_changed(self.sidebar_open, session.sidebar_open());
		set_if_changed(self.narrow, session.is_narrow());
	}

	pub fn sync_transform(&self, session: &RenderSession) {
		set_if_changed(self.transform, session.transform());
	}

	pub fn sync_connectors(&self, session: &RenderSession) {
		let flat = session
			.connectors()
			.map(|set| set.iter().filter_map(FlatConnector::from_connector).collect())
			.unwrap_or_default();
		set_if_changed(self.connectors, flat);
	}
}

fn set_if_changed<T>(signal: RwSignal<T>, value: T)
where
	T: PartialEq + Send + Sync + 'static,
{
	if signal.with_untracked(|current| *current != value) {
		signal.set(value);
	}
}
