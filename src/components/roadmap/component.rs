use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::info;
use wasm_bindgen::prelude::*;
use web_sys::{Element, MouseEvent, WheelEvent};

use super::dom::{CANVAS_ID, DomRegions, node_dom_id, now_ms, window_width};
use super::state::{CanvasModel, SessionHandle, SessionSignals};
use crate::roadmap::theme::status_color;
use crate::roadmap::{FlatConnector, LevelGroup, LevelLayout, Node, Orientation, Point};

const NO_EFFECTS: &str = "transition: none; transform: none; box-shadow: none;";

/// Pannable, zoomable surface showing the current render plus its connector overlay.
#[component]
pub fn RoadmapCanvas(session: SessionHandle, signals: SessionSignals) -> impl IntoView {
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let started = Rc::new(Cell::new(false));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (session_init, animate_init, resize_cb_init) =
		(session.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		if container_ref.get().is_none() || started.replace(true) {
			return;
		}
		let Some(window) = web_sys::window() else {
			return;
		};

		let session_resize = session_init.clone();
		*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
			let mut s = session_resize.borrow_mut();
			if s.on_resize(window_width(), now_ms()) {
				info!("layout orientation changed");
			}
			signals.sync(&s);
		}));
		if let Some(ref cb) = *resize_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let (session_anim, animate_inner) = (session_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			let now = now_ms();
			let container: Option<Element> = container_ref.get_untracked().map(Into::into);
			if let Some(regions) = container.as_ref().and_then(DomRegions::new) {
				let mut s = session_anim.borrow_mut();
				s.on_animation_frame(now);
				let report = s.tick(now, &regions);
				if report.connectors_changed() || report.export.is_some() || report.toast_dismissed {
					signals.sync(&s);
				}
			}
			if let Some(ref cb) = *animate_inner.borrow() {
				if let Some(w) = web_sys::window() {
					let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
				}
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let local_point = move |ev: &MouseEvent| -> Option<Point> {
		let container: Element = container_ref.get_untracked()?.into();
		let rect = container.get_bounding_client_rect();
		Some(Point::new(
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		))
	};

	let session_md = session.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		if let Some(p) = local_point(&ev) {
			session_md.borrow_mut().begin_pan(p.x, p.y);
		}
	};

	let session_mm = session.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let mut s = session_mm.borrow_mut();
		if !s.is_panning() {
			return;
		}
		if let Some(p) = local_point(&ev) {
			s.pan_to(p.x, p.y, now_ms());
			signals.sync_transform(&s);
		}
	};

	let session_mu = session.clone();
	let on_mouseup = move |_: MouseEvent| {
		session_mu.borrow_mut().end_pan();
	};

	let session_ml = session.clone();
	let on_mouseleave = move |_: MouseEvent| {
		session_ml.borrow_mut().end_pan();
	};

	let session_wh = session.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let mouse: &MouseEvent = &ev;
		if let Some(p) = local_point(mouse) {
			let mut s = session_wh.borrow_mut();
			s.wheel(ev.delta_y(), p, now_ms());
			signals.sync_transform(&s);
		}
	};

	let session_dc = session.clone();
	let on_dblclick = move |ev: MouseEvent| {
		if let Some(p) = local_point(&ev) {
			let mut s = session_dc.borrow_mut();
			s.double_click(p, now_ms());
			signals.sync_transform(&s);
		}
	};

	let exporting = signals.exporting;

	view! {
		<div
			node_ref=container_ref
			id=CANVAS_ID
			class="roadmap-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			on:dblclick=on_dblclick
			style="position: relative; overflow: hidden; width: 100%; height: 100%; cursor: grab;"
		>
			<div
				class="roadmap-surface"
				style=move || {
					format!(
						"transform: {}; transform-origin: 0 0; padding: 40px;",
						signals.transform.get().css(),
					)
				}
			>
				{move || match signals.canvas.get() {
					CanvasModel::Placeholder(text) => {
						view! {
							<div class="roadmap-placeholder">
								<p>{text}</p>
							</div>
						}
							.into_any()
					}
					CanvasModel::Roadmap(layout) => levels_view(layout, exporting).into_any(),
				}}
			</div>
			<svg
				class="roadmap-connectors"
				style="position: absolute; inset: 0; width: 100%; height: 100%; pointer-events: none; overflow: visible;"
			>
				{move || {
					signals.connectors.get().into_iter().map(connector_view).collect_view()
				}}
			</svg>
		</div>
	}
}

fn levels_view(layout: LevelLayout, exporting: RwSignal<bool>) -> impl IntoView {
	let stacked = layout.orientation == Orientation::Stacked;
	layout
		.groups
		.into_iter()
		.enumerate()
		.map(|(index, group)| level_view(index, group, stacked, exporting))
		.collect_view()
}

fn level_view(
	index: usize,
	group: LevelGroup,
	stacked: bool,
	exporting: RwSignal<bool>,
) -> impl IntoView {
	let label = group.show_label.then(|| {
		view! { <div class="level-label">{group.label()}</div> }
	});
	let row_class = if stacked {
		"level-nodes level-nodes-stacked"
	} else {
		"level-nodes level-nodes-rows"
	};
	let nodes = group
		.nodes
		.into_iter()
		.map(|node| node_card(node, exporting))
		.collect_view();

	view! {
		<section class="level" style=format!("animation-delay: {}ms;", index * 100)>
			{label}
			<div class=row_class>{nodes}</div>
		</section>
	}
}

fn node_card(node: Node, exporting: RwSignal<bool>) -> impl IntoView {
	let dot = format!("background-color: {};", status_color(node.status));
	let status_title = format!("Status: {}", node.status.label());
	let class = format!("roadmap-node {}", node.status.css_class());

	view! {
		<div
			id=node_dom_id(&node.id)
			class=class
			style=move || if exporting.get() { NO_EFFECTS } else { "" }
		>
			<div class="roadmap-node-header">
				<h3 class="roadmap-node-title">{node.title}</h3>
				<span class="status-dot" style=dot title=status_title></span>
			</div>
			<p class="roadmap-node-description">{node.description}</p>
		</div>
	}
}

fn connector_view(c: FlatConnector) -> impl IntoView {
	view! {
		<g class="connector">
			<path
				d=c.d
				stroke=c.color
				stroke-width=c.width.to_string()
				fill="none"
				stroke-linecap="round"
				stroke-linejoin="round"
			/>
			<path d=c.arrow_d fill=c.color />
			<circle
				cx=c.start.x.to_string()
				cy=c.start.y.to_string()
				r=c.disc_radius.to_string()
				fill=c.color
			/>
		</g>
	}
}
