use std::cell::RefCell;
use std::rc::Rc;

use leptos::ev::MouseEvent;
use leptos::prelude::*;
use log::warn;

use crate::components::roadmap::{
	BrowserExportSink, CanvasRasterizer, LocalStoragePreferences, RoadmapCanvas, SessionHandle,
	SessionSignals, canvas_center, now_ms, window_width,
};
use crate::roadmap::sample::sample_text;
use crate::roadmap::{ExportFormat, ExportPipeline, RenderSession, RoadmapConfig};

const SAMPLE_LOADED: &str = "Sample data loaded!";

fn start_session() -> Option<SessionHandle> {
	let document = web_sys::window()?.document()?;
	let config = RoadmapConfig::default();
	let export = ExportPipeline::new(
		Box::new(CanvasRasterizer::new(document.clone())),
		Box::new(BrowserExportSink::new(document)),
		config.page,
		config.capture_scale,
	);
	let session = RenderSession::new(
		config,
		Box::new(LocalStoragePreferences),
		export,
		window_width(),
	);
	Some(Rc::new(RefCell::new(session)))
}

/// Runs a session operation from a control, then refreshes the view.
#[derive(Clone)]
struct Actions {
	session: SessionHandle,
	signals: SessionSignals,
}

impl Actions {
	fn run(&self, f: impl FnOnce(&mut RenderSession, f64)) {
		let mut s = self.session.borrow_mut();
		f(&mut *s, now_ms());
		self.signals.sync(&s);
	}
}

fn close_if_narrow(s: &mut RenderSession, now: f64) {
	if s.is_narrow() {
		s.set_sidebar_open(false, now);
	}
}

/// Editor sidebar, toolbar and roadmap canvas.
#[component]
pub fn Home() -> impl IntoView {
	let Some(session) = start_session() else {
		warn!("no browser document, nothing to mount");
		return view! { <p>"This page needs a browser."</p> }.into_any();
	};
	let input = RwSignal::new(sample_text());
	let signals = {
		let mut s = session.borrow_mut();
		s.render(&input.get_untracked(), now_ms());
		SessionSignals::new(&s)
	};

	let actions = Actions {
		session: session.clone(),
		signals,
	};

	let on_render = {
		let actions = actions.clone();
		move |_: MouseEvent| {
			let text = input.get_untracked();
			actions.run(|s, now| {
				s.render(&text, now);
				close_if_narrow(s, now);
			});
		}
	};

	let on_sample = {
		let actions = actions.clone();
		move |_: MouseEvent| {
			let text = sample_text();
			input.set(text.clone());
			actions.run(|s, now| {
				s.render(&text, now);
				s.notify(SAMPLE_LOADED, now);
				close_if_narrow(s, now);
			});
		}
	};

	let on_theme = {
		let actions = actions.clone();
		move |_: MouseEvent| {
			actions.run(|s, now| {
				s.toggle_theme(now);
			})
		}
	};

	let on_sidebar_toggle = {
		let actions = actions.clone();
		move |_: MouseEvent| actions.run(|s, now| s.set_sidebar_open(!s.sidebar_open(), now))
	};

	let on_sidebar_close = {
		let actions = actions.clone();
		move |_: MouseEvent| actions.run(|s, now| s.set_sidebar_open(false, now))
	};

	let on_zoom_in = {
		let actions = actions.clone();
		move |_: MouseEvent| actions.run(|s, now| s.zoom_in(canvas_center(), now))
	};

	let on_zoom_out = {
		let actions = actions.clone();
		move |_: MouseEvent| actions.run(|s, now| s.zoom_out(canvas_center(), now))
	};

	let on_zoom_reset = {
		let actions = actions.clone();
		move |_: MouseEvent| actions.run(|s, now| s.reset_zoom(now))
	};

	let export = move |format: ExportFormat| {
		let actions = actions.clone();
		move |_: MouseEvent| {
			actions.run(|s, now| {
				// failures are reported through the toast
				let _ = s.request_export(format, now);
			})
		}
	};

	let sidebar_class = move || {
		match (signals.narrow.get(), signals.sidebar_open.get()) {
			(false, _) => "sidebar",
			(true, true) => "sidebar open",
			(true, false) => "sidebar hidden",
		}
	};

	view! {
		<div class=move || if signals.dark.get() { "app dark" } else { "app" }>
			<div
				class=move || {
					if signals.narrow.get() && signals.sidebar_open.get() {
						"mobile-overlay active"
					} else {
						"mobile-overlay"
					}
				}
				on:click=on_sidebar_close.clone()
			></div>

			<aside class=sidebar_class>
				<div class="sidebar-header">
					<h2>"Roadmap JSON"</h2>
					<button class="sidebar-close" on:click=on_sidebar_close>
						"×"
					</button>
				</div>
				<textarea
					class="json-input"
					spellcheck="false"
					placeholder="Paste your roadmap JSON here..."
					prop:value=move || input.get()
					on:input=move |ev| input.set(event_target_value(&ev))
				></textarea>
				<p class="json-error">{move || signals.error.get().unwrap_or_default()}</p>
				<div class="sidebar-actions">
					<button class="render-btn" on:click=on_render>
						"Render Roadmap"
					</button>
					<button class="sample-btn" on:click=on_sample>
						"Load Sample"
					</button>
				</div>
			</aside>

			<main class="main">
				<header class="toolbar">
					<button class="sidebar-toggle" on:click=on_sidebar_toggle>
						{move || if signals.sidebar_open.get() { "✕" } else { "☰" }}
					</button>
					<h1 class="roadmap-title">"Roadmap" {move || signals.title.get()}</h1>
					<div class="toolbar-actions">
						<button title="Zoom in" on:click=on_zoom_in>
							"+"
						</button>
						<button title="Zoom out" on:click=on_zoom_out>
							"−"
						</button>
						<button title="Reset zoom" on:click=on_zoom_reset>
							"⟲"
						</button>
						<button title="Export PNG" on:click=export(ExportFormat::Png)>
							"PNG"
						</button>
						<button title="Export PDF" on:click=export(ExportFormat::Pdf)>
							"PDF"
						</button>
						<button title="Export SVG" on:click=export(ExportFormat::Svg)>
							"SVG"
						</button>
						<button title="Toggle theme" on:click=on_theme>
							{move || if signals.dark.get() { "☀" } else { "☾" }}
						</button>
					</div>
				</header>
				<RoadmapCanvas session=session signals=signals />
			</main>

			<div class=move || {
				if signals.exporting.get() { "export-overlay active" } else { "export-overlay" }
			}>
				<p>"Exporting..."</p>
			</div>

			<div class=move || if signals.toast.get().is_some() { "toast show" } else { "toast" }>
				<span>{move || signals.toast.get().unwrap_or_default()}</span>
			</div>
		</div>
	}
		.into_any()
}
