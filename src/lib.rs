//! Roadmap canvas: renders a JSON dependency roadmap as levelled node cards joined by curved
//! connectors, with pan/zoom and PNG/PDF/SVG export.
//!
//! [`roadmap`] is the DOM-free engine and is what the tests drive. The Leptos components and
//! pages wire it to the browser.

use leptos::prelude::*;
use leptos_meta::{Meta, Title, provide_meta_context};
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;
use log::{Level, info};

mod components;
mod pages;
pub mod roadmap;

use crate::pages::home::Home;
use crate::pages::not_found::NotFound;

/// Routes `log` output to the browser console and installs the panic hook.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("roadmap-canvas {}", env!("CARGO_PKG_VERSION"));
}

/// Root component: the editor at `/`, a 404 page everywhere else.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	view! {
		<Title text="Roadmap Canvas" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=Home />
			</Routes>
		</Router>
	}
}
