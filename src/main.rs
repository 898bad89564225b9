//! Browser entry point: installs logging and mounts the app.

use leptos::prelude::*;
use roadmap_canvas::{App, init_logging};

fn main() {
	init_logging();
	mount_to_body(App);
}
