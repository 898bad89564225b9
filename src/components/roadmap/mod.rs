mod component;
mod dom;
mod render;
mod state;

pub use component::RoadmapCanvas;
pub use dom::{BrowserExportSink, LocalStoragePreferences, canvas_center, now_ms, window_width};
pub use render::CanvasRasterizer;
pub use state::{SessionHandle, SessionSignals};
