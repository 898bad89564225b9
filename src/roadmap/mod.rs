//! Headless roadmap engine: validation, level layout, connector routing, viewport transform,
//! refresh scheduling and export. Nothing in here touches the DOM.

pub mod config;
pub mod connector;
pub mod document;
pub mod error;
pub mod export;
pub mod geometry;
pub mod levels;
pub mod sample;
pub mod scheduler;
pub mod session;
pub mod theme;
pub mod toast;
pub mod viewport;

pub use config::{PageSize, RoadmapConfig, SyncWindows};
pub use connector::{Connector, ConnectorId, ConnectorPath, ConnectorSet, ConnectorStyle};
pub use document::{Edge, Node, ParsedInput, RoadmapDocument, Status, parse_document};
pub use error::{CaptureError, DocumentError, ExportError, SchemaError};
pub use export::{
	Bitmap, ExportFormat, ExportPipeline, ExportSink, ExportState, FlatConnector, FlatLabel,
	FlatNode, FlattenedSurface, PagePlacement, PaginatedDocumentWriter, Rasterizer, export_file_name,
	paginate,
};
pub use geometry::{Point, Rect, RegionLookup, RegionMap};
pub use levels::{LevelGroup, LevelLayout, Orientation, partition};
pub use scheduler::{SyncAction, SyncEvent, SyncScheduler};
pub use session::{CanvasView, RenderSession, TickReport};
pub use theme::{MemoryPreferences, Palette, PreferenceStore, Theme};
pub use toast::{Notifier, Toast};
pub use viewport::{TransformedRegions, ViewportController, ViewportTransform};
