//! Error types for parsing, capture and export.

/// Why an input buffer could not be turned into a roadmap.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
	/// The text is not JSON.
	#[error("Invalid JSON format: {0}")]
	Parse(#[from] serde_json::Error),

	/// JSON, but not a roadmap.
	#[error(transparent)]
	Schema(#[from] SchemaError),
}

/// Structural problem in otherwise valid JSON.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
	/// `nodes` or `dependencies` is absent or not an array.
	#[error("JSON must contain \"nodes\" and \"dependencies\" arrays.")]
	MissingArrays,

	/// A node entry failed to deserialize.
	#[error("Node #{index} is invalid: {reason}")]
	InvalidNode {
		/// Position in `nodes`.
		index: usize,
		/// Deserializer message.
		reason: String,
	},

	/// A dependency entry failed to deserialize.
	#[error("Dependency #{index} is invalid: {reason}")]
	InvalidEdge {
		/// Position in `dependencies`.
		index: usize,
		/// Deserializer message.
		reason: String,
	},

	/// Two nodes share an id.
	#[error("Node id \"{id}\" is used more than once.")]
	DuplicateNodeId {
		/// The repeated id.
		id: String,
	},
}

impl DocumentError {
	/// Short text for the error slot under the editor.
	pub fn user_message(&self) -> String {
		match self {
			Self::Parse(_) => "Invalid JSON format.".to_string(),
			Self::Schema(err) => err.to_string(),
		}
	}

	/// Placeholder shown in place of the canvas.
	pub fn placeholder(&self) -> &'static str {
		match self {
			Self::Parse(_) => "Could not render roadmap due to invalid JSON.",
			Self::Schema(_) => {
				"Invalid roadmap structure. Make sure \"nodes\" and \"dependencies\" arrays exist."
			}
		}
	}

	/// Transient notification text.
	pub fn toast(&self) -> &'static str {
		match self {
			Self::Parse(_) => "Error: Could not parse the JSON.",
			Self::Schema(_) => "Error: Invalid roadmap structure.",
		}
	}
}

/// The rasterizer could not produce a bitmap.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("capture failed: {message}")]
pub struct CaptureError {
	/// What the rasterizer reported.
	pub message: String,
}

impl CaptureError {
	/// Wraps a rasterizer message.
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}
}

/// Why an export did not produce a file.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExportError {
	/// No roadmap is rendered.
	#[error("Please generate a roadmap first!")]
	NothingToExport,

	/// Another export is still in flight.
	#[error("An export is already in progress.")]
	Busy,

	/// Rasterization failed.
	#[error(transparent)]
	Capture(#[from] CaptureError),

	/// The sink or document writer failed.
	#[error("writing export failed: {0}")]
	Write(String),
}
