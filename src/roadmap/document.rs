//! The roadmap document model and validation of the editor buffer.

use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::error::{DocumentError, SchemaError};

/// Progress of a node, shown as a colored dot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
	/// `"completed"`
	Completed,
	/// `"in-progress"`
	InProgress,
	/// `"planned"`, and anything unrecognised.
	#[default]
	Planned,
	/// `"on-hold"`
	OnHold,
}

impl Status {
	/// Unknown labels read as [`Status::Planned`].
	pub fn from_label(label: &str) -> Self {
		match label {
			"completed" => Self::Completed,
			"in-progress" => Self::InProgress,
			"on-hold" => Self::OnHold,
			_ => Self::Planned,
		}
	}

	/// Human-readable name for tooltips.
	pub fn label(self) -> &'static str {
		match self {
			Self::Completed => "Completed",
			Self::InProgress => "In Progress",
			Self::Planned => "Planned",
			Self::OnHold => "On Hold",
		}
	}

	/// Class added to the node card.
	pub fn css_class(self) -> &'static str {
		match self {
			Self::Completed => "status-completed",
			Self::InProgress => "status-in-progress",
			Self::Planned => "status-planned",
			Self::OnHold => "status-on-hold",
		}
	}
}

/// One roadmap item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
	/// Unique within the document.
	pub id: String,
	/// Card heading; missing or `null` is empty.
	#[serde(default, deserialize_with = "nullable_text")]
	pub title: String,
	/// Card body; missing or `null` is empty.
	#[serde(default, deserialize_with = "nullable_text")]
	pub description: String,
	/// Unknown or `null` labels read as planned.
	#[serde(default, deserialize_with = "lenient_status")]
	pub status: Status,
	/// Integral; `2.0` and `"2"` are accepted too.
	#[serde(default, deserialize_with = "integer_level")]
	pub level: i64,
}

/// Dependency: `to` builds on `from`. Either end may name a missing node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
	/// Source node id.
	pub from: String,
	/// Target node id.
	pub to: String,
}

/// A validated roadmap, immutable for the render it belongs to.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadmapDocument {
	/// Shown next to the app name and used for export file names.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	/// Ids are unique.
	pub nodes: Vec<Node>,
	/// In input order.
	pub dependencies: Vec<Edge>,
}

impl RoadmapDocument {
	/// Node with the given id.
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Title suffix shown next to the app name, e.g. `": Frontend Roadmap"`.
	pub fn display_title(&self) -> String {
		match self.title.as_deref() {
			Some(t) if !t.is_empty() => format!(": {t}"),
			_ => String::new(),
		}
	}
}

/// Result of validating the editor buffer.
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedInput {
	/// Nothing but whitespace.
	Blank,
	/// Well-formed, but without nodes.
	Empty,
	/// At least one node.
	Roadmap(RoadmapDocument),
}

/// Parses and validates the editor buffer. Dangling dependencies are kept.
pub fn parse_document(text: &str) -> Result<ParsedInput, DocumentError> {
	if text.trim().is_empty() {
		return Ok(ParsedInput::Blank);
	}
	let value: Value = serde_json::from_str(text)?;
	let doc = validate(&value)?;
	if doc.nodes.is_empty() {
		return Ok(ParsedInput::Empty);
	}
	debug!(
		"validated roadmap: {} nodes, {} dependencies",
		doc.nodes.len(),
		doc.dependencies.len()
	);
	Ok(ParsedInput::Roadmap(doc))
}

fn validate(value: &Value) -> Result<RoadmapDocument, SchemaError> {
	let (Some(Value::Array(raw_nodes)), Some(Value::Array(raw_edges))) =
		(value.get("nodes"), value.get("dependencies"))
	else {
		return Err(SchemaError::MissingArrays);
	};

	let mut seen = HashSet::new();
	let mut nodes = Vec::with_capacity(raw_nodes.len());
	for (index, raw) in raw_nodes.iter().enumerate() {
		let node = Node::deserialize(raw).map_err(|e| SchemaError::InvalidNode {
			index,
			reason: e.to_string(),
		})?;
		if !seen.insert(node.id.clone()) {
			return Err(SchemaError::DuplicateNodeId { id: node.id });
		}
		nodes.push(node);
	}

	let dependencies = raw_edges
		.iter()
		.enumerate()
		.map(|(index, raw)| {
			Edge::deserialize(raw).map_err(|e| SchemaError::InvalidEdge {
				index,
				reason: e.to_string(),
			})
		})
		.collect::<Result<Vec<_>, _>>()?;

	let title = value
		.get("title")
		.and_then(Value::as_str)
		.map(str::to_string);

	Ok(RoadmapDocument {
		title,
		nodes,
		dependencies,
	})
}

/// `null` reads as an empty string, like a missing field.
fn nullable_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_status<'de, D>(deserializer: D) -> Result<Status, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = Option::<String>::deserialize(deserializer)?;
	Ok(raw.as_deref().map(Status::from_label).unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LevelRepr {
	Int(i64),
	Float(f64),
	Text(String),
}

fn integer_level<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
	D: Deserializer<'de>,
{
	use serde::de::Error;

	match LevelRepr::deserialize(deserializer)? {
		LevelRepr::Int(level) => Ok(level),
		LevelRepr::Float(f) if f.fract() == 0.0 && f.is_finite() => Ok(f as i64),
		LevelRepr::Float(f) => Err(D::Error::custom(format!("level {f} is not an integer"))),
		LevelRepr::Text(s) => s
			.trim()
			.parse()
			.map_err(|_| D::Error::custom(format!("level \"{s}\" is not an integer"))),
	}
}
