//! Grouping of nodes into levels and the orientation they are laid out in.

use std::collections::BTreeMap;

use super::config::RoadmapConfig;
use super::document::Node;

/// How nodes inside a level are arranged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
	/// One node per row, full width. Used on narrow viewports.
	Stacked,
	/// Nodes flow left to right and wrap.
	Rows,
}

impl Orientation {
	/// Stacked below the narrow breakpoint, rows otherwise.
	pub fn for_viewport(viewport_width: f64, config: &RoadmapConfig) -> Self {
		if config.is_narrow(viewport_width) {
			Self::Stacked
		} else {
			Self::Rows
		}
	}
}

/// Nodes sharing one level.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelGroup {
	/// Level number from the document.
	pub level: i64,
	/// In document order.
	pub nodes: Vec<Node>,
	/// Whether the `Level N` caption is drawn.
	pub show_label: bool,
}

impl LevelGroup {
	/// `"Level N"`.
	pub fn label(&self) -> String {
		format!("Level {}", self.level)
	}
}

/// Layout instructions handed to the surface that materializes nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelLayout {
	/// Ascending by level.
	pub groups: Vec<LevelGroup>,
	/// How nodes flow inside each group.
	pub orientation: Orientation,
}

impl LevelLayout {
	/// Partitions `nodes` and picks the orientation for `viewport_width`.
	pub fn new(nodes: &[Node], viewport_width: f64, config: &RoadmapConfig) -> Self {
		Self {
			groups: partition(nodes, config.level_label_threshold),
			orientation: Orientation::for_viewport(viewport_width, config),
		}
	}

	/// Re-evaluates the orientation. Returns `true` when it changed.
	pub fn relayout(&mut self, viewport_width: f64, config: &RoadmapConfig) -> bool {
		let orientation = Orientation::for_viewport(viewport_width, config);
		let changed = orientation != self.orientation;
		self.orientation = orientation;
		changed
	}

	/// Nodes across all groups.
	pub fn node_count(&self) -> usize {
		self.groups.iter().map(|g| g.nodes.len()).sum()
	}
}

/// Groups nodes by level, ascending numerically, keeping first-seen order inside each group.
pub fn partition(nodes: &[Node], label_threshold: usize) -> Vec<LevelGroup> {
	let mut by_level: BTreeMap<i64, Vec<Node>> = BTreeMap::new();
	for node in nodes {
		by_level.entry(node.level).or_default().push(node.clone());
	}
	let level_count = by_level.len();
	by_level
		.into_iter()
		.map(|(level, nodes)| LevelGroup {
			level,
			show_label: nodes.len() > 1 || level_count > label_threshold,
			nodes,
		})
		.collect()
}
