//! Points, rectangles and node region lookup.

use std::collections::HashMap;

/// Position in surface or screen pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	/// Horizontal, growing right.
	pub x: f64,
	/// Vertical, growing down.
	pub y: f64,
}

impl Point {
	/// Point at `(x, y)`.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// This point moved by `(dx, dy)`.
	pub fn offset(self, dx: f64, dy: f64) -> Self {
		Self::new(self.x + dx, self.y + dy)
	}
}

/// Axis-aligned rectangle, origin at the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
	/// Left edge.
	pub x: f64,
	/// Top edge.
	pub y: f64,
	/// Extent to the right of `x`.
	pub width: f64,
	/// Extent below `y`.
	pub height: f64,
}

impl Rect {
	/// Rectangle with its top-left corner at `(x, y)`.
	pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
		Self {
			x,
			y,
			width,
			height,
		}
	}

	/// Right edge.
	pub fn right(&self) -> f64 {
		self.x + self.width
	}

	/// Bottom edge.
	pub fn bottom(&self) -> f64 {
		self.y + self.height
	}

	/// Midpoint of the top edge, where incoming connectors end.
	pub fn top_center(&self) -> Point {
		Point::new(self.x + self.width / 2.0, self.y)
	}

	/// Midpoint of the bottom edge, where outgoing connectors start.
	pub fn bottom_center(&self) -> Point {
		Point::new(self.x + self.width / 2.0, self.bottom())
	}

	/// Smallest rectangle covering both.
	pub fn union(&self, other: &Rect) -> Rect {
		let (x, y) = (self.x.min(other.x), self.y.min(other.y));
		Rect::new(
			x,
			y,
			self.right().max(other.right()) - x,
			self.bottom().max(other.bottom()) - y,
		)
	}
}

/// Resolves a node id to the rectangle its materialized element occupies, in the coordinate
/// space connectors are drawn in.
pub trait RegionLookup {
	/// `None` when the node is not materialized.
	fn region(&self, node_id: &str) -> Option<Rect>;
}

/// Fixed id -> rectangle table.
#[derive(Clone, Debug, Default)]
pub struct RegionMap {
	regions: HashMap<String, Rect>,
}

impl RegionMap {
	/// Empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Later inserts replace earlier ones for the same id.
	pub fn insert(&mut self, node_id: impl Into<String>, rect: Rect) {
		self.regions.insert(node_id.into(), rect);
	}

	/// Builder form of [`insert`](Self::insert).
	pub fn with(mut self, node_id: impl Into<String>, rect: Rect) -> Self {
		self.insert(node_id, rect);
		self
	}

	/// Forgets a node, as if its element had been removed.
	pub fn remove(&mut self, node_id: &str) -> Option<Rect> {
		self.regions.remove(node_id)
	}
}

impl RegionLookup for RegionMap {
	fn region(&self, node_id: &str) -> Option<Rect> {
		self.regions.get(node_id).copied()
	}
}

impl<L: RegionLookup + ?Sized> RegionLookup for &L {
	fn region(&self, node_id: &str) -> Option<Rect> {
		(**self).region(node_id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn anchors_and_union() {
		let a = Rect::new(10.0, 20.0, 100.0, 40.0);
		assert_eq!(a.top_center(), Point::new(60.0, 20.0));
		assert_eq!(a.bottom_center(), Point::new(60.0, 60.0));

		let b = Rect::new(-10.0, 50.0, 30.0, 30.0);
		assert_eq!(a.union(&b), Rect::new(-10.0, 20.0, 120.0, 60.0));
	}

	#[test]
	fn region_map_last_insert_wins() {
		let map = RegionMap::new()
			.with("a", Rect::new(0.0, 0.0, 1.0, 1.0))
			.with("a", Rect::new(5.0, 5.0, 1.0, 1.0));
		assert_eq!(map.region("a"), Some(Rect::new(5.0, 5.0, 1.0, 1.0)));
		assert_eq!(map.region("b"), None);
	}
}
