//! Pan and zoom of the rendering surface.

use log::debug;

use super::config::RoadmapConfig;
use super::geometry::{Point, Rect, RegionLookup};

/// Pan/zoom transform of the rendering surface: `screen = surface * k + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportTransform {
	/// Horizontal translation in screen pixels.
	pub x: f64,
	/// Vertical translation in screen pixels.
	pub y: f64,
	/// Scale.
	pub k: f64,
}

impl Default for ViewportTransform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl ViewportTransform {
	/// No pan, scale 1.
	pub const IDENTITY: Self = Self {
		x: 0.0,
		y: 0.0,
		k: 1.0,
	};

	/// Equal to [`Self::IDENTITY`].
	pub fn is_identity(&self) -> bool {
		*self == Self::IDENTITY
	}

	/// Surface point to screen point.
	pub fn apply(&self, p: Point) -> Point {
		Point::new(p.x * self.k + self.x, p.y * self.k + self.y)
	}

	/// Surface rectangle to screen rectangle.
	pub fn apply_rect(&self, r: Rect) -> Rect {
		let origin = self.apply(Point::new(r.x, r.y));
		Rect::new(origin.x, origin.y, r.width * self.k, r.height * self.k)
	}

	/// CSS `transform` value with a top-left origin.
	pub fn css(&self) -> String {
		format!(
			"matrix({k}, 0, 0, {k}, {x}, {y})",
			k = self.k,
			x = self.x,
			y = self.y
		)
	}
}

/// Surface-space regions seen through a viewport transform.
pub struct TransformedRegions<L> {
	/// Untransformed regions.
	pub inner: L,
	/// Applied to every region read.
	pub transform: ViewportTransform,
}

impl<L: RegionLookup> RegionLookup for TransformedRegions<L> {
	fn region(&self, node_id: &str) -> Option<Rect> {
		self.inner
			.region(node_id)
			.map(|r| self.transform.apply_rect(r))
	}
}

#[derive(Clone, Debug, Default)]
struct PanState {
	active: bool,
	start_x: f64,
	start_y: f64,
	transform_start_x: f64,
	transform_start_y: f64,
}

/// Handle returned by [`ViewportController::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&ViewportTransform)>;

/// Owns the surface transform. Every change is pushed to subscribers.
pub struct ViewportController {
	transform: ViewportTransform,
	min_zoom: f64,
	max_zoom: f64,
	wheel_in_step: f64,
	wheel_out_step: f64,
	double_click_multiplier: f64,
	pan: PanState,
	listeners: Vec<(SubscriptionId, Listener)>,
	next_subscription: u64,
	disposed: bool,
}

impl ViewportController {
	/// Identity transform, zoom bounds and steps from `config`.
	pub fn new(config: &RoadmapConfig) -> Self {
		Self {
			transform: ViewportTransform::IDENTITY,
			min_zoom: config.min_zoom,
			max_zoom: config.max_zoom,
			wheel_in_step: config.wheel_in_step,
			wheel_out_step: config.wheel_out_step,
			double_click_multiplier: config.double_click_multiplier,
			pan: PanState::default(),
			listeners: Vec::new(),
			next_subscription: 0,
			disposed: false,
		}
	}

	/// Current transform.
	pub fn transform(&self) -> ViewportTransform {
		self.transform
	}

	/// A drag is in progress.
	pub fn is_panning(&self) -> bool {
		self.pan.active
	}

	/// Calls `listener` with every new transform. No-op once disposed.
	pub fn subscribe(&mut self, listener: impl FnMut(&ViewportTransform) + 'static) -> SubscriptionId {
		let id = SubscriptionId(self.next_subscription);
		self.next_subscription += 1;
		if !self.disposed {
			self.listeners.push((id, Box::new(listener)));
		}
		id
	}

	/// Removes one listener; others keep receiving.
	pub fn unsubscribe(&mut self, id: SubscriptionId) {
		self.listeners.retain(|(sub, _)| *sub != id);
	}

	/// Live subscriptions.
	pub fn subscriber_count(&self) -> usize {
		self.listeners.len()
	}

	/// Drops every subscription. Later mutations are ignored.
	pub fn dispose(&mut self) {
		self.listeners.clear();
		self.pan = PanState::default();
		self.disposed = true;
	}

	/// Starts a drag at screen point `(x, y)`.
	pub fn begin_pan(&mut self, x: f64, y: f64) {
		if self.disposed {
			return;
		}
		self.pan = PanState {
			active: true,
			start_x: x,
			start_y: y,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	/// Drag move. Ignored unless a pan is in progress.
	pub fn pan_to(&mut self, x: f64, y: f64) {
		if !self.pan.active {
			return;
		}
		let next = ViewportTransform {
			x: self.pan.transform_start_x + (x - self.pan.start_x),
			y: self.pan.transform_start_y + (y - self.pan.start_y),
			k: self.transform.k,
		};
		self.set(next);
	}

	/// Ends the drag. The transform stays where it is.
	pub fn end_pan(&mut self) {
		self.pan.active = false;
	}

	/// Shifts the translation by `(dx, dy)`.
	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		let t = self.transform;
		self.set(ViewportTransform {
			x: t.x + dx,
			y: t.y + dy,
			k: t.k,
		});
	}

	/// Sets the translation, keeping the scale.
	pub fn move_to(&mut self, x: f64, y: f64) {
		let k = self.transform.k;
		self.set(ViewportTransform { x, y, k });
	}

	/// Scales by `factor` around `anchor` (screen space), clamped to the zoom bounds.
	pub fn zoom_by(&mut self, factor: f64, anchor: Point) {
		let target = self.transform.k * factor;
		self.zoom_abs(target, anchor);
	}

	fn zoom_abs(&mut self, scale: f64, anchor: Point) {
		if !scale.is_finite() || scale <= 0.0 {
			return;
		}
		let t = self.transform;
		let new_k = scale.clamp(self.min_zoom, self.max_zoom);
		let ratio = new_k / t.k;
		self.set(ViewportTransform {
			x: anchor.x - (anchor.x - t.x) * ratio,
			y: anchor.y - (anchor.y - t.y) * ratio,
			k: new_k,
		});
	}

	/// Positive `delta_y` zooms out, negative zooms in. A flat (or NaN) delta does nothing.
	pub fn zoom_with_wheel(&mut self, delta_y: f64, anchor: Point) {
		if delta_y == 0.0 || delta_y.is_nan() {
			return;
		}
		let factor = if delta_y > 0.0 {
			self.wheel_out_step
		} else {
			self.wheel_in_step
		};
		self.zoom_by(factor, anchor);
	}

	/// Double click applies the fixed multiplier, never an accelerated one.
	pub fn double_click(&mut self, anchor: Point) {
		self.zoom_by(self.double_click_multiplier, anchor);
	}

	/// Back to [`ViewportTransform::IDENTITY`].
	pub fn reset(&mut self) {
		self.set(ViewportTransform::IDENTITY);
	}

	fn set(&mut self, next: ViewportTransform) {
		if self.disposed || next == self.transform {
			return;
		}
		self.transform = next;
		debug!("viewport -> {:?}", next);
		for (_, listener) in &mut self.listeners {
			listener(&next);
		}
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;

	fn controller() -> ViewportController {
		ViewportController::new(&RoadmapConfig::default())
	}

	fn recorded(vp: &mut ViewportController) -> Rc<RefCell<Vec<ViewportTransform>>> {
		let seen = Rc::new(RefCell::new(Vec::new()));
		let sink = Rc::clone(&seen);
		vp.subscribe(move |t| sink.borrow_mut().push(*t));
		seen
	}

	#[test]
	fn zoom_stays_within_bounds() {
		let mut vp = controller();
		for _ in 0..100 {
			vp.zoom_by(1.2, Point::new(300.0, 200.0));
		}
		assert_eq!(vp.transform().k, 3.0);
		for _ in 0..200 {
			vp.zoom_with_wheel(1.0, Point::new(10.0, 10.0));
		}
		assert_eq!(vp.transform().k, 0.1);
	}

	#[test]
	fn zoom_keeps_anchor_fixed() {
		let mut vp = controller();
		vp.move_to(40.0, -20.0);
		let anchor = Point::new(200.0, 100.0);
		let before = vp.transform();
		let surface = Point::new(
			(anchor.x - before.x) / before.k,
			(anchor.y - before.y) / before.k,
		);
		vp.zoom_by(2.0, anchor);
		let after = vp.transform().apply(surface);
		assert!((after.x - anchor.x).abs() < 1e-9);
		assert!((after.y - anchor.y).abs() < 1e-9);
	}

	#[test]
	fn reset_returns_to_identity() {
		let mut vp = controller();
		vp.pan_by(123.0, -45.0);
		vp.zoom_by(2.5, Point::new(7.0, 9.0));
		vp.reset();
		assert_eq!(vp.transform(), ViewportTransform::IDENTITY);
		assert!(vp.transform().is_identity());
	}

	#[test]
	fn every_mutation_notifies() {
		let mut vp = controller();
		let seen = recorded(&mut vp);
		vp.begin_pan(10.0, 10.0);
		vp.pan_to(30.0, 25.0);
		vp.end_pan();
		vp.pan_to(100.0, 100.0);
		vp.zoom_by(1.2, Point::default());
		vp.move_to(0.0, 0.0);
		vp.reset();
		let seen = seen.borrow();
		assert_eq!(seen.len(), 4);
		assert_eq!((seen[0].x, seen[0].y), (20.0, 15.0));
		assert_eq!(*seen.last().unwrap(), ViewportTransform::IDENTITY);
	}

	#[test]
	fn wheel_without_vertical_delta_is_ignored() {
		let mut vp = controller();
		let seen = recorded(&mut vp);
		vp.zoom_with_wheel(0.0, Point::new(50.0, 50.0));
		vp.zoom_with_wheel(-0.0, Point::new(50.0, 50.0));
		assert_eq!(vp.transform(), ViewportTransform::IDENTITY);
		assert!(seen.borrow().is_empty());

		vp.zoom_with_wheel(-3.0, Point::new(0.0, 0.0));
		assert_eq!(vp.transform().k, 1.1);
		vp.zoom_with_wheel(3.0, Point::new(0.0, 0.0));
		assert!((vp.transform().k - 0.99).abs() < 1e-9);
		assert_eq!(seen.borrow().len(), 2);
	}

	#[test]
	fn double_click_does_not_compound() {
		let mut vp = controller();
		let seen = recorded(&mut vp);
		vp.double_click(Point::new(50.0, 50.0));
		vp.double_click(Point::new(50.0, 50.0));
		assert_eq!(vp.transform(), ViewportTransform::IDENTITY);
		assert!(seen.borrow().is_empty());
	}

	#[test]
	fn dispose_drops_subscriptions() {
		let mut vp = controller();
		let seen = recorded(&mut vp);
		assert_eq!(Rc::strong_count(&seen), 2);
		vp.dispose();
		assert_eq!(vp.subscriber_count(), 0);
		assert_eq!(Rc::strong_count(&seen), 1);
		vp.pan_by(5.0, 5.0);
		assert_eq!(vp.transform(), ViewportTransform::IDENTITY);
	}

	#[test]
	fn unsubscribe_removes_one_listener() {
		let mut vp = controller();
		let a = Rc::new(RefCell::new(0));
		let b = Rc::new(RefCell::new(0));
		let (a2, b2) = (Rc::clone(&a), Rc::clone(&b));
		let id = vp.subscribe(move |_| *a2.borrow_mut() += 1);
		vp.subscribe(move |_| *b2.borrow_mut() += 1);
		vp.pan_by(1.0, 0.0);
		vp.unsubscribe(id);
		vp.pan_by(1.0, 0.0);
		assert_eq!((*a.borrow(), *b.borrow()), (1, 2));
	}

	#[test]
	fn transformed_regions_follow_the_transform() {
		use crate::roadmap::geometry::RegionMap;

		let regions = TransformedRegions {
			inner: RegionMap::new().with("a", Rect::new(10.0, 10.0, 100.0, 50.0)),
			transform: ViewportTransform {
				x: 50.0,
				y: 20.0,
				k: 2.0,
			},
		};
		assert_eq!(
			regions.region("a"),
			Some(Rect::new(70.0, 40.0, 200.0, 100.0))
		);
	}
}
