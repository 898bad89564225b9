//! Coalesces geometry refresh requests so connectors follow the surface without recomputing on
//! every input event.
//!
//! Time is passed in explicitly (milliseconds), so the scheduler can be driven by
//! `requestAnimationFrame` in the browser and by plain numbers in tests.

use log::debug;

use super::config::SyncWindows;

/// Event classes that shift node positions or connector styling without changing node identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyncEvent {
	/// Pan or zoom.
	Transform,
	/// Window resize.
	Resize,
	/// Theme toggle.
	Theme,
	/// Sidebar opened or closed.
	Sidebar,
	/// Zoom reset button.
	ZoomReset,
}

impl SyncEvent {
	/// Debounce window of this event class.
	pub fn window(self, windows: &SyncWindows) -> f64 {
		match self {
			Self::Transform => windows.transform,
			Self::Resize => windows.resize,
			Self::Theme => windows.theme,
			Self::Sidebar => windows.sidebar,
			Self::ZoomReset => windows.zoom_reset,
		}
	}
}

/// Work the session performs when [`SyncScheduler::poll`] returns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncAction {
	/// Destroy and rebuild every connector.
	Reroute,
	/// Refresh geometry and style of existing connectors.
	Reposition,
	/// Export preparation settled: redraw connectors at identity transform.
	ExportRedraw,
	/// Redraw settled: hand the surface to the rasterizer.
	ExportCapture,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Timer {
	Event(SyncEvent),
	ExportSettle,
	ExportCapture,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Reroute {
	Idle,
	AwaitingFrame,
	Settling { deadline: f64 },
}

/// Per-class trailing debounce timers plus the frame-gated reroute and export steps.
#[derive(Debug)]
pub struct SyncScheduler {
	windows: SyncWindows,
	timers: Vec<(Timer, f64)>,
	reroute: Reroute,
}

impl SyncScheduler {
	/// Idle scheduler.
	pub fn new(windows: SyncWindows) -> Self {
		Self {
			windows,
			timers: Vec::new(),
			reroute: Reroute::Idle,
		}
	}

	/// Trailing debounce: a repeat of the same event class pushes its deadline out.
	pub fn notify(&mut self, event: SyncEvent, now: f64) {
		self.arm(Timer::Event(event), now + event.window(&self.windows));
	}

	/// Queues a full reroute. It fires only after one animation frame has passed and the
	/// reroute settle window has elapsed after that frame.
	pub fn request_reroute(&mut self) {
		self.reroute = Reroute::AwaitingFrame;
	}

	/// Starts the reroute settle window if a reroute was waiting for a frame.
	pub fn on_animation_frame(&mut self, now: f64) {
		if self.reroute == Reroute::AwaitingFrame {
			self.reroute = Reroute::Settling {
				deadline: now + self.windows.reroute_settle,
			};
		}
	}

	/// Arms the export settle timer; redraw and capture follow from [`poll`](Self::poll).
	pub fn begin_export(&mut self, now: f64) {
		self.arm(Timer::ExportSettle, now + self.windows.export_settle);
	}

	/// Drops pending reroute and geometry timers of the previous render. Export timers survive.
	pub fn reset(&mut self) {
		self.reroute = Reroute::Idle;
		self.timers.retain(|(t, _)| !matches!(t, Timer::Event(_)));
	}

	/// A reroute is queued but no frame has passed yet.
	pub fn awaiting_frame(&self) -> bool {
		self.reroute == Reroute::AwaitingFrame
	}

	/// Nothing pending.
	pub fn is_idle(&self) -> bool {
		self.reroute == Reroute::Idle && self.timers.is_empty()
	}

	/// Returns the actions due at `now`, in firing order. Duplicate repositions collapse into
	/// one, and a reroute due in the same poll absorbs them.
	pub fn poll(&mut self, now: f64) -> Vec<SyncAction> {
		let mut actions = Vec::new();

		if let Reroute::Settling { deadline } = self.reroute {
			if deadline <= now {
				self.reroute = Reroute::Idle;
				actions.push(SyncAction::Reroute);
			}
		}

		let mut due: Vec<(Timer, f64)> = Vec::new();
		self.timers.retain(|&(timer, deadline)| {
			if deadline <= now {
				due.push((timer, deadline));
				false
			} else {
				true
			}
		});
		due.sort_by(|a, b| a.1.total_cmp(&b.1));

		for (timer, _) in due {
			let action = match timer {
				Timer::Event(_) => SyncAction::Reposition,
				Timer::ExportSettle => {
					self.arm(Timer::ExportCapture, now + self.windows.export_redraw);
					SyncAction::ExportRedraw
				}
				Timer::ExportCapture => SyncAction::ExportCapture,
			};
			let absorbed = action == SyncAction::Reposition
				&& actions
					.iter()
					.any(|a| matches!(a, SyncAction::Reposition | SyncAction::Reroute));
			if !absorbed {
				actions.push(action);
			}
		}

		if !actions.is_empty() {
			debug!("sync actions at {now}: {actions:?}");
		}
		actions
	}

	fn arm(&mut self, timer: Timer, deadline: f64) {
		match self.timers.iter_mut().find(|(t, _)| *t == timer) {
			Some(slot) => slot.1 = deadline,
			None => self.timers.push((timer, deadline)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn scheduler() -> SyncScheduler {
		SyncScheduler::new(SyncWindows::default())
	}

	#[test]
	fn transform_bursts_collapse_to_one_trailing_reposition() {
		let mut s = scheduler();
		for t in 0..10 {
			s.notify(SyncEvent::Transform, t as f64 * 10.0);
			assert!(s.poll(t as f64 * 10.0).is_empty());
		}
		// last event at 90ms, window 30ms
		assert!(s.poll(119.0).is_empty());
		assert_eq!(s.poll(120.0), vec![SyncAction::Reposition]);
		assert!(s.poll(500.0).is_empty());
		assert!(s.is_idle());
	}

	#[test]
	fn each_event_class_has_its_own_window() {
		let mut s = scheduler();
		s.notify(SyncEvent::Theme, 0.0);
		s.notify(SyncEvent::Resize, 0.0);
		s.notify(SyncEvent::Sidebar, 0.0);
		assert!(s.poll(49.0).is_empty());
		assert_eq!(s.poll(50.0), vec![SyncAction::Reposition]);
		assert_eq!(s.poll(150.0), vec![SyncAction::Reposition]);
		assert!(s.poll(299.0).is_empty());
		assert_eq!(s.poll(300.0), vec![SyncAction::Reposition]);
	}

	#[test]
	fn simultaneous_events_reposition_once() {
		let mut s = scheduler();
		s.notify(SyncEvent::Transform, 70.0);
		s.notify(SyncEvent::Theme, 50.0);
		assert_eq!(s.poll(200.0), vec![SyncAction::Reposition]);
	}

	#[test]
	fn reroute_waits_for_a_frame_then_settles() {
		let mut s = scheduler();
		s.request_reroute();
		assert!(s.awaiting_frame());
		assert!(s.poll(1_000.0).is_empty());

		s.on_animation_frame(1_000.0);
		assert!(!s.awaiting_frame());
		// a second frame must not push the deadline
		s.on_animation_frame(1_016.0);
		assert!(s.poll(1_099.0).is_empty());
		assert_eq!(s.poll(1_100.0), vec![SyncAction::Reroute]);
		assert!(s.is_idle());
	}

	#[test]
	fn reroute_absorbs_pending_reposition() {
		let mut s = scheduler();
		s.request_reroute();
		s.on_animation_frame(0.0);
		s.notify(SyncEvent::Transform, 10.0);
		assert_eq!(s.poll(100.0), vec![SyncAction::Reroute]);
	}

	#[test]
	fn reset_drops_stale_work_but_keeps_export() {
		let mut s = scheduler();
		s.request_reroute();
		s.notify(SyncEvent::Transform, 0.0);
		s.begin_export(0.0);
		s.reset();
		assert!(!s.awaiting_frame());
		assert_eq!(s.poll(200.0), vec![SyncAction::ExportRedraw]);
	}

	#[test]
	fn export_steps_are_sequenced() {
		let mut s = scheduler();
		s.begin_export(0.0);
		assert!(s.poll(199.0).is_empty());
		assert_eq!(s.poll(210.0), vec![SyncAction::ExportRedraw]);
		assert!(s.poll(309.0).is_empty());
		assert_eq!(s.poll(310.0), vec![SyncAction::ExportCapture]);
		assert!(s.is_idle());
	}
}
