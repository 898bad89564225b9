//! Single-slot transient notifications.

/// Message on screen until `expires_at`.
#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
	/// Text shown to the user.
	pub message: String,
	/// Dismissal time in milliseconds.
	pub expires_at: f64,
}

/// Holds at most one transient message; a newer message replaces the current one.
#[derive(Debug)]
pub struct Notifier {
	default_duration: f64,
	current: Option<Toast>,
}

impl Notifier {
	/// Notifier whose toasts last `default_duration` ms.
	pub fn new(default_duration: f64) -> Self {
		Self {
			default_duration,
			current: None,
		}
	}

	/// Shows `message` for the default duration.
	pub fn show(&mut self, message: impl Into<String>, now: f64) {
		self.show_for(message, self.default_duration, now);
	}

	/// Shows `message` for `duration` ms.
	pub fn show_for(&mut self, message: impl Into<String>, duration: f64, now: f64) {
		self.current = Some(Toast {
			message: message.into(),
			expires_at: now + duration,
		});
	}

	/// The toast on screen, if any.
	pub fn current(&self) -> Option<&Toast> {
		self.current.as_ref()
	}

	/// Dismisses an expired toast. Returns `true` if one was dismissed.
	pub fn tick(&mut self, now: f64) -> bool {
		if self.current.as_ref().is_some_and(|t| t.expires_at <= now) {
			self.current = None;
			return true;
		}
		false
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn toast_expires_after_its_duration() {
		let mut n = Notifier::new(3000.0);
		n.show("Sample data loaded!", 100.0);
		assert!(!n.tick(3099.0));
		assert_eq!(n.current().unwrap().message, "Sample data loaded!");
		assert!(n.tick(3100.0));
		assert!(n.current().is_none());
	}

	#[test]
	fn newer_toast_replaces_older() {
		let mut n = Notifier::new(3000.0);
		n.show("first", 0.0);
		n.show_for("second", 500.0, 1000.0);
		assert_eq!(n.current().unwrap().message, "second");
		assert!(n.tick(1500.0));
	}
}
