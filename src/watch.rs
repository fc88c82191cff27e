//! Change observation with a bounded polling fallback.
//!
//! A [`ChangeSource`] reports structural changes through a callback. When the
//! source cannot be installed, the check is instead re-run on a fixed interval
//! until the [`PollBudget`] is spent.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use leptos::prelude::{IntervalHandle, set_interval_with_handle};
use log::warn;

use crate::error::MapError;

/// Something that can call back whenever its watched structure changes.
pub trait ChangeSource {
	/// Install `on_change`. Fails when the source cannot observe.
	fn watch(&self, on_change: Rc<dyn Fn()>) -> Result<(), MapError>;
}

/// Interval and total duration of a polling fallback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollBudget {
	/// Time between checks.
	pub interval: Duration,
	/// Time after which polling stops.
	pub timeout: Duration,
}

impl PollBudget {
	/// Budget from millisecond values.
	pub fn from_millis(interval: u64, timeout: u64) -> Self {
		Self {
			interval: Duration::from_millis(interval),
			timeout: Duration::from_millis(timeout),
		}
	}

	/// Checks that fit in the timeout. Zero for a zero interval.
	pub fn max_checks(&self) -> u32 {
		if self.interval.is_zero() {
			return 0;
		}
		(self.timeout.as_millis() / self.interval.as_millis()) as u32
	}
}

/// Counts down the checks left in a [`PollBudget`].
#[derive(Clone, Debug)]
pub struct BoundedPoll {
	remaining: u32,
}

impl BoundedPoll {
	/// Counter holding the full budget.
	pub fn new(budget: PollBudget) -> Self {
		Self {
			remaining: budget.max_checks(),
		}
	}

	/// Consume one check. Returns `false` once the budget is exhausted, in which
	/// case the check must not run.
	pub fn tick(&mut self) -> bool {
		if self.remaining == 0 {
			return false;
		}
		self.remaining -= 1;
		true
	}
}

/// Run `check` now and on every change reported by `source`, or fall back to
/// bounded polling when the source cannot be installed.
pub fn observe_or_poll(source: &impl ChangeSource, check: Rc<dyn Fn()>, budget: PollBudget) {
	check();
	let Err(e) = source.watch(check.clone()) else {
		return;
	};
	warn!("Change observer unavailable ({e}), polling for {:?}", budget.timeout);

	let poll = Rc::new(RefCell::new(BoundedPoll::new(budget)));
	let handle: Rc<Cell<Option<IntervalHandle>>> = Rc::new(Cell::new(None));
	let handle_inner = handle.clone();
	let started = set_interval_with_handle(
		move || {
			if poll.borrow_mut().tick() {
				check();
			} else if let Some(h) = handle_inner.take() {
				h.clear();
			}
		},
		budget.interval,
	);
	match started {
		Ok(h) => handle.set(Some(h)),
		Err(e) => warn!("Failed to start polling fallback: {}", MapError::js_message(&e)),
	}
}
