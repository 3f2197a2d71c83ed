//! Timeout scheduling behind an injected interface.
//!
//! DESIGN
//! ======
//! Components never call `setTimeout` directly. They receive a [`Scheduler`]
//! so rate-limit windows, typewriter chains and banner expiry can be driven
//! deterministically by [`ManualScheduler`] outside the browser.

#[cfg(test)]
#[path = "timer_test.rs"]
mod timer_test;

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// Opaque handle for a pending timeout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl TimerId {
    #[must_use]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

pub type TimerCallback = Box<dyn FnOnce()>;

/// One-shot timers plus a monotonic clock.
pub trait Scheduler {
    /// Run `callback` once, `delay_ms` milliseconds from now.
    fn set_timeout(&self, delay_ms: u32, callback: TimerCallback) -> TimerId;

    /// Cancel a pending timeout. Unknown or already-fired ids are ignored.
    fn clear_timeout(&self, id: TimerId);

    /// Milliseconds elapsed on a monotonic clock.
    fn now_ms(&self) -> f64;
}

/// Virtual-time scheduler. Nothing fires until [`ManualScheduler::advance`].
#[derive(Default)]
pub struct ManualScheduler {
    now: Cell<u64>,
    next_id: Cell<u64>,
    /// Keyed by `(due_ms, id)` so equal deadlines fire in scheduling order.
    pending: RefCell<BTreeMap<(u64, u64), TimerCallback>>,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `ms`, firing every timer that comes due.
    ///
    /// Timers scheduled by a firing callback run in the same call when their
    /// deadline still falls inside the window.
    pub fn advance(&self, ms: u64) {
        let target = self.now.get().saturating_add(ms);
        loop {
            let next = {
                let mut pending = self.pending.borrow_mut();
                match pending.keys().next().copied() {
                    Some(key) if key.0 <= target => pending.remove(&key).map(|cb| (key.0, cb)),
                    _ => None,
                }
            };
            let Some((due, callback)) = next else {
                break;
            };
            self.now.set(due);
            callback();
        }
        self.now.set(target);
    }

    /// Number of timers still waiting to fire.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Current virtual time in whole milliseconds.
    #[must_use]
    pub fn elapsed(&self) -> u64 {
        self.now.get()
    }
}

impl Scheduler for ManualScheduler {
    fn set_timeout(&self, delay_ms: u32, callback: TimerCallback) -> TimerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let due = self.now.get().saturating_add(u64::from(delay_ms));
        self.pending.borrow_mut().insert((due, id), callback);
        TimerId(id)
    }

    fn clear_timeout(&self, id: TimerId) {
        // The callback is dropped outside the borrow; its captures may touch
        // this scheduler again.
        let removed = {
            let mut pending = self.pending.borrow_mut();
            let key = pending.keys().find(|&&(_, raw)| raw == id.0).copied();
            key.and_then(|key| pending.remove(&key))
        };
        drop(removed);
    }

    #[allow(clippy::cast_precision_loss)]
    fn now_ms(&self) -> f64 {
        self.now.get() as f64
    }
}

/// `setTimeout`-backed scheduler built on `gloo-timers`.
#[cfg(feature = "hydrate")]
#[derive(Default)]
pub struct BrowserScheduler {
    next_id: Cell<u64>,
    pending: std::rc::Rc<RefCell<std::collections::HashMap<u64, gloo_timers::callback::Timeout>>>,
}

#[cfg(feature = "hydrate")]
impl Scheduler for BrowserScheduler {
    fn set_timeout(&self, delay_ms: u32, callback: TimerCallback) -> TimerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let pending = std::rc::Rc::clone(&self.pending);
        let timeout = gloo_timers::callback::Timeout::new(delay_ms, move || {
            // Dropping a gloo Timeout from inside its own callback would free the
            // running closure; detach it instead.
            let fired = pending.borrow_mut().remove(&id);
            if let Some(fired) = fired {
                drop(fired.forget());
            }
            callback();
        });
        self.pending.borrow_mut().insert(id, timeout);
        TimerId(id)
    }

    fn clear_timeout(&self, id: TimerId) {
        let cancelled = self.pending.borrow_mut().remove(&id.0);
        drop(cancelled);
    }

    fn now_ms(&self) -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map_or_else(js_sys::Date::now, |p| p.now())
    }
}
