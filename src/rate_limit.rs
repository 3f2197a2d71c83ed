//! Debounce and throttle wrappers for event handlers.
//!
//! DESIGN
//! ======
//! Each wrapper owns its timer state; independently created wrappers share
//! nothing. Callbacks scheduled on the [`Scheduler`] hold only a weak
//! reference back to the wrapper, so dropping the last handle cancels
//! whatever is pending.
//!
//! - [`debounce`]: fire once, `wait` ms after the last call of a burst, with
//!   that last call's arguments.
//! - [`throttle`]: fire on the leading call, then drop every call until the
//!   `limit` ms cooldown ends. Dropped calls are not queued.

#[cfg(test)]
#[path = "rate_limit_test.rs"]
mod rate_limit_test;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::timer::{Scheduler, TimerId};

// =============================================================================
// DEBOUNCE
// =============================================================================

/// Handle returned by [`debounce`]. Clones share the same pending timer.
pub struct Debounced<S: Scheduler + ?Sized + 'static, A: 'static> {
    inner: Rc<DebounceInner<S, A>>,
}

struct DebounceInner<S: Scheduler + ?Sized, A> {
    scheduler: Rc<S>,
    wait_ms: u32,
    pending: Cell<Option<TimerId>>,
    callback: Rc<RefCell<dyn FnMut(A)>>,
}

/// Wrap `callback` so it runs `wait_ms` after the most recent call.
pub fn debounce<S, A, F>(scheduler: Rc<S>, wait_ms: u32, callback: F) -> Debounced<S, A>
where
    S: Scheduler + ?Sized + 'static,
    A: 'static,
    F: FnMut(A) + 'static,
{
    let callback: Rc<RefCell<dyn FnMut(A)>> = Rc::new(RefCell::new(callback));
    Debounced {
        inner: Rc::new(DebounceInner { scheduler, wait_ms, pending: Cell::new(None), callback }),
    }
}

impl<S: Scheduler + ?Sized + 'static, A: 'static> Debounced<S, A> {
    /// Restart the quiet period with `args` as the arguments to deliver.
    pub fn call(&self, args: A) {
        let inner = &self.inner;
        if let Some(id) = inner.pending.take() {
            inner.scheduler.clear_timeout(id);
        }
        let weak: Weak<DebounceInner<S, A>> = Rc::downgrade(inner);
        let callback = Rc::clone(&inner.callback);
        let id = inner.scheduler.set_timeout(
            inner.wait_ms,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.pending.set(None);
                }
                if let Ok(mut callback) = callback.try_borrow_mut() {
                    (&mut *callback)(args);
                }
            }),
        );
        inner.pending.set(Some(id));
    }

    /// Drop the pending call, if any.
    pub fn cancel(&self) {
        if let Some(id) = self.inner.pending.take() {
            self.inner.scheduler.clear_timeout(id);
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner.pending.get().is_some()
    }
}

impl<S: Scheduler + ?Sized + 'static, A: 'static> Clone for Debounced<S, A> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<S: Scheduler + ?Sized, A> Drop for DebounceInner<S, A> {
    fn drop(&mut self) {
        if let Some(id) = self.pending.take() {
            self.scheduler.clear_timeout(id);
        }
    }
}

// =============================================================================
// THROTTLE
// =============================================================================

/// Handle returned by [`throttle`]. Clones share the same cooldown window.
pub struct Throttled<S: Scheduler + ?Sized + 'static, A: 'static> {
    inner: Rc<ThrottleInner<S, A>>,
}

struct ThrottleInner<S: Scheduler + ?Sized, A> {
    scheduler: Rc<S>,
    limit_ms: u32,
    cooldown: Cell<Option<TimerId>>,
    callback: RefCell<Box<dyn FnMut(A)>>,
}

/// Wrap `callback` so it runs at most once per `limit_ms` window.
pub fn throttle<S, A, F>(scheduler: Rc<S>, limit_ms: u32, callback: F) -> Throttled<S, A>
where
    S: Scheduler + ?Sized + 'static,
    A: 'static,
    F: FnMut(A) + 'static,
{
    Throttled {
        inner: Rc::new(ThrottleInner {
            scheduler,
            limit_ms,
            cooldown: Cell::new(None),
            callback: RefCell::new(Box::new(callback)),
        }),
    }
}

impl<S: Scheduler + ?Sized + 'static, A: 'static> Throttled<S, A> {
    /// Run the callback unless a cooldown is active. Returns whether it ran.
    pub fn call(&self, args: A) -> bool {
        let inner = &self.inner;
        if inner.cooldown.get().is_some() {
            return false;
        }
        let weak: Weak<ThrottleInner<S, A>> = Rc::downgrade(inner);
        let id = inner.scheduler.set_timeout(
            inner.limit_ms,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.cooldown.set(None);
                }
            }),
        );
        inner.cooldown.set(Some(id));

        let Ok(mut callback) = inner.callback.try_borrow_mut() else {
            return false;
        };
        (&mut *callback)(args);
        true
    }

    /// End the current cooldown early.
    pub fn cancel(&self) {
        if let Some(id) = self.inner.cooldown.take() {
            self.inner.scheduler.clear_timeout(id);
        }
    }

    #[must_use]
    pub fn is_cooling_down(&self) -> bool {
        self.inner.cooldown.get().is_some()
    }
}

impl<S: Scheduler + ?Sized + 'static, A: 'static> Clone for Throttled<S, A> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<S: Scheduler + ?Sized, A> Drop for ThrottleInner<S, A> {
    fn drop(&mut self) {
        if let Some(id) = self.cooldown.take() {
            self.scheduler.clear_timeout(id);
        }
    }
}
