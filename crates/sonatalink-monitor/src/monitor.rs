use std::fmt;
use std::ops::{Add, Sub};
use std::time::Duration;

use crate::condition::Condition;
use crate::lock::{Lock, LockGuard};

/// A value guarded by a private lock, with a condition broadcast on every
/// change.
///
/// Writers go through [`set`](Self::set) or [`update`](Self::update); both
/// broadcast so every waiter re-evaluates its predicate. Readers block with
/// [`wait_until`](Self::wait_until) or one of the comparison helpers.
pub struct Monitor<T> {
    lock: Lock<T>,
    changed: Condition,
}

impl<T> Monitor<T> {
    /// Create a monitor holding `value`.
    pub fn new(value: T) -> Self {
        Self::named("monitor", value)
    }

    /// Create a monitor whose lock carries a diagnostic name.
    pub fn named(name: &'static str, value: T) -> Self {
        Self {
            lock: Lock::named(name, value),
            changed: Condition::new(),
        }
    }

    /// Assign a new value and wake all waiters.
    pub fn set(&self, value: T) {
        let mut guard = self.lock.lock();
        *guard = value;
        self.changed.broadcast();
    }

    /// Mutate the value under the lock and wake all waiters.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.lock.lock();
        let result = f(&mut *guard);
        self.changed.broadcast();
        result
    }

    /// Acquire the lock for a compound read.
    ///
    /// Changes made through this guard do not wake waiters; use
    /// [`update`](Self::update) for writes.
    pub fn lock(&self) -> LockGuard<'_, T> {
        self.lock.lock()
    }

    /// Block until `ready` holds, returning the guard with the lock held.
    pub fn wait_until<F>(&self, mut ready: F) -> LockGuard<'_, T>
    where
        F: FnMut(&T) -> bool,
    {
        let mut guard = self.lock.lock();
        self.changed.wait_while(&mut guard, |value| !ready(value));
        guard
    }

    /// Like [`wait_until`](Self::wait_until) but gives up after `timeout`.
    ///
    /// Returns `None` if the predicate still does not hold when the deadline
    /// passes.
    pub fn wait_until_for<F>(&self, timeout: Duration, mut ready: F) -> Option<LockGuard<'_, T>>
    where
        F: FnMut(&T) -> bool,
    {
        let deadline = std::time::Instant::now() + timeout;
        let mut guard = self.lock.lock();
        while !ready(&*guard) {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                return None;
            }
            self.changed.wait_for(&mut guard, remaining);
        }
        Some(guard)
    }

    /// Consume the monitor and return the value.
    pub fn into_inner(self) -> T {
        self.lock.into_inner()
    }
}

impl<T: Clone> Monitor<T> {
    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        self.lock.lock().clone()
    }
}

impl<T: PartialEq> Monitor<T> {
    /// Block as long as the value equals `value`.
    pub fn wait_while_eq(&self, value: &T) {
        let _guard = self.wait_until(|current| current != value);
    }

    /// Block as long as the value differs from `value`.
    pub fn wait_while_ne(&self, value: &T) {
        let _guard = self.wait_until(|current| current == value);
    }
}

impl<T> Monitor<T>
where
    T: Copy + PartialOrd + Add<Output = T> + Sub<Output = T> + From<u8>,
{
    /// Add one and wake all waiters.
    pub fn increment(&self) -> T {
        self.add(T::from(1))
    }

    /// Subtract one and wake all waiters.
    pub fn decrement(&self) -> T {
        self.update(|value| {
            *value = *value - T::from(1);
            *value
        })
    }

    /// Add `delta` and wake all waiters. Returns the new value.
    pub fn add(&self, delta: T) -> T {
        self.update(|value| {
            *value = *value + delta;
            *value
        })
    }

    /// Block as long as the value is less than `value`.
    pub fn wait_while_lt(&self, value: T) {
        let _guard = self.wait_until(|current| !(*current < value));
    }

    /// Block as long as the value is less than or equal to `value`.
    pub fn wait_while_le(&self, value: T) {
        let _guard = self.wait_until(|current| !(*current <= value));
    }

    /// Block as long as the value is greater than `value`.
    pub fn wait_while_gt(&self, value: T) {
        let _guard = self.wait_until(|current| !(*current > value));
    }

    /// Block as long as the value is greater than or equal to `value`.
    pub fn wait_while_ge(&self, value: T) {
        let _guard = self.wait_until(|current| !(*current >= value));
    }
}

impl<T: Default> Default for Monitor<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Monitor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lock.try_lock() {
            Some(value) => f.debug_struct("Monitor").field("value", &*value).finish(),
            None => f
                .debug_struct("Monitor")
                .field("value", &"<locked>")
                .finish(),
        }
    }
}
