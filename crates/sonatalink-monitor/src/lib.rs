//! Monitor primitives: mutual exclusion plus predicate wait/signal.
//!
//! This is the lowest layer of sonatalink. A monitor pairs one [`Lock`] with
//! one or more [`Condition`]s:
//!
//! 1. acquire the lock,
//! 2. evaluate a predicate over the guarded state,
//! 3. while it is false, [`Condition::wait`] on the guard.
//!
//! `wait` releases the lock atomically while blocked and re-acquires it before
//! returning. Wakeups may be spurious, so the predicate is always re-checked in
//! a loop. [`Monitor`] bundles a private lock, its state and a condition for
//! the common "wait until the value changes" case.

pub mod condition;
pub mod lock;
pub mod monitor;

pub use condition::Condition;
pub use lock::{Lock, LockGuard};
pub use monitor::Monitor;
