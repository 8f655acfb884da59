use std::fmt;
use std::time::Duration;

use crate::lock::LockGuard;

/// Condition variable used together with a [`Lock`](crate::Lock).
///
/// A condition is associated with whichever lock's guard is passed to
/// [`wait`](Self::wait). It may be used with different locks over its lifetime
/// but never with two locks at the same time; doing so panics.
///
/// The borrow on the guard ties every waiter to the lifetime of its lock, so a
/// lock cannot be dropped while a thread is blocked on one of its conditions.
#[derive(Default)]
pub struct Condition {
    inner: parking_lot::Condvar,
}

impl Condition {
    /// Create a condition with no waiters.
    pub const fn new() -> Self {
        Self {
            inner: parking_lot::Condvar::new(),
        }
    }

    /// Block until signaled.
    ///
    /// The lock behind `guard` is released while blocked and re-acquired
    /// before returning. Wakeups may be spurious: callers re-check their
    /// predicate after every return. There is no implicit timeout.
    pub fn wait<T: ?Sized>(&self, guard: &mut LockGuard<'_, T>) {
        self.inner.wait(guard);
    }

    /// Block while `blocked` returns true for the guarded state.
    pub fn wait_while<T: ?Sized, F>(&self, guard: &mut LockGuard<'_, T>, mut blocked: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        while blocked(&mut **guard) {
            self.inner.wait(guard);
        }
    }

    /// Block until signaled or until `timeout` elapses.
    ///
    /// Returns `true` if the wait timed out.
    pub fn wait_for<T: ?Sized>(&self, guard: &mut LockGuard<'_, T>, timeout: Duration) -> bool {
        self.inner.wait_for(guard, timeout).timed_out()
    }

    /// Wake one waiter. Returns whether a thread was woken.
    pub fn signal(&self) -> bool {
        self.inner.notify_one()
    }

    /// Wake every waiter. Returns the number of threads woken.
    pub fn broadcast(&self) -> usize {
        self.inner.notify_all()
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::lock::Lock;

    struct Shared {
        lock: Lock<State>,
        ready: Condition,
    }

    #[derive(Default)]
    struct State {
        generation: u64,
        waiting: usize,
        woken: usize,
        tokens: usize,
    }

    #[test]
    fn two_waiters_one_signaller_never_lose_a_wakeup() {
        for _ in 0..200 {
            let shared = Arc::new(Shared {
                lock: Lock::named("state", State::default()),
                ready: Condition::new(),
            });

            let waiters: Vec<_> = (0..2)
                .map(|_| {
                    let shared = Arc::clone(&shared);
                    thread::spawn(move || {
                        let mut guard = shared.lock.lock();
                        guard.waiting += 1;
                        while guard.generation == 0 {
                            shared.ready.wait(&mut guard);
                        }
                        guard.woken += 1;
                    })
                })
                .collect();

            // waiting == 2 observed under the lock means both threads are inside wait().
            loop {
                let mut guard = shared.lock.lock();
                if guard.waiting == 2 {
                    guard.generation += 1;
                    shared.ready.broadcast();
                    break;
                }
                drop(guard);
                thread::yield_now();
            }

            for waiter in waiters {
                waiter.join().unwrap();
            }
            assert_eq!(shared.lock.lock().woken, 2);
        }
    }

    /// Spin until `ready` holds under the lock, then run `act` while still
    /// holding it.
    fn when<F, A>(shared: &Shared, ready: F, act: A)
    where
        F: Fn(&State) -> bool,
        A: FnOnce(&mut State),
    {
        loop {
            let mut guard = shared.lock.lock();
            if ready(&*guard) {
                act(&mut *guard);
                return;
            }
            drop(guard);
            thread::yield_now();
        }
    }

    #[test]
    fn one_signal_per_waiter_wakes_each_exactly_once() {
        for _ in 0..200 {
            let shared = Arc::new(Shared {
                lock: Lock::named("tokens", State::default()),
                ready: Condition::new(),
            });

            let waiters: Vec<_> = (0..2)
                .map(|_| {
                    let shared = Arc::clone(&shared);
                    thread::spawn(move || {
                        let mut guard = shared.lock.lock();
                        guard.waiting += 1;
                        shared.ready.wait_while(&mut guard, |state| state.tokens == 0);
                        guard.tokens -= 1;
                        guard.waiting -= 1;
                        guard.woken += 1;
                    })
                })
                .collect();

            let signaller = {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    when(
                        &shared,
                        |state| state.waiting == 2,
                        |state| {
                            state.tokens += 1;
                            shared.ready.signal();
                        },
                    );
                    // One waiter consumed the token; the other is still parked.
                    when(
                        &shared,
                        |state| state.woken == 1,
                        |state| {
                            assert_eq!(state.waiting, 1);
                            assert_eq!(state.tokens, 0);
                            state.tokens += 1;
                            shared.ready.signal();
                        },
                    );
                })
            };

            signaller.join().unwrap();
            for waiter in waiters {
                waiter.join().unwrap();
            }
            let state = shared.lock.lock();
            assert_eq!(state.woken, 2);
            assert_eq!(state.tokens, 0);
        }
    }

    #[test]
    fn predicate_set_before_wait_does_not_block() {
        let lock = Lock::new(true);
        let cond = Condition::new();
        let mut guard = lock.lock();
        cond.wait_while(&mut guard, |ready| !*ready);
        assert!(*guard);
    }

    #[test]
    fn wait_for_reports_timeout() {
        let lock = Lock::new(());
        let cond = Condition::new();
        let mut guard = lock.lock();
        assert!(cond.wait_for(&mut guard, Duration::from_millis(10)));
    }

    #[test]
    fn signal_without_waiters_is_harmless() {
        let cond = Condition::new();
        assert!(!cond.signal());
        assert_eq!(cond.broadcast(), 0);
    }

    #[test]
    fn wait_releases_lock_while_blocked() {
        let shared = Arc::new(Shared {
            lock: Lock::new(State::default()),
            ready: Condition::new(),
        });

        let waiter = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let mut guard = shared.lock.lock();
                guard.waiting = 1;
                shared.ready.wait_while(&mut guard, |state| state.generation == 0);
                guard.generation
            })
        };

        // The signaller can only get in if the waiter released the lock.
        loop {
            let mut guard = shared.lock.lock();
            if guard.waiting == 1 {
                guard.generation = 7;
                shared.ready.signal();
                break;
            }
            drop(guard);
            thread::yield_now();
        }

        assert_eq!(waiter.join().unwrap(), 7);
    }
}
