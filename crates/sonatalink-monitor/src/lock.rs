use std::fmt;

/// Guard proving the calling thread holds a [`Lock`].
///
/// Conditions take this guard by `&mut` so `wait` can only be called while the
/// lock is held.
pub type LockGuard<'a, T> = parking_lot::MutexGuard<'a, T>;

/// Mutual exclusion around a value of type `T`.
///
/// At most one thread holds the lock at any instant. The lock is released when
/// the returned [`LockGuard`] is dropped, including on unwinding.
pub struct Lock<T: ?Sized> {
    name: &'static str,
    inner: parking_lot::Mutex<T>,
}

impl<T> Lock<T> {
    /// Create an anonymous lock guarding `value`.
    pub fn new(value: T) -> Self {
        Self::named("anonymous", value)
    }

    /// Create a lock with a diagnostic name.
    pub fn named(name: &'static str, value: T) -> Self {
        Self {
            name,
            inner: parking_lot::Mutex::new(value),
        }
    }

    /// Consume the lock and return the guarded value.
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T: ?Sized> Lock<T> {
    /// Acquire the lock, blocking until it is available.
    pub fn lock(&self) -> LockGuard<'_, T> {
        self.inner.lock()
    }

    /// Acquire the lock only if no other thread holds it.
    pub fn try_lock(&self) -> Option<LockGuard<'_, T>> {
        self.inner.try_lock()
    }

    /// Whether some thread currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// Mutable access without locking; `&mut self` already proves exclusivity.
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }

    /// Diagnostic name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T: Default> Default for Lock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: ?Sized> fmt::Debug for Lock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lock")
            .field("name", &self.name)
            .field("locked", &self.is_locked())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn lock_excludes_other_holders() {
        let lock = Lock::named("excl", 0u32);
        let guard = lock.lock();
        assert!(lock.is_locked());
        assert!(lock.try_lock().is_none());
        drop(guard);
        assert!(lock.try_lock().is_some());
    }

    #[test]
    fn concurrent_increments_are_serialized() {
        let lock = Arc::new(Lock::new(0u64));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lock = Arc::clone(&lock);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        *lock.lock() += 1;
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*lock.lock(), 8000);
    }

    #[test]
    fn debug_reports_name_and_state() {
        let lock = Lock::named("send", ());
        let text = format!("{lock:?}");
        assert!(text.contains("send"));
        assert!(text.contains("locked: false"));
    }
}
