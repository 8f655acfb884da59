use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use sonatalink_monitor::{Lock, LockGuard, Monitor};
use tracing::debug;

use crate::connection::{Connection, Inbound};
use crate::error::Result;
use crate::framing::{Framing, Received};

/// A connection shared between threads.
///
/// Sends, establish and terminate take the connection lock, so sends from
/// different threads never interleave on the wire. Receives go through a
/// split-off [`Inbound`] handle under a lock of their own, so a thread
/// blocked waiting for input never holds up senders. Transports that cannot
/// split receive under the connection lock.
///
/// Link state is mirrored in a monitor that is updated after each operation,
/// letting threads block in [`wait_connected`](Self::wait_connected) without
/// holding the connection lock (which an accepting passive socket holds for
/// as long as it waits for a peer).
pub struct SharedConnection<C> {
    conn: Lock<C>,
    inbound: Lock<Option<(u64, Box<dyn Inbound>)>>,
    connected: Monitor<bool>,
    /// Bumped on every link state change; tags the inbound handle with the
    /// link it was split from.
    epoch: AtomicU64,
}

impl<C: Connection> SharedConnection<C> {
    pub fn new(conn: C) -> Self {
        let connected = conn.is_connected();
        Self {
            conn: Lock::named("connection", conn),
            inbound: Lock::named("inbound", None),
            connected: Monitor::named("link-state", connected),
            epoch: AtomicU64::new(0),
        }
    }

    /// Establish the connection, waking threads blocked in `wait_connected`.
    pub fn establish(&self) -> Result<()> {
        self.with(|conn| conn.establish())
    }

    /// Terminate the connection. A thread blocked in [`receive`](Self::receive)
    /// wakes with an error.
    pub fn terminate(&self) {
        self.with(|conn| conn.terminate());
        if let Some(mut inbound) = self.inbound.try_lock() {
            *inbound = None;
        }
    }

    /// Send `bytes`, serialized against every other sender.
    pub fn send(&self, bytes: &[u8]) -> Result<()> {
        self.with(|conn| conn.send(bytes))
    }

    /// Receive one framed message, serialized against other receivers only.
    ///
    /// Any failure other than a timeout terminates the connection.
    pub fn receive(&self, framing: &Framing) -> Result<Received> {
        let mut slot = self.inbound.lock();
        let cached = slot.take();
        let (epoch, mut handle) = match cached {
            Some((epoch, handle)) if epoch == self.epoch.load(Ordering::Acquire) => {
                (epoch, handle)
            }
            _ => {
                let split = self.with(|conn| {
                    conn.split_inbound()
                        .map(|handle| handle.map(|h| (self.epoch.load(Ordering::Acquire), h)))
                })?;
                match split {
                    Some(split) => split,
                    None => {
                        drop(slot);
                        return self.with(|conn| conn.receive(framing));
                    }
                }
            }
        };

        let result = handle.receive(framing);
        match &result {
            Err(err) if !err.is_timeout() => {
                self.with(|conn| {
                    // Only the link this handle was split from.
                    if self.epoch.load(Ordering::Acquire) == epoch {
                        conn.terminate();
                    }
                });
            }
            _ => *slot = Some((epoch, handle)),
        }
        result
    }

    /// Last observed link state.
    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    /// Block until the link is established.
    ///
    /// With a `timeout`, returns `false` if it expired first.
    pub fn wait_connected(&self, timeout: Option<Duration>) -> bool {
        match timeout {
            Some(timeout) => self.connected.wait_until_for(timeout, |up| *up).is_some(),
            None => {
                self.connected.wait_while_eq(&false);
                true
            }
        }
    }

    /// Run `f` with exclusive access to the connection, then publish the
    /// resulting link state.
    pub fn with<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        let mut guard = self.conn.lock();
        let result = f(&mut *guard);
        self.publish(&*guard);
        result
    }

    /// Exclusive access without publishing link state on release.
    pub fn lock(&self) -> LockGuard<'_, C> {
        self.conn.lock()
    }

    /// Consume the wrapper and return the connection.
    pub fn into_inner(self) -> C {
        self.conn.into_inner()
    }

    fn publish(&self, conn: &C) {
        let up = conn.is_connected();
        let changed = self.connected.update(|state| std::mem::replace(state, up) != up);
        if changed {
            self.epoch.fetch_add(1, Ordering::AcqRel);
            debug!(name = conn.name(), connected = up, "link state changed");
        }
    }
}
