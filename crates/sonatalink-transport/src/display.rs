use std::fs::File;

use tracing::{debug, warn};

use crate::connection::{write_once, Connection, ConnectionKind, Unit};
use crate::error::{Result, TransportError};

/// Send-only connection writing to a private duplicate of standard output.
///
/// The duplicate is taken at [`establish`](Connection::establish) time, so
/// terminating the connection never closes the process's own stdout. There is
/// no durability guarantee beyond what the terminal or pipe provides.
#[derive(Debug)]
pub struct DisplayConnection {
    name: String,
    unit: Unit,
    handle: Option<File>,
}

impl DisplayConnection {
    pub fn new(name: impl Into<String>, unit: Unit) -> Self {
        Self {
            name: name.into(),
            unit,
            handle: None,
        }
    }
}

#[cfg(unix)]
fn duplicate_stdout() -> std::io::Result<File> {
    use std::os::fd::AsFd;

    let fd = std::io::stdout().as_fd().try_clone_to_owned()?;
    Ok(File::from(fd))
}

#[cfg(not(unix))]
fn duplicate_stdout() -> std::io::Result<File> {
    Err(std::io::Error::from(std::io::ErrorKind::Unsupported))
}

impl Connection for DisplayConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn unit(&self) -> Unit {
        self.unit
    }

    fn kind(&self) -> ConnectionKind {
        ConnectionKind::Display
    }

    fn establish(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Ok(());
        }
        let handle = duplicate_stdout().map_err(|e| TransportError::io(&self.name, "dup", e))?;
        debug!(name = %self.name, "display connection established");
        self.handle = Some(handle);
        Ok(())
    }

    fn terminate(&mut self) {
        if self.handle.take().is_some() {
            debug!(name = %self.name, "display connection terminated");
        }
    }

    fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let handle = self
            .handle
            .as_mut()
            .ok_or_else(|| TransportError::not_connected(&self.name))?;
        let result = write_once(&self.name, handle, bytes);
        if let Err(err) = &result {
            warn!(name = %self.name, error = %err, "write failed; terminating");
            self.terminate();
        }
        result
    }
}

impl Drop for DisplayConnection {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::Framing;

    #[test]
    fn send_before_establish_is_not_connected() {
        let mut display = DisplayConnection::new("console", Unit::NONE);
        let err = display.send(b"x").unwrap_err();
        assert!(matches!(err, TransportError::NotConnected { .. }));
    }

    #[test]
    fn establish_and_terminate_are_idempotent() {
        let mut display = DisplayConnection::new("console", Unit(1));
        display.establish().unwrap();
        display.establish().unwrap();
        assert!(display.is_connected());

        display.send(b"").unwrap();

        display.terminate();
        display.terminate();
        assert!(!display.is_connected());
    }

    #[test]
    fn display_cannot_receive() {
        let mut display = DisplayConnection::new("console", Unit::NONE);
        display.establish().unwrap();
        let err = display.receive(&Framing::new(8, 0)).unwrap_err();
        assert!(matches!(
            err,
            TransportError::Unsupported {
                kind: ConnectionKind::Display,
                ..
            }
        ));
    }
}
