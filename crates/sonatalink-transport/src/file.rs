use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::connection::{write_once, Connection, ConnectionKind, Unit};
use crate::error::{Result, TransportError};

/// Send-only connection appending to a file.
///
/// The file is created if missing and never truncated. Every successful send
/// is followed by an `fsync`, so a message that `send` reported as written
/// survives a crash. A short or failed write terminates the connection.
#[derive(Debug)]
pub struct FileConnection {
    name: String,
    unit: Unit,
    path: PathBuf,
    handle: Option<File>,
}

impl FileConnection {
    pub fn new(name: impl Into<String>, unit: Unit, path: impl AsRef<Path>) -> Self {
        Self {
            name: name.into(),
            unit,
            path: path.as_ref().to_path_buf(),
            handle: None,
        }
    }

    /// The file this connection appends to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The open handle, if established.
    pub fn handle(&self) -> Option<&File> {
        self.handle.as_ref()
    }
}

impl Connection for FileConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn unit(&self) -> Unit {
        self.unit
    }

    fn kind(&self) -> ConnectionKind {
        ConnectionKind::File
    }

    fn establish(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Ok(());
        }
        let handle = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| TransportError::io(&self.name, "open", e))?;
        info!(name = %self.name, path = ?self.path, "file connection established");
        self.handle = Some(handle);
        Ok(())
    }

    fn terminate(&mut self) {
        if self.handle.take().is_some() {
            debug!(name = %self.name, path = ?self.path, "file connection terminated");
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
        if let Err(err) = write_once(&self.name, handle, bytes) {
            warn!(name = %self.name, error = %err, "write failed; terminating");
            self.terminate();
            return Err(err);
        }
        handle
            .sync_all()
            .map_err(|e| TransportError::io(&self.name, "fsync", e))
    }
}

impl Drop for FileConnection {
    fn drop(&mut self) {
        self.terminate();
    }
}
