//! Single instance lock using Unix socket.
//!
//! Only one monitor may own the float switch pin and the accessory port. A
//! Unix socket is used because the OS releases it when the process dies,
//! avoiding stale lock files.

use crate::error::MonitorError;
use std::io;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use thiserror::Error;

const SOCKET_NAME: &str = "water-level-monitor.sock";

/// Error types for instance lock operations.
#[derive(Debug, Error)]
pub enum InstanceLockError {
    /// Another instance is already running.
    #[error("another instance is already running")]
    AlreadyRunning,

    /// I/O error during lock acquisition.
    #[error("failed to acquire instance lock: {0}")]
    Io(#[from] io::Error),
}

impl From<InstanceLockError> for MonitorError {
    fn from(e: InstanceLockError) -> Self {
        match e {
            InstanceLockError::AlreadyRunning => MonitorError::AlreadyRunning,
            InstanceLockError::Io(e) => MonitorError::IoError(e),
        }
    }
}

/// Single instance lock using a Unix socket.
///
/// The lock is held as long as this struct exists. When dropped, the socket
/// file is removed.
pub struct InstanceLock {
    _listener: UnixListener,
    path: PathBuf,
}

impl InstanceLock {
    /// Acquire the lock at the default location.
    pub fn acquire() -> Result<Self, InstanceLockError> {
        Self::acquire_at(Self::socket_path())
    }

    /// Acquire the lock on a specific socket path.
    pub fn acquire_at(path: PathBuf) -> Result<Self, InstanceLockError> {
        // A socket file nobody listens on is left over from a killed process
        if path.exists() {
            if UnixStream::connect(&path).is_ok() {
                return Err(InstanceLockError::AlreadyRunning);
            }
            let _ = std::fs::remove_file(&path);
        }

        match UnixListener::bind(&path) {
            Ok(listener) => Ok(Self {
                _listener: listener,
                path,
            }),
            // Another instance bound between our check and bind
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                Err(InstanceLockError::AlreadyRunning)
            }
            Err(e) => Err(InstanceLockError::Io(e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the path to the socket file.
    pub fn socket_path() -> PathBuf {
        Self::socket_path_in(std::env::var("XDG_RUNTIME_DIR").ok().as_deref())
    }

    /// Socket path inside `runtime_dir`, falling back to `/tmp`.
    fn socket_path_in(runtime_dir: Option<&str>) -> PathBuf {
        runtime_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(SOCKET_NAME)
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
