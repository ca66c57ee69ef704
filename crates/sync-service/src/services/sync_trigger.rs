//! Sync trigger: runs a one-way bucket synchronization.
//!
//! The production implementation drives the `rclone` CLI. The remote is
//! configured entirely through `RCLONE_CONFIG_*` environment variables on the
//! child process, so no rclone config file is needed.

use crate::config::Config;
use async_trait::async_trait;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::instrument;

/// rclone backend type for the remote.
const REMOTE_TYPE: &str = "google cloud storage";

/// Longest stderr excerpt kept in memory and carried into logs.
const MAX_STDERR_LOG_BYTES: usize = 2048;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Invalid {role} location: {reason}")]
    InvalidLocation { role: &'static str, reason: String },

    #[error("Failed to start sync process: {0}")]
    Spawn(String),

    #[error("Sync process exited unsuccessfully: {0}")]
    Exit(String),
}

/// Trait for sync operations (enables mocking).
#[async_trait]
pub trait SyncTrigger: Send + Sync {
    /// Make `destination` mirror `source`.
    async fn sync(&self, destination: &str, source: &str) -> Result<(), SyncError>;
}

/// Sync trigger backed by `rclone sync`.
#[derive(Debug, Clone)]
pub struct RcloneSync {
    binary: String,
    remote: String,
}

impl RcloneSync {
    pub fn new(binary: impl Into<String>, remote: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            remote: remote.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.rclone_binary.clone(), config.rclone_remote.clone())
    }

    /// Resolve a location into an rclone `remote:path` argument.
    fn remote_path(&self, role: &'static str, location: &str) -> Result<String, SyncError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(SyncError::InvalidLocation {
                role,
                reason: "location is empty".to_string(),
            });
        }
        // Would be parsed as a flag by rclone
        if location.starts_with('-') {
            return Err(SyncError::InvalidLocation {
                role,
                reason: "location must not start with '-'".to_string(),
            });
        }
        Ok(format!("{}:{}", self.remote, location))
    }

    /// Environment variables that define the remote for the child process.
    fn remote_env(&self) -> [(String, String); 2] {
        let prefix = format!(
            "RCLONE_CONFIG_{}",
            self.remote.to_ascii_uppercase().replace('-', "_")
        );
        [
            (format!("{prefix}_TYPE"), REMOTE_TYPE.to_string()),
            (format!("{prefix}_BUCKET_POLICY_ONLY"), "true".to_string()),
        ]
    }
}

#[async_trait]
impl SyncTrigger for RcloneSync {
    #[instrument(skip(self), name = "sync.services.rclone")]
    async fn sync(&self, destination: &str, source: &str) -> Result<(), SyncError> {
        let src = self.remote_path("source", source)?;
        let dest = self.remote_path("destination", destination)?;

        tracing::info!(target: "sync.services.rclone", src = %src, dest = %dest, "Starting rclone sync");

        // kill_on_drop: a timed-out or cancelled request must not leave the
        // child running
        let mut child = Command::new(&self.binary)
            .arg("sync")
            .arg(&src)
            .arg(&dest)
            .envs(self.remote_env())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                tracing::error!(target: "sync.services.rclone", binary = %self.binary, error = %e, "Failed to spawn rclone");
                SyncError::Spawn(e.to_string())
            })?;

        let stderr = match child.stderr.take() {
            Some(pipe) => read_bounded(pipe, MAX_STDERR_LOG_BYTES).await.map_err(|e| {
                tracing::error!(target: "sync.services.rclone", error = %e, "Failed to read rclone stderr");
                SyncError::Spawn(e.to_string())
            })?,
            None => Vec::new(),
        };

        let status = child.wait().await.map_err(|e| {
            tracing::error!(target: "sync.services.rclone", error = %e, "Failed to wait for rclone");
            SyncError::Spawn(e.to_string())
        })?;

        if !status.success() {
            tracing::error!(
                target: "sync.services.rclone",
                status = %status,
                stderr = %String::from_utf8_lossy(&stderr),
                "rclone sync failed"
            );
            return Err(SyncError::Exit(status.to_string()));
        }

        tracing::info!(target: "sync.services.rclone", "rclone sync completed");
        Ok(())
    }
}

/// Keep the first `limit` bytes of `reader` and discard the rest.
///
/// The remainder is drained so the writer never blocks on a full pipe.
async fn read_bounded<R: AsyncRead + Unpin>(reader: R, limit: usize) -> std::io::Result<Vec<u8>> {
    let mut head = Vec::new();
    let mut limited = reader.take(limit as u64);
    limited.read_to_end(&mut head).await?;
    let mut rest = limited.into_inner();
    tokio::io::copy(&mut rest, &mut tokio::io::sink()).await?;
    Ok(head)
}

/// Mock sync trigger module for testing.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock sync trigger that records its calls.
    pub struct MockSyncTrigger {
        /// Whether to return errors.
        return_error: bool,
        /// Number of calls made.
        call_count: AtomicUsize,
        /// `(destination, source)` of every call.
        calls: Mutex<Vec<(String, String)>>,
    }

    impl MockSyncTrigger {
        /// Create a mock that always succeeds.
        pub fn succeeding() -> Self {
            Self {
                return_error: false,
                call_count: AtomicUsize::new(0),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Create a mock that always fails.
        pub fn failing() -> Self {
            Self {
                return_error: true,
                ..Self::succeeding()
            }
        }

        /// Get the number of calls made.
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        /// The `(destination, source)` arguments of the latest call.
        pub fn last_call(&self) -> Option<(String, String)> {
            self.calls
                .lock()
                .ok()
                .and_then(|calls| calls.last().cloned())
        }
    }

    #[async_trait]
    impl SyncTrigger for MockSyncTrigger {
        async fn sync(&self, destination: &str, source: &str) -> Result<(), SyncError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut calls) = self.calls.lock() {
                calls.push((destination.to_string(), source.to_string()));
            }

            if self.return_error {
                return Err(SyncError::Exit("mock sync failure".to_string()));
            }
            Ok(())
        }
    }

}
