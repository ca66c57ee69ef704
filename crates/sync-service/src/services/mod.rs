//! External service integrations.

pub mod sync_trigger;

pub use sync_trigger::{RcloneSync, SyncError, SyncTrigger};
