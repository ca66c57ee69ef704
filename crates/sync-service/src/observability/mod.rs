//! Observability for the sync service.

pub mod metrics;
