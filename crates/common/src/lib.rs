//! Common utilities shared across the bucket sync crates.

#![warn(clippy::pedantic)]

/// Module for JWT utilities (validation errors, size limits, clock skew, kid extraction)
pub mod jwt;
