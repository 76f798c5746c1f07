//! imgpro - batch image transform pipeline
//!
//! Scanned images go through expand, rotate, crop and enhance with bounded
//! concurrency, are optionally split into one item per detected object, and
//! can be sent to an external analysis service before export.
//! This library exposes modules for integration testing.

pub mod api;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
