//! Building-permit project cost estimation service.
//!
//! The crate wraps a set of externally trained regression pipelines behind a
//! small HTTP API and CLI. Each request derives engineered features from the
//! raw permit attributes, validates required inputs, and dispatches to either
//! a single base pipeline or to a bracket-specific pipeline chosen by a
//! first-pass estimate.

pub mod config;
pub mod error;
pub mod estimator;
pub mod telemetry;
