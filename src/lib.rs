//! MedVault: encrypted medical-record storage service.
//!
//! A thin HTTP layer over a hosted key-value store. Callers encrypt records
//! client-side; the service stores and returns opaque blobs and never holds
//! key material. A companion batch job reaps expired auth tokens on a
//! schedule.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`store`]: Key-value store abstraction and Deta Base client
//! - [`api`]: HTTP API for record storage and retrieval
//! - [`reaper`]: Expired-token cleanup job
//! - [`metrics`]: Prometheus counters and latency histograms
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod reaper;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{Result, VaultError};
