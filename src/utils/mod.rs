//! # Utility Modules
//!
//! Supporting utilities for logging, metrics, and timekeeping.
//!
//! ## Components
//! - **Logging**: tracing subscriber setup
//! - **Metrics**: thread-safe observability counters
//! - **Time**: epoch-second stamps for registry entries

pub mod logging;
pub mod metrics;
pub mod time;

pub use metrics::Metrics;
