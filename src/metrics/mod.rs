//! Metrics export.
//!
//! Pushes per-host expiry gauges to a Prometheus Push Gateway.
//!
//! # Submodules
//!
//! - `prom` - Prometheus metrics integration

pub mod prom;
