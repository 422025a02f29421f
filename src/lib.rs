//! Demo service for watching a Horizontal Pod Autoscaler react to CPU load.
//!
//! `/api/burn` saturates every core for a bounded time, `/api/info` tells which
//! pod answered, and `/q/health/*` serve the kubelet probes.

pub mod burn;
pub mod config;
pub mod error;
pub mod health;
pub mod identity;
pub mod info;
pub mod logging;
pub mod metrics;
pub mod routes;
