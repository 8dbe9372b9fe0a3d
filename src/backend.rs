//! Collaborator contracts consumed by the synchronization layer.
//!
//! The concrete fetch service lives behind [`RobotFetcher`]; the registry
//! only ever sees the trait. Failures stay opaque here, and what to tell
//! the operator is the caller's decision.

use std::future::Future;

use crate::models::Robot;

/// Bulk-fetch service returning the current full list of known robots.
///
/// Idempotent and argument-free; the synchronization layer invokes it once
/// per activation and never retries on its own.
pub trait RobotFetcher: Send + Sync + 'static {
    fn fetch_all(&self) -> impl Future<Output = anyhow::Result<Vec<Robot>>> + Send;
}
