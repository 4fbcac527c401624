//! Session services: the repository cache and fetch orchestration.

/// Session-scoped repository handle cache.
pub mod cache;
/// Acquire request handling.
pub mod fetch;

pub use cache::{CacheState, RepositoryCache};
pub use fetch::{AcquireRequest, FetchOrchestrator};
