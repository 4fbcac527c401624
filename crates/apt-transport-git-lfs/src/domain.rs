//! Pure protocol and repository-layout logic, free of process or network I/O.

/// Configuration item interpretation.
pub mod configuration;
/// Protocol message model and wire encoding.
pub mod message;
/// git-lfs pointer detection.
pub mod pointer;
/// Acquire URI translation and cache naming.
pub mod uri;
