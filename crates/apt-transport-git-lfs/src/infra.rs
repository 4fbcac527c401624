//! Infrastructure adapters for external commands, git, and the filesystem.

/// Coreutils-backed file digests.
pub mod checksum;
/// Injectable external command boundary.
pub mod command;
/// Working-tree operations through git and git-lfs.
pub mod git;
pub mod lock;
/// Message framing over stdin/stdout.
pub mod stdio;
