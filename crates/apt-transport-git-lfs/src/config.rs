//! Process settings read from the environment at startup.
//!
//! Settings APT pushes at runtime arrive through `601 Configuration` instead;
//! see [`crate::domain::configuration`].

use std::path::PathBuf;

/// Overrides the directory holding cached working trees.
pub const CACHE_DIR_ENV: &str = "APT_GIT_LFS_CACHE_DIR";
/// Log filter directives, in `tracing-subscriber` `EnvFilter` syntax.
pub const LOG_ENV: &str = "APT_GIT_LFS_LOG";
pub const DEFAULT_CACHE_DIR: &str = "/var/cache/apt/git-lfs";
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Startup configuration of the method process.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MethodConfig {
    pub cache_root: PathBuf,
    pub log_filter: String,
}

impl MethodConfig {
    /// Loads configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| lookup(key).filter(|value: &String| !value.trim().is_empty());

        Self {
            cache_root: value(CACHE_DIR_ENV)
                .map_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR), PathBuf::from),
            log_filter: value(LOG_ENV).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }
}
