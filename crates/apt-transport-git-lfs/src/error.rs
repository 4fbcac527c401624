//! Error taxonomy shared by request handlers.

use std::io;
use std::path::PathBuf;

use crate::infra::lock::LockError;

/// Failure raised while handling one protocol request.
///
/// Every variant is caught at the dispatch boundary and reported to the parent
/// as a `400 URI Failure`, so none of them terminates the session.
#[derive(Debug, thiserror::Error)]
pub enum MethodError {
    /// The acquire URI uses a scheme this method does not serve.
    #[error("unsupported URI scheme `{0}`")]
    UnsupportedScheme(String),
    /// The acquire URI cannot be split into a remote and a file path.
    #[error("invalid URI `{uri}`: {reason}")]
    InvalidUri { uri: String, reason: String },
    /// A request is missing a header it cannot be handled without.
    #[error("missing required header `{0}`")]
    MissingHeader(&'static str),
    /// A cache directory exists but holds no git metadata.
    #[error("`{}` exists but is not a git working tree", path.display())]
    NotARepository { path: PathBuf },
    /// An external command could not be started.
    #[error("failed to execute {program}: {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: io::Error,
    },
    /// An external command exited unsuccessfully.
    #[error("`{command}` failed ({status}): {detail}")]
    CommandFailed {
        command: String,
        status: String,
        detail: String,
    },
    /// A hashing utility printed something that is not a digest.
    #[error("unexpected output from {program}: {output:?}")]
    MalformedChecksum { program: String, output: String },
    /// The working-tree lock could not be taken.
    #[error(transparent)]
    Lock(#[from] LockError),
    /// Local filesystem failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl MethodError {
    /// Returns the stable error kind name reported in failure messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedScheme(_) => "UnsupportedScheme",
            Self::InvalidUri { .. } => "InvalidUri",
            Self::MissingHeader(_) => "MissingHeader",
            Self::NotARepository { .. } => "NotARepository",
            Self::CommandSpawn { .. } => "CommandSpawn",
            Self::CommandFailed { .. } => "CommandFailed",
            Self::MalformedChecksum { .. } => "MalformedChecksum",
            Self::Lock(_) => "Lock",
            Self::Io(_) => "Io",
        }
    }
}
