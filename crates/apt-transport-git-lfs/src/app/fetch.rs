//! Fetch orchestration: one `600 URI Acquire` request end to end.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use time::OffsetDateTime;
use time::macros::format_description;
use tokio::io::AsyncWrite;
use tracing::{info, warn};

use crate::app::cache::{CacheState, RepositoryCache};
use crate::domain::configuration::ConfigurationUpdate;
use crate::domain::message::{Header, Message, MessageCode};
use crate::domain::pointer::resolve_content_path;
use crate::domain::uri::translate;
use crate::error::MethodError;
use crate::infra::checksum::compute_checksums;
use crate::infra::command::CommandExecutor;
use crate::infra::lock::acquire_lock;
use crate::infra::stdio::MessageWriter;

/// Status text sent before slow repository work.
pub const WAITING_MESSAGE: &str = "Waiting for headers";
/// Failure text for files missing from the repository.
pub const NOT_FOUND_MESSAGE: &str = "404 Not Found";
/// Fail reason telling the parent not to retry a missing file.
pub const NOT_FOUND_REASON: &str = "HttpError404";

/// Parsed `600 URI Acquire` request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AcquireRequest {
    pub uri: String,
    pub filename: PathBuf,
}

impl AcquireRequest {
    /// Extracts the request from an acquire message.
    ///
    /// # Errors
    /// Returns [`MethodError::MissingHeader`] when `URI` or `Filename` is
    /// absent.
    pub fn from_message(message: &Message) -> Result<Self, MethodError> {
        let uri = message
            .header(Header::Uri)
            .ok_or(MethodError::MissingHeader(Header::Uri.as_str()))?;
        let filename = message
            .header(Header::Filename)
            .ok_or(MethodError::MissingHeader(Header::Filename.as_str()))?;

        Ok(Self {
            uri: uri.to_string(),
            filename: PathBuf::from(filename),
        })
    }
}

/// Owns the session state needed to satisfy acquire requests.
pub struct FetchOrchestrator {
    executor: CommandExecutor,
    cache: RepositoryCache,
}

impl FetchOrchestrator {
    /// Creates an orchestrator over `cache` running commands with `executor`.
    pub fn new(executor: CommandExecutor, cache: RepositoryCache) -> Self {
        Self { executor, cache }
    }

    /// Applies settings pushed by a configuration message.
    pub fn apply_configuration(&mut self, update: ConfigurationUpdate) {
        if let Some(proxy) = update.proxy {
            info!(%proxy, "Using proxy for git commands");
            self.executor.set_proxy(&proxy);
        }
    }

    /// Fetches the file named by `request` into its destination and reports
    /// progress and the result to the parent.
    ///
    /// A file missing from the repository is reported as a permanent
    /// not-found failure and is not an error. On a cache miss `102 Status`
    /// precedes the clone or sync, so that failure then follows a Status;
    /// on a live repository the failure is the only message.
    ///
    /// # Errors
    /// Returns an error when the URI cannot be translated, the repository
    /// cannot be synced, a command fails, or local I/O fails. Nothing but a
    /// possible `102 Status` has been sent for the request in that case.
    pub async fn acquire<W>(
        &mut self,
        request: &AcquireRequest,
        writer: &mut MessageWriter<W>,
    ) -> Result<(), MethodError>
    where
        W: AsyncWrite + Unpin,
    {
        let location = translate(&request.uri)?;
        let _lock = acquire_lock(self.cache.lock_path(&location.remote)).await?;

        let mut status_sent = false;
        if self.cache.state(&location.remote) == CacheState::NeedsSync {
            writer.send(&status_message(&request.uri)).await?;
            status_sent = true;
        }
        let repository = self
            .cache
            .repository(&self.executor, &location.remote)
            .await?;

        let worktree_path = repository.root().join(&location.file_path);
        if !worktree_path.is_file() {
            warn!(uri = %request.uri, path = %worktree_path.display(), "Requested file not found");
            let failure = Message::new(MessageCode::UriFailure)
                .with_header(Header::Uri, request.uri.as_str())
                .with_header(Header::Message, NOT_FOUND_MESSAGE)
                .with_header(Header::FailReason, NOT_FOUND_REASON);
            writer.send(&failure).await?;

            return Ok(());
        }

        let content_path = resolve_content_path(&worktree_path, &repository.objects_root());
        if !status_sent {
            writer.send(&status_message(&request.uri)).await?;
        }
        repository.ensure_lfs_installed(&self.executor).await?;
        repository
            .lfs_pull(&self.executor, &location.file_path)
            .await?;

        copy_to_destination(&content_path, &request.filename).await?;
        let size = tokio::fs::metadata(&request.filename).await?.len();
        let last_modified =
            format_http_date(tokio::fs::metadata(&content_path).await?.modified()?)?;
        let checksums = compute_checksums(&self.executor, &request.filename).await?;
        info!(uri = %request.uri, size, "Fetched file");

        let start = Message::new(MessageCode::UriStart)
            .with_header(Header::Uri, request.uri.as_str())
            .with_header(Header::Size, size.to_string())
            .with_header(Header::LastModified, last_modified.as_str());
        writer.send(&start).await?;

        let done = Message::new(MessageCode::UriDone)
            .with_header(Header::Uri, request.uri.as_str())
            .with_header(Header::Filename, request.filename.to_string_lossy())
            .with_header(Header::Size, size.to_string())
            .with_header(Header::LastModified, last_modified)
            .with_header(Header::Md5Hash, checksums.md5.as_str())
            .with_header(Header::Md5SumHash, checksums.md5)
            .with_header(Header::Sha256Hash, checksums.sha256)
            .with_header(Header::Sha512Hash, checksums.sha512);
        writer.send(&done).await?;

        Ok(())
    }
}

fn status_message(uri: &str) -> Message {
    Message::new(MessageCode::Status)
        .with_header(Header::Uri, uri)
        .with_header(Header::Message, WAITING_MESSAGE)
}

async fn copy_to_destination(source: &Path, destination: &Path) -> io::Result<()> {
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::copy(source, destination).await?;

    Ok(())
}

/// Formats `time` as an RFC 1123 date in GMT, e.g.
/// `Thu, 01 Jan 1970 00:00:00 GMT`.
fn format_http_date(time: SystemTime) -> io::Result<String> {
    let format = format_description!(
        "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
    );

    OffsetDateTime::from(time)
        .format(&format)
        .map_err(io::Error::other)
}
