//! Repository adapter: git and git-lfs operations against one working tree.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::domain::uri::redact_credentials;
use crate::error::MethodError;
use crate::infra::command::{CommandExecutor, CommandRequest};

/// Name of the git metadata directory inside a working tree.
pub const GIT_DIR: &str = ".git";

/// Handle to one cached working tree.
#[derive(Debug)]
pub struct GitRepository {
    root: PathBuf,
    lfs_installed: bool,
}

impl GitRepository {
    /// Opens the existing working tree at `root`.
    ///
    /// # Errors
    /// Returns [`MethodError::NotARepository`] when `root` has no `.git`
    /// directory.
    pub fn open(root: &Path) -> Result<Self, MethodError> {
        if !root.join(GIT_DIR).is_dir() {
            return Err(MethodError::NotARepository {
                path: root.to_path_buf(),
            });
        }

        Ok(Self {
            root: root.to_path_buf(),
            lfs_installed: false,
        })
    }

    /// Clones `remote` into `destination` and opens the new working tree.
    ///
    /// Large files stay as pointer stubs; they are materialized one path at
    /// a time with [`GitRepository::lfs_pull`].
    ///
    /// # Errors
    /// Returns an error when `git clone` fails (for example on missing remote
    /// or rejected credentials) or produces no working tree.
    pub async fn clone_into(
        executor: &CommandExecutor,
        remote: &str,
        destination: &Path,
    ) -> Result<Self, MethodError> {
        info!(
            remote = %redact_credentials(remote),
            destination = %destination.display(),
            "Cloning repository"
        );
        let mut request = git_command().args([
            "clone".to_string(),
            "--".to_string(),
            remote.to_string(),
            destination.to_string_lossy().into_owned(),
        ]);
        if let Some(parent) = destination.parent() {
            request = request.current_dir(parent);
        }
        executor.run(request).await?;

        Self::open(destination)
    }

    /// Returns the working-tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the git-lfs content-addressed object store of this tree.
    pub fn objects_root(&self) -> PathBuf {
        self.root.join(GIT_DIR).join("lfs").join("objects")
    }

    /// Returns whether git-lfs hooks were installed through this handle.
    pub fn lfs_installed(&self) -> bool {
        self.lfs_installed
    }

    /// Discards local modifications with `git reset --hard`.
    ///
    /// # Errors
    /// Returns an error when git rejects the reset.
    pub async fn hard_reset(&self, executor: &CommandExecutor) -> Result<(), MethodError> {
        executor
            .run(self.git(["reset", "--hard"]))
            .await
            .map(|_| ())
    }

    /// Fast-forwards the working tree from its upstream with `git pull`.
    ///
    /// # Errors
    /// Returns an error when fetching or merging fails.
    pub async fn pull(&self, executor: &CommandExecutor) -> Result<(), MethodError> {
        info!(root = %self.root.display(), "Pulling repository");
        executor.run(self.git(["pull"])).await.map(|_| ())
    }

    /// Installs git-lfs into the repository configuration once per handle.
    ///
    /// # Errors
    /// Returns an error when `git lfs install --local` fails.
    pub async fn ensure_lfs_installed(
        &mut self,
        executor: &CommandExecutor,
    ) -> Result<(), MethodError> {
        if self.lfs_installed {
            return Ok(());
        }

        executor.run(self.git(["lfs", "install", "--local"])).await?;
        self.lfs_installed = true;

        Ok(())
    }

    /// Downloads large-file objects matching `path` without touching the
    /// working tree.
    ///
    /// # Errors
    /// Returns an error when `git lfs fetch` fails.
    pub async fn lfs_fetch(
        &self,
        executor: &CommandExecutor,
        path: &str,
    ) -> Result<(), MethodError> {
        debug!(path, "Fetching large-file objects");
        executor
            .run(self.git(lfs_path_args("fetch", path)))
            .await
            .map(|_| ())
    }

    /// Downloads large-file objects matching `path` and checks them out.
    ///
    /// # Errors
    /// Returns an error when `git lfs pull` fails.
    pub async fn lfs_pull(
        &self,
        executor: &CommandExecutor,
        path: &str,
    ) -> Result<(), MethodError> {
        debug!(path, "Materializing large-file objects");
        executor
            .run(self.git(lfs_path_args("pull", path)))
            .await
            .map(|_| ())
    }

    fn git<I, S>(&self, args: I) -> CommandRequest
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        git_command().current_dir(&self.root).args(args)
    }
}

/// Base git invocation that never prompts and never smudges large files.
fn git_command() -> CommandRequest {
    CommandRequest::new("git")
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("GIT_LFS_SKIP_SMUDGE", "1")
}

/// Builds `lfs <subcommand>` arguments limited to exactly `path`.
///
/// The empty exclude overrides any `lfs.fetchexclude` configured on the
/// repository.
fn lfs_path_args(subcommand: &str, path: &str) -> Vec<String> {
    vec![
        "lfs".to_string(),
        subcommand.to_string(),
        format!("--include={path}"),
        "--exclude=".to_string(),
    ]
}
