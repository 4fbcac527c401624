//! File digests computed with the coreutils hashing utilities.

use std::path::Path;

use crate::error::MethodError;
use crate::infra::command::{CommandExecutor, CommandRequest};

/// Digests reported in `201 URI Done`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Checksums {
    pub md5: String,
    pub sha256: String,
    pub sha512: String,
}

/// Computes MD5, SHA-256, and SHA-512 of `path`.
///
/// # Errors
/// Returns an error when a hashing utility fails or prints something that is
/// not a hexadecimal digest.
pub async fn compute_checksums(
    executor: &CommandExecutor,
    path: &Path,
) -> Result<Checksums, MethodError> {
    Ok(Checksums {
        md5: digest(executor, "md5sum", path).await?,
        sha256: digest(executor, "sha256sum", path).await?,
        sha512: digest(executor, "sha512sum", path).await?,
    })
}

async fn digest(
    executor: &CommandExecutor,
    program: &str,
    path: &Path,
) -> Result<String, MethodError> {
    let request =
        CommandRequest::new(program).args(["--".to_string(), path.to_string_lossy().into_owned()]);
    let stdout = executor.run(request).await?;

    // `<digest>  <file>`; names with backslashes get a leading `\`.
    let digest = stdout
        .split_whitespace()
        .next()
        .map(|digest| digest.trim_start_matches('\\'))
        .filter(|digest| {
            !digest.is_empty() && digest.bytes().all(|byte| byte.is_ascii_hexdigit())
        })
        .ok_or_else(|| MethodError::MalformedChecksum {
            program: program.to_string(),
            output: stdout.clone(),
        })?;

    Ok(digest.to_string())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use tempfile::tempdir;

    use super::*;
    use crate::infra::command::testing::output;
    use crate::infra::command::{MockCommandRunner, RealCommandRunner};

    #[tokio::test]
    async fn test_compute_checksums_parses_each_utility() {
        // Arrange
        let mut runner = MockCommandRunner::new();
        runner.expect_run().times(3).returning(|request| {
            let stdout = match request.program.as_str() {
                "md5sum" => "aa11  /tmp/f\n",
                "sha256sum" => "bb22  /tmp/f\n",
                _ => "cc33  /tmp/f\n",
            };
            Box::pin(async move { Ok(output(0, stdout, "")) })
        });
        let executor = CommandExecutor::new(Arc::new(runner));

        // Act
        let checksums = compute_checksums(&executor, Path::new("/tmp/f"))
            .await
            .expect("failed to compute checksums");

        // Assert
        assert_eq!(
            checksums,
            Checksums {
                md5: "aa11".to_string(),
                sha256: "bb22".to_string(),
                sha512: "cc33".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_compute_checksums_rejects_garbage_output() {
        // Arrange
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .returning(|_| Box::pin(async { Ok(output(0, "not-a-digest\n", "")) }));
        let executor = CommandExecutor::new(Arc::new(runner));

        // Act
        let result = compute_checksums(&executor, Path::new("/tmp/f")).await;

        // Assert
        assert!(matches!(result, Err(MethodError::MalformedChecksum { .. })));
    }

    #[tokio::test]
    async fn test_compute_checksums_with_real_utilities() {
        // Arrange
        let dir = tempdir().expect("failed to create temp dir");
        let path = dir.path().join("hello.txt");
        fs::write(&path, "hello\n").expect("failed to write file");
        let executor = CommandExecutor::new(Arc::new(RealCommandRunner));

        // Act
        let checksums = compute_checksums(&executor, &path)
            .await
            .expect("failed to compute checksums");

        // Assert
        assert_eq!(checksums.md5, "b1946ac92492d2347c6235b4d2611184");
        assert_eq!(
            checksums.sha256,
            "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03"
        );
        assert_eq!(checksums.sha512.len(), 128);
    }
}
