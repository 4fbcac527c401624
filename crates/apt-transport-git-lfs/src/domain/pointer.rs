//! Detection of git-lfs pointer stubs in a working tree.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// First line of every git-lfs v1 pointer file.
pub const POINTER_VERSION_LINE: &str = "version https://git-lfs.github.com/spec/v1";
/// Pointer files are never larger than this many bytes.
const MAX_POINTER_SIZE: u64 = 1024;
const OID_PREFIX: &str = "oid sha256:";
const OID_LENGTH: usize = 64;

/// Extracts the SHA-256 oid from pointer file content.
///
/// Returns `None` unless `content` is UTF-8 text whose first line is
/// [`POINTER_VERSION_LINE`] and whose second line is `oid sha256:<64 hex>`.
pub fn parse_pointer(content: &[u8]) -> Option<&str> {
    let text = std::str::from_utf8(content).ok()?;
    let mut lines = text.lines();
    if lines.next()? != POINTER_VERSION_LINE {
        return None;
    }

    let oid = lines.next()?.strip_prefix(OID_PREFIX)?;
    if oid.len() != OID_LENGTH || !oid.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }

    Some(oid)
}

/// Returns the content-addressed path of `oid` below `objects_root`.
///
/// The layout is `<objects_root>/<oid[0..2]>/<oid[2..4]>/<oid>`.
pub fn object_path(objects_root: &Path, oid: &str) -> PathBuf {
    objects_root.join(&oid[..2]).join(&oid[2..4]).join(oid)
}

/// Resolves `path` to the file holding its real content.
///
/// Pointer stubs resolve to their object below `objects_root`; every other
/// file, including unreadable or non-text ones, resolves to itself.
pub fn resolve_content_path(path: &Path, objects_root: &Path) -> PathBuf {
    match read_pointer_candidate(path) {
        Ok(Some(content)) => match parse_pointer(&content) {
            Some(oid) => object_path(objects_root, oid),
            None => path.to_path_buf(),
        },
        Ok(None) | Err(_) => path.to_path_buf(),
    }
}

/// Reads `path` when it is small enough to be a pointer.
fn read_pointer_candidate(path: &Path) -> io::Result<Option<Vec<u8>>> {
    let mut content = Vec::new();
    File::open(path)?
        .take(MAX_POINTER_SIZE + 1)
        .read_to_end(&mut content)?;
    if content.len() as u64 > MAX_POINTER_SIZE {
        return Ok(None);
    }

    Ok(Some(content))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    const OID: &str = "abcd0123456789abcdef0123456789abcdef0123456789abcdef0123456789ab";

    fn pointer_text(oid: &str) -> String {
        format!("{POINTER_VERSION_LINE}\noid sha256:{oid}\nsize 12345\n")
    }

    #[test]
    fn test_parse_pointer_extracts_oid() {
        // Arrange
        let content = pointer_text(OID);

        // Act
        let oid = parse_pointer(content.as_bytes());

        // Assert
        assert_eq!(oid, Some(OID));
    }

    #[test]
    fn test_parse_pointer_accepts_two_line_stub() {
        // Arrange
        let content = format!("{POINTER_VERSION_LINE}\noid sha256:{OID}\n");

        // Act
        let oid = parse_pointer(content.as_bytes());

        // Assert
        assert_eq!(oid, Some(OID));
    }

    #[test]
    fn test_parse_pointer_rejects_wrong_version_line() {
        // Arrange
        let content = format!("version https://example.com/spec/v2\noid sha256:{OID}\n");

        // Act / Assert
        assert_eq!(parse_pointer(content.as_bytes()), None);
    }

    #[test]
    fn test_parse_pointer_rejects_wrong_oid_key() {
        // Arrange
        let content = format!("{POINTER_VERSION_LINE}\noid sha1:{OID}\n");

        // Act / Assert
        assert_eq!(parse_pointer(content.as_bytes()), None);
    }

    #[test]
    fn test_parse_pointer_rejects_truncated_stub() {
        // Arrange
        let truncated = format!("{POINTER_VERSION_LINE}\noid sha256:{}\n", &OID[..40]);

        // Act / Assert
        assert_eq!(parse_pointer(POINTER_VERSION_LINE.as_bytes()), None);
        assert_eq!(parse_pointer(truncated.as_bytes()), None);
    }

    #[test]
    fn test_parse_pointer_rejects_non_text_content() {
        // Arrange
        let content = [0xff, 0xfe, 0x00, 0x12, 0x80];

        // Act / Assert
        assert_eq!(parse_pointer(&content), None);
    }

    #[test]
    fn test_object_path_uses_two_level_prefix() {
        // Arrange
        let objects_root = Path::new("/cache/repo/.git/lfs/objects");

        // Act
        let path = object_path(objects_root, OID);

        // Assert
        assert_eq!(path, objects_root.join("ab").join("cd").join(OID));
    }

    #[test]
    fn test_resolve_content_path_maps_pointer_to_object() {
        // Arrange
        let dir = tempdir().expect("failed to create temp dir");
        let stub = dir.path().join("pkg.deb");
        fs::write(&stub, pointer_text(OID)).expect("failed to write stub");
        let objects_root = dir.path().join(".git/lfs/objects");

        // Act
        let resolved = resolve_content_path(&stub, &objects_root);

        // Assert
        assert_eq!(resolved, objects_root.join("ab").join("cd").join(OID));
    }

    #[test]
    fn test_resolve_content_path_keeps_literal_file() {
        // Arrange
        let dir = tempdir().expect("failed to create temp dir");
        let literal = dir.path().join("Release");
        fs::write(&literal, "Origin: example\nSuite: stable\n").expect("failed to write file");

        // Act
        let resolved = resolve_content_path(&literal, &dir.path().join("objects"));

        // Assert
        assert_eq!(resolved, literal);
    }

    #[test]
    fn test_resolve_content_path_keeps_large_file_starting_like_pointer() {
        // Arrange
        let dir = tempdir().expect("failed to create temp dir");
        let large = dir.path().join("big.bin");
        let mut content = pointer_text(OID);
        content.push_str(&"x".repeat(2048));
        fs::write(&large, content).expect("failed to write file");

        // Act
        let resolved = resolve_content_path(&large, &dir.path().join("objects"));

        // Assert
        assert_eq!(resolved, large);
    }
}
