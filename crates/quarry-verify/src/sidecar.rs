//! Sidecar checksum text handling.
//!
//! Remote repositories publish digests as small text files next to the
//! resource. The format in the wild is loose: bare hex, `<hex>  <filename>`
//! as produced by `sha1sum`, trailing newlines, mixed case.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::MultiDigest;
use crate::error::Result;
use crate::hasher::DigestPair;

/// Extract the digest token from sidecar file content.
///
/// Takes the first whitespace-delimited token and ignores anything after
/// it, so `sha1sum`-style output parses the same as a bare digest.
pub fn read_digest(text: &str) -> Option<&str> {
    text.split_whitespace().next()
}

/// Case-insensitive digest comparison, tolerant of surrounding whitespace.
pub fn digests_equal(expected: &str, actual: &str) -> bool {
    expected.trim().eq_ignore_ascii_case(actual.trim())
}

/// Compute SHA-1 and MD5 of a file on disk in one pass.
///
/// Used for uploads, where the digests are published after the main body.
pub fn digest_file(path: &Path) -> Result<DigestPair> {
    let mut file = File::open(path)?;
    let mut digest = MultiDigest::new();
    let mut buffer = [0u8; 8192];

    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        digest.update(&buffer[..n]);
    }

    Ok(digest.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn reads_bare_digest() {
        assert_eq!(
            read_digest("a9993e364706816aba3e25717850c26c9cd0d89d\n"),
            Some("a9993e364706816aba3e25717850c26c9cd0d89d")
        );
    }

    #[test]
    fn reads_sha1sum_style_digest() {
        assert_eq!(
            read_digest("a9993e364706816aba3e25717850c26c9cd0d89d  foo.jar"),
            Some("a9993e364706816aba3e25717850c26c9cd0d89d")
        );
    }

    #[test]
    fn empty_sidecar_has_no_digest() {
        assert_eq!(read_digest("   \n"), None);
    }

    #[test]
    fn comparison_ignores_case_and_whitespace() {
        assert!(digests_equal("ABCDEF", " abcdef\n"));
        assert!(!digests_equal("abcdef", "abcde0"));
    }

    #[test]
    fn digests_file_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("payload.bin");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"abc").unwrap();

        let pair = digest_file(&path).unwrap();
        assert_eq!(pair.sha1, "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(pair.md5, "900150983cd24fb0d6963f7d28e17f72");
    }
}
