use digest::Digest;
use md5::Md5;
use sha1::Sha1;

/// Lowercase hex digests of one byte stream, one entry per algorithm the
/// sidecar wire format knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestPair {
    pub sha1: String,
    pub md5: String,
}

/// Streaming digester for the two sidecar algorithms.
///
/// Remote repositories publish exactly `.sha1` and `.md5` sidecars, so
/// both digests are always wanted and both are fed from the same chunk:
/// the transfer stream is traversed a single time, whether the bytes come
/// off the network or back out of a resumed partial file.
pub struct MultiDigest {
    sha1: Sha1,
    md5: Md5,
}

impl MultiDigest {
    pub fn new() -> Self {
        Self {
            sha1: Sha1::new(),
            md5: Md5::new(),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.sha1.update(data);
        self.md5.update(data);
    }

    /// Finalize both digests as lowercase hex. Consumes self so a
    /// finished digest cannot be fed again.
    pub fn finalize(self) -> DigestPair {
        DigestPair {
            sha1: hex::encode(self.sha1.finalize()),
            md5: hex::encode(self.md5.finalize()),
        }
    }
}

impl Default for MultiDigest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_known_vector() {
        let mut digest = MultiDigest::new();
        digest.update(b"abc");
        assert_eq!(
            digest.finalize().sha1,
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn md5_known_vector() {
        let mut digest = MultiDigest::new();
        digest.update(b"abc");
        assert_eq!(digest.finalize().md5, "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn multi_digest_matches_single_pass() {
        let mut split = MultiDigest::new();
        split.update(b"hello ");
        split.update(b"world");

        let mut whole = MultiDigest::new();
        whole.update(b"hello world");

        assert_eq!(split.finalize(), whole.finalize());
    }
}
