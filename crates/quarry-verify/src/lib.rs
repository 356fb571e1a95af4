//! Content verification primitives for transferred artifacts.
//!
//! Provides incremental hashing over the byte stream of an in-flight
//! transfer plus the small amount of text handling needed for remote
//! sidecar checksum files (`<name>.sha1`, `<name>.md5`).
//!
//! The wire format pins the algorithms to SHA-1 and MD5, so there is no
//! pluggability here: [`MultiDigest`] feeds both in a single pass and
//! that is the whole surface.
//!
//! # Example
//!
//! ```
//! use quarry_verify::MultiDigest;
//!
//! let mut digest = MultiDigest::new();
//! digest.update(b"HELLO");
//! let pair = digest.finalize();
//! assert_eq!(pair.sha1.len(), 40);
//! assert_eq!(pair.md5.len(), 32);
//! ```

pub use self::error::VerifyError;
pub use self::hasher::{DigestPair, MultiDigest};
pub use self::sidecar::{digest_file, digests_equal, read_digest};

mod error;
mod hasher;
mod sidecar;
