use thiserror::Error;

use crate::data::ResourceKind;

/// Failures of the connector facade itself, as opposed to failures of an
/// individual transfer (those land in the descriptor's outcome).
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The endpoint cannot be served by this connector at all.
    #[error("no connector available for {url}: {reason}")]
    NoConnector { url: String, reason: String },

    /// `get`/`put` was called after `close`.
    #[error("connector closed")]
    Closed,
}

/// Terminal failure of a single transfer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("{kind} not found at {url}")]
    NotFound { kind: ResourceKind, url: String },

    #[error("access denied to {url} (status {status})")]
    AuthDenied { url: String, status: u16 },

    #[error("failed to transfer {kind} {url}: {message}")]
    Failed {
        kind: ResourceKind,
        url: String,
        message: String,
    },

    #[error("checksum mismatch for {url}: expected {expected}, actual {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("checksum validation failed, no checksums available for {url}")]
    ChecksumUnavailable { url: String },

    #[error("transfer cancelled")]
    Cancelled,
}
