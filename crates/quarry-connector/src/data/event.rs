use std::path::PathBuf;
use std::sync::Arc;

use crate::error::TransferError;

/// Whether a transfer moves bytes from or to the remote repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Get,
    Put,
}

/// Identifies the resource a lifecycle event belongs to.
#[derive(Debug, Clone)]
pub struct TransferResource {
    /// Base URL of the repository the resource lives in.
    pub repository_url: String,
    /// Path of the resource relative to the repository root.
    pub resource_path: String,
    /// Local file being written or read, if any.
    pub file: Option<PathBuf>,
}

/// One lifecycle event of one transfer.
///
/// For a given transfer the events are totally ordered: one INITIATED,
/// any number of PROGRESSED (and at most one CORRUPTED), then exactly one
/// of SUCCEEDED or FAILED.
#[derive(Debug, Clone)]
pub struct TransferEvent {
    pub resource: Arc<TransferResource>,
    pub request: RequestKind,
    /// Bytes carried by this event.
    pub delta: u64,
    /// Bytes transferred so far, including any resumed prefix.
    pub transferred: u64,
    /// Expected total, when the remote side announced one.
    pub total: Option<u64>,
    /// The failure behind a CORRUPTED or FAILED event.
    pub error: Option<TransferError>,
}

/// Lifecycle event sink. All methods default to no-ops so implementors
/// only override what they render.
///
/// Observers are best-effort: a panic inside a callback is caught and
/// logged and never changes the transfer outcome.
pub trait TransferObserver: Send + Sync {
    fn transfer_initiated(&self, _event: &TransferEvent) {}

    fn transfer_progressed(&self, _event: &TransferEvent) {}

    fn transfer_succeeded(&self, _event: &TransferEvent) {}

    /// Soft checksum failure under the WARN policy; the transfer still
    /// succeeds afterwards.
    fn transfer_corrupted(&self, _event: &TransferEvent) {}

    fn transfer_failed(&self, _event: &TransferEvent) {}
}
