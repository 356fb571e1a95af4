use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::TransferError;

/// Distinguishes the two descriptor families for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Artifact,
    Metadata,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Artifact => f.write_str("artifact"),
            ResourceKind::Metadata => f.write_str("metadata"),
        }
    }
}

/// How strictly downloaded content is checked against remote sidecars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumPolicy {
    /// Any mismatch or missing sidecar fails the transfer.
    #[default]
    Strict,
    /// Mismatches emit a CORRUPTED event but the file is accepted.
    Warn,
    /// Skip verification entirely.
    Ignore,
}

/// Lifecycle state of one transfer. Transitions are monotonic:
/// NEW → ACTIVE → DONE, and DONE is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    New,
    Active,
    Done,
}

const STATE_NEW: u8 = 0;
const STATE_ACTIVE: u8 = 1;
const STATE_DONE: u8 = 2;

/// Terminal result of one transfer, set exactly once when it reaches DONE.
pub type TransferOutcome = Result<(), TransferError>;

#[derive(Default)]
struct TransferInner {
    state: AtomicU8,
    outcome: Mutex<Option<TransferOutcome>>,
}

/// Shared handle onto one descriptor's mutable state.
///
/// The engine clones the handle into the worker task; the caller keeps the
/// descriptor and reads `state()`/`outcome()` after the batch call returns.
#[derive(Clone, Default)]
pub struct Transfer {
    inner: Arc<TransferInner>,
}

impl Transfer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TransferState {
        match self.inner.state.load(Ordering::Acquire) {
            STATE_NEW => TransferState::New,
            STATE_ACTIVE => TransferState::Active,
            _ => TransferState::Done,
        }
    }

    pub fn outcome(&self) -> Option<TransferOutcome> {
        self.inner.outcome.lock().unwrap().clone()
    }

    /// Worker entry: NEW → ACTIVE. Never downgrades a later state.
    pub(crate) fn set_active(&self) {
        self.inner.state.fetch_max(STATE_ACTIVE, Ordering::AcqRel);
    }

    /// Terminal transition. The first recorded outcome wins; repeated
    /// calls leave both outcome and state untouched.
    pub(crate) fn finish(&self, outcome: TransferOutcome) {
        let mut slot = self.inner.outcome.lock().unwrap();
        if slot.is_none() {
            *slot = Some(outcome);
        }
        self.inner.state.store(STATE_DONE, Ordering::Release);
    }
}

impl fmt::Debug for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transfer")
            .field("state", &self.state())
            .finish()
    }
}

/// Download of one artifact into a local destination file.
#[derive(Debug)]
pub struct ArtifactDownload {
    resource_path: String,
    file: Option<PathBuf>,
    policy: ChecksumPolicy,
    transfer: Transfer,
}

impl ArtifactDownload {
    pub fn new(
        resource_path: impl Into<String>,
        file: impl Into<PathBuf>,
        policy: ChecksumPolicy,
    ) -> Self {
        Self {
            resource_path: resource_path.into(),
            file: Some(file.into()),
            policy,
            transfer: Transfer::new(),
        }
    }

    /// Probe for remote existence only: a HEAD request, no body fetch and
    /// no local file.
    pub fn existence_check(resource_path: impl Into<String>) -> Self {
        Self {
            resource_path: resource_path.into(),
            file: None,
            policy: ChecksumPolicy::Ignore,
            transfer: Transfer::new(),
        }
    }

    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn policy(&self) -> ChecksumPolicy {
        self.policy
    }

    pub fn state(&self) -> TransferState {
        self.transfer.state()
    }

    pub fn outcome(&self) -> Option<TransferOutcome> {
        self.transfer.outcome()
    }

    pub(crate) fn transfer(&self) -> Transfer {
        self.transfer.clone()
    }
}

/// Download of one metadata document into a local destination file.
#[derive(Debug)]
pub struct MetadataDownload {
    resource_path: String,
    file: PathBuf,
    policy: ChecksumPolicy,
    transfer: Transfer,
}

impl MetadataDownload {
    pub fn new(
        resource_path: impl Into<String>,
        file: impl Into<PathBuf>,
        policy: ChecksumPolicy,
    ) -> Self {
        Self {
            resource_path: resource_path.into(),
            file: file.into(),
            policy,
            transfer: Transfer::new(),
        }
    }

    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn policy(&self) -> ChecksumPolicy {
        self.policy
    }

    pub fn state(&self) -> TransferState {
        self.transfer.state()
    }

    pub fn outcome(&self) -> Option<TransferOutcome> {
        self.transfer.outcome()
    }

    pub(crate) fn transfer(&self) -> Transfer {
        self.transfer.clone()
    }
}

/// Upload of one local artifact file.
#[derive(Debug)]
pub struct ArtifactUpload {
    resource_path: String,
    file: PathBuf,
    transfer: Transfer,
}

impl ArtifactUpload {
    pub fn new(resource_path: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            resource_path: resource_path.into(),
            file: file.into(),
            transfer: Transfer::new(),
        }
    }

    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn state(&self) -> TransferState {
        self.transfer.state()
    }

    pub fn outcome(&self) -> Option<TransferOutcome> {
        self.transfer.outcome()
    }

    pub(crate) fn transfer(&self) -> Transfer {
        self.transfer.clone()
    }
}

/// Upload of one local metadata file.
#[derive(Debug)]
pub struct MetadataUpload {
    resource_path: String,
    file: PathBuf,
    transfer: Transfer,
}

impl MetadataUpload {
    pub fn new(resource_path: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            resource_path: resource_path.into(),
            file: file.into(),
            transfer: Transfer::new(),
        }
    }

    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn state(&self) -> TransferState {
        self.transfer.state()
    }

    pub fn outcome(&self) -> Option<TransferOutcome> {
        self.transfer.outcome()
    }

    pub(crate) fn transfer(&self) -> Transfer {
        self.transfer.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_is_monotonic() {
        let transfer = Transfer::new();
        assert_eq!(transfer.state(), TransferState::New);

        transfer.set_active();
        assert_eq!(transfer.state(), TransferState::Active);

        transfer.finish(Ok(()));
        assert_eq!(transfer.state(), TransferState::Done);

        // late activation must not resurrect a finished transfer
        transfer.set_active();
        assert_eq!(transfer.state(), TransferState::Done);
    }

    #[test]
    fn first_outcome_wins() {
        let transfer = Transfer::new();
        transfer.finish(Err(TransferError::Cancelled));
        transfer.finish(Ok(()));

        assert_eq!(transfer.outcome(), Some(Err(TransferError::Cancelled)));
    }

    #[test]
    fn existence_check_has_no_file() {
        let download = ArtifactDownload::existence_check("org/demo/demo.jar");
        assert!(download.file().is_none());
        assert_eq!(download.state(), TransferState::New);
        assert!(download.outcome().is_none());
    }
}
