//! HTTP repository connector with resumable transfers and checksum
//! verification.
//!
//! A [`RepositoryConnector`] serves batches of concurrent downloads and
//! uploads against one remote endpoint:
//!
//! - interrupted downloads resume through byte-range requests, with a
//!   per-process registry of partial files guarded by OS advisory locks
//! - downloaded content is verified against remote `.sha1`/`.md5`
//!   sidecars under a configurable [`ChecksumPolicy`]
//! - verified files are published atomically by renaming a sibling
//!   partial, so the destination is never observable half-written
//! - every transfer emits an ordered lifecycle event stream to an
//!   optional [`TransferObserver`]
//! - `get`/`put` block until every descriptor of the batch is terminal;
//!   callers read per-descriptor outcomes off the descriptors afterwards
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use quarry_connector::{
//!     ArtifactDownload, ChecksumPolicy, DefaultFileProcessor, RemoteEndpoint,
//!     RepositoryConnector, SessionConfig,
//! };
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let connector = RepositoryConnector::new(
//!     RemoteEndpoint::new("https://repo.example/releases"),
//!     SessionConfig::default(),
//!     Arc::new(DefaultFileProcessor),
//! )?;
//!
//! let download = ArtifactDownload::new(
//!     "org/demo/demo-1.0.jar",
//!     "/tmp/demo-1.0.jar",
//!     ChecksumPolicy::Strict,
//! );
//! connector.get(std::slice::from_ref(&download), &[]).await?;
//! download.outcome().expect("batch completed")?;
//! # Ok(())
//! # }
//! ```

mod core;
mod data;
mod effects;
mod error;

pub use data::{
    ArtifactDownload, ArtifactUpload, ChecksumPolicy, Credentials, MetadataDownload,
    MetadataUpload, ProxySpec, RemoteEndpoint, RequestKind, ResourceKind, SessionConfig,
    Transfer, TransferEvent, TransferObserver, TransferOutcome, TransferResource, TransferState,
};
pub use effects::{DefaultFileProcessor, FileProcessor, RepositoryConnector};
pub use error::{ConnectorError, TransferError};
