use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use futures_util::StreamExt;
use quarry_verify::digest_file;
use reqwest::{Body, Client};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::core::classify_status;
use crate::data::{RemoteEndpoint, RequestKind, ResourceKind, Transfer, TransferResource};
use crate::effects::dispatch::EventDispatcher;
use crate::effects::http::authenticated;
use crate::error::TransferError;

/// One upload: stream the local file, then publish its digests.
pub(crate) struct PutTask {
    pub(crate) kind: ResourceKind,
    pub(crate) url: String,
    pub(crate) file: PathBuf,
    pub(crate) resource: Arc<TransferResource>,
    pub(crate) transfer: Transfer,
    pub(crate) client: Client,
    pub(crate) endpoint: RemoteEndpoint,
    pub(crate) dispatcher: EventDispatcher,
}

impl PutTask {
    pub(crate) async fn run(self) -> Result<(), TransferError> {
        self.transfer.set_active();
        self.dispatcher.initiated(&self.resource, RequestKind::Put);

        match self.send().await {
            Ok(transferred) => {
                // sidecars are attempted before the terminal signal but
                // their failures never fail the parent upload
                self.upload_sidecars().await;
                self.dispatcher
                    .succeeded(&self.resource, RequestKind::Put, transferred);
                Ok(())
            }
            Err(err) => {
                self.dispatcher.failed(&self.resource, RequestKind::Put, &err);
                Err(err)
            }
        }
    }

    async fn send(&self) -> Result<u64, TransferError> {
        let total = tokio::fs::metadata(&self.file)
            .await
            .map_err(|err| self.transport_failure(err))?
            .len();
        let file = tokio::fs::File::open(&self.file)
            .await
            .map_err(|err| self.transport_failure(err))?;

        let dispatcher = self.dispatcher.clone();
        let resource = self.resource.clone();
        let mut sent = 0u64;
        let stream = ReaderStream::new(file).inspect(move |chunk| {
            if let Ok(bytes) = chunk {
                sent += bytes.len() as u64;
                dispatcher.progressed(
                    &resource,
                    RequestKind::Put,
                    bytes.len() as u64,
                    sent,
                    Some(total),
                );
            }
        });

        let response = authenticated(self.client.put(&self.url), &self.endpoint)
            .body(Body::wrap_stream(stream))
            .send()
            .await
            .map_err(|err| self.transport_failure(err))?;

        classify_status(response.status(), self.kind, &self.url)?;
        Ok(total)
    }

    /// Publish `.sha1` and `.md5` next to the uploaded resource. Some
    /// remotes reject unknown extensions, so failures are logged and
    /// swallowed.
    async fn upload_sidecars(&self) {
        let path = self.file.clone();
        let digests = match tokio::task::spawn_blocking(move || digest_file(&path)).await {
            Ok(Ok(digests)) => digests,
            Ok(Err(err)) => {
                debug!(file = %self.file.display(), %err, "failed to digest upload");
                return;
            }
            Err(err) => {
                debug!(file = %self.file.display(), %err, "digest task failed");
                return;
            }
        };

        for (ext, digest) in [(".sha1", digests.sha1), (".md5", digests.md5)] {
            let url = format!("{}{ext}", self.url);
            match authenticated(self.client.put(&url), &self.endpoint)
                .body(digest)
                .send()
                .await
            {
                Ok(response) if response.status().as_u16() < 400 => {}
                Ok(response) => {
                    debug!(%url, status = response.status().as_u16(), "checksum upload rejected");
                }
                Err(err) => {
                    debug!(%url, %err, "checksum upload failed");
                }
            }
        }
    }

    fn transport_failure(&self, err: impl fmt::Display) -> TransferError {
        TransferError::Failed {
            kind: self.kind,
            url: self.url.clone(),
            message: err.to_string(),
        }
    }
}
