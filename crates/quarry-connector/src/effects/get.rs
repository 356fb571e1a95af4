use std::fmt;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quarry_verify::{DigestPair, MultiDigest, digests_equal, read_digest};
use reqwest::header::{ACCEPT, CONTENT_RANGE, PRAGMA, RANGE};
use reqwest::{Client, Response, StatusCode};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::debug;

use crate::core::classify_status;
use crate::data::{
    ChecksumPolicy, RemoteEndpoint, RequestKind, ResourceKind, SessionConfig, Transfer,
    TransferResource,
};
use crate::effects::dispatch::EventDispatcher;
use crate::effects::fsops::FileProcessor;
use crate::effects::http::{authenticated, build_client};
use crate::effects::partfile::{PartClaim, PartRegistry};
use crate::error::TransferError;

/// Mid-stream I/O failures are retried with a fresh range request this
/// many times before the transfer fails.
const MAX_RESUME_ATTEMPTS: u32 = 3;

/// One download, driven through CLAIM → FETCH → VERIFY → COMMIT → CLEANUP.
pub(crate) struct GetTask {
    pub(crate) kind: ResourceKind,
    pub(crate) url: String,
    /// `None` for an existence check: HEAD only, no body fetch.
    pub(crate) file: Option<PathBuf>,
    pub(crate) policy: ChecksumPolicy,
    pub(crate) resume_allowed: bool,
    pub(crate) resource: Arc<TransferResource>,
    pub(crate) transfer: Transfer,
    pub(crate) client: Client,
    pub(crate) endpoint: RemoteEndpoint,
    pub(crate) config: SessionConfig,
    pub(crate) registry: Arc<PartRegistry>,
    pub(crate) processor: Arc<dyn FileProcessor>,
    pub(crate) dispatcher: EventDispatcher,
}

impl GetTask {
    pub(crate) async fn run(self) -> Result<(), TransferError> {
        self.transfer.set_active();
        self.dispatcher.initiated(&self.resource, RequestKind::Get);

        let result = match self.file.clone() {
            Some(dest) => self.download(&dest).await,
            // existence check: HEAD only, nothing transferred
            None => self.head_check().await.map(|()| 0),
        };

        match result {
            Ok(transferred) => {
                self.dispatcher
                    .succeeded(&self.resource, RequestKind::Get, transferred);
                Ok(())
            }
            Err(err) => {
                self.dispatcher.failed(&self.resource, RequestKind::Get, &err);
                Err(err)
            }
        }
    }

    async fn head_check(&self) -> Result<(), TransferError> {
        let response = authenticated(self.client.head(&self.url), &self.endpoint)
            .send()
            .await
            .map_err(|err| self.transport_failure(err))?;
        classify_status(response.status(), self.kind, &self.url)
    }

    async fn download(&self, dest: &Path) -> Result<u64, TransferError> {
        let claim = self
            .registry
            .claim(dest, self.resume_allowed)
            .map_err(|err| self.transport_failure(err))?;

        let result = self.fetch_and_publish(dest, &claim).await;

        // CLEANUP: a failed transfer leaves nothing behind; on success the
        // partial has already been renamed into place.
        self.registry.release(claim, result.is_err());
        result
    }

    async fn fetch_and_publish(&self, dest: &Path, claim: &PartClaim) -> Result<u64, TransferError> {
        let (digests, transferred) = self.fetch(claim).await?;

        if let Some(digests) = digests
            && let Err(err) = self.verify(dest, &digests).await
        {
            match self.policy {
                ChecksumPolicy::Strict => return Err(err),
                _ => self.dispatcher.corrupted(&self.resource, RequestKind::Get, &err),
            }
        }

        self.processor
            .move_file(claim.partial(), dest)
            .map_err(|err| self.transport_failure(err))?;
        Ok(transferred)
    }

    /// FETCH: stream the body into the partial, feeding the digests, with
    /// resume-on-transient-failure.
    async fn fetch(&self, claim: &PartClaim) -> Result<(Option<DigestPair>, u64), TransferError> {
        if let Some(parent) = claim.partial().parent() {
            self.processor
                .mkdirs(parent)
                .map_err(|err| self.transport_failure(err))?;
        }

        let mut part = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(claim.partial())
            .await
            .map_err(|err| self.transport_failure(err))?;

        let mut digest = match self.policy {
            ChecksumPolicy::Ignore => None,
            _ => Some(MultiDigest::new()),
        };
        let mut offset = claim.len();

        // the digest must cover the final file, resumed prefix included
        if offset > 0
            && let Some(digest) = digest.as_mut()
        {
            hash_existing(&mut part, offset, digest)
                .await
                .map_err(|err| self.transport_failure(err))?;
        }

        let mut resumed_client: Option<Client> = None;
        let mut attempts = 0u32;

        loop {
            let response = match self.request(offset, &mut resumed_client).await {
                Ok(response) => response,
                Err(err) if attempts < MAX_RESUME_ATTEMPTS => {
                    attempts += 1;
                    debug!(url = %self.url, attempts, %err, "request failed, retrying");
                    continue;
                }
                Err(err) => return Err(self.transport_failure(err)),
            };

            let status = response.status();
            classify_status(status, self.kind, &self.url)?;

            let honors_range = response
                .headers()
                .get(CONTENT_RANGE)
                .and_then(|value| value.to_str().ok())
                .map(|value| !value.eq_ignore_ascii_case("none"))
                .unwrap_or(false);

            if honors_range {
                part.seek(SeekFrom::Start(offset))
                    .await
                    .map_err(|err| self.transport_failure(err))?;
            } else if offset > 0 {
                // the server ignored the range request and restarted from
                // byte zero; the partial prefix is stale
                part.set_len(0)
                    .await
                    .map_err(|err| self.transport_failure(err))?;
                part.seek(SeekFrom::Start(0))
                    .await
                    .map_err(|err| self.transport_failure(err))?;
                offset = 0;
                if digest.is_some() {
                    digest = Some(MultiDigest::new());
                }
            }

            let total = response.content_length().map(|len| len + offset);
            let writable = status == StatusCode::OK || status == StatusCode::PARTIAL_CONTENT;

            match self
                .drain_body(response, &mut part, writable, &mut digest, &mut offset, total)
                .await
            {
                Ok(()) => {
                    part.flush()
                        .await
                        .map_err(|err| self.transport_failure(err))?;
                    return Ok((digest.map(MultiDigest::finalize), offset));
                }
                Err(DrainError::Interrupted(err)) if attempts < MAX_RESUME_ATTEMPTS => {
                    // resume from whatever made it to disk; keep the partial
                    attempts += 1;
                    part.flush()
                        .await
                        .map_err(|err| self.transport_failure(err))?;
                    debug!(url = %self.url, offset, attempts, %err, "stream interrupted, resuming");
                }
                Err(err) => return Err(self.transport_failure(err)),
            }
        }
    }

    async fn drain_body(
        &self,
        mut response: Response,
        part: &mut tokio::fs::File,
        writable: bool,
        digest: &mut Option<MultiDigest>,
        offset: &mut u64,
        total: Option<u64>,
    ) -> Result<(), DrainError> {
        loop {
            match response.chunk().await {
                Ok(Some(bytes)) => {
                    if !writable {
                        continue;
                    }
                    part.write_all(&bytes).await.map_err(DrainError::Fatal)?;
                    if let Some(digest) = digest.as_mut() {
                        digest.update(&bytes);
                    }
                    *offset += bytes.len() as u64;
                    self.dispatcher.progressed(
                        &self.resource,
                        RequestKind::Get,
                        bytes.len() as u64,
                        *offset,
                        total,
                    );
                }
                Ok(None) => return Ok(()),
                Err(err) => return Err(DrainError::Interrupted(err)),
            }
        }
    }

    /// Build and send the GET. Resumed requests (offset > 0) carry a
    /// `Range` header and go through a dedicated compression-free client.
    async fn request(
        &self,
        offset: u64,
        resumed_client: &mut Option<Client>,
    ) -> reqwest::Result<Response> {
        if offset > 0 && resumed_client.is_none() {
            *resumed_client = Some(build_client(&self.endpoint, &self.config, false)?);
        }
        let client = match (offset > 0, resumed_client.as_ref()) {
            (true, Some(client)) => client,
            _ => &self.client,
        };

        let mut request = client.get(&self.url).header(ACCEPT, "*/*");
        if !self.config.use_cache {
            request = request.header(PRAGMA, "no-cache");
        }
        if offset > 0 {
            request = request.header(RANGE, format!("bytes={offset}-"));
        }
        authenticated(request, &self.endpoint).send().await
    }

    /// VERIFY: prefer the remote `.sha1` sidecar, fall back to `.md5`.
    async fn verify(&self, dest: &Path, digests: &DigestPair) -> Result<(), TransferError> {
        if self.verify_sidecar(dest, ".sha1", &digests.sha1).await? {
            return Ok(());
        }
        if self.verify_sidecar(dest, ".md5", &digests.md5).await? {
            return Ok(());
        }
        Err(TransferError::ChecksumUnavailable {
            url: self.url.clone(),
        })
    }

    /// `Ok(true)` when the sidecar exists and matches, `Ok(false)` when it
    /// is unavailable, `Err` on a mismatch.
    async fn verify_sidecar(
        &self,
        dest: &Path,
        ext: &str,
        actual: &str,
    ) -> Result<bool, TransferError> {
        let sidecar_url = format!("{}{ext}", self.url);
        let response = match authenticated(self.client.get(&sidecar_url), &self.endpoint)
            .send()
            .await
        {
            Ok(response) if response.status() == StatusCode::OK => response,
            Ok(_) => return Ok(false),
            Err(err) => {
                debug!(url = %sidecar_url, %err, "sidecar fetch failed");
                return Ok(false);
            }
        };
        let text = match response.text().await {
            Ok(text) => text,
            Err(err) => {
                debug!(url = %sidecar_url, %err, "sidecar read failed");
                return Ok(false);
            }
        };

        let expected = read_digest(&text).unwrap_or("");
        if digests_equal(expected, actual) {
            // publish the verified digest next to the destination; failing
            // to do so is not fatal
            let sidecar_dest = append_ext(dest, ext);
            if let Err(err) = std::fs::write(&sidecar_dest, actual) {
                debug!(file = %sidecar_dest.display(), %err, "could not write local checksum");
            }
            Ok(true)
        } else {
            Err(TransferError::ChecksumMismatch {
                url: self.url.clone(),
                expected: expected.to_ascii_lowercase(),
                actual: actual.to_string(),
            })
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

/// Distinguishes a resumable mid-stream failure from one that must fail
/// the transfer outright.
enum DrainError {
    Interrupted(reqwest::Error),
    Fatal(std::io::Error),
}

impl fmt::Display for DrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrainError::Interrupted(err) => err.fmt(f),
            DrainError::Fatal(err) => err.fmt(f),
        }
    }
}

async fn hash_existing(
    part: &mut tokio::fs::File,
    len: u64,
    digest: &mut MultiDigest,
) -> std::io::Result<()> {
    part.seek(SeekFrom::Start(0)).await?;
    let mut remaining = len;
    let mut buffer = [0u8; 8192];
    while remaining > 0 {
        let n = part.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        let take = (n as u64).min(remaining) as usize;
        digest.update(&buffer[..take]);
        remaining -= take as u64;
    }
    Ok(())
}

fn append_ext(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(ext);
    PathBuf::from(name)
}
