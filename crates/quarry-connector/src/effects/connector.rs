use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use reqwest::Client;

use crate::core::{build_url, normalize_scheme};
use crate::data::{
    ArtifactDownload, ArtifactUpload, ChecksumPolicy, MetadataDownload, MetadataUpload,
    RemoteEndpoint, ResourceKind, SessionConfig, Transfer, TransferResource,
};
use crate::effects::batch::{BatchJob, execute_batch};
use crate::effects::dispatch::EventDispatcher;
use crate::effects::fsops::FileProcessor;
use crate::effects::get::GetTask;
use crate::effects::http::build_client;
use crate::effects::partfile::PartRegistry;
use crate::effects::put::PutTask;
use crate::error::ConnectorError;

/// Connector for one remote repository endpoint.
///
/// Owns the HTTP client for its lifetime and serves batches of downloads
/// and uploads. `get` and `put` return only once every descriptor in the
/// batch is DONE; per-descriptor failures land in the descriptors'
/// outcomes, not in the batch result.
pub struct RepositoryConnector {
    endpoint: RemoteEndpoint,
    config: SessionConfig,
    client: Client,
    registry: Arc<PartRegistry>,
    processor: Arc<dyn FileProcessor>,
    dispatcher: EventDispatcher,
    closed: AtomicBool,
}

impl RepositoryConnector {
    /// Validate the endpoint and build the shared HTTP client.
    ///
    /// Fails with [`ConnectorError::NoConnector`] when the endpoint's
    /// content type is not `"default"` or its URL scheme is not one of
    /// the accepted http/dav variants.
    pub fn new(
        endpoint: RemoteEndpoint,
        config: SessionConfig,
        processor: Arc<dyn FileProcessor>,
    ) -> Result<Self, ConnectorError> {
        if endpoint.content_type() != "default" {
            return Err(ConnectorError::NoConnector {
                url: endpoint.url().to_string(),
                reason: format!("unsupported content type {:?}", endpoint.content_type()),
            });
        }
        if !endpoint.scheme_supported() {
            return Err(ConnectorError::NoConnector {
                url: endpoint.url().to_string(),
                reason: "unsupported URL scheme".to_string(),
            });
        }

        let client =
            build_client(&endpoint, &config, true).map_err(|err| ConnectorError::NoConnector {
                url: endpoint.url().to_string(),
                reason: err.to_string(),
            })?;
        let dispatcher = EventDispatcher::new(config.observer.clone());
        let registry = Arc::new(PartRegistry::new(config.disable_resumable));

        Ok(Self {
            endpoint,
            config,
            client,
            registry,
            processor,
            dispatcher,
            closed: AtomicBool::new(false),
        })
    }

    /// Download a batch of artifacts and metadata concurrently, returning
    /// once every descriptor is terminal.
    pub async fn get(
        &self,
        artifact_downloads: &[ArtifactDownload],
        metadata_downloads: &[MetadataDownload],
    ) -> Result<(), ConnectorError> {
        self.ensure_open()?;

        let mut jobs = Vec::with_capacity(artifact_downloads.len() + metadata_downloads.len());
        for download in metadata_downloads {
            jobs.push(self.get_job(
                ResourceKind::Metadata,
                download.resource_path(),
                Some(download.file().to_path_buf()),
                download.policy(),
                false,
                download.transfer(),
            ));
        }
        for download in artifact_downloads {
            jobs.push(self.get_job(
                ResourceKind::Artifact,
                download.resource_path(),
                download.file().map(Path::to_path_buf),
                download.policy(),
                true,
                download.transfer(),
            ));
        }

        execute_batch(jobs, &self.config.cancel_token).await;
        Ok(())
    }

    /// Upload a batch of artifacts and metadata concurrently, returning
    /// once every descriptor is terminal.
    pub async fn put(
        &self,
        artifact_uploads: &[ArtifactUpload],
        metadata_uploads: &[MetadataUpload],
    ) -> Result<(), ConnectorError> {
        self.ensure_open()?;

        let mut jobs = Vec::with_capacity(artifact_uploads.len() + metadata_uploads.len());
        for upload in artifact_uploads {
            jobs.push(self.put_job(
                ResourceKind::Artifact,
                upload.resource_path(),
                upload.file().to_path_buf(),
                upload.transfer(),
            ));
        }
        for upload in metadata_uploads {
            jobs.push(self.put_job(
                ResourceKind::Metadata,
                upload.resource_path(),
                upload.file().to_path_buf(),
                upload.transfer(),
            ));
        }

        execute_batch(jobs, &self.config.cancel_token).await;
        Ok(())
    }

    /// Close the connector. Subsequent `get`/`put` calls fail fast;
    /// calling `close` again is a no-op.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn endpoint(&self) -> &RemoteEndpoint {
        &self.endpoint
    }

    fn ensure_open(&self) -> Result<(), ConnectorError> {
        if self.is_closed() {
            Err(ConnectorError::Closed)
        } else {
            Ok(())
        }
    }

    fn get_job(
        &self,
        kind: ResourceKind,
        resource_path: &str,
        file: Option<PathBuf>,
        policy: ChecksumPolicy,
        resume_allowed: bool,
        transfer: Transfer,
    ) -> BatchJob<impl Future<Output = Result<(), crate::error::TransferError>> + Send + 'static>
    {
        let url = normalize_scheme(&build_url(self.endpoint.url(), resource_path));
        let resource = Arc::new(TransferResource {
            repository_url: self.endpoint.url().to_string(),
            resource_path: resource_path.to_string(),
            file: file.clone(),
        });
        let task = GetTask {
            kind,
            url: url.clone(),
            file,
            policy,
            resume_allowed,
            resource,
            transfer: transfer.clone(),
            client: self.client.clone(),
            endpoint: self.endpoint.clone(),
            config: self.config.clone(),
            registry: self.registry.clone(),
            processor: self.processor.clone(),
            dispatcher: self.dispatcher.clone(),
        };
        BatchJob {
            transfer,
            kind,
            url,
            work: task.run(),
        }
    }

    fn put_job(
        &self,
        kind: ResourceKind,
        resource_path: &str,
        file: PathBuf,
        transfer: Transfer,
    ) -> BatchJob<impl Future<Output = Result<(), crate::error::TransferError>> + Send + 'static>
    {
        let url = normalize_scheme(&build_url(self.endpoint.url(), resource_path));
        let resource = Arc::new(TransferResource {
            repository_url: self.endpoint.url().to_string(),
            resource_path: resource_path.to_string(),
            file: Some(file.clone()),
        });
        let task = PutTask {
            kind,
            url: url.clone(),
            file,
            resource,
            transfer: transfer.clone(),
            client: self.client.clone(),
            endpoint: self.endpoint.clone(),
            dispatcher: self.dispatcher.clone(),
        };
        BatchJob {
            transfer,
            kind,
            url,
            work: task.run(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::fsops::DefaultFileProcessor;

    fn connector_for(url: &str) -> Result<RepositoryConnector, ConnectorError> {
        RepositoryConnector::new(
            RemoteEndpoint::new(url),
            SessionConfig::default(),
            Arc::new(DefaultFileProcessor),
        )
    }

    #[test]
    fn refuses_non_default_content_type() {
        let result = RepositoryConnector::new(
            RemoteEndpoint::new("http://repo.example").with_content_type("p2"),
            SessionConfig::default(),
            Arc::new(DefaultFileProcessor),
        );
        assert!(matches!(result, Err(ConnectorError::NoConnector { .. })));
    }

    #[test]
    fn refuses_unsupported_scheme() {
        assert!(matches!(
            connector_for("ftp://repo.example"),
            Err(ConnectorError::NoConnector { .. })
        ));
    }

    #[test]
    fn accepts_dav_endpoints() {
        assert!(connector_for("dav:https://repo.example/releases").is_ok());
    }

    #[tokio::test]
    async fn closed_connector_fails_fast() {
        let connector = connector_for("http://repo.example").unwrap();
        connector.close();
        connector.close(); // idempotent

        let result = connector.get(&[], &[]).await;
        assert!(matches!(result, Err(ConnectorError::Closed)));
        let result = connector.put(&[], &[]).await;
        assert!(matches!(result, Err(ConnectorError::Closed)));
    }

    #[tokio::test]
    async fn empty_batches_complete_immediately() {
        let connector = connector_for("http://repo.example").unwrap();
        connector.get(&[], &[]).await.unwrap();
        connector.put(&[], &[]).await.unwrap();
    }
}
