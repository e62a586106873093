//! Sequential chunk upload with bounded retry.
//!
//! Chunk N+1 is never sent before chunk N has been acknowledged, and the
//! combine request is only issued once every chunk succeeded.

use std::path::Path;

use coursemart_protocol::CombineRequest;
use coursemart_transfer::{ChunkStatus, UploadJob, checksum_bytes};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::endpoint::{ChunkRequest, UploadEndpoint};
use crate::error::{TransportError, UploadError};
use crate::source::ChunkSource;
use crate::types::{ProgressFn, UploadConfig, UploadOutcome};

/// Uploads payloads to an [`UploadEndpoint`] in fixed-size chunks.
///
/// The client holds no per-job state, so one instance can drive several
/// concurrent jobs.
pub struct ChunkedUploadClient {
    config: UploadConfig,
    cancel: CancellationToken,
}

impl Default for ChunkedUploadClient {
    fn default() -> Self {
        Self {
            config: UploadConfig::default(),
            cancel: CancellationToken::new(),
        }
    }
}

impl ChunkedUploadClient {
    /// Creates a client, rejecting an invalid config up front.
    pub fn new(config: UploadConfig) -> Result<Self, UploadError> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Replaces the cancellation token checked before every chunk attempt.
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns a handle that cancels every job run by this client.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Uploads `payload` and returns the URL of the reassembled object.
    ///
    /// `on_progress` receives the percentage of acknowledged chunks once per
    /// successful chunk; it is never called for a failed attempt.
    pub async fn upload_file(
        &self,
        endpoint: &dyn UploadEndpoint,
        payload: &[u8],
        on_progress: Option<&ProgressFn>,
    ) -> Result<UploadOutcome, UploadError> {
        let mut job = UploadJob::new(payload.len() as u64, self.config.chunk_size)?;
        self.run(endpoint, &mut job, payload, on_progress).await
    }

    /// Uploads the file at `path`, reading one chunk at a time.
    ///
    /// At most one chunk of the file is held in memory.
    pub async fn upload_path(
        &self,
        endpoint: &dyn UploadEndpoint,
        path: &Path,
        on_progress: Option<&ProgressFn>,
    ) -> Result<UploadOutcome, UploadError> {
        let file = tokio::fs::File::open(path).await?;
        let total_bytes = file.metadata().await?.len();
        debug!(path = %path.display(), bytes = total_bytes, "opened upload source");

        let mut job = UploadJob::new(total_bytes, self.config.chunk_size)?;
        self.drive(endpoint, &mut job, ChunkSource::file(file), on_progress)
            .await
    }

    /// Drives a prepared job over an in-memory `payload` through upload and
    /// combine.
    ///
    /// Every chunk is sent again from chunk 1 even if the job ran before;
    /// this is the restart path after a failed job.
    pub async fn run(
        &self,
        endpoint: &dyn UploadEndpoint,
        job: &mut UploadJob,
        payload: &[u8],
        on_progress: Option<&ProgressFn>,
    ) -> Result<UploadOutcome, UploadError> {
        if payload.len() as u64 != job.total_bytes() {
            return Err(UploadError::Validation(format!(
                "payload is {} bytes, job was planned for {}",
                payload.len(),
                job.total_bytes()
            )));
        }
        self.drive(endpoint, job, ChunkSource::Bytes(payload), on_progress)
            .await
    }

    async fn drive(
        &self,
        endpoint: &dyn UploadEndpoint,
        job: &mut UploadJob,
        mut source: ChunkSource<'_>,
        on_progress: Option<&ProgressFn>,
    ) -> Result<UploadOutcome, UploadError> {
        job.reset();
        let total_chunks = job.total_chunks();
        info!(
            upload_id = %job.upload_id(),
            total_chunks,
            total_bytes = job.total_bytes(),
            chunk_size = job.chunk_size(),
            "starting chunked upload"
        );

        for number in 1..=total_chunks {
            self.upload_chunk_with_retry(endpoint, job, &mut source, number)
                .await?;

            let pct = job.progress();
            debug!(upload_id = %job.upload_id(), chunk = number, progress = pct, "chunk acknowledged");
            if let Some(cb) = on_progress {
                cb(pct);
            }
        }

        let url = self.combine(endpoint, job).await?;
        info!(upload_id = %job.upload_id(), url = %url, "upload complete");

        Ok(UploadOutcome {
            url,
            upload_id: job.upload_id().to_string(),
            total_chunks,
            total_bytes: job.total_bytes(),
        })
    }

    /// Delivers one chunk, retrying up to `max_retries` attempts in total.
    ///
    /// The chunk is read and checksummed once; retries resend the same bytes.
    async fn upload_chunk_with_retry(
        &self,
        endpoint: &dyn UploadEndpoint,
        job: &mut UploadJob,
        source: &mut ChunkSource<'_>,
        number: u32,
    ) -> Result<(), UploadError> {
        self.check_cancelled()?;
        let Some(chunk) = job.chunk(number).copied() else {
            return Err(UploadError::Validation(format!(
                "chunk {number} is not part of the job"
            )));
        };
        let data = source.read(&chunk).await?;
        let checksum = checksum_bytes(data);
        let mut attempts: u32 = 0;

        loop {
            self.check_cancelled()?;
            job.set_status(number, ChunkStatus::InFlight);

            let request = ChunkRequest {
                upload_id: job.upload_id(),
                chunk_number: number,
                total_chunks: job.total_chunks(),
                checksum: &checksum,
                data,
            };
            let sent = tokio::select! {
                _ = self.cancel.cancelled() => None,
                result = endpoint.upload_chunk(request) => Some(result),
            };
            let Some(result) = sent else {
                job.set_status(number, ChunkStatus::Pending);
                debug!(upload_id = %job.upload_id(), chunk = number, "upload cancelled in flight");
                return Err(UploadError::Cancelled);
            };

            let err = match result {
                Ok(()) => {
                    job.set_status(number, ChunkStatus::Succeeded);
                    return Ok(());
                }
                Err(e) => e,
            };

            attempts += 1;
            if attempts >= self.config.max_retries {
                job.set_status(number, ChunkStatus::Failed);
                error!(
                    upload_id = %job.upload_id(),
                    chunk = number,
                    attempts,
                    error = %err,
                    "chunk upload failed, abandoning job"
                );
                return Err(UploadError::ChunkUpload {
                    chunk: number,
                    attempts,
                    source: err,
                });
            }

            job.set_status(number, ChunkStatus::Pending);
            let delay = self.config.delay_for_attempt(attempts);
            warn!(
                upload_id = %job.upload_id(),
                chunk = number,
                attempt = attempts,
                error = %err,
                retry_in_ms = delay.as_millis() as u64,
                "chunk upload failed, retrying"
            );

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!(upload_id = %job.upload_id(), chunk = number, "upload cancelled during backoff");
                    return Err(UploadError::Cancelled);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Issues the single combine request for a fully uploaded job.
    async fn combine(
        &self,
        endpoint: &dyn UploadEndpoint,
        job: &UploadJob,
    ) -> Result<String, UploadError> {
        self.check_cancelled()?;

        let upload_id = job.upload_id().to_string();
        let req = CombineRequest {
            upload_id: upload_id.clone(),
            total_chunks: job.total_chunks(),
        };

        let failure = |source: TransportError| {
            error!(upload_id = %upload_id, error = %source, "combine failed");
            UploadError::Combine {
                upload_id: upload_id.clone(),
                source,
            }
        };

        let resp = endpoint.combine(&req).await.map_err(&failure)?;
        if !resp.success {
            let reason = resp
                .error
                .unwrap_or_else(|| "endpoint reported failure".into());
            return Err(failure(TransportError::Rejected(reason)));
        }
        if resp.url.is_empty() {
            return Err(failure(TransportError::InvalidResponse(
                "combine response has no url".into(),
            )));
        }
        Ok(resp.url)
    }

    fn check_cancelled(&self) -> Result<(), UploadError> {
        if self.cancel.is_cancelled() {
            Err(UploadError::Cancelled)
        } else {
            Ok(())
        }
    }
}
