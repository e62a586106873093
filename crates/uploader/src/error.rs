//! Upload error types.

use coursemart_transfer::TransferError;

/// Failure of a single request to the endpoint.
///
/// Chunk requests that fail this way are retried; the error only reaches the
/// caller as the `source` of an [`UploadError`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("rejected by endpoint: {0}")]
    Rejected(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid auth token")]
    InvalidToken,

    #[error("invalid endpoint URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Terminal failure of an upload job.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("chunk {chunk} failed after {attempts} attempts: {source}")]
    ChunkUpload {
        chunk: u32,
        attempts: u32,
        source: TransportError,
    },

    #[error("combine failed for upload {upload_id}: {source}")]
    Combine {
        upload_id: String,
        source: TransportError,
    },

    #[error("cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TransferError> for UploadError {
    fn from(e: TransferError) -> Self {
        UploadError::Validation(e.to_string())
    }
}

impl UploadError {
    /// True if a chunk exhausted its retries. Nothing was reassembled.
    pub fn is_chunk_failure(&self) -> bool {
        matches!(self, UploadError::ChunkUpload { .. })
    }

    /// True if every chunk was stored but reassembly failed.
    pub fn is_combine_failure(&self) -> bool {
        matches!(self, UploadError::Combine { .. })
    }

    /// Number of the chunk that exhausted its retries, if any.
    pub fn failed_chunk(&self) -> Option<u32> {
        match self {
            UploadError::ChunkUpload { chunk, .. } => Some(*chunk),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_failure_names_chunk() {
        let err = UploadError::ChunkUpload {
            chunk: 2,
            attempts: 3,
            source: TransportError::Status {
                status: 503,
                body: "busy".into(),
            },
        };
        assert!(err.is_chunk_failure());
        assert!(!err.is_combine_failure());
        assert_eq!(err.failed_chunk(), Some(2));
        let msg = err.to_string();
        assert!(msg.contains("chunk 2"), "{msg}");
        assert!(msg.contains("503"), "{msg}");
    }

    #[test]
    fn combine_failure_is_distinct() {
        let err = UploadError::Combine {
            upload_id: "u1".into(),
            source: TransportError::Rejected("missing chunk 3".into()),
        };
        assert!(err.is_combine_failure());
        assert!(!err.is_chunk_failure());
        assert_eq!(err.failed_chunk(), None);
        assert!(err.to_string().contains("u1"));
    }

    #[test]
    fn transfer_error_becomes_validation() {
        let err: UploadError = TransferError::EmptyPayload.into();
        assert!(matches!(err, UploadError::Validation(ref m) if m.contains("empty")));
    }

    #[test]
    fn source_chain_is_preserved() {
        use std::error::Error;
        let err = UploadError::ChunkUpload {
            chunk: 1,
            attempts: 3,
            source: TransportError::InvalidToken,
        };
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "invalid auth token");
    }
}
