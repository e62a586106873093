//! Payload partitioning and per-job state for chunked uploads.
//!
//! Nothing in this crate performs I/O: it lays a payload of known length out
//! as an [`UploadJob`] of ordered [`Chunk`] ranges and tracks their status
//! while the uploader reads and drives them to the endpoint.

mod chunked;
mod progress;
mod types;
mod validation;

pub use chunked::{checksum_bytes, chunk_count, plan_chunks};
pub use coursemart_protocol::DEFAULT_CHUNK_SIZE;
pub use progress::progress_percent;
pub use types::{Chunk, ChunkStatus, UploadJob, generate_upload_id};
pub use validation::{validate_chunk_size, validate_payload_len};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("payload is empty")]
    EmptyPayload,

    #[error("invalid chunk size: {0}")]
    InvalidChunkSize(usize),

    #[error("payload of {bytes} bytes needs more than {max} chunks at chunk size {chunk_size}")]
    TooManyChunks {
        bytes: u64,
        chunk_size: usize,
        max: u32,
    },
}
