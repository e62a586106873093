use std::time::Duration;

/// Default chunk size: 5 MiB.
///
/// Chosen to stay below the request body limit of the hosted storage
/// functions the endpoint runs on.
pub const DEFAULT_CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// Default number of attempts per chunk before the whole job is abandoned.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Backoff unit. The wait before retry `k` is `k * DEFAULT_BACKOFF_STEP`.
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_millis(1000);

/// Path appended to the upload endpoint for the reassembly request.
pub const COMBINE_PATH: &str = "/combine";

/// Multipart form field names of a chunk request.
pub mod fields {
    pub const CHUNK: &str = "chunk";
    pub const UPLOAD_ID: &str = "uploadId";
    pub const CHUNK_NUMBER: &str = "chunkNumber";
    pub const TOTAL_CHUNKS: &str = "totalChunks";
    pub const CHECKSUM: &str = "checksum";
}
