//! Wire contract between the chunked upload client and the remote storage endpoint.
//!
//! The endpoint accepts one multipart request per chunk and a single JSON
//! combine request once every chunk has been acknowledged.

pub mod constants;
pub mod messages;

// Re-export primary types for convenience.
pub use constants::{
    COMBINE_PATH, DEFAULT_BACKOFF_STEP, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_RETRIES, fields,
};
pub use messages::{CombineRequest, CombineResponse, ErrorResponse};
