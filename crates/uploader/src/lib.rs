//! Chunked upload client.
//!
//! Transfers an arbitrarily large payload to an endpoint that only accepts
//! bounded-size requests. The payload is split into ordered chunks, each
//! chunk is delivered sequentially with bounded retry, and the endpoint is
//! finally asked to reassemble them into one object.
//!
//! # Pipeline
//!
//! 1. **Plan**: lay the payload out as `chunk_size` ranges, read one at a time
//! 2. **Upload**: send chunk 1..=N in order, retrying each with linear backoff
//! 3. **Combine**: ask the endpoint to reassemble the chunks and return a URL
//!
//! The transport sits behind [`UploadEndpoint`]; [`HttpEndpoint`] talks to a
//! real server, [`MemoryEndpoint`] keeps everything in-process.

pub mod client;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod memory;
mod source;
pub mod types;

// Re-export primary types for convenience.
pub use client::ChunkedUploadClient;
pub use endpoint::{ChunkRequest, EndpointFuture, UploadEndpoint};
pub use error::{TransportError, UploadError};
pub use http::HttpEndpoint;
pub use memory::{EndpointCall, MemoryEndpoint};
pub use types::{ProgressFn, UploadConfig, UploadOutcome};
