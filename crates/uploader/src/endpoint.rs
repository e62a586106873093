//! Transport seam between the upload client and the remote endpoint.

use std::future::Future;
use std::pin::Pin;

use coursemart_protocol::{CombineRequest, CombineResponse};

use crate::error::TransportError;

/// Boxed future returned by [`UploadEndpoint`] methods.
pub type EndpointFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

/// One chunk delivery.
#[derive(Debug, Clone, Copy)]
pub struct ChunkRequest<'a> {
    pub upload_id: &'a str,
    /// 1-based chunk number.
    pub chunk_number: u32,
    pub total_chunks: u32,
    /// SHA-256 hex checksum of `data`.
    pub checksum: &'a str,
    pub data: &'a [u8],
}

/// Abstract connection to a chunk-accepting storage endpoint.
///
/// Implementations must treat a redelivery of the same
/// `(upload_id, chunk_number)` as an overwrite, never an append: the client
/// retries chunks whose acknowledgement may have been lost.
pub trait UploadEndpoint: Send + Sync {
    /// Stores one chunk. `Ok` means the endpoint acknowledged it.
    fn upload_chunk<'a>(&'a self, request: ChunkRequest<'a>) -> EndpointFuture<'a, ()>;

    /// Reassembles every chunk of `request.upload_id` into one object.
    fn combine<'a>(&'a self, request: &'a CombineRequest) -> EndpointFuture<'a, CombineResponse>;
}
