//! In-process endpoint that stores chunks in memory.
//!
//! Behaves like a well-formed remote endpoint: chunks are keyed by
//! `(upload_id, chunk_number)` so redelivery overwrites, and combine
//! concatenates chunks in number order. Faults can be scripted per chunk
//! number, which makes it the test double for the client.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use coursemart_protocol::{CombineRequest, CombineResponse};
use coursemart_transfer::checksum_bytes;
use tokio::time::Instant;

use crate::endpoint::{ChunkRequest, EndpointFuture, UploadEndpoint};
use crate::error::TransportError;

/// URL scheme of objects assembled by [`MemoryEndpoint`].
pub const MEMORY_URL_SCHEME: &str = "memory://";

/// A request observed by the endpoint, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointCall {
    Chunk {
        upload_id: String,
        chunk_number: u32,
        total_chunks: u32,
        at: Instant,
    },
    Combine {
        upload_id: String,
        total_chunks: u32,
        at: Instant,
    },
}

#[derive(Debug, Clone, Copy)]
enum Fault {
    /// Reject without storing.
    Reject,
    /// Store the chunk, then report failure (lost acknowledgement).
    DropAck,
}

#[derive(Default)]
struct MemoryState {
    chunks: HashMap<(String, u32), Vec<u8>>,
    objects: HashMap<String, Vec<u8>>,
    calls: Vec<EndpointCall>,
    chunk_faults: HashMap<u32, Vec<Fault>>,
    combine_failures: u32,
    /// Upload ids with a chunk delivery in progress.
    in_flight: HashSet<String>,
}

/// In-memory [`UploadEndpoint`].
#[derive(Default)]
pub struct MemoryEndpoint {
    state: Mutex<MemoryState>,
}

impl MemoryEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rejects the next `times` deliveries of chunk `number`.
    pub fn fail_chunk(&self, number: u32, times: u32) {
        let mut state = self.state();
        let faults = state.chunk_faults.entry(number).or_default();
        faults.extend(std::iter::repeat_n(Fault::Reject, times as usize));
    }

    /// Stores the next `times` deliveries of chunk `number` but reports
    /// failure, as if the acknowledgement was lost on the way back.
    pub fn drop_ack(&self, number: u32, times: u32) {
        let mut state = self.state();
        let faults = state.chunk_faults.entry(number).or_default();
        faults.extend(std::iter::repeat_n(Fault::DropAck, times as usize));
    }

    /// Fails the next `times` combine requests.
    pub fn fail_combine(&self, times: u32) {
        self.state().combine_failures += times;
    }

    /// Every request received so far, in arrival order.
    pub fn calls(&self) -> Vec<EndpointCall> {
        self.state().calls.clone()
    }

    /// Chunk numbers in the order they were received (retries included).
    pub fn chunk_sequence(&self) -> Vec<u32> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                EndpointCall::Chunk { chunk_number, .. } => Some(*chunk_number),
                EndpointCall::Combine { .. } => None,
            })
            .collect()
    }

    /// How many times chunk `number` was delivered.
    pub fn chunk_attempts(&self, number: u32) -> usize {
        self.chunk_sequence()
            .into_iter()
            .filter(|n| *n == number)
            .count()
    }

    /// Number of combine requests received.
    pub fn combine_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, EndpointCall::Combine { .. }))
            .count()
    }

    /// Bytes of the assembled object for `upload_id`.
    pub fn object(&self, upload_id: &str) -> Option<Vec<u8>> {
        self.state().objects.get(upload_id).cloned()
    }

    /// Number of stored (not yet combined) chunks for `upload_id`.
    pub fn stored_chunks(&self, upload_id: &str) -> usize {
        self.state()
            .chunks
            .keys()
            .filter(|(id, _)| id == upload_id)
            .count()
    }

    /// Marks a chunk of `upload_id` as in flight. One job never has two
    /// chunks in flight; separate jobs do not block each other.
    fn begin_delivery(&self, upload_id: &str) -> Result<InFlight<'_>, TransportError> {
        if !self.state().in_flight.insert(upload_id.to_string()) {
            return Err(TransportError::Rejected(format!(
                "concurrent chunk delivery for upload {upload_id}"
            )));
        }
        Ok(InFlight {
            endpoint: self,
            upload_id: upload_id.to_string(),
        })
    }

    fn receive_chunk(&self, request: ChunkRequest<'_>) -> Result<(), TransportError> {
        let mut state = self.state();
        state.calls.push(EndpointCall::Chunk {
            upload_id: request.upload_id.to_string(),
            chunk_number: request.chunk_number,
            total_chunks: request.total_chunks,
            at: Instant::now(),
        });

        let fault = state
            .chunk_faults
            .get_mut(&request.chunk_number)
            .and_then(|faults| (!faults.is_empty()).then(|| faults.remove(0)));
        if let Some(Fault::Reject) = fault {
            return Err(TransportError::Status {
                status: 503,
                body: format!("chunk {} rejected", request.chunk_number),
            });
        }

        if request.chunk_number == 0 || request.chunk_number > request.total_chunks {
            return Err(TransportError::Rejected(format!(
                "chunk number {} out of range 1..={}",
                request.chunk_number, request.total_chunks
            )));
        }
        if !request.checksum.is_empty() && checksum_bytes(request.data) != request.checksum {
            return Err(TransportError::Rejected("checksum mismatch".into()));
        }

        // Keyed insert: redelivery overwrites.
        state.chunks.insert(
            (request.upload_id.to_string(), request.chunk_number),
            request.data.to_vec(),
        );

        match fault {
            Some(Fault::DropAck) => Err(TransportError::Status {
                status: 504,
                body: "gateway timeout".into(),
            }),
            _ => Ok(()),
        }
    }

    fn assemble(&self, request: &CombineRequest) -> Result<CombineResponse, TransportError> {
        let mut state = self.state();
        state.calls.push(EndpointCall::Combine {
            upload_id: request.upload_id.clone(),
            total_chunks: request.total_chunks,
            at: Instant::now(),
        });

        if state.combine_failures > 0 {
            state.combine_failures -= 1;
            return Err(TransportError::Status {
                status: 500,
                body: "combine failed".into(),
            });
        }

        let mut object = Vec::new();
        for number in 1..=request.total_chunks {
            let key = (request.upload_id.clone(), number);
            let Some(data) = state.chunks.get(&key) else {
                return Err(TransportError::Rejected(format!("missing chunk {number}")));
            };
            object.extend_from_slice(data);
        }

        state.chunks.retain(|(id, _), _| id != &request.upload_id);
        state.objects.insert(request.upload_id.clone(), object);
        Ok(CombineResponse::ok(format!(
            "{MEMORY_URL_SCHEME}{}",
            request.upload_id
        )))
    }
}

/// Clears the in-flight mark when a delivery ends, including when its
/// future is dropped mid-request.
struct InFlight<'a> {
    endpoint: &'a MemoryEndpoint,
    upload_id: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.endpoint.state().in_flight.remove(&self.upload_id);
    }
}

impl UploadEndpoint for MemoryEndpoint {
    fn upload_chunk<'a>(&'a self, request: ChunkRequest<'a>) -> EndpointFuture<'a, ()> {
        Box::pin(async move {
            let _delivery = self.begin_delivery(request.upload_id)?;
            let result = self.receive_chunk(request);
            // Stay in flight across a yield so overlapping deliveries are caught.
            tokio::task::yield_now().await;
            result
        })
    }

    fn combine<'a>(&'a self, request: &'a CombineRequest) -> EndpointFuture<'a, CombineResponse> {
        Box::pin(async move { self.assemble(request) })
    }
}
