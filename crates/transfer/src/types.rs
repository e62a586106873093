use chrono::Utc;

use crate::chunked::plan_chunks;
use crate::progress::progress_percent;
use crate::TransferError;

/// Upload state of a single chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkStatus {
    #[default]
    Pending,
    InFlight,
    Succeeded,
    Failed,
}

/// One contiguous byte range of the source payload.
///
/// A chunk only describes where its bytes live; they are read from the
/// source right before delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// 1-based position within the job.
    pub number: u32,
    /// Byte offset within the payload.
    pub offset: u64,
    /// Length in bytes, never zero.
    pub len: usize,
    pub status: ChunkStatus,
}

impl Chunk {
    pub fn new(number: u32, offset: u64, len: usize) -> Self {
        Self {
            number,
            offset,
            len,
            status: ChunkStatus::Pending,
        }
    }

    /// Byte range of this chunk within the payload.
    pub fn range(&self) -> std::ops::Range<u64> {
        self.offset..self.offset + self.len as u64
    }

    /// The bytes of this chunk within an in-memory payload.
    ///
    /// Panics if `payload` is shorter than the planned range.
    pub fn slice<'p>(&self, payload: &'p [u8]) -> &'p [u8] {
        let start = self.offset as usize;
        &payload[start..start + self.len]
    }
}

/// Generates an upload id from the current UTC time in microseconds plus a
/// random suffix, e.g. `1718000000123456-9f86d081`.
pub fn generate_upload_id() -> String {
    let micros = Utc::now().timestamp_micros();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{micros}-{}", &suffix[..8])
}

/// One logical file transfer: the payload laid out as ordered chunks sharing
/// a single upload id.
#[derive(Debug)]
pub struct UploadJob {
    upload_id: String,
    total_bytes: u64,
    chunk_size: usize,
    chunks: Vec<Chunk>,
}

impl UploadJob {
    /// Plans a job over `total_bytes` and assigns a freshly generated upload id.
    pub fn new(total_bytes: u64, chunk_size: usize) -> Result<Self, TransferError> {
        Self::with_upload_id(generate_upload_id(), total_bytes, chunk_size)
    }

    /// Plans a job under a caller-supplied upload id.
    pub fn with_upload_id(
        upload_id: impl Into<String>,
        total_bytes: u64,
        chunk_size: usize,
    ) -> Result<Self, TransferError> {
        let chunks = plan_chunks(total_bytes, chunk_size)?;
        Ok(Self {
            upload_id: upload_id.into(),
            total_bytes,
            chunk_size,
            chunks,
        })
    }

    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of chunks; equals the last chunk's number.
    pub fn total_chunks(&self) -> u32 {
        self.chunks.len() as u32
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Returns the chunk with the given 1-based number.
    pub fn chunk(&self, number: u32) -> Option<&Chunk> {
        let idx = (number as usize).checked_sub(1)?;
        self.chunks.get(idx)
    }

    /// Updates the status of chunk `number`. Unknown numbers are ignored.
    pub fn set_status(&mut self, number: u32, status: ChunkStatus) {
        if let Some(chunk) = (number as usize)
            .checked_sub(1)
            .and_then(|idx| self.chunks.get_mut(idx))
        {
            chunk.status = status;
        }
    }

    /// Puts every chunk back to `Pending` so the job can be driven again
    /// from chunk 1.
    pub fn reset(&mut self) {
        for chunk in &mut self.chunks {
            chunk.status = ChunkStatus::Pending;
        }
    }

    /// Number of chunks acknowledged by the endpoint.
    pub fn succeeded(&self) -> u32 {
        self.chunks
            .iter()
            .filter(|c| c.status == ChunkStatus::Succeeded)
            .count() as u32
    }

    /// True once every chunk has been acknowledged.
    pub fn is_complete(&self) -> bool {
        self.chunks
            .iter()
            .all(|c| c.status == ChunkStatus::Succeeded)
    }

    /// Current progress as a percentage of acknowledged chunks.
    pub fn progress(&self) -> u8 {
        progress_percent(self.succeeded(), self.total_chunks())
    }
}
