use crate::TransferError;

/// Rejects a zero-length payload.
///
/// An empty upload has no chunk to carry the upload id, so the endpoint
/// could never combine it.
pub fn validate_payload_len(total_bytes: u64) -> Result<(), TransferError> {
    if total_bytes == 0 {
        return Err(TransferError::EmptyPayload);
    }
    Ok(())
}

/// Rejects a chunk size of zero.
pub fn validate_chunk_size(chunk_size: usize) -> Result<(), TransferError> {
    if chunk_size == 0 {
        return Err(TransferError::InvalidChunkSize(chunk_size));
    }
    Ok(())
}
