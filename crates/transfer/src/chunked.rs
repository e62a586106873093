use sha2::{Digest, Sha256};

use crate::types::Chunk;
use crate::validation::{validate_chunk_size, validate_payload_len};
use crate::TransferError;

// ---------------------------------------------------------------------------
// Checksum helpers
// ---------------------------------------------------------------------------

/// Computes SHA-256 of `data` and returns the hex-encoded digest.
pub fn checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Partitioning
// ---------------------------------------------------------------------------

/// Number of chunks a payload of `total_bytes` splits into (`ceil(S / C)`).
pub fn chunk_count(total_bytes: u64, chunk_size: usize) -> u64 {
    if chunk_size == 0 {
        return 0;
    }
    total_bytes.div_ceil(chunk_size as u64)
}

/// Lays out 1-based, contiguous chunks of `chunk_size` bytes over a payload
/// of `total_bytes`.
///
/// Every chunk but the last is exactly `chunk_size` bytes; the last holds the
/// non-empty remainder. Only ranges are produced: the bytes themselves are
/// read from the source when a chunk is sent.
pub fn plan_chunks(total_bytes: u64, chunk_size: usize) -> Result<Vec<Chunk>, TransferError> {
    validate_payload_len(total_bytes)?;
    validate_chunk_size(chunk_size)?;

    let count = chunk_count(total_bytes, chunk_size);
    let too_many = || TransferError::TooManyChunks {
        bytes: total_bytes,
        chunk_size,
        max: u32::MAX,
    };
    let count = u32::try_from(count).map_err(|_| too_many())?;

    let step = chunk_size as u64;
    let chunks = (0..count)
        .map(|i| {
            let offset = u64::from(i) * step;
            let len = (total_bytes - offset).min(step) as usize;
            Chunk::new(i + 1, offset, len)
        })
        .collect();
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChunkStatus;

    const MIB: u64 = 1024 * 1024;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn checksum_bytes_deterministic() {
        let c1 = checksum_bytes(b"hello world");
        let c2 = checksum_bytes(b"hello world");
        assert_eq!(c1, c2);
        assert_eq!(c1.len(), 64); // SHA-256 = 64 hex chars.
    }

    #[test]
    fn checksum_bytes_different_data() {
        assert_ne!(checksum_bytes(b"hello"), checksum_bytes(b"world"));
    }

    #[test]
    fn chunk_count_is_ceiling() {
        assert_eq!(chunk_count(12 * MIB, 5 * MIB as usize), 3);
        assert_eq!(chunk_count(10 * MIB, 5 * MIB as usize), 2);
        assert_eq!(chunk_count(MIB, 5 * MIB as usize), 1);
        assert_eq!(chunk_count(1, 1), 1);
        assert_eq!(chunk_count(0, 5), 0);
        assert_eq!(chunk_count(5, 0), 0);
    }

    #[test]
    fn plan_twelve_mib_in_five_mib_chunks() {
        let chunks = plan_chunks(12 * MIB, 5 * MIB as usize).unwrap();

        let sizes: Vec<usize> = chunks.iter().map(|c| c.len).collect();
        let mib = MIB as usize;
        assert_eq!(sizes, vec![5 * mib, 5 * mib, 2 * mib]);

        let numbers: Vec<u32> = chunks.iter().map(|c| c.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);

        let offsets: Vec<u64> = chunks.iter().map(|c| c.offset).collect();
        assert_eq!(offsets, vec![0, 5 * MIB, 10 * MIB]);

        assert!(chunks.iter().all(|c| c.status == ChunkStatus::Pending));
    }

    #[test]
    fn plan_smaller_than_chunk_size() {
        let chunks = plan_chunks(MIB, 5 * MIB as usize).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len, MIB as usize);
    }

    #[test]
    fn plan_multi_gib_payload_without_data() {
        // 4 GiB + 1 byte: only ranges are allocated.
        let total = 4 * 1024 * MIB + 1;
        let chunks = plan_chunks(total, 5 * MIB as usize).unwrap();
        let last = chunks.last().unwrap();
        assert_eq!(chunks.len() as u64, chunk_count(total, 5 * MIB as usize));
        assert_eq!(last.range().end, total);
        assert_eq!(last.len, (total % (5 * MIB)) as usize);
    }

    #[test]
    fn plan_empty_payload_fails() {
        let result = plan_chunks(0, 5 * MIB as usize);
        assert!(matches!(result, Err(TransferError::EmptyPayload)));
    }

    #[test]
    fn plan_zero_chunk_size_fails() {
        let result = plan_chunks(4, 0);
        assert!(matches!(result, Err(TransferError::InvalidChunkSize(0))));
    }

    #[test]
    fn plan_rejects_chunk_number_overflow() {
        let result = plan_chunks(u64::from(u32::MAX) + 1, 1);
        assert!(matches!(result, Err(TransferError::TooManyChunks { .. })));
    }

    #[test]
    fn chunks_partition_payload_exactly() {
        for size in [1usize, 2, 7, 64, 100, 1000, 4097] {
            let payload = pattern(size);
            for chunk_size in [1usize, 3, 8, 64, 99, 4096, 10_000] {
                let chunks = plan_chunks(size as u64, chunk_size).unwrap();
                assert_eq!(chunks.len() as u64, chunk_count(size as u64, chunk_size));

                let mut expected_offset = 0;
                let mut rebuilt = Vec::with_capacity(size);
                for chunk in &chunks {
                    assert_eq!(chunk.offset, expected_offset, "gap or overlap");
                    assert!(chunk.len > 0);
                    assert!(chunk.len <= chunk_size);
                    expected_offset += chunk.len as u64;
                    rebuilt.extend_from_slice(chunk.slice(&payload));
                }
                assert_eq!(rebuilt, payload, "size {size}, chunk size {chunk_size}");
            }
        }
    }
}
