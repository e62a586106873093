//! Data types for the upload flow.

use std::time::Duration;

use coursemart_protocol::{DEFAULT_BACKOFF_STEP, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_RETRIES};

use crate::error::UploadError;

/// Tuning for one [`ChunkedUploadClient`](crate::ChunkedUploadClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfig {
    /// Bytes per chunk.
    pub chunk_size: usize,
    /// Attempts per chunk before the job is abandoned.
    pub max_retries: u32,
    /// Linear backoff unit: retry `k` waits `k * backoff_step`.
    pub backoff_step: Duration,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_step: DEFAULT_BACKOFF_STEP,
        }
    }
}

impl UploadConfig {
    /// Checks the config before any I/O happens.
    pub fn validate(&self) -> Result<(), UploadError> {
        if self.chunk_size == 0 {
            return Err(UploadError::Validation("chunk size must be positive".into()));
        }
        if self.max_retries == 0 {
            return Err(UploadError::Validation(
                "max retries must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Delay before retrying after the `attempt`-th failure (1-based).
    ///
    /// Grows linearly: 1 s, 2 s, 3 s, … with the default step.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff_step.saturating_mul(attempt)
    }
}

/// Result of a fully uploaded and reassembled job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Public reference of the assembled object.
    pub url: String,
    pub upload_id: String,
    pub total_chunks: u32,
    pub total_bytes: u64,
}

/// Receives the percentage of acknowledged chunks after each success.
pub type ProgressFn = dyn Fn(u8) + Send + Sync;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = UploadConfig::default();
        assert_eq!(config.chunk_size, 5 * 1024 * 1024);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.backoff_step, Duration::from_millis(1000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn linear_backoff() {
        let config = UploadConfig::default();
        let delays: Vec<u128> = (1..=4)
            .map(|k| config.delay_for_attempt(k).as_millis())
            .collect();
        assert_eq!(delays, vec![1000, 2000, 3000, 4000]);
    }

    #[test]
    fn backoff_is_monotonic() {
        let config = UploadConfig {
            backoff_step: Duration::from_millis(250),
            ..Default::default()
        };
        let mut last = Duration::ZERO;
        for k in 1..=20 {
            let d = config.delay_for_attempt(k);
            assert!(d > last);
            last = d;
        }
    }

    #[test]
    fn zero_chunk_size_invalid() {
        let config = UploadConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(UploadError::Validation(_))));
    }

    #[test]
    fn zero_retries_invalid() {
        let config = UploadConfig {
            max_retries: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(UploadError::Validation(_))));
    }
}
