//! Writer configuration

use crate::types::InvalidCharPolicy;

/// Environment variable overriding the worker count.
pub const ENV_WORKERS: &str = "XLSXSTREAM_WORKERS";
/// Environment variable overriding the deflate level.
pub const ENV_COMPRESSION: &str = "XLSXSTREAM_COMPRESSION";

/// Tuning knobs for [`crate::XlsxWriter`].
///
/// None of these change the bytes of the worksheet; they only trade memory
/// and CPU for throughput. `compression_level` changes the archive bytes but
/// not its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    /// Encoding workers used by [`crate::XlsxWriter::write_all`].
    pub workers: usize,
    /// Deflate level, 0 (store) to 9 (smallest).
    pub compression_level: u32,
    /// Capacity of each bounded channel between pipeline stages.
    pub queue_depth: usize,
    /// Idle buffers the pool keeps around between rows.
    pub pool_retain: usize,
    /// Starting capacity of freshly allocated encoding buffers.
    pub buffer_capacity: usize,
    /// Handling of characters XML cannot carry.
    pub invalid_chars: InvalidCharPolicy,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self::with_workers(num_cpus::get())
    }
}

impl WriterOptions {
    /// Defaults sized for `workers` encoding threads (at least one).
    pub fn with_workers(workers: usize) -> Self {
        let workers = workers.max(1);
        WriterOptions {
            workers,
            compression_level: 6,
            queue_depth: workers * 4,
            pool_retain: workers * 4,
            buffer_capacity: 4 * 1024,
            invalid_chars: InvalidCharPolicy::Replace,
        }
    }

    /// Defaults, overridden by `XLSXSTREAM_WORKERS` / `XLSXSTREAM_COMPRESSION`
    /// when they are set and parse.
    pub fn from_env() -> Self {
        let mut options = std::env::var(ENV_WORKERS)
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .map(Self::with_workers)
            .unwrap_or_default();
        if let Some(level) = std::env::var(ENV_COMPRESSION)
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok())
        {
            options = options.compression_level(level);
        }
        options
    }

    /// Set worker count, resizing the queue and pool to match.
    pub fn workers(self, workers: usize) -> Self {
        WriterOptions {
            compression_level: self.compression_level,
            buffer_capacity: self.buffer_capacity,
            invalid_chars: self.invalid_chars,
            ..Self::with_workers(workers)
        }
    }

    /// Set deflate level (clamped to 9).
    pub fn compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }

    pub fn queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth.max(1);
        self
    }

    pub fn pool_retain(mut self, retain: usize) -> Self {
        self.pool_retain = retain;
        self
    }

    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    pub fn invalid_chars(mut self, policy: InvalidCharPolicy) -> Self {
        self.invalid_chars = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_scale_with_workers() {
        let options = WriterOptions::with_workers(3);
        assert_eq!(options.workers, 3);
        assert_eq!(options.queue_depth, 12);
        assert_eq!(options.pool_retain, 12);
        assert_eq!(options.compression_level, 6);
        assert_eq!(options.invalid_chars, InvalidCharPolicy::Replace);
    }

    #[test]
    fn test_zero_workers_means_one() {
        assert_eq!(WriterOptions::with_workers(0).workers, 1);
        assert!(WriterOptions::default().workers >= 1);
    }

    #[test]
    fn test_builder_keeps_unrelated_settings() {
        let options = WriterOptions::with_workers(2)
            .compression_level(42)
            .invalid_chars(InvalidCharPolicy::Reject)
            .workers(5);
        assert_eq!(options.workers, 5);
        assert_eq!(options.queue_depth, 20);
        assert_eq!(options.compression_level, 9);
        assert_eq!(options.invalid_chars, InvalidCharPolicy::Reject);
    }
}
