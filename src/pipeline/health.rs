//! Health monitoring and metrics for a pipeline

use std::sync::atomic::{AtomicU64, Ordering};

/// Health metrics for a pipeline
///
/// All fields use atomic operations for thread-safe access from the
/// worker, the bridge and the caller.
pub struct PipelineHealth {
    /// Number of samples delivered to the caller or consumed by the sink
    samples_delivered: AtomicU64,

    /// Total payload bytes delivered
    bytes_delivered: AtomicU64,

    /// Number of samples dropped because teardown was already draining
    samples_dropped: AtomicU64,
}

impl PipelineHealth {
    /// Create a new health metrics instance
    pub fn new() -> Self {
        Self {
            samples_delivered: AtomicU64::new(0),
            bytes_delivered: AtomicU64::new(0),
            samples_dropped: AtomicU64::new(0),
        }
    }

    /// Record a delivered sample
    pub fn record_delivered(&self, size: usize) {
        self.samples_delivered.fetch_add(1, Ordering::Relaxed);
        self.bytes_delivered.fetch_add(size as u64, Ordering::Relaxed);
    }

    /// Record a sample dropped during teardown
    pub fn record_dropped(&self) {
        self.samples_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the number of delivered samples
    pub fn samples_delivered(&self) -> u64 {
        self.samples_delivered.load(Ordering::Relaxed)
    }

    /// Get the total delivered payload bytes
    pub fn bytes_delivered(&self) -> u64 {
        self.bytes_delivered.load(Ordering::Relaxed)
    }

    /// Get the number of dropped samples
    pub fn samples_dropped(&self) -> u64 {
        self.samples_dropped.load(Ordering::Relaxed)
    }

    /// One-line summary for periodic logging
    pub fn summary(&self) -> String {
        format!(
            "{} samples ({} bytes) delivered, {} dropped",
            self.samples_delivered(),
            self.bytes_delivered(),
            self.samples_dropped()
        )
    }
}

impl Default for PipelineHealth {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let health = PipelineHealth::new();
        health.record_delivered(100);
        health.record_delivered(50);
        health.record_dropped();

        assert_eq!(health.samples_delivered(), 2);
        assert_eq!(health.bytes_delivered(), 150);
        assert_eq!(health.samples_dropped(), 1);
        assert_eq!(health.summary(), "2 samples (150 bytes) delivered, 1 dropped");
    }
}
