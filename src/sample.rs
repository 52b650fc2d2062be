//! Sample and buffer transfer types

use bytes::Bytes;
use std::time::Duration;

/// Timestamp of a sample relative to pipeline start
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp {
    /// Microseconds since the pipeline entered Playing
    pub micros: u64,
}

impl Timestamp {
    /// Create a new timestamp from microseconds
    pub fn from_micros(micros: u64) -> Self {
        Self { micros }
    }

    /// Create a timestamp from a duration since pipeline start
    pub fn from_duration(duration: Duration) -> Self {
        Self {
            micros: duration.as_micros() as u64,
        }
    }

    /// Convert to duration
    pub fn as_duration(&self) -> Duration {
        Duration::from_micros(self.micros)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}us", self.micros)
    }
}

/// One unit of produced media data
///
/// A sample may carry no buffer (a gap); the bridge silently skips those.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Payload bytes, if any
    pub buffer: Option<Bytes>,

    /// Presentation timestamp
    pub pts: Timestamp,

    /// Monotonic sequence number assigned by the source
    pub seq: u64,
}

impl Sample {
    /// Size of the payload in bytes, zero when the buffer is absent
    pub fn size(&self) -> usize {
        self.buffer.as_ref().map(Bytes::len).unwrap_or(0)
    }
}

/// Copy a buffer into newly allocated, caller-owned memory
///
/// The returned bytes share no storage with the input, severing the
/// lifetime coupling between the pipeline and the caller. No partial
/// copies are produced; allocation failure aborts the process.
pub fn copy_buffer(buffer: &Bytes) -> Bytes {
    Bytes::copy_from_slice(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_is_independent_storage() {
        let original = Bytes::from_static(b"payload under test");
        let copy = copy_buffer(&original);

        assert_eq!(copy, original);
        assert_ne!(copy.as_ptr(), original.as_ptr());
    }

    #[test]
    fn sample_size_without_buffer_is_zero() {
        let sample = Sample {
            buffer: None,
            pts: Timestamp::from_micros(0),
            seq: 0,
        };
        assert_eq!(sample.size(), 0);
    }

    #[test]
    fn timestamp_round_trips_through_duration() {
        let ts = Timestamp::from_duration(Duration::from_millis(1500));
        assert_eq!(ts.micros, 1_500_000);
        assert_eq!(ts.as_duration(), Duration::from_millis(1500));
    }
}
