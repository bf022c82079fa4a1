//! Raw packet type delivered by transports.

use std::sync::Arc;

/// One delivery from the transport layer.
///
/// The payload is shared, so a packet can be cloned into a replay log or a
/// test fixture without copying bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    /// Bytes exactly as received from the device
    pub payload: Arc<[u8]>,

    /// Number of samples the transport says the payload carries
    pub sample_count: u32,

    /// Timestamp the transport attached to the whole series
    pub series_timestamp: i64,
}

impl RawPacket {
    /// Create a new packet
    pub fn new(payload: impl Into<Arc<[u8]>>, sample_count: u32, series_timestamp: i64) -> Self {
        Self { payload: payload.into(), sample_count, series_timestamp }
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// True when the payload carries no bytes
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
