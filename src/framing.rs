//! Record framing for sensor byte streams.
//!
//! Two policies exist side by side:
//!
//! - [`FixedWidthFramer`] splits a single payload into whole records and drops
//!   any trailing partial record.
//! - [`CarryFramer`] accumulates bytes across deliveries and hands the partial
//!   tail back as a remainder, so a record split across two packets is still
//!   decoded exactly once.

use std::slice::ChunksExact;
use tracing::debug;

/// Stateless splitter for payloads made of fixed-size records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedWidthFramer {
    record_size: usize,
}

impl FixedWidthFramer {
    /// `record_size` must be non-zero.
    pub const fn new(record_size: usize) -> Self {
        assert!(record_size > 0, "record size must be non-zero");
        Self { record_size }
    }

    /// Whole records in `payload`, in order.
    ///
    /// Bytes past the last whole record are not yielded and are not carried
    /// into the next call.
    pub fn records<'a>(&self, payload: &'a [u8]) -> ChunksExact<'a, u8> {
        let chunks = payload.chunks_exact(self.record_size);
        let dropped = chunks.remainder().len();
        if dropped > 0 {
            debug!(
                "Dropping {} trailing bytes ({}-byte records, {} byte payload)",
                dropped,
                self.record_size,
                payload.len()
            );
        }
        chunks
    }
}

/// Incremental framer that carries a partial record between deliveries.
///
/// Feed it with [`push`](Self::push), drain complete records with
/// [`next_record`](Self::next_record), then take the leftover bytes with
/// [`into_remainder`](Self::into_remainder). The remainder is always shorter
/// than one record.
#[derive(Debug, Clone)]
pub struct CarryFramer {
    buf: Vec<u8>,
    pos: usize,
    record_size: usize,
}

impl CarryFramer {
    /// Start a framer seeded with the remainder from the previous call.
    pub fn new(record_size: usize, remainder: &[u8]) -> Self {
        assert!(record_size > 0, "record size must be non-zero");
        let mut buf = Vec::with_capacity(record_size * 4);
        buf.extend_from_slice(remainder);
        Self { buf, pos: 0, record_size }
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Bytes buffered but not yet returned as a record.
    pub fn buffered(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Next complete record, if enough bytes are buffered.
    pub fn next_record(&mut self) -> Option<&[u8]> {
        if self.buffered() < self.record_size {
            return None;
        }
        let start = self.pos;
        self.pos += self.record_size;
        Some(&self.buf[start..self.pos])
    }

    /// Unconsumed bytes, to be passed back in on the next call.
    pub fn into_remainder(mut self) -> Vec<u8> {
        self.buf.drain(..self.pos);
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fixed_width_yields_whole_records() {
        let framer = FixedWidthFramer::new(6);
        let payload: Vec<u8> = (0..18).collect();
        let records: Vec<&[u8]> = framer.records(&payload).collect();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2], &[12, 13, 14, 15, 16, 17]);
    }

    #[test]
    fn fixed_width_drops_trailing_partial_record() {
        let framer = FixedWidthFramer::new(6);
        let payload: Vec<u8> = (0..10).collect();
        let records: Vec<&[u8]> = framer.records(&payload).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(framer.records(&payload[..5]).count(), 0);
    }

    #[test]
    fn carry_framer_keeps_partial_tail() {
        let mut framer = CarryFramer::new(4, &[1, 2]);
        framer.push(&[3, 4, 5]);
        assert_eq!(framer.next_record(), Some(&[1, 2, 3, 4][..]));
        assert_eq!(framer.next_record(), None);
        assert_eq!(framer.into_remainder(), vec![5]);
    }

    #[test]
    fn carry_framer_exact_fit_leaves_empty_remainder() {
        let mut framer = CarryFramer::new(3, &[]);
        framer.push(&[1, 2, 3, 4, 5, 6]);
        assert!(framer.next_record().is_some());
        assert!(framer.next_record().is_some());
        assert!(framer.next_record().is_none());
        assert!(framer.into_remainder().is_empty());
    }

    proptest! {
        #[test]
        fn prop_carry_framer_chunking_invariance(
            stream in prop::collection::vec(any::<u8>(), 0..400),
            cuts in prop::collection::vec(0usize..400, 0..6),
            record_size in 1usize..64,
        ) {
            let mut whole = CarryFramer::new(record_size, &[]);
            whole.push(&stream);
            let mut expected = Vec::new();
            while let Some(r) = whole.next_record() {
                expected.push(r.to_vec());
            }
            let expected_tail = whole.into_remainder();

            let mut cuts: Vec<usize> = cuts.into_iter().map(|c| c.min(stream.len())).collect();
            cuts.sort_unstable();
            let mut bounds = vec![0];
            bounds.extend(cuts);
            bounds.push(stream.len());

            let mut remainder = Vec::new();
            let mut actual = Vec::new();
            for pair in bounds.windows(2) {
                let mut framer = CarryFramer::new(record_size, &remainder);
                framer.push(&stream[pair[0]..pair[1]]);
                while let Some(r) = framer.next_record() {
                    actual.push(r.to_vec());
                }
                remainder = framer.into_remainder();
                prop_assert!(remainder.len() < record_size);
            }

            prop_assert_eq!(actual, expected);
            prop_assert_eq!(remainder, expected_tail);
        }
    }
}
