//! Bluetooth chest-strap heart-rate monitor.
//!
//! The strap streams fixed 60-byte PDUs, but the transport delivers them in
//! arbitrary slices. Partial PDUs are carried to the next call.

use serde::Serialize;

use super::{DriverKind, ParseResponse, SensorDriver, SensorRecord, keys};
use crate::framing::CarryFramer;
use crate::types::{FieldMap, FieldValue, ParameterSpec, ParameterType, RawPacket, SensorParameter};
use crate::Result;

/// Size of one heart-rate PDU.
pub const PDU_SIZE: usize = 60;

const HEART_RATE_OFFSET: usize = 12;
const BEAT_COUNT_OFFSET: usize = 13;

static PARAMETERS: &[SensorParameter] = &[
    SensorParameter::data(keys::HEART_RATE, ParameterType::Integer, "Heart Rate"),
    SensorParameter::data(keys::BEAT_COUNT, ParameterType::Integer, "Beat counter that rolls over"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeartRateSample {
    /// Beats per minute
    pub heart_rate: u8,
    /// Rolls over at 255
    pub beat_count: u8,
}

impl HeartRateSample {
    pub fn field_map(&self) -> FieldMap {
        FieldMap::from([
            (keys::HEART_RATE, FieldValue::Int(i32::from(self.heart_rate))),
            (keys::BEAT_COUNT, FieldValue::Int(i32::from(self.beat_count))),
        ])
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HeartRateMonitor;

impl SensorDriver for HeartRateMonitor {
    fn kind(&self) -> DriverKind {
        DriverKind::HeartRate
    }

    fn parameters(&self) -> ParameterSpec {
        ParameterSpec::new(PARAMETERS)
    }

    fn decode(&self, packets: &[RawPacket], remainder: &[u8]) -> Result<ParseResponse> {
        let mut framer = CarryFramer::new(PDU_SIZE, remainder);
        for packet in packets {
            tracing::debug!("heart-rate packet: {} bytes", packet.len());
            framer.push(&packet.payload);
        }

        let mut records = Vec::new();
        while let Some(pdu) = framer.next_record() {
            let sample = HeartRateSample {
                heart_rate: pdu[HEART_RATE_OFFSET],
                beat_count: pdu[BEAT_COUNT_OFFSET],
            };
            tracing::trace!("HR: {} BC: {}", sample.heart_rate, sample.beat_count);
            records.push(SensorRecord::HeartRate(sample));
        }

        let remainder = framer.into_remainder();
        tracing::debug!("heart-rate decode done, {} bytes carried", remainder.len());
        Ok(ParseResponse { records, remainder })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stream(pdus: &[(u8, u8)], tail: usize) -> Vec<u8> {
        let mut bytes = Vec::new();
        for (i, &(hr, bc)) in pdus.iter().enumerate() {
            let mut pdu = vec![i as u8; PDU_SIZE];
            pdu[HEART_RATE_OFFSET] = hr;
            pdu[BEAT_COUNT_OFFSET] = bc;
            bytes.extend(pdu);
        }
        bytes.extend(std::iter::repeat_n(0xEE, tail));
        bytes
    }

    fn decode_in_slices(bytes: &[u8], cuts: &[usize]) -> (Vec<SensorRecord>, Vec<u8>) {
        let mut remainder = Vec::new();
        let mut records = Vec::new();
        let mut start = 0;
        for end in cuts.iter().copied().chain(std::iter::once(bytes.len())) {
            let packet = RawPacket::new(bytes[start..end].to_vec(), 1, 0);
            let response = HeartRateMonitor.decode(&[packet], &remainder).unwrap();
            records.extend(response.records);
            remainder = response.remainder;
            start = end;
        }
        (records, remainder)
    }

    #[test]
    fn reads_rate_and_beat_count_offsets() {
        let bytes = stream(&[(0x48, 0x10)], 0);
        let response = HeartRateMonitor.decode(&[RawPacket::new(bytes, 1, 0)], &[]).unwrap();
        assert_eq!(
            response.records,
            vec![SensorRecord::HeartRate(HeartRateSample { heart_rate: 72, beat_count: 16 })]
        );
        let map = response.records[0].field_map();
        assert_eq!(map.get("HR"), Some(&FieldValue::Int(72)));
        assert_eq!(map.get("BC"), Some(&FieldValue::Int(16)));
    }

    #[test]
    fn chunking_does_not_change_output() {
        let bytes = stream(&[(60, 1), (61, 2)], 30);
        assert_eq!(bytes.len(), 150);

        let whole = decode_in_slices(&bytes, &[]);
        assert_eq!(whole.0.len(), 2);
        assert_eq!(whole.1.len(), 30);

        assert_eq!(decode_in_slices(&bytes, &[10]), whole);
        assert_eq!(decode_in_slices(&bytes, &[59, 60]), whole);
    }

    #[test]
    fn remainder_is_combined_with_multiple_packets() {
        let bytes = stream(&[(80, 9)], 0);
        let packets = [
            RawPacket::new(bytes[20..40].to_vec(), 1, 0),
            RawPacket::new(bytes[40..].to_vec(), 1, 0),
        ];
        let response = HeartRateMonitor.decode(&packets, &bytes[..20]).unwrap();
        assert_eq!(response.records.len(), 1);
        assert!(response.remainder.is_empty());
    }

    #[test]
    fn short_input_is_all_remainder() {
        let response =
            HeartRateMonitor.decode(&[RawPacket::new(vec![1u8; 59], 1, 0)], &[]).unwrap();
        assert!(response.records.is_empty());
        assert_eq!(response.remainder.len(), 59);
    }

    proptest! {
        #[test]
        fn prop_any_split_matches_single_call(
            pdus in prop::collection::vec((any::<u8>(), any::<u8>()), 0..5),
            tail in 0usize..PDU_SIZE,
            cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..6),
        ) {
            let bytes = stream(&pdus, tail);
            let mut cuts: Vec<usize> = cuts.into_iter().map(|i| i.index(bytes.len() + 1)).collect();
            cuts.sort_unstable();

            let (records, remainder) = decode_in_slices(&bytes, &cuts);
            prop_assert_eq!(records.len(), pdus.len());
            prop_assert_eq!(remainder.len(), tail);
            for (record, &(hr, bc)) in records.iter().zip(&pdus) {
                prop_assert_eq!(
                    record,
                    &SensorRecord::HeartRate(HeartRateSample { heart_rate: hr, beat_count: bc })
                );
            }
        }
    }
}
