//! Bit-level field primitives shared by the sample decoders.

use crate::{DriverError, Result};

/// Bit 11 of a 12-bit two's-complement field.
pub const SIGN_BIT_12: u16 = 0x800;

/// Low 11 bits of a sign + magnitude field.
pub const MAGNITUDE_MASK_11: u16 = 0x7FF;

/// Only the low nibble of the high byte carries data in a 12-bit field.
pub const HIGH_NIBBLE_MASK: u8 = 0x0F;

/// Sign-extend the low `bits` bits of `value` into an `i32`.
///
/// `bits` must be in `1..=32`.
pub const fn sign_extend(value: u32, bits: u32) -> i32 {
    debug_assert!(bits >= 1 && bits <= 32);
    let shift = 32 - bits;
    ((value << shift) as i32) >> shift
}

/// Assemble a signed 12-bit reading from its high and low bytes.
///
/// Bits 4..7 of `high` are ignored.
pub const fn twelve_bit(high: u8, low: u8) -> i32 {
    let raw = (((high & HIGH_NIBBLE_MASK) as u32) << 8) | low as u32;
    sign_extend(raw, 12)
}

/// Little-endian unsigned 16-bit value (low byte first).
pub const fn u16_le(low: u8, high: u8) -> u16 {
    u16::from_le_bytes([low, high])
}

/// Big-endian unsigned 16-bit value (high byte first).
pub const fn u16_be(high: u8, low: u8) -> u16 {
    u16::from_be_bytes([high, low])
}

/// Read a little-endian `u32` at `offset`, failing when the slice is too short.
pub fn read_u32_le(data: &[u8], offset: usize) -> Result<u32> {
    let end = offset + 4;
    let bytes = data
        .get(offset..end)
        .ok_or(DriverError::ShortPayload { expected: end, actual: data.len() })?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn twelve_bit_boundaries() {
        assert_eq!(twelve_bit(0x08, 0x00), -2048);
        assert_eq!(twelve_bit(0x08, 0x00) as u32, 0xFFFF_F800);
        assert_eq!(twelve_bit(0x07, 0xFF), 2047);
        assert_eq!(twelve_bit(0x0F, 0xFF), -1);
        assert_eq!(twelve_bit(0x00, 0x00), 0);
    }

    #[test]
    fn twelve_bit_ignores_upper_nibble() {
        assert_eq!(twelve_bit(0xF7, 0xFF), 2047);
        assert_eq!(twelve_bit(0xA8, 0x00), -2048);
    }

    #[test]
    fn endian_helpers() {
        assert_eq!(u16_le(0x34, 0x12), 0x1234);
        assert_eq!(u16_be(0x12, 0x34), 0x1234);
        assert_eq!(read_u32_le(&[0, 0x78, 0x56, 0x34, 0x12], 1).unwrap(), 0x1234_5678);
    }

    #[test]
    fn read_u32_le_out_of_bounds() {
        let err = read_u32_le(&[1, 2, 3], 0).unwrap_err();
        assert!(matches!(err, DriverError::ShortPayload { expected: 4, actual: 3 }));
    }

    proptest! {
        #[test]
        fn prop_twelve_bit_matches_or_mask_extension(high in any::<u8>(), low in any::<u8>()) {
            let mut v = (((high & 0x0F) as u32) << 8) | low as u32;
            if v & 0x800 != 0 {
                v |= 0xFFFF_F000;
            }
            prop_assert_eq!(twelve_bit(high, low), v as i32);
            prop_assert!((-2048..=2047).contains(&twelve_bit(high, low)));
        }

        #[test]
        fn prop_sign_extend_16_matches_i16_cast(value in any::<u16>()) {
            prop_assert_eq!(sign_extend(value as u32, 16), value as i16 as i32);
        }
    }
}
