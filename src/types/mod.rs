//! Core types shared by the sensor drivers.
//!
//! ## Architecture
//!
//! - [`RawPacket`] is one transport delivery: a shared payload, its declared
//!   sample count and the series timestamp
//! - [`bits`] holds the byte-field primitives every decoder is built from
//! - [`ParameterSpec`] lists what a driver can be configured with and reports
//! - [`FieldValue`] and [`FieldMap`] are the wire-compatible record view
//! - [`ParamBundle`] carries host-supplied settings and legacy print requests
//!
//! ## Usage Example
//!
//! ```rust
//! use sensor_codecs::types::{RawPacket, bits};
//!
//! let packet = RawPacket::new(vec![0x00, 0x08], 1, 1_700_000_000);
//! let value = bits::twelve_bit(packet.payload[1], packet.payload[0]);
//! assert_eq!(value, -2048);
//! ```

pub mod bits;
mod packet;
mod parameter;
mod params;
mod value;

pub use packet::RawPacket;
pub use parameter::{ParameterPurpose, ParameterSpec, SensorParameter};
pub use params::{ParamBundle, ParamValue};
pub use value::{FieldMap, FieldValue, ParameterType};
