//! Built-in [`Provider`](crate::provider::Provider) implementations

pub mod channel;
pub mod replay;

pub use channel::{ChannelProvider, HostHandle, channel_provider};
pub use replay::{CommandLog, RecordedPacket, Recording, ReplayProvider};
