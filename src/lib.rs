//! `cannode` library: a node abstraction over a CAN bus that carries
//! arbitrary-length text payloads (JSON documents, typically) on top of the
//! classic 8-byte frame limit. The crate exposes the transport primitives
//! (identifiers, frames, bus contract), the chunk segmentation/reassembly
//! protocol, and the node that ties them to a background dispatch loop.
//==================================================================================
/// Domain errors (identifier validation, segmentation, node operations).
pub mod error;
/// Chunk protocol, transport contract, and the node built on top of them.
pub mod protocol;
//==================================================================================

pub use error::{CanIdError, ChunkError, NodeError};
pub use protocol::node::{config::NodeConfig, CanNode};
pub use protocol::transport::{
    can_frame::CanFrame, can_id::CanId, can_speed::CanSpeed, traits::can_bus::CanBus,
};
