//! Error definitions shared across library modules.
//! Each type models a specific failure scenario (identifier validation,
//! segmentation, node operations over a given transport).
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Errors that can occur while building a CAN identifier.
pub enum CanIdError {
    /// Raw value does not fit in a 29-bit extended identifier.
    #[error("Identifier out of range: {raw:#X} exceeds 29 bits")]
    OutOfRange { raw: u32 },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Errors raised while splitting a payload into chunk frames.
pub enum ChunkError {
    /// Payload needs more chunks than the one-byte chunk count can express.
    #[error("Payload too large: {len} bytes exceeds maximum of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },
}

//==================================================================================NODE_ERROR
#[derive(Error, Debug)]
/// Errors surfaced by [`CanNode`](crate::protocol::node::CanNode) operations.
///
/// Generic over the transport error so the driver's own diagnostics survive.
pub enum NodeError<E: core::fmt::Debug> {
    /// Transport refused to start (driver install / controller start).
    #[error("Transport init failed: {0:?}")]
    TransportInit(E),

    /// `begin` was called on a node that is already running.
    #[error("Node already started")]
    AlreadyStarted,

    /// Send or receive attempted before `begin`.
    #[error("Node not started")]
    NotStarted,

    /// Single-frame transmission failed.
    #[error("Transmit failed: {0:?}")]
    Transmit(E),

    /// A chunk of a segmented message failed; earlier chunks are already on the bus.
    #[error("Transmit of chunk {index}/{count} failed: {error:?}")]
    ChunkTransmit { index: u8, count: u8, error: E },

    /// Transport failure while polling for a frame.
    #[error("Receive failed: {0:?}")]
    Receive(E),

    /// Payload could not be segmented.
    #[error(transparent)]
    Chunk(#[from] ChunkError),

    /// The background dispatch thread could not be spawned.
    #[error("Dispatch thread spawn failed: {0}")]
    Spawn(#[from] std::io::Error),

    /// Observer registration attempted from inside an observer callback.
    #[error("Observer registration from within a callback is not allowed")]
    ReentrantCall,

    /// Value could not be serialized to JSON.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
