//! Chunk protocol: carries payloads longer than one frame across successive
//! CAN frames, each prefixed with a three-byte header.
//!
//! ```text
//! byte 0      byte 1        byte 2        bytes 3..len
//! message_id  chunk_index   chunk_count   up to 5 payload bytes
//! ```
//!
//! Chunks are concatenated in arrival order on the receiving side.
use crate::protocol::transport::can_frame::MAX_FRAME_DATA;

/// Size of the header at the start of every chunk frame.
pub const CHUNK_HEADER_LEN: usize = 3;
/// Payload bytes carried by one chunk frame.
pub const CHUNK_PAYLOAD_CAPACITY: usize = MAX_FRAME_DATA - CHUNK_HEADER_LEN;
/// Chunk count and index share a single byte each.
pub const MAX_CHUNK_COUNT: usize = u8::MAX as usize;
/// Largest payload that can be segmented (255 chunks of 5 bytes).
pub const MAX_CHUNKED_PAYLOAD: usize = MAX_CHUNK_COUNT * CHUNK_PAYLOAD_CAPACITY;

pub mod assembler;
pub mod builder;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Header embedded in the first three bytes of every chunk frame.
pub struct ChunkHeader {
    /// Rolling per-sender message counter (wraps at 256).
    pub message_id: u8,
    /// 0-based position of the chunk within its message.
    pub chunk_index: u8,
    /// Total number of chunks in the message.
    pub chunk_count: u8,
}

impl ChunkHeader {
    /// Read the header from a frame payload; `None` when fewer than three bytes are present.
    ///
    /// No range check is applied: the assembler acts on whatever the sender wrote.
    pub fn decode(data: &[u8]) -> Option<Self> {
        match data {
            [message_id, chunk_index, chunk_count, ..] => Some(Self {
                message_id: *message_id,
                chunk_index: *chunk_index,
                chunk_count: *chunk_count,
            }),
            _ => None,
        }
    }

    pub fn encode(&self) -> [u8; CHUNK_HEADER_LEN] {
        [self.message_id, self.chunk_index, self.chunk_count]
    }

    /// A chunk with index 0 always opens a new message.
    #[inline]
    pub fn is_first(&self) -> bool {
        self.chunk_index == 0
    }

    /// `chunk_index < chunk_count` and `chunk_count >= 1`.
    pub fn is_well_formed(&self) -> bool {
        self.chunk_count >= 1 && self.chunk_index < self.chunk_count
    }
}

/// Number of chunks needed for `payload_len` bytes; an empty payload still takes one.
pub const fn chunk_count_for(payload_len: usize) -> usize {
    if payload_len == 0 {
        1
    } else {
        payload_len.div_ceil(CHUNK_PAYLOAD_CAPACITY)
    }
}
