//! CAN frame generator for chunked messages. Builds the ordered frame
//! sequence for a payload, one frame per five bytes.
use core::sync::atomic::{AtomicU8, Ordering};

use crate::error::ChunkError;
use crate::protocol::transport::can_frame::{CanFrame, MAX_FRAME_DATA};
use crate::protocol::transport::can_id::CanId;
use crate::protocol::transport::chunked::{
    chunk_count_for, ChunkHeader, CHUNK_HEADER_LEN, CHUNK_PAYLOAD_CAPACITY, MAX_CHUNKED_PAYLOAD,
};

//==================================================================================MESSAGE_ID
/// Per-node message identifier source, wrapping at 256.
///
/// Only unique enough to tell consecutive messages of one sender apart.
#[derive(Debug, Default)]
pub struct MessageIdCounter {
    next: AtomicU8,
}

impl MessageIdCounter {
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    pub const fn starting_at(first: u8) -> Self {
        Self {
            next: AtomicU8::new(first),
        }
    }

    /// Return the current identifier and advance the counter.
    pub fn next_id(&self) -> u8 {
        // fetch_add wraps on overflow.
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

//==================================================================================BUILDER
#[derive(Debug, Clone)]
/// Shared parameters for all frames composing one chunked message.
pub struct ChunkBuilder<'a> {
    id: CanId,
    message_id: u8,
    payload: &'a [u8],
}

/// Lazy iterator returning frames one by one, in index order.
pub struct ChunkIterator<'a> {
    builder: ChunkBuilder<'a>,
    chunk_index: usize,
    chunk_count: usize,
    failed: bool,
}

impl<'a> Iterator for ChunkIterator<'a> {
    type Item = Result<CanFrame, ChunkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.chunk_index >= self.chunk_count {
            return None;
        }

        let total_len = self.builder.payload.len();
        if total_len > MAX_CHUNKED_PAYLOAD {
            self.failed = true;
            return Some(Err(ChunkError::PayloadTooLarge {
                len: total_len,
                max: MAX_CHUNKED_PAYLOAD,
            }));
        }

        let header = ChunkHeader {
            message_id: self.builder.message_id,
            chunk_index: self.chunk_index as u8,
            chunk_count: self.chunk_count as u8,
        };

        let offset = self.chunk_index * CHUNK_PAYLOAD_CAPACITY;
        let copy_len = CHUNK_PAYLOAD_CAPACITY.min(total_len - offset);

        let mut data = [0u8; MAX_FRAME_DATA];
        data[..CHUNK_HEADER_LEN].copy_from_slice(&header.encode());
        data[CHUNK_HEADER_LEN..CHUNK_HEADER_LEN + copy_len]
            .copy_from_slice(&self.builder.payload[offset..offset + copy_len]);

        self.chunk_index += 1;

        Some(Ok(CanFrame {
            id: self.builder.id,
            data,
            len: CHUNK_HEADER_LEN + copy_len,
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let remaining = self.chunk_count.saturating_sub(self.chunk_index);
        (remaining.min(1), Some(remaining))
    }
}

impl<'a> ChunkBuilder<'a> {
    /// Prepare the frames of `payload`, stamped with the sender `id` and `message_id`.
    pub fn new(id: CanId, message_id: u8, payload: &'a [u8]) -> Self {
        Self {
            id,
            message_id,
            payload,
        }
    }

    /// Number of frames the message occupies (at least one).
    pub fn chunk_count(&self) -> usize {
        chunk_count_for(self.payload.len())
    }

    /// Start the iteration; each call to `next` yields the next frame.
    ///
    /// An oversized payload yields one `PayloadTooLarge` error and no frame.
    pub fn build(self) -> ChunkIterator<'a> {
        let chunk_count = self.chunk_count();
        ChunkIterator {
            builder: self,
            chunk_index: 0,
            chunk_count,
            failed: false,
        }
    }
}

/// Split `payload` into its complete, ordered frame sequence.
pub fn segment(id: CanId, message_id: u8, payload: &[u8]) -> Result<Vec<CanFrame>, ChunkError> {
    ChunkBuilder::new(id, message_id, payload).build().collect()
}
