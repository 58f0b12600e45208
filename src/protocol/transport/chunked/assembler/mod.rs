//! Chunk assembler: rebuilds application payloads by aggregating the CAN
//! frames of one chunked message.
//!
//! A single reassembly context exists at a time. Any frame with chunk index 0
//! starts a new message, silently discarding an unfinished one. Payload bytes
//! are appended in arrival order; no reordering or gap detection takes place.
use core::str::Utf8Error;

use super::{ChunkHeader, CHUNK_HEADER_LEN};

//==================================================================================Enums and Structs
#[derive(Debug, PartialEq, Eq)]
pub enum ProcessResult {
    /// Frame too short to carry a header, or a stray chunk of a message
    /// other than the active one.
    Ignored,
    /// Frame integrated but additional chunks are still missing.
    FragmentConsumed,
    /// All announced chunks were received; the complete message is now available.
    MessageComplete(CompletedMessage),
}

/// Container returning a reassembled message, detached from the assembler buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedMessage {
    /// Identifier shared by the chunks of this message.
    pub message_id: u8,
    /// Reassembled payload.
    pub payload: Vec<u8>,
}

impl CompletedMessage {
    /// Borrow the payload as UTF-8 text.
    pub fn as_str(&self) -> Result<&str, Utf8Error> {
        core::str::from_utf8(&self.payload)
    }

    /// Deserialize the payload as a JSON document.
    pub fn parse_json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}

/// In-progress state of a partially received message.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ReassemblyContext {
    message_id: u8,
    expected_chunks: u8,
    received_chunks: usize,
    buffer: Vec<u8>,
}

/// Possible states of the assembler.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum AssemblyState {
    /// No message in progress (never started, or last one completed).
    #[default]
    Idle,
    /// Chunks of `message_id` are being collected.
    Accumulating(ReassemblyContext),
}

/// Reassembly state machine fed with every received frame, in receipt order.
#[derive(Debug, Clone, Default)]
pub struct ChunkAssembler {
    state: AssemblyState,
}

impl ChunkAssembler {
    /// Instantiate the assembler in the idle state.
    pub const fn new() -> Self {
        Self {
            state: AssemblyState::Idle,
        }
    }

    //==================================================================================Process Functions
    /// Process the payload of a received CAN frame.
    ///
    /// Transition rules, in order:
    /// 1. fewer than three bytes: ignored;
    /// 2. chunk index 0: (re)initialize the context for this message id;
    /// 3. chunk of the active message: append the bytes after the header;
    ///    chunks of any other message are dropped;
    /// 4. once the received count reaches the announced count (at least one),
    ///    hand out the payload and return to idle.
    pub fn process_frame(&mut self, data: &[u8]) -> ProcessResult {
        let Some(header) = ChunkHeader::decode(data) else {
            return ProcessResult::Ignored;
        };

        if header.is_first() {
            if let AssemblyState::Accumulating(previous) = &self.state {
                tracing::debug!(
                    discarded_id = previous.message_id,
                    received = previous.received_chunks,
                    expected = previous.expected_chunks,
                    new_id = header.message_id,
                    "discarding incomplete message"
                );
            }
            self.state = AssemblyState::Accumulating(ReassemblyContext {
                message_id: header.message_id,
                expected_chunks: header.chunk_count,
                received_chunks: 0,
                buffer: Vec::with_capacity(
                    header.chunk_count as usize * super::CHUNK_PAYLOAD_CAPACITY,
                ),
            });
        }

        let context = match &mut self.state {
            AssemblyState::Accumulating(context) if context.message_id == header.message_id => {
                context
            }
            _ => {
                tracing::trace!(
                    message_id = header.message_id,
                    chunk_index = header.chunk_index,
                    "dropping stray chunk"
                );
                return ProcessResult::Ignored;
            }
        };

        context.buffer.extend_from_slice(&data[CHUNK_HEADER_LEN..]);
        context.received_chunks += 1;

        if context.expected_chunks >= 1
            && context.received_chunks == context.expected_chunks as usize
        {
            let message = CompletedMessage {
                message_id: context.message_id,
                payload: core::mem::take(&mut context.buffer),
            };
            self.state = AssemblyState::Idle;
            return ProcessResult::MessageComplete(message);
        }

        ProcessResult::FragmentConsumed
    }

    /// Message id currently being collected, if any.
    pub fn active_message_id(&self) -> Option<u8> {
        match &self.state {
            AssemblyState::Idle => None,
            AssemblyState::Accumulating(context) => Some(context.message_id),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == AssemblyState::Idle
    }

    /// Drop any partial message.
    pub fn reset(&mut self) {
        self.state = AssemblyState::Idle;
    }
}
