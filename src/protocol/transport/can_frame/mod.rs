//! In-memory representation of a classic CAN data frame.
use crate::protocol::transport::can_id::CanId;

/// Maximum payload of a classic CAN frame.
pub const MAX_FRAME_DATA: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Raw frame as written to or read from the CAN bus.
pub struct CanFrame {
    /// Identifier of the sending node.
    pub id: CanId,
    /// Payload buffer. Classic CAN frames always provide eight bytes.
    pub data: [u8; MAX_FRAME_DATA],
    /// Number of valid payload bytes (Data Length Code, 0 to 8).
    pub len: usize,
}

impl CanFrame {
    /// Build a frame from at most eight bytes; `None` when `bytes` is longer.
    pub fn new(id: CanId, bytes: &[u8]) -> Option<Self> {
        if bytes.len() > MAX_FRAME_DATA {
            return None;
        }
        Some(Self::truncating(id, bytes))
    }

    /// Build a frame, silently dropping everything past the eighth byte.
    pub fn truncating(id: CanId, bytes: &[u8]) -> Self {
        let len = bytes.len().min(MAX_FRAME_DATA);
        let mut data = [0u8; MAX_FRAME_DATA];
        data[..len].copy_from_slice(&bytes[..len]);
        Self { id, data, len }
    }

    /// Immutable view over the valid payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

impl embedded_can::Frame for CanFrame {
    fn new(id: impl Into<embedded_can::Id>, data: &[u8]) -> Option<Self> {
        CanFrame::new(CanId::from(id.into()), data)
    }

    /// Remote frames carry no data and play no part in the chunk protocol.
    fn new_remote(_id: impl Into<embedded_can::Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        self.id.is_extended()
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> embedded_can::Id {
        self.id.into()
    }

    fn dlc(&self) -> usize {
        self.len
    }

    fn data(&self) -> &[u8] {
        self.payload()
    }
}
