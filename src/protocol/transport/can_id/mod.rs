//! Bus identifiers: the numeric address a node stamps on every frame it sends.
//! Classic CAN knows 11-bit standard and 29-bit extended identifiers.
use crate::error::CanIdError;
use embedded_can::{ExtendedId, Id, StandardId};

/// Largest standard (11-bit) identifier.
pub const MAX_STANDARD_ID: u32 = 0x7FF;
/// Largest extended (29-bit) identifier.
pub const MAX_EXTENDED_ID: u32 = 0x1FFF_FFFF;

//==================================================================================CAN_ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Validated CAN identifier, assigned per node rather than per message.
pub struct CanId {
    raw: u32,
    extended: bool,
}

impl CanId {
    /// Picks the narrowest format: standard up to `0x7FF`, extended above.
    pub fn new(raw: u32) -> Result<Self, CanIdError> {
        if raw <= MAX_STANDARD_ID {
            Ok(Self {
                raw,
                extended: false,
            })
        } else {
            Self::extended(raw)
        }
    }

    /// Standard 11-bit identifier.
    pub fn standard(raw: u16) -> Result<Self, CanIdError> {
        if raw as u32 > MAX_STANDARD_ID {
            return Err(CanIdError::OutOfRange { raw: raw as u32 });
        }
        Ok(Self {
            raw: raw as u32,
            extended: false,
        })
    }

    /// Extended 29-bit identifier, even for values that would fit in 11 bits.
    pub fn extended(raw: u32) -> Result<Self, CanIdError> {
        if raw > MAX_EXTENDED_ID {
            return Err(CanIdError::OutOfRange { raw });
        }
        Ok(Self {
            raw,
            extended: true,
        })
    }

    /// Numeric identifier value.
    pub fn raw(&self) -> u32 {
        self.raw
    }

    pub fn is_extended(&self) -> bool {
        self.extended
    }
}

impl From<CanId> for Id {
    fn from(id: CanId) -> Self {
        // Ranges were checked at construction, the fallbacks are unreachable.
        if id.extended {
            Id::Extended(ExtendedId::new(id.raw).unwrap_or(ExtendedId::MAX))
        } else {
            Id::Standard(StandardId::new(id.raw as u16).unwrap_or(StandardId::MAX))
        }
    }
}

impl From<Id> for CanId {
    fn from(id: Id) -> Self {
        match id {
            Id::Standard(id) => Self {
                raw: id.as_raw() as u32,
                extended: false,
            },
            Id::Extended(id) => Self {
                raw: id.as_raw(),
                extended: true,
            },
        }
    }
}

impl TryFrom<u32> for CanId {
    type Error = CanIdError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}
