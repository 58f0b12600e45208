//! Supported bus bit rates, forwarded to the transport when the node starts.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Nominal CAN bus speed. Every node on a segment must agree on it.
pub enum CanSpeed {
    /// 1 Mbit/s, the default.
    #[default]
    Mbps1,
    /// 500 kbit/s.
    Kbps500,
    /// 250 kbit/s.
    Kbps250,
    /// 125 kbit/s.
    Kbps125,
}

impl CanSpeed {
    /// Bit rate in bits per second.
    pub const fn bitrate(&self) -> u32 {
        match self {
            CanSpeed::Mbps1 => 1_000_000,
            CanSpeed::Kbps500 => 500_000,
            CanSpeed::Kbps250 => 250_000,
            CanSpeed::Kbps125 => 125_000,
        }
    }
}
