//! Minimal abstraction for a blocking CAN bus. Allows the library to plug
//! into various implementations (embedded HAL driver, SocketCAN, test doubles).
use core::time::Duration;

use crate::protocol::transport::{can_frame::CanFrame, can_speed::CanSpeed};

/// Contract to open the bus and to send and receive single frames.
///
/// Methods take `&self`: a node transmits from the caller's thread while its
/// dispatch loop receives on a background thread, both through one shared
/// transport. Implementations synchronize internally (most CAN controllers
/// have independent TX and RX paths).
pub trait CanBus: Send + Sync + 'static {
    type Error: core::fmt::Debug + Send + 'static;

    /// Install and start the controller at the requested speed.
    fn open(&self, speed: CanSpeed) -> Result<(), Self::Error>;

    /// Stop the controller and release the driver.
    fn close(&self);

    /// Emit a frame, waiting at most `timeout` for room in the TX queue.
    fn transmit(&self, frame: &CanFrame, timeout: Duration) -> Result<(), Self::Error>;

    /// Wait at most `timeout` for the next frame.
    ///
    /// `Ok(None)` means the timeout elapsed without traffic, which is not an error.
    fn receive(&self, timeout: Duration) -> Result<Option<CanFrame>, Self::Error>;
}
