//! Transport layer: CAN identifiers and frames, bus speeds, the chunk
//! segmentation protocol, and the bus abstraction trait.
//!
//! ## Timing Constants
//!
//! Default delays and timeouts used by [`CanNode`](crate::protocol::node::CanNode)
//! unless overridden through [`NodeConfig`](crate::protocol::node::config::NodeConfig).

pub mod can_frame;
pub mod can_id;
pub mod can_speed;
pub mod chunked;
pub mod traits;

/// Timeout for sending a single CAN frame (ms).
///
/// Prevents indefinite blocking when the bus is faulty, disconnected, or saturated.
/// A classic 8-byte frame takes well under a millisecond at 125 kbit/s without
/// contention; arbitration losses and retransmissions stay far below this bound.
pub const CAN_SEND_TIMEOUT_MS: u64 = 100;

/// Default timeout for a blocking [`CanNode::receive`](crate::protocol::node::CanNode::receive) poll (ms).
pub const DEFAULT_RECEIVE_TIMEOUT_MS: u64 = 100;

/// Poll interval of the background dispatch loop (ms).
///
/// A receive timeout is a normal outcome: the loop checks its stop flag and polls again.
/// This bounds how long stopping the loop can take.
pub const DISPATCH_POLL_INTERVAL_MS: u64 = 100;

/// Pause after a failed receive before the dispatch loop polls again (ms).
pub const DISPATCH_ERROR_BACKOFF_MS: u64 = 10;
