//! Tunables of a [`CanNode`](super::CanNode): transport timeouts, dispatch
//! loop pacing, and the background thread identity.
use core::time::Duration;

use crate::protocol::transport::{
    CAN_SEND_TIMEOUT_MS, DEFAULT_RECEIVE_TIMEOUT_MS, DISPATCH_ERROR_BACKOFF_MS,
    DISPATCH_POLL_INTERVAL_MS,
};

/// Name given to the background dispatch thread.
pub const DEFAULT_DISPATCH_THREAD_NAME: &str = "can-node-rx";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// Upper bound for one frame transmission.
    pub transmit_timeout: Duration,
    /// Timeout used by `receive_default`.
    pub receive_timeout: Duration,
    /// Receive timeout of each dispatch loop poll; bounds how long stopping the loop takes.
    pub poll_interval: Duration,
    /// Pause after a failed receive in the dispatch loop.
    pub error_backoff: Duration,
    /// Delay inserted between consecutive chunks of one message.
    ///
    /// Zero sends back-to-back. Controllers with shallow TX queues may need 1-2 ms.
    pub inter_frame_delay: Duration,
    pub thread_name: String,
    /// Stack size of the dispatch thread; platform default when `None`.
    pub stack_size: Option<usize>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            transmit_timeout: Duration::from_millis(CAN_SEND_TIMEOUT_MS),
            receive_timeout: Duration::from_millis(DEFAULT_RECEIVE_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DISPATCH_POLL_INTERVAL_MS),
            error_backoff: Duration::from_millis(DISPATCH_ERROR_BACKOFF_MS),
            inter_frame_delay: Duration::ZERO,
            thread_name: DEFAULT_DISPATCH_THREAD_NAME.to_string(),
            stack_size: None,
        }
    }
}

impl NodeConfig {
    pub fn with_transmit_timeout(mut self, timeout: Duration) -> Self {
        self.transmit_timeout = timeout;
        self
    }

    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }

    pub fn with_inter_frame_delay(mut self, delay: Duration) -> Self {
        self.inter_frame_delay = delay;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }
}
