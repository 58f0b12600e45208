//! CAN node: one bus identifier, a raw frame path, and a chunked payload path.
//!
//! Sending is synchronous on the caller's thread: raw frames go out as-is,
//! payloads are segmented and transmitted chunk by chunk. Receiving is either
//! a blocking [`CanNode::receive`] poll or, once an observer is registered,
//! a background dispatch loop that feeds the observers.
//!
//! ```rust,ignore
//! use cannode::{CanId, CanNode, CanSpeed};
//!
//! let mut node = CanNode::new(bus, CanId::new(0x42)?);
//! node.begin(CanSpeed::Kbps500)?;
//! node.set_json_callback(|text| println!("received {text}"))?;
//! node.send_json(r#"{"temp":21.5}"#)?;
//! ```
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{ChunkError, NodeError};
use crate::protocol::transport::{
    can_frame::CanFrame,
    can_id::CanId,
    can_speed::CanSpeed,
    chunked::{
        builder::{ChunkBuilder, MessageIdCounter},
        MAX_CHUNKED_PAYLOAD,
    },
    traits::can_bus::CanBus,
};

pub mod config;
pub mod dispatch;

use config::NodeConfig;
use dispatch::{lock, DispatchLoop, FrameDispatcher, PayloadCallback, RawCallback};

/// Node bound to a single bus identifier.
///
/// Dropping the node stops the dispatch loop before the observers are
/// released, then closes the transport if [`begin`](Self::begin) succeeded.
pub struct CanNode<C: CanBus> {
    id: CanId,
    config: NodeConfig,
    bus: Arc<C>,
    started: bool,
    message_ids: MessageIdCounter,
    dispatcher: Arc<Mutex<FrameDispatcher>>,
    dispatch_loop: Mutex<DispatchLoop>,
    // Mirror of `dispatch_loop.is_running()`, readable without the lifecycle lock.
    dispatching: AtomicBool,
}

impl<C: CanBus> CanNode<C> {
    /// Node with the default timeouts.
    pub fn new(bus: C, id: CanId) -> Self {
        Self::with_config(bus, id, NodeConfig::default())
    }

    pub fn with_config(bus: C, id: CanId, config: NodeConfig) -> Self {
        Self {
            id,
            config,
            bus: Arc::new(bus),
            started: false,
            message_ids: MessageIdCounter::new(),
            dispatcher: Arc::new(Mutex::new(FrameDispatcher::new())),
            dispatch_loop: Mutex::new(DispatchLoop::Idle),
            dispatching: AtomicBool::new(false),
        }
    }

    /// Identifier stamped on every frame this node sends.
    pub fn id(&self) -> CanId {
        self.id
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Underlying transport.
    pub fn bus(&self) -> &C {
        &self.bus
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Open the transport at `speed`. Fails if the driver cannot start.
    pub fn begin(&mut self, speed: CanSpeed) -> Result<(), NodeError<C::Error>> {
        if self.started {
            return Err(NodeError::AlreadyStarted);
        }
        self.bus.open(speed).map_err(NodeError::TransportInit)?;
        self.started = true;

        tracing::info!(
            id = self.id.raw(),
            bitrate = speed.bitrate(),
            "node started"
        );
        Ok(())
    }

    //==================================================================================SEND
    /// Send one raw frame. Bytes past the eighth are silently dropped.
    pub fn send(&self, data: &[u8]) -> Result<(), NodeError<C::Error>> {
        self.ensure_started()?;
        let frame = CanFrame::truncating(self.id, data);
        self.bus
            .transmit(&frame, self.config.transmit_timeout)
            .map_err(|error| {
                tracing::warn!(?error, "frame transmit failed");
                NodeError::Transmit(error)
            })
    }

    /// Segment `text` and send every chunk in order.
    ///
    /// Returns the message id used. On failure the chunks already sent stay on
    /// the bus; the receiver simply never completes that message.
    pub fn send_json(&self, text: &str) -> Result<u8, NodeError<C::Error>> {
        self.send_payload(text.as_bytes())
    }

    /// Byte-level variant of [`send_json`](Self::send_json).
    pub fn send_payload(&self, payload: &[u8]) -> Result<u8, NodeError<C::Error>> {
        self.ensure_started()?;

        // Checked up front so an oversized payload does not consume a message id.
        if payload.len() > MAX_CHUNKED_PAYLOAD {
            return Err(ChunkError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_CHUNKED_PAYLOAD,
            }
            .into());
        }

        let message_id = self.message_ids.next_id();
        let builder = ChunkBuilder::new(self.id, message_id, payload);
        let count = builder.chunk_count() as u8;

        for (index, frame) in builder.build().enumerate() {
            let frame = frame?;

            if index > 0 && !self.config.inter_frame_delay.is_zero() {
                std::thread::sleep(self.config.inter_frame_delay);
            }

            self.bus
                .transmit(&frame, self.config.transmit_timeout)
                .map_err(|error| {
                    tracing::warn!(message_id, index, count, ?error, "chunk transmit failed");
                    NodeError::ChunkTransmit {
                        index: index as u8,
                        count,
                        error,
                    }
                })?;
        }

        tracing::trace!(message_id, count, len = payload.len(), "message sent");
        Ok(message_id)
    }

    /// Serialize `value` to JSON and send it as a chunked message.
    pub fn send_json_value<T: serde::Serialize + ?Sized>(
        &self,
        value: &T,
    ) -> Result<u8, NodeError<C::Error>> {
        let text = serde_json::to_string(value)?;
        self.send_json(&text)
    }

    //==================================================================================RECEIVE
    /// Blocking poll for the next frame; `Ok(None)` when `timeout` elapses.
    ///
    /// While the dispatch loop runs, both compete for incoming frames.
    pub fn receive(&self, timeout: Duration) -> Result<Option<CanFrame>, NodeError<C::Error>> {
        self.ensure_started()?;
        self.bus.receive(timeout).map_err(NodeError::Receive)
    }

    /// [`receive`](Self::receive) with the configured default timeout.
    pub fn receive_default(&self) -> Result<Option<CanFrame>, NodeError<C::Error>> {
        self.receive(self.config.receive_timeout)
    }

    //==================================================================================OBSERVERS
    /// Register the observer receiving every frame; replaces the previous one.
    ///
    /// Observers run on the dispatch thread and must not register or clear
    /// observers of the same node (`NodeError::ReentrantCall`).
    pub fn set_receive_callback<F>(&self, callback: F) -> Result<(), NodeError<C::Error>>
    where
        F: FnMut(&CanFrame) + Send + 'static,
    {
        let callback: RawCallback = Box::new(callback);
        self.update_observers(|dispatcher| dispatcher.set_raw_observer(Some(callback)))
    }

    pub fn clear_receive_callback(&self) -> Result<(), NodeError<C::Error>> {
        self.update_observers(|dispatcher| dispatcher.set_raw_observer(None))
    }

    /// Register the observer receiving reassembled payloads; replaces the previous one.
    pub fn set_json_callback<F>(&self, callback: F) -> Result<(), NodeError<C::Error>>
    where
        F: FnMut(&str) + Send + 'static,
    {
        let callback: PayloadCallback = Box::new(callback);
        self.update_observers(|dispatcher| dispatcher.set_payload_observer(Some(callback)))
    }

    pub fn clear_json_callback(&self) -> Result<(), NodeError<C::Error>> {
        self.update_observers(|dispatcher| dispatcher.set_payload_observer(None))
    }

    /// Whether the background dispatch loop currently exists.
    ///
    /// Safe to call from an observer, even while another thread is stopping the loop.
    pub fn is_dispatching(&self) -> bool {
        self.dispatching.load(Ordering::Acquire)
    }

    /// Apply an observer change, then start or stop the loop to match.
    ///
    /// The lifecycle lock is held across both steps, and the dispatcher lock
    /// excludes an in-flight frame, so no observer is invoked while it is replaced.
    fn update_observers(
        &self,
        apply: impl FnOnce(&mut FrameDispatcher),
    ) -> Result<(), NodeError<C::Error>> {
        if dispatch::is_dispatch_thread_of(&self.dispatcher) {
            return Err(NodeError::ReentrantCall);
        }

        let mut dispatch_loop = lock(&self.dispatch_loop);
        let wanted = {
            let mut dispatcher = lock(&self.dispatcher);
            apply(&mut dispatcher);
            dispatcher.has_observers()
        };
        let result = dispatch_loop.update(wanted, &self.bus, &self.dispatcher, &self.config);
        self.dispatching.store(dispatch_loop.is_running(), Ordering::Release);
        result.map_err(NodeError::from)
    }

    fn ensure_started(&self) -> Result<(), NodeError<C::Error>> {
        if self.started {
            Ok(())
        } else {
            Err(NodeError::NotStarted)
        }
    }
}

impl<C: CanBus> Drop for CanNode<C> {
    fn drop(&mut self) {
        self.dispatch_loop
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .stop();
        self.dispatching.store(false, Ordering::Release);
        // On the dispatch thread the dispatcher is still locked by the current frame.
        if !dispatch::is_dispatch_thread_of(&self.dispatcher) {
            lock(&self.dispatcher).clear();
        }

        if self.started {
            self.bus.close();
            tracing::info!(id = self.id.raw(), "node stopped");
        }
    }
}

impl<C: CanBus> core::fmt::Debug for CanNode<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CanNode")
            .field("id", &self.id)
            .field("started", &self.started)
            .field("dispatching", &self.is_dispatching())
            .finish()
    }
}
