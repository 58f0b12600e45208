//! Receive side of a node: the frame fan-out to the registered observers and
//! the background loop that feeds it.
//!
//! The loop is an explicit two-state machine, `Idle` or `Running`. The node
//! recomputes the wanted state after every observer change; starting an
//! already running loop or stopping an idle one is a no-op.
use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crate::protocol::node::config::NodeConfig;
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::chunked::assembler::{ChunkAssembler, ProcessResult};
use crate::protocol::transport::traits::can_bus::CanBus;

/// Observer receiving every frame verbatim.
pub type RawCallback = Box<dyn FnMut(&CanFrame) + Send>;
/// Observer receiving fully reassembled payloads.
pub type PayloadCallback = Box<dyn FnMut(&str) + Send>;

thread_local! {
    // Dispatcher served by the current thread, if it is a dispatch thread.
    static DISPATCH_OWNER: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Lock a mutex, recovering the data if an observer panicked while holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Whether the calling thread is the dispatch thread serving `dispatcher`.
pub(crate) fn is_dispatch_thread_of(dispatcher: &Arc<Mutex<FrameDispatcher>>) -> bool {
    let key = Arc::as_ptr(dispatcher) as usize;
    DISPATCH_OWNER.with(|owner| owner.get() == Some(key))
}

//==================================================================================FRAME_DISPATCHER
/// Fan-out of the received frame stream.
///
/// Every frame reaches the raw observer first. Independently, frames are fed
/// to the assembler while a payload observer is registered, and completed
/// payloads are handed to that observer.
#[derive(Default)]
pub struct FrameDispatcher {
    raw: Option<RawCallback>,
    payload: Option<PayloadCallback>,
    assembler: ChunkAssembler,
}

impl core::fmt::Debug for FrameDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameDispatcher")
            .field("raw", &self.raw.is_some())
            .field("payload", &self.payload.is_some())
            .field("assembler", &self.assembler)
            .finish()
    }
}

impl FrameDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace or remove the raw-frame observer.
    pub fn set_raw_observer(&mut self, observer: Option<RawCallback>) {
        self.raw = observer;
    }

    /// Replace or remove the payload observer.
    ///
    /// Removing it also drops any partial message, so a later observer never
    /// sees chunks collected before it was registered.
    pub fn set_payload_observer(&mut self, observer: Option<PayloadCallback>) {
        if observer.is_none() {
            self.assembler.reset();
        }
        self.payload = observer;
    }

    /// At least one observer is registered, so the dispatch loop must run.
    pub fn has_observers(&self) -> bool {
        self.raw.is_some() || self.payload.is_some()
    }

    /// Remove both observers and drop any partial message.
    pub fn clear(&mut self) {
        self.raw = None;
        self.payload = None;
        self.assembler.reset();
    }

    /// Sole entry point of the receive path, called once per frame in receipt order.
    pub fn on_frame(&mut self, frame: &CanFrame) {
        if let Some(raw) = self.raw.as_mut() {
            raw(frame);
        }

        let Some(observer) = self.payload.as_mut() else {
            return;
        };

        if let ProcessResult::MessageComplete(message) =
            self.assembler.process_frame(frame.payload())
        {
            tracing::trace!(
                message_id = message.message_id,
                len = message.payload.len(),
                "message complete"
            );
            match message.as_str() {
                Ok(text) => observer(text),
                Err(error) => {
                    tracing::warn!(
                        message_id = message.message_id,
                        %error,
                        "payload is not valid UTF-8, delivering lossy text"
                    );
                    observer(&String::from_utf8_lossy(&message.payload));
                }
            }
        }
    }
}

//==================================================================================DISPATCH_LOOP
/// Lifecycle of the background receive loop.
#[derive(Debug, Default)]
pub(crate) enum DispatchLoop {
    /// No observer registered, no thread.
    #[default]
    Idle,
    /// Thread polling the bus on behalf of the observers.
    Running(LoopHandle),
}

#[derive(Debug)]
pub(crate) struct LoopHandle {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl DispatchLoop {
    pub(crate) fn is_running(&self) -> bool {
        matches!(self, DispatchLoop::Running(_))
    }

    /// Move to `Running` when `wanted`, to `Idle` otherwise.
    pub(crate) fn update<C: CanBus>(
        &mut self,
        wanted: bool,
        bus: &Arc<C>,
        dispatcher: &Arc<Mutex<FrameDispatcher>>,
        config: &NodeConfig,
    ) -> io::Result<()> {
        match (wanted, self.is_running()) {
            (true, false) => {
                *self = DispatchLoop::Running(LoopHandle::spawn(bus, dispatcher, config)?);
                tracing::debug!(thread = %config.thread_name, "dispatch loop started");
                Ok(())
            }
            (false, true) => {
                self.stop();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Stop the loop and wait for its thread; no observer runs once this returns.
    pub(crate) fn stop(&mut self) {
        let DispatchLoop::Running(handle) = core::mem::take(self) else {
            return;
        };
        handle.stop.store(true, Ordering::Release);

        // The loop cannot join itself; the flag alone ends it after the current frame.
        if handle.thread.thread().id() == thread::current().id() {
            return;
        }
        if handle.thread.join().is_err() {
            tracing::error!("dispatch thread terminated by a panicking observer");
        } else {
            tracing::debug!("dispatch loop stopped");
        }
    }
}

impl LoopHandle {
    fn spawn<C: CanBus>(
        bus: &Arc<C>,
        dispatcher: &Arc<Mutex<FrameDispatcher>>,
        config: &NodeConfig,
    ) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));

        let mut builder = thread::Builder::new().name(config.thread_name.clone());
        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let bus = Arc::clone(bus);
        let dispatcher = Arc::clone(dispatcher);
        let flag = Arc::clone(&stop);
        let poll_interval = config.poll_interval;
        let error_backoff = config.error_backoff;

        let thread = builder.spawn(move || {
            run(&*bus, &dispatcher, &flag, poll_interval, error_backoff);
        })?;

        Ok(Self { stop, thread })
    }
}

/// Body of the dispatch thread: poll, fan out, repeat until stopped.
///
/// Receive timeouts and receive errors never end the loop; only the stop flag does.
fn run<C: CanBus>(
    bus: &C,
    dispatcher: &Arc<Mutex<FrameDispatcher>>,
    stop: &AtomicBool,
    poll_interval: Duration,
    error_backoff: Duration,
) {
    DISPATCH_OWNER.with(|owner| owner.set(Some(Arc::as_ptr(dispatcher) as usize)));

    while !stop.load(Ordering::Acquire) {
        match bus.receive(poll_interval) {
            Ok(Some(frame)) => {
                tracing::trace!(id = frame.id.raw(), len = frame.len, "frame received");
                let mut dispatcher = lock(dispatcher);
                // A stop requested during the receive wins over the frame.
                if stop.load(Ordering::Acquire) {
                    break;
                }
                dispatcher.on_frame(&frame);
            }
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(?error, "receive failed, polling continues");
                thread::sleep(error_backoff);
            }
        }
    }

    DISPATCH_OWNER.with(|owner| owner.set(None));
}
