/// Test doubles to simulate the CAN bus during integration tests.
use cannode::{CanBus, CanFrame, CanSpeed};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[allow(dead_code)]
/// In-memory CAN bus reproducing the `CanBus` trait behavior.
pub struct MockCanBus {
    tx: Sender<CanFrame>,
    rx: Mutex<Receiver<CanFrame>>,
    pub stats: Arc<BusStats>,
}

#[derive(Debug, Default)]
#[allow(dead_code)]
/// Counters shared with the test body, surviving the node that owns the bus.
pub struct BusStats {
    /// Receive calls currently blocked inside the transport.
    pub active_polls: AtomicUsize,
    /// Receive calls issued so far.
    pub total_polls: AtomicUsize,
    pub transmitted: AtomicUsize,
    pub open: AtomicBool,
    /// Make every receive fail until cleared.
    pub fail_receive: AtomicBool,
}

#[allow(dead_code)]
impl BusStats {
    pub fn total_polls(&self) -> usize {
        self.total_polls.load(Ordering::SeqCst)
    }

    pub fn active_polls(&self) -> usize {
        self.active_polls.load(Ordering::SeqCst)
    }
}

#[allow(dead_code)]
impl MockCanBus {
    /// Construct a pair of interconnected buses (DUT ↔ host).
    pub fn create_pair() -> (Self, Self) {
        let (dut_tx, host_rx) = mpsc::channel();
        let (host_tx, dut_rx) = mpsc::channel();

        let dut_bus = Self {
            tx: dut_tx,
            rx: Mutex::new(dut_rx),
            stats: Arc::default(),
        };

        let host_bus = Self {
            tx: host_tx,
            rx: Mutex::new(host_rx),
            stats: Arc::default(),
        };

        (dut_bus, host_bus)
    }

    /// Single endpoint plus a sender to inject frames into it.
    pub fn with_injector() -> (Self, Sender<CanFrame>) {
        let (inject_tx, rx) = mpsc::channel();
        // Frames sent by the endpoint go nowhere once the sink is dropped.
        let (tx, _sink) = mpsc::channel();
        let bus = Self {
            tx,
            rx: Mutex::new(rx),
            stats: Arc::default(),
        };
        (bus, inject_tx)
    }
}

impl CanBus for MockCanBus {
    type Error = &'static str;

    fn open(&self, _speed: CanSpeed) -> Result<(), Self::Error> {
        self.stats.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) {
        self.stats.open.store(false, Ordering::SeqCst);
    }

    fn transmit(&self, frame: &CanFrame, _timeout: Duration) -> Result<(), Self::Error> {
        self.stats.transmitted.fetch_add(1, Ordering::SeqCst);
        // A vanished peer behaves like an unplugged cable: the frame is lost.
        let _ = self.tx.send(*frame);
        Ok(())
    }

    fn receive(&self, timeout: Duration) -> Result<Option<CanFrame>, Self::Error> {
        self.stats.total_polls.fetch_add(1, Ordering::SeqCst);
        self.stats.active_polls.fetch_add(1, Ordering::SeqCst);

        let result = if self.stats.fail_receive.load(Ordering::SeqCst) {
            std::thread::sleep(timeout.min(Duration::from_millis(2)));
            Err("bus error")
        } else {
            let rx = self.rx.lock().unwrap();
            match rx.recv_timeout(timeout) {
                Ok(frame) => Ok(Some(frame)),
                Err(RecvTimeoutError::Timeout) => Ok(None),
                Err(RecvTimeoutError::Disconnected) => {
                    drop(rx);
                    std::thread::sleep(timeout);
                    Ok(None)
                }
            }
        };

        self.stats.active_polls.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[allow(dead_code)]
/// Route library logs to the test output; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
