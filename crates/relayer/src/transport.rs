use async_trait::async_trait;
use median_relay_types::PriceEvent;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Capability surface of the message bus as seen by the relayer.
///
/// Delivered events are already authenticated against the feeder allowlist;
/// the relayer does not re-verify signatures.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Wait for the next price event. Returns `None` once the transport has
    /// shut down and no further events will arrive.
    async fn next_price(&self) -> Option<PriceEvent>;
}

/// In-memory transport for testing. Events published with [`publish`]
/// are handed to `next_price` callers in order.
///
/// [`publish`]: MockTransport::publish
pub struct MockTransport {
    tx: Mutex<Option<mpsc::UnboundedSender<PriceEvent>>>,
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<PriceEvent>>,
}

impl MockTransport {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx: Mutex::new(Some(tx)),
            rx: tokio::sync::Mutex::new(rx),
        }
    }

    /// Queue an event for delivery. Events published after [`close`] are
    /// silently dropped.
    ///
    /// [`close`]: MockTransport::close
    pub fn publish(&self, event: PriceEvent) {
        if let Some(tx) = self.tx.lock().expect("transport sender lock poisoned").as_ref() {
            let _ = tx.send(event);
        }
    }

    /// Shut the transport down; pending events are still delivered, then
    /// `next_price` returns `None`.
    pub fn close(&self) {
        self.tx.lock().expect("transport sender lock poisoned").take();
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn next_price(&self) -> Option<PriceEvent> {
        self.rx.lock().await.recv().await
    }
}
