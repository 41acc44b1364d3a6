//! In-memory transport for driving a session from tests.

use super::transport::{Transport, TransportFactory};
use crate::types::{Envelope, RealtimeError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Test-side handle onto one scripted connection.
#[derive(Clone)]
pub struct ScriptedPeer {
    inbound: mpsc::UnboundedSender<Result<Envelope>>,
    written: Arc<Mutex<Vec<Envelope>>>,
    stalled: Arc<AtomicBool>,
    closed: CancellationToken,
}

impl ScriptedPeer {
    /// Queues a raw frame as if the server had sent it.
    pub fn push_text(&self, text: &str) {
        let _ = self.inbound.send(Envelope::decode(text));
    }

    /// Makes the next read fail as if the socket dropped.
    pub fn drop_connection(&self) {
        let _ = self.inbound.send(Err(RealtimeError::TransportClosed));
    }

    /// Every later write parks forever, like a socket whose send buffer
    /// never drains.
    pub fn stall_writes(&self) {
        self.stalled.store(true, Ordering::SeqCst);
    }

    pub fn written(&self) -> Vec<Envelope> {
        self.written.lock().unwrap().clone()
    }

    pub fn written_events(&self, event: &str) -> Vec<Envelope> {
        self.written()
            .into_iter()
            .filter(|e| e.event == event)
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

pub struct ScriptedTransport {
    inbound: tokio::sync::Mutex<mpsc::UnboundedReceiver<Result<Envelope>>>,
    written: Arc<Mutex<Vec<Envelope>>>,
    stalled: Arc<AtomicBool>,
    closed: CancellationToken,
}

impl ScriptedTransport {
    pub fn pair() -> (Self, ScriptedPeer) {
        let (tx, rx) = mpsc::unbounded_channel();
        let written = Arc::new(Mutex::new(Vec::new()));
        let stalled = Arc::new(AtomicBool::new(false));
        let closed = CancellationToken::new();
        let peer = ScriptedPeer {
            inbound: tx,
            written: Arc::clone(&written),
            stalled: Arc::clone(&stalled),
            closed: closed.clone(),
        };
        let transport = Self {
            inbound: tokio::sync::Mutex::new(rx),
            written,
            stalled,
            closed,
        };
        (transport, peer)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn write(&self, envelope: &Envelope) -> Result<()> {
        if self.closed.is_cancelled() {
            return Err(RealtimeError::TransportClosed);
        }
        if self.stalled.load(Ordering::SeqCst) {
            return std::future::pending().await;
        }
        // exercise the framer on the way out
        let encoded = envelope.encode()?;
        self.written.lock().unwrap().push(Envelope::decode(&encoded)?);
        Ok(())
    }

    async fn read(&self) -> Result<Envelope> {
        let mut inbound = self.inbound.lock().await;
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(RealtimeError::TransportClosed),
            next = inbound.recv() => next.unwrap_or(Err(RealtimeError::TransportClosed)),
        }
    }

    async fn close(&self) -> Result<()> {
        self.closed.cancel();
        Ok(())
    }
}

/// Factory that replays a script of dial outcomes: `false` fails the dial,
/// `true` hands out a fresh scripted connection. Once the script runs out
/// every dial succeeds.
#[derive(Clone, Default)]
pub struct ScriptedFactory {
    script: Arc<Mutex<VecDeque<bool>>>,
    peers: Arc<Mutex<Vec<ScriptedPeer>>>,
    dialed: Arc<Mutex<Vec<(String, Instant)>>>,
    always_fail: bool,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(outcomes: impl IntoIterator<Item = bool>) -> Self {
        Self {
            script: Arc::new(Mutex::new(outcomes.into_iter().collect())),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::default()
        }
    }

    pub fn dial_count(&self) -> usize {
        self.dialed.lock().unwrap().len()
    }

    pub fn dialed_urls(&self) -> Vec<String> {
        self.dialed
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    /// When each dial started, on the tokio clock.
    pub fn dial_times(&self) -> Vec<Instant> {
        self.dialed.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }

    /// Most recent successful connection.
    pub fn latest(&self) -> Option<ScriptedPeer> {
        self.peers.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TransportFactory for ScriptedFactory {
    async fn dial(&self, url: &str) -> Result<Arc<dyn Transport>> {
        self.dialed
            .lock()
            .unwrap()
            .push((url.to_string(), Instant::now()));

        let succeed = !self.always_fail && self.script.lock().unwrap().pop_front().unwrap_or(true);
        if !succeed {
            return Err(RealtimeError::Connect("scripted dial failure".to_string()));
        }

        let (transport, peer) = ScriptedTransport::pair();
        self.peers.lock().unwrap().push(peer);
        Ok(Arc::new(transport))
    }
}
