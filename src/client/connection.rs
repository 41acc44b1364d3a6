use crate::types::{Envelope, RealtimeError, Result};
use crate::websocket::Transport;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Session-scoped ref allocator. Survives reconnects so refs never repeat.
#[derive(Debug, Default)]
pub struct RefCounter(AtomicU64);

impl RefCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate next message reference
    pub fn next(&self) -> String {
        (self.0.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    /// Last ref handed out, 0 if none.
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// One installed transport. Writes to it are serialised by `write_lock`;
/// `closed` aborts any write still pending when it is retired.
struct LiveTransport {
    transport: Arc<dyn Transport>,
    write_lock: Mutex<()>,
    closed: CancellationToken,
}

impl LiveTransport {
    fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            write_lock: Mutex::new(()),
            closed: CancellationToken::new(),
        }
    }

    async fn retire(&self) {
        self.closed.cancel();
        if let Err(e) = self.transport.close().await {
            tracing::debug!("Error closing transport: {}", e);
        }
    }
}

/// Owns the live transport and the session write mutex.
///
/// The slot lock is only held to swap or clone the transport, never across
/// I/O, so `close` and `detach` cannot be held up by a stalled write.
pub struct ConnectionManager {
    live: Mutex<Option<Arc<LiveTransport>>>,
    refs: RefCounter,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            live: Mutex::new(None),
            refs: RefCounter::new(),
        }
    }

    /// Makes `transport` the live connection. Refuses (and closes it) once
    /// `cancel` has fired, so a dial that races `stop` cannot leak a socket.
    pub async fn install(&self, transport: Arc<dyn Transport>, cancel: &CancellationToken) -> bool {
        let mut slot = self.live.lock().await;
        if cancel.is_cancelled() {
            drop(slot);
            let _ = transport.close().await;
            return false;
        }
        let previous = slot.replace(Arc::new(LiveTransport::new(transport)));
        drop(slot);

        if let Some(previous) = previous {
            previous.retire().await;
        }
        true
    }

    /// Checks if a transport is installed
    pub async fn is_connected(&self) -> bool {
        self.live.lock().await.is_some()
    }

    /// Stamps a fresh ref and writes the envelope. The ref is taken under the
    /// transport's write lock, so write order and ref order agree. Returns the
    /// ref.
    ///
    /// Fails with `TransportClosed` if the transport is closed or replaced
    /// while the write is pending.
    pub async fn send(&self, mut envelope: Envelope) -> Result<String> {
        let live = self
            .live
            .lock()
            .await
            .clone()
            .ok_or(RealtimeError::NotConnected)?;

        let _write = tokio::select! {
            biased;
            _ = live.closed.cancelled() => return Err(RealtimeError::TransportClosed),
            guard = live.write_lock.lock() => guard,
        };

        let msg_ref = self.refs.next();
        envelope.stamp(msg_ref.clone());

        tokio::select! {
            biased;
            _ = live.closed.cancelled() => Err(RealtimeError::TransportClosed),
            written = live.transport.write(&envelope) => written.map(|()| msg_ref),
        }
    }

    /// Uninstalls `transport` if it is still the live one, then closes it.
    pub async fn detach(&self, transport: &Arc<dyn Transport>) {
        let current = {
            let mut slot = self.live.lock().await;
            if slot
                .as_ref()
                .is_some_and(|live| Arc::ptr_eq(&live.transport, transport))
            {
                slot.take()
            } else {
                None
            }
        };

        match current {
            Some(live) => live.retire().await,
            None => {
                if let Err(e) = transport.close().await {
                    tracing::debug!("Error closing transport: {}", e);
                }
            }
        }
    }

    /// Closes and clears whatever transport is live. Errors are swallowed.
    pub async fn close(&self) {
        let live = self.live.lock().await.take();
        if let Some(live) = live {
            live.retire().await;
        }
    }

    pub fn refs(&self) -> &RefCounter {
        &self.refs
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::scripted::ScriptedTransport;
    use std::time::Duration;

    #[test]
    fn test_ref_counter_is_monotonic() {
        let refs = RefCounter::new();
        assert_eq!(refs.next(), "1");
        assert_eq!(refs.next(), "2");
        assert_eq!(refs.current(), 2);
    }

    #[tokio::test]
    async fn test_send_without_transport_is_not_connected() {
        let connection = ConnectionManager::new();
        let result = connection.send(Envelope::heartbeat().unwrap()).await;
        assert!(matches!(result, Err(RealtimeError::NotConnected)));
        assert_eq!(connection.refs().current(), 0);
    }

    #[tokio::test]
    async fn test_refs_survive_transport_replacement() {
        let connection = ConnectionManager::new();
        let cancel = CancellationToken::new();

        let (first, first_peer) = ScriptedTransport::pair();
        connection.install(Arc::new(first), &cancel).await;
        connection.send(Envelope::heartbeat().unwrap()).await.unwrap();

        let (second, second_peer) = ScriptedTransport::pair();
        connection.install(Arc::new(second), &cancel).await;
        assert!(first_peer.is_closed());
        connection.send(Envelope::heartbeat().unwrap()).await.unwrap();

        assert_eq!(first_peer.written()[0].r#ref.as_deref(), Some("1"));
        assert_eq!(second_peer.written()[0].r#ref.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_install_after_cancel_closes_transport() {
        let connection = ConnectionManager::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let (transport, peer) = ScriptedTransport::pair();
        assert!(!connection.install(Arc::new(transport), &cancel).await);
        assert!(peer.is_closed());
        assert!(!connection.is_connected().await);
    }

    #[tokio::test]
    async fn test_detach_ignores_stale_transport() {
        let connection = ConnectionManager::new();
        let cancel = CancellationToken::new();

        let (stale, stale_peer) = ScriptedTransport::pair();
        let stale: Arc<dyn Transport> = Arc::new(stale);
        let (live, _live_peer) = ScriptedTransport::pair();
        connection.install(Arc::new(live), &cancel).await;

        connection.detach(&stale).await;
        assert!(stale_peer.is_closed());
        assert!(connection.is_connected().await);

        connection.close().await;
        assert!(!connection.is_connected().await);
    }

    #[tokio::test]
    async fn test_close_does_not_wait_for_stalled_write() {
        let connection = Arc::new(ConnectionManager::new());
        let (transport, peer) = ScriptedTransport::pair();
        connection
            .install(Arc::new(transport), &CancellationToken::new())
            .await;
        peer.stall_writes();

        let pending = tokio::spawn({
            let connection = Arc::clone(&connection);
            async move { connection.send(Envelope::heartbeat().unwrap()).await }
        });
        // the write is in flight once its ref is stamped
        while connection.refs().current() == 0 {
            tokio::task::yield_now().await;
        }

        tokio::time::timeout(Duration::from_secs(1), connection.close())
            .await
            .expect("close blocked behind a stalled write");
        assert!(peer.is_closed());

        let result = tokio::time::timeout(Duration::from_secs(1), pending)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(result, Err(RealtimeError::TransportClosed)));
    }

    #[tokio::test]
    async fn test_stalled_write_does_not_block_replacement() {
        let connection = Arc::new(ConnectionManager::new());
        let cancel = CancellationToken::new();

        let (first, first_peer) = ScriptedTransport::pair();
        let first: Arc<dyn Transport> = Arc::new(first);
        connection.install(Arc::clone(&first), &cancel).await;
        first_peer.stall_writes();

        let pending = tokio::spawn({
            let connection = Arc::clone(&connection);
            async move { connection.send(Envelope::heartbeat().unwrap()).await }
        });
        // the write is in flight once its ref is stamped
        while connection.refs().current() == 0 {
            tokio::task::yield_now().await;
        }

        tokio::time::timeout(Duration::from_secs(1), connection.detach(&first))
            .await
            .expect("detach blocked behind a stalled write");

        let (second, second_peer) = ScriptedTransport::pair();
        connection.install(Arc::new(second), &cancel).await;
        let msg_ref = tokio::time::timeout(
            Duration::from_secs(1),
            connection.send(Envelope::heartbeat().unwrap()),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(second_peer.written()[0].r#ref.as_deref(), Some(msg_ref.as_str()));
        assert!(matches!(
            pending.await.unwrap(),
            Err(RealtimeError::TransportClosed)
        ));
    }
}
