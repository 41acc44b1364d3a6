use super::builder::{SessionBuilder, SessionOptions};
use super::config::RealtimeConfig;
use super::connection::ConnectionManager;
use super::publisher::Publisher;
use super::state::SessionState;
use crate::channel::Registry;
use crate::infrastructure::{HeartbeatManager, TaskManager, Timer};
use crate::messaging::MessageRouter;
use crate::types::{RealtimeError, Result};
use crate::websocket::{Transport, TransportFactory};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;

/// A realtime session: one multiplexed connection serving every registered
/// subscription.
///
/// The session dials the realtime endpoint, joins each channel in
/// registration order, dispatches inbound frames to the subscription for
/// their topic, keeps the socket alive with heartbeats and redials with
/// bounded exponential backoff when the connection drops.
///
/// # Example
///
/// ```no_run
/// use realtime_dispatch::{RealtimeConfig, RealtimeSession, Subscription};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = RealtimeSession::builder(
///     RealtimeConfig::new("https://your-project.supabase.co").with_anon_key("your-anon-key"),
/// )
/// .subscribe(Subscription::broadcast("chat", "room", |event, payload| {
///     println!("{}: {}", event, String::from_utf8_lossy(payload));
///     Ok(())
/// }))
/// .build()?;
///
/// session.start().await?;
/// session.publish("room", br#"{"text":"hi"}"#).await?;
/// session.stop().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RealtimeSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: RealtimeConfig,
    options: SessionOptions,
    registry: Arc<Registry>,
    factory: Arc<dyn TransportFactory>,
    connection: Arc<ConnectionManager>,
    state: watch::Sender<SessionState>,
    cancel: CancellationToken,
    // start/stop serialisation
    lifecycle: Mutex<()>,
    tasks: Mutex<Option<TaskManager>>,
    exhausted: Mutex<Option<u32>>,
}

impl RealtimeSession {
    pub fn builder(config: RealtimeConfig) -> SessionBuilder {
        SessionBuilder::new(config)
    }

    pub(crate) fn from_parts(
        config: RealtimeConfig,
        options: SessionOptions,
        registry: Arc<Registry>,
        factory: Arc<dyn TransportFactory>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            inner: Arc::new(SessionInner {
                config,
                options,
                registry,
                factory,
                connection: Arc::new(ConnectionManager::new()),
                state,
                cancel: CancellationToken::new(),
                lifecycle: Mutex::new(()),
                tasks: Mutex::new(None),
                exhausted: Mutex::new(None),
            }),
        }
    }

    /// Connects, joins every channel and spawns the read and heartbeat tasks.
    ///
    /// The first dial happens immediately and counts as the first attempt of
    /// the reconnect budget; if it fails the backoff schedule takes over.
    /// Returns once all joins are written.
    ///
    /// # Errors
    ///
    /// - [`RealtimeError::Config`] if no usable base URL is configured
    /// - [`RealtimeError::ReconnectExhausted`] if no dial succeeded within the budget
    /// - [`RealtimeError::Stopped`] if the session was stopped before or during start
    ///
    /// Calling `start` on a running session is a no-op.
    pub async fn start(&self) -> Result<()> {
        let inner = &self.inner;
        let _lifecycle = inner.lifecycle.lock().await;

        match inner.current_state() {
            SessionState::Idle => {}
            SessionState::Stopped => return Err(RealtimeError::Stopped),
            other => {
                tracing::debug!("Session already started ({})", other);
                return Ok(());
            }
        }

        let url = match inner.config.websocket_url() {
            Ok(url) => url,
            Err(e) => {
                inner.cancel.cancel();
                inner.set_state(SessionState::Stopped);
                return Err(e);
            }
        };

        let mut timer = Timer::new(inner.options.reconnect);
        let attempt = timer.count_immediate_attempt();

        inner.set_state(SessionState::Connecting);
        let transport = match inner.dial_and_join(&url, attempt).await {
            Ok(transport) => Ok(transport),
            Err(RealtimeError::Stopped) => Err(RealtimeError::Stopped),
            Err(e) => {
                tracing::warn!(attempt, "Initial connection failed: {}", e);
                inner.set_state(SessionState::Reconnecting);
                inner.redial(&url, &mut timer).await
            }
        };

        let transport = match transport {
            Ok(transport) => transport,
            Err(e) => {
                if let RealtimeError::ReconnectExhausted { attempts } = e {
                    *inner.exhausted.lock().await = Some(attempts);
                }
                inner.cancel.cancel();
                inner.set_state(SessionState::Stopped);
                return Err(e);
            }
        };

        inner.set_state(SessionState::Active);

        let mut tasks = TaskManager::new();
        tasks.spawn("read", Arc::clone(inner).read_loop(url, transport));
        tasks.spawn(
            "heartbeat",
            HeartbeatManager::new(Arc::clone(&inner.connection), inner.cancel.clone())
                .with_interval(inner.options.heartbeat_interval)
                .run(),
        );
        *inner.tasks.lock().await = Some(tasks);

        tracing::info!(
            "Session active with {} subscription(s)",
            inner.registry.len()
        );
        Ok(())
    }

    /// Stops the session: cancels the background tasks, closes the transport
    /// and waits for the read task to finish. Idempotent.
    ///
    /// Once `stop` returns no handler runs again and `publish` fails with
    /// [`RealtimeError::NotConnected`].
    pub async fn stop(&self) -> Result<()> {
        let inner = &self.inner;
        inner.cancel.cancel();

        let _lifecycle = inner.lifecycle.lock().await;
        let tasks = inner.tasks.lock().await.take();
        if tasks.is_none() && inner.current_state() == SessionState::Stopped {
            return Ok(());
        }

        tracing::info!("Stopping session");
        inner.connection.close().await;
        if let Some(tasks) = tasks {
            tasks.join_all().await;
        }
        inner.set_state(SessionState::Stopped);
        tracing::info!("Session stopped");
        Ok(())
    }

    /// Broadcasts `payload` on `realtime:<topic>`. See [`Publisher::publish`].
    pub async fn publish(&self, topic: &str, payload: &[u8]) -> Result<()> {
        self.publisher().publish(topic, payload).await
    }

    /// Publishing handle that can outlive this value.
    pub fn publisher(&self) -> Publisher {
        Publisher::new(Arc::clone(&self.inner.connection))
    }

    /// Resolves once the session is stopped. Returns
    /// [`RealtimeError::ReconnectExhausted`] if it stopped because the
    /// reconnect budget ran out.
    pub async fn wait(&self) -> Result<()> {
        let mut rx = self.inner.state.subscribe();
        match rx.wait_for(|state| state.is_terminal()).await {
            Ok(_) => {}
            // sender gone, nothing left to wait for
            Err(_) => return Ok(()),
        }

        match *self.inner.exhausted.lock().await {
            Some(attempts) => Err(RealtimeError::ReconnectExhausted { attempts }),
            None => Ok(()),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.current_state()
    }

    /// Receiver that observes every state transition.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Checks whether a transport is currently live.
    pub async fn is_connected(&self) -> bool {
        self.inner.connection.is_connected().await
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.inner.config
    }
}

impl SessionInner {
    fn current_state(&self) -> SessionState {
        *self.state.borrow()
    }

    fn set_state(&self, new_state: SessionState) {
        let old = self.state.send_replace(new_state);
        if old != new_state {
            tracing::info!("Session state: {} -> {}", old, new_state);
        }
    }

    /// One dial followed by the join script.
    async fn dial_and_join(&self, url: &str, attempt: u32) -> Result<Arc<dyn Transport>> {
        tracing::info!(attempt, "Dialing realtime endpoint");

        let transport = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(RealtimeError::Stopped),
            dialed = self.factory.dial(url) => dialed?,
        };

        self.set_state(SessionState::Joining);
        if !self
            .connection
            .install(Arc::clone(&transport), &self.cancel)
            .await
        {
            return Err(RealtimeError::Stopped);
        }

        self.join_all().await;
        Ok(transport)
    }

    /// Writes every join envelope in registry order. A failed join is logged
    /// and skipped; the read task notices a dead socket on its own.
    async fn join_all(&self) {
        for join in self.registry.join_envelopes() {
            match self.connection.send(join.clone()).await {
                Ok(msg_ref) => {
                    tracing::debug!(topic = %join.topic, msg_ref = %msg_ref, "Join sent");
                }
                Err(e) => {
                    tracing::warn!(topic = %join.topic, "Failed to join channel: {}", e);
                }
            }
        }
    }

    /// Redials following `timer`'s backoff schedule until a dial succeeds or
    /// the budget is spent. The caller resets the timer after a success.
    async fn redial(&self, url: &str, timer: &mut Timer) -> Result<Arc<dyn Transport>> {
        while let Some(wait) = timer.next_delay() {
            let attempt = timer.attempts();
            tracing::debug!(attempt, "Waiting {:?} before reconnecting", wait);

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(RealtimeError::Stopped),
                _ = tokio::time::sleep(wait) => {}
            }

            match self.dial_and_join(url, attempt).await {
                Ok(transport) => return Ok(transport),
                Err(RealtimeError::Stopped) => return Err(RealtimeError::Stopped),
                Err(e) => tracing::warn!(attempt, "Reconnect attempt failed: {}", e),
            }
        }

        let attempts = timer.attempts();
        tracing::error!("Giving up after {} reconnect attempts", attempts);
        Err(RealtimeError::ReconnectExhausted { attempts })
    }

    /// Owns `Transport::read`, dispatches inline and is the only place that
    /// moves the session into `Reconnecting`.
    async fn read_loop(self: Arc<Self>, url: String, mut transport: Arc<dyn Transport>) {
        let router = MessageRouter::new(Arc::clone(&self.registry));
        let mut timer = Timer::new(self.options.reconnect);
        tracing::info!("Starting read task");

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                next = transport.read() => next,
            };

            match next {
                Ok(envelope) => {
                    router.route(&envelope);
                }
                Err(RealtimeError::MalformedFrame(reason)) => {
                    tracing::warn!("Discarding malformed frame: {}", reason);
                }
                Err(e) => {
                    if self.cancel.is_cancelled() {
                        break;
                    }

                    tracing::warn!("Read loop failed: {}", e);
                    self.set_state(SessionState::Reconnecting);
                    self.connection.detach(&transport).await;

                    match self.redial(&url, &mut timer).await {
                        Ok(next_transport) => {
                            transport = next_transport;
                            // next outage starts again from the initial delay
                            timer.reset();
                            self.set_state(SessionState::Active);
                            tracing::info!("Reconnected successfully");
                        }
                        Err(RealtimeError::ReconnectExhausted { attempts }) => {
                            *self.exhausted.lock().await = Some(attempts);
                            self.cancel.cancel();
                            self.set_state(SessionState::Stopped);
                            break;
                        }
                        Err(_) => break,
                    }
                }
            }
        }

        tracing::info!("Read task finished");
    }
}
