use super::config::RealtimeConfig;
use super::session::RealtimeSession;
use crate::channel::{Registry, Subscription};
use crate::infrastructure::ReconnectPolicy;
use crate::types::Result;
use crate::types::constants::HEARTBEAT_INTERVAL;
use crate::websocket::{TransportFactory, WebSocketFactory};
use std::sync::Arc;
use std::time::Duration;

/// Session tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub heartbeat_interval: Duration,
    pub reconnect: ReconnectPolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_millis(HEARTBEAT_INTERVAL),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// Builder for [`RealtimeSession`]: collects the subscriptions and compiles
/// them into a registry.
pub struct SessionBuilder {
    config: RealtimeConfig,
    subscriptions: Vec<Subscription>,
    factory: Option<Arc<dyn TransportFactory>>,
    options: SessionOptions,
}

impl SessionBuilder {
    pub fn new(config: RealtimeConfig) -> Self {
        Self {
            config,
            subscriptions: Vec::new(),
            factory: None,
            options: SessionOptions::default(),
        }
    }

    pub fn subscribe(mut self, subscription: Subscription) -> Self {
        self.subscriptions.push(subscription);
        self
    }

    pub fn subscriptions(mut self, subscriptions: impl IntoIterator<Item = Subscription>) -> Self {
        self.subscriptions.extend(subscriptions);
        self
    }

    /// Replace the WebSocket transport, e.g. with a scripted one in tests.
    pub fn transport_factory(mut self, factory: Arc<dyn TransportFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Ignored when zero.
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        if interval.is_zero() {
            tracing::warn!("Ignoring zero heartbeat interval");
        } else {
            self.options.heartbeat_interval = interval;
        }
        self
    }

    pub fn reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.options.reconnect = policy;
        self
    }

    /// Fails with `DuplicateSubscription` when two subscriptions share a topic.
    pub fn build(self) -> Result<RealtimeSession> {
        let registry = Registry::build(self.subscriptions)?;
        let factory = self
            .factory
            .unwrap_or_else(|| Arc::new(WebSocketFactory) as Arc<dyn TransportFactory>);

        Ok(RealtimeSession::from_parts(
            self.config,
            self.options,
            Arc::new(registry),
            factory,
        ))
    }
}
