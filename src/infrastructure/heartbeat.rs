use crate::client::ConnectionManager;
use crate::types::{Envelope, RealtimeError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

const DEFAULT_HEARTBEAT_INTERVAL: Duration =
    Duration::from_millis(crate::types::constants::HEARTBEAT_INTERVAL);

/// Periodic keep-alive on the `phoenix` topic.
///
/// Write failures are logged and the loop carries on; a dead socket is
/// detected by the read task, not here.
pub struct HeartbeatManager {
    interval: Duration,
    connection: Arc<ConnectionManager>,
    cancel: CancellationToken,
}

impl HeartbeatManager {
    pub fn new(connection: Arc<ConnectionManager>, cancel: CancellationToken) -> Self {
        Self {
            interval: DEFAULT_HEARTBEAT_INTERVAL,
            connection,
            cancel,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Runs until the cancellation token fires.
    pub async fn run(self) {
        let mut interval_timer = time::interval_at(Instant::now() + self.interval, self.interval);
        interval_timer.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = interval_timer.tick() => {}
            }

            let heartbeat = match Envelope::heartbeat() {
                Ok(envelope) => envelope,
                Err(e) => {
                    tracing::error!("[Heartbeat] Failed to build frame: {}", e);
                    continue;
                }
            };

            let sent = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                sent = self.connection.send(heartbeat) => sent,
            };

            match sent {
                Ok(msg_ref) => tracing::debug!("Sent heartbeat with ref {}", msg_ref),
                Err(RealtimeError::NotConnected) => {
                    tracing::debug!("[Heartbeat] Skipped, no live transport");
                }
                Err(e) => tracing::warn!("[Heartbeat] Failed to send: {}", e),
            }
        }

        tracing::debug!("Heartbeat task finished");
    }
}
