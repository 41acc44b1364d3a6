use super::event::is_housekeeping;
use crate::channel::Registry;
use crate::types::Envelope;
use std::sync::Arc;

/// What the router did with one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Protocol housekeeping (`phx_reply`, `phx_close`, `heartbeat`)
    Housekeeping,
    /// No subscription for the topic
    UnknownTopic,
    /// Handler ran and succeeded
    Delivered,
    /// Handler ran and reported failure
    HandlerFailed,
}

/// Routes incoming messages to the subscription registered for their topic
pub struct MessageRouter {
    registry: Arc<Registry>,
}

impl MessageRouter {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Dispatches inline on the calling task. Handler failures are logged and
    /// contained here.
    pub fn route(&self, message: &Envelope) -> RouteOutcome {
        if is_housekeeping(&message.event) {
            tracing::debug!(
                topic = %message.topic,
                event = %message.event,
                msg_ref = ?message.r#ref,
                "Discarding housekeeping frame"
            );
            return RouteOutcome::Housekeeping;
        }

        let Some(subscription) = self.registry.lookup(&message.topic) else {
            tracing::debug!(
                topic = %message.topic,
                event = %message.event,
                "No subscription for topic, discarding"
            );
            return RouteOutcome::UnknownTopic;
        };

        match subscription.consume(&message.event, message.payload_bytes()) {
            Ok(()) => RouteOutcome::Delivered,
            Err(e) => {
                tracing::warn!(
                    handler = subscription.name(),
                    topic = %message.topic,
                    event = %message.event,
                    "Handler failed: {}",
                    e
                );
                RouteOutcome::HandlerFailed
            }
        }
    }
}
