use super::config::JoinPayload;
use super::subscription::Subscription;
use crate::types::constants::phoenix_events;
use crate::types::{Envelope, RealtimeError, Result};
use std::collections::HashMap;

/// Topic to handler lookup plus the join script replayed on every connect.
///
/// Immutable once built; the session shares it with the read task by `Arc`.
#[derive(Debug)]
pub struct Registry {
    handlers: HashMap<String, Subscription>,
    joins: Vec<Envelope>,
}

impl Registry {
    /// Compiles the subscriptions. Join envelopes keep input order and carry no
    /// ref yet; refs are stamped when they are written.
    pub fn build(subscriptions: Vec<Subscription>) -> Result<Self> {
        let mut handlers = HashMap::with_capacity(subscriptions.len());
        let mut joins = Vec::with_capacity(subscriptions.len());

        for subscription in subscriptions {
            subscription.validate()?;

            let topic = subscription.topic();
            if handlers.contains_key(&topic) {
                return Err(RealtimeError::DuplicateSubscription(topic));
            }

            let payload = JoinPayload::for_subscription(&subscription);
            joins.push(Envelope::from_value(
                topic.clone(),
                phoenix_events::JOIN,
                &payload,
            )?);

            tracing::debug!(
                "Registered subscription '{}' ({}) on {}",
                subscription.name(),
                subscription.kind(),
                topic
            );
            handlers.insert(topic, subscription);
        }

        Ok(Self { handlers, joins })
    }

    pub fn lookup(&self, topic: &str) -> Option<&Subscription> {
        self.handlers.get(topic)
    }

    /// Join envelopes in registration order.
    pub fn join_envelopes(&self) -> &[Envelope] {
        &self.joins
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.joins.iter().map(|join| join.topic.as_str())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
