use crate::types::constants::{TOPIC_PREFIX, channel_events};
use crate::types::{HandlerResult, RealtimeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Callback invoked with the event name and the raw JSON payload bytes.
pub type ConsumeFn = Arc<dyn Fn(&str, &[u8]) -> HandlerResult + Send + Sync + 'static>;

/// The three channel kinds multiplexed over one socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Broadcast,
    Presence,
    PostgresChanges,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Broadcast => channel_events::BROADCAST,
            Self::Presence => channel_events::PRESENCE,
            Self::PostgresChanges => channel_events::POSTGRES_CHANGES,
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Postgres change types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PostgresChangeEvent {
    #[default]
    #[serde(rename = "*")]
    All,
    #[serde(rename = "INSERT")]
    Insert,
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "DELETE")]
    Delete,
}

impl PostgresChangeEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "*",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

/// Which database changes a `postgres_changes` subscription listens to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresChangesFilter {
    pub event: PostgresChangeEvent,
    pub schema: String,
    pub table: Option<String>,
    /// Row filter such as `id=eq.1`
    pub filter: Option<String>,
}

impl PostgresChangesFilter {
    /// All events on every table of `schema`.
    pub fn schema(schema: impl Into<String>) -> Self {
        Self {
            event: PostgresChangeEvent::All,
            schema: schema.into(),
            table: None,
            filter: None,
        }
    }

    /// All events on one table.
    pub fn table(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            ..Self::schema(schema)
        }
    }

    pub fn event(mut self, event: PostgresChangeEvent) -> Self {
        self.event = event;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

/// Per-subscription join options. Defaults match what the server expects
/// from a plain listener.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelOptions {
    /// Ask the server to acknowledge broadcasts.
    pub broadcast_ack: bool,
    /// Receive our own broadcasts.
    pub broadcast_self: bool,
    /// Presence key; empty lets the server pick one.
    pub presence_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ChannelTarget {
    Broadcast { topic: String },
    Presence { topic: String },
    PostgresChanges(PostgresChangesFilter),
}

/// Declarative handler descriptor: one channel plus the callback that consumes its events.
#[derive(Clone)]
pub struct Subscription {
    name: String,
    pub(crate) target: ChannelTarget,
    pub(crate) options: ChannelOptions,
    consume: ConsumeFn,
}

impl Subscription {
    fn new<F>(name: impl Into<String>, target: ChannelTarget, consume: F) -> Self
    where
        F: Fn(&str, &[u8]) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            target,
            options: ChannelOptions::default(),
            consume: Arc::new(consume),
        }
    }

    /// Listen to broadcasts on `realtime:<topic>`.
    pub fn broadcast<F>(name: impl Into<String>, topic: impl Into<String>, consume: F) -> Self
    where
        F: Fn(&str, &[u8]) -> HandlerResult + Send + Sync + 'static,
    {
        Self::new(
            name,
            ChannelTarget::Broadcast {
                topic: topic.into(),
            },
            consume,
        )
    }

    /// Listen to presence events on `realtime:<topic>`.
    pub fn presence<F>(name: impl Into<String>, topic: impl Into<String>, consume: F) -> Self
    where
        F: Fn(&str, &[u8]) -> HandlerResult + Send + Sync + 'static,
    {
        Self::new(
            name,
            ChannelTarget::Presence {
                topic: topic.into(),
            },
            consume,
        )
    }

    /// Listen to database changes matching `filter`.
    pub fn postgres_changes<F>(
        name: impl Into<String>,
        filter: PostgresChangesFilter,
        consume: F,
    ) -> Self
    where
        F: Fn(&str, &[u8]) -> HandlerResult + Send + Sync + 'static,
    {
        Self::new(name, ChannelTarget::PostgresChanges(filter), consume)
    }

    pub fn with_options(mut self, options: ChannelOptions) -> Self {
        self.options = options;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ChannelKind {
        match self.target {
            ChannelTarget::Broadcast { .. } => ChannelKind::Broadcast,
            ChannelTarget::Presence { .. } => ChannelKind::Presence,
            ChannelTarget::PostgresChanges(_) => ChannelKind::PostgresChanges,
        }
    }

    /// Full channel topic as it appears on the wire.
    pub fn topic(&self) -> String {
        match &self.target {
            ChannelTarget::Broadcast { topic } | ChannelTarget::Presence { topic } => {
                channel_topic(topic)
            }
            ChannelTarget::PostgresChanges(filter) => match &filter.table {
                Some(table) => format!("{}:{}:{}", TOPIC_PREFIX, filter.schema, table),
                None => channel_topic(&filter.schema),
            },
        }
    }

    /// Rejects an empty topic, or an empty schema for `postgres_changes`.
    pub fn validate(&self) -> Result<()> {
        let missing = match &self.target {
            ChannelTarget::Broadcast { topic } | ChannelTarget::Presence { topic } => {
                topic.is_empty().then_some("topic")
            }
            ChannelTarget::PostgresChanges(filter) => filter.schema.is_empty().then_some("schema"),
        };

        match missing {
            Some(field) => Err(RealtimeError::Channel(format!(
                "subscription '{}' ({}) has an empty {}",
                self.name,
                self.kind(),
                field
            ))),
            None => Ok(()),
        }
    }

    /// Hands one event to the callback.
    pub fn consume(&self, event: &str, payload: &[u8]) -> HandlerResult {
        (self.consume)(event, payload)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// `realtime:<topic>`
pub fn channel_topic(topic: &str) -> String {
    format!("{}:{}", TOPIC_PREFIX, topic)
}
