use super::subscription::{ChannelOptions, ChannelTarget, PostgresChangeEvent, Subscription};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BroadcastConfig {
    /// Instruct server to acknowledge broadcast receipt
    pub ack: bool,
    /// Enable client to receive messages it broadcast
    #[serde(rename = "self")]
    pub self_: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PresenceConfig {
    pub key: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PostgresChangesConfig {
    pub event: PostgresChangeEvent,
    pub schema: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// Kind-specific part of the join payload. Only the section for the
/// subscription's own kind is present.
/// Reference: https://supabase.com/docs/guides/realtime/protocol
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct ChannelJoinConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broadcast: Option<BroadcastConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<PresenceConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postgres_changes: Option<Vec<PostgresChangesConfig>>,
}

/// Full join payload sent to server
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JoinPayload {
    pub config: ChannelJoinConfig,
}

impl JoinPayload {
    pub fn for_subscription(subscription: &Subscription) -> Self {
        let ChannelOptions {
            broadcast_ack,
            broadcast_self,
            presence_key,
        } = &subscription.options;

        let config = match &subscription.target {
            ChannelTarget::Broadcast { .. } => ChannelJoinConfig {
                broadcast: Some(BroadcastConfig {
                    ack: *broadcast_ack,
                    self_: *broadcast_self,
                }),
                ..Default::default()
            },
            ChannelTarget::Presence { .. } => ChannelJoinConfig {
                presence: Some(PresenceConfig {
                    key: presence_key.clone(),
                }),
                ..Default::default()
            },
            ChannelTarget::PostgresChanges(filter) => ChannelJoinConfig {
                postgres_changes: Some(vec![PostgresChangesConfig {
                    event: filter.event,
                    schema: filter.schema.clone(),
                    table: filter.table.clone(),
                    filter: filter.filter.clone(),
                }]),
                ..Default::default()
            },
        };

        Self { config }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::PostgresChangesFilter;
    use crate::types::HandlerResult;
    use serde_json::json;

    fn noop(_: &str, _: &[u8]) -> HandlerResult {
        Ok(())
    }

    fn payload_of(subscription: &Subscription) -> serde_json::Value {
        serde_json::to_value(JoinPayload::for_subscription(subscription)).unwrap()
    }

    #[test]
    fn test_broadcast_join_payload() {
        let sub = Subscription::broadcast("bc", "room", noop);
        assert_eq!(
            payload_of(&sub),
            json!({"config": {"broadcast": {"ack": false, "self": false}}})
        );
    }

    #[test]
    fn test_presence_join_payload() {
        let sub = Subscription::presence("pr", "room", noop);
        assert_eq!(
            payload_of(&sub),
            json!({"config": {"presence": {"key": ""}}})
        );
    }

    #[test]
    fn test_postgres_changes_join_payload() {
        let sub = Subscription::postgres_changes(
            "db",
            PostgresChangesFilter::table("public", "todos").event(PostgresChangeEvent::Insert),
            noop,
        );
        assert_eq!(
            payload_of(&sub),
            json!({"config": {"postgres_changes": [
                {"event": "INSERT", "schema": "public", "table": "todos"}
            ]}})
        );

        let sub =
            Subscription::postgres_changes("db", PostgresChangesFilter::schema("audit"), noop);
        assert_eq!(
            payload_of(&sub),
            json!({"config": {"postgres_changes": [{"event": "*", "schema": "audit"}]}})
        );
    }

    #[test]
    fn test_channel_options_flow_into_payload() {
        let sub = Subscription::broadcast("bc", "room", noop).with_options(ChannelOptions {
            broadcast_ack: true,
            broadcast_self: true,
            ..Default::default()
        });
        assert_eq!(
            payload_of(&sub),
            json!({"config": {"broadcast": {"ack": true, "self": true}}})
        );

        let sub = Subscription::postgres_changes(
            "db",
            PostgresChangesFilter::table("public", "todos").with_filter("id=eq.1"),
            noop,
        );
        assert_eq!(
            payload_of(&sub)["config"]["postgres_changes"][0]["filter"],
            "id=eq.1"
        );
    }
}
