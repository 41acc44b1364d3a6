/// Phoenix protocol event strings (magic strings layer)
pub mod phoenix_events {
    pub const CLOSE: &str = "phx_close";
    pub const ERROR: &str = "phx_error";
    pub const JOIN: &str = "phx_join";
    pub const REPLY: &str = "phx_reply";
    pub const LEAVE: &str = "phx_leave";
    pub const HEARTBEAT: &str = "heartbeat";
}

/// Phoenix protocol topics
pub const PHOENIX_TOPIC: &str = "phoenix";

/// Prefix shared by every Supabase Realtime channel topic
pub const TOPIC_PREFIX: &str = "realtime";

/// Channel event strings (magic strings layer)
pub mod channel_events {
    pub const POSTGRES_CHANGES: &str = "postgres_changes";
    pub const BROADCAST: &str = "broadcast";
    pub const PRESENCE: &str = "presence";
}

/// Event name carried inside a published broadcast payload
pub const BROADCAST_MESSAGE_EVENT: &str = "message";

/// Path appended to the configured base URL
pub const WEBSOCKET_PATH: &str = "/realtime/v1/websocket";

/// Protocol version
pub const VSN: &str = "1.0.0";

/// Default heartbeat interval (milliseconds)
pub const HEARTBEAT_INTERVAL: u64 = 30_000;

/// Reconnect backoff: first wait (milliseconds)
pub const RECONNECT_INITIAL_DELAY: u64 = 1_000;

/// Reconnect backoff: ceiling (milliseconds)
pub const RECONNECT_MAX_DELAY: u64 = 30_000;

/// Reconnect backoff: dial attempts before giving up
pub const RECONNECT_MAX_ATTEMPTS: u32 = 10;
