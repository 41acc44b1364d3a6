// Module declarations
mod config;
mod registry;
mod subscription;

// Public API exports
pub use config::{
    BroadcastConfig, ChannelJoinConfig, JoinPayload, PostgresChangesConfig, PresenceConfig,
};
pub use registry::Registry;
pub use subscription::{
    ChannelKind, ChannelOptions, ConsumeFn, PostgresChangeEvent, PostgresChangesFilter,
    Subscription, channel_topic,
};
