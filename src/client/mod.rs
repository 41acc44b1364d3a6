// Module declarations
mod builder;
mod config;
mod connection;
mod publisher;
mod session;
mod state;


// Public API exports
pub use builder::{SessionBuilder, SessionOptions};
pub use config::RealtimeConfig;
pub use connection::{ConnectionManager, RefCounter};
pub use publisher::{Publisher, broadcast_envelope};
pub use session::RealtimeSession;
pub use state::SessionState;
