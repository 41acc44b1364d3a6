//! # Realtime Dispatch
//!
//! Subscription and message dispatch client for Supabase Realtime
//! (Phoenix Channels v1 over a single WebSocket).
//!
//! Register broadcast, presence and `postgres_changes` handlers up front; the
//! session connects, joins every channel, routes inbound frames to the handler
//! for their topic, sends heartbeats and reconnects with bounded exponential
//! backoff.
//!
//! ## Example
//!
//! ```no_run
//! use realtime_dispatch::{PostgresChangesFilter, RealtimeConfig, RealtimeSession, Subscription};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = RealtimeSession::builder(RealtimeConfig::from_env())
//!         .subscribe(Subscription::postgres_changes(
//!             "todos",
//!             PostgresChangesFilter::table("public", "todos"),
//!             |event, payload| {
//!                 println!("{}: {}", event, String::from_utf8_lossy(payload));
//!                 Ok(())
//!             },
//!         ))
//!         .build()?;
//!
//!     session.start().await?;
//!     tokio::signal::ctrl_c().await?;
//!     session.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod client;
pub mod infrastructure;
pub mod messaging;
pub mod types;
pub mod websocket;

pub use channel::{
    ChannelKind, ChannelOptions, PostgresChangeEvent, PostgresChangesFilter, Registry,
    Subscription,
};
pub use client::{Publisher, RealtimeConfig, RealtimeSession, SessionBuilder, SessionState};
pub use infrastructure::ReconnectPolicy;
pub use types::{Envelope, HandlerError, HandlerResult, RealtimeError, Result};
pub use websocket::{Transport, TransportFactory};
