//! Transport abstraction traits.
//!
//! The session only talks to these traits, so tests can drive it with a
//! scripted stream instead of a real socket.

use crate::types::{Envelope, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// One live duplex connection carrying framed envelopes.
///
/// A `write` may run concurrently with an in-flight `read`. Concurrent
/// writers are not required; the session serialises them.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one envelope.
    async fn write(&self, envelope: &Envelope) -> Result<()>;

    /// Receive the next envelope.
    ///
    /// Returns [`RealtimeError::TransportClosed`](crate::RealtimeError::TransportClosed)
    /// once the connection is gone, and
    /// [`RealtimeError::MalformedFrame`](crate::RealtimeError::MalformedFrame) for a
    /// frame that could not be decoded (the connection stays usable).
    async fn read(&self) -> Result<Envelope>;

    /// Close the connection. Idempotent; pending reads fail promptly.
    async fn close(&self) -> Result<()>;
}

/// Opens transports. The only collaborator the session consumes.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn dial(&self, url: &str) -> Result<Arc<dyn Transport>>;
}
