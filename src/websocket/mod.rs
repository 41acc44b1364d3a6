// WebSocket module - transport seam and the tokio-tungstenite implementation
pub mod factory;
#[cfg(test)]
pub(crate) mod scripted;
pub mod transport;

pub use factory::{WebSocketFactory, WebSocketTransport};
pub use transport::{Transport, TransportFactory};
