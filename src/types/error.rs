use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors that can occur when using the realtime session.
#[derive(Error, Debug)]
pub enum RealtimeError {
    /// Base URL missing or unparseable
    #[error("Configuration error: {0}")]
    Config(String),

    /// Dialing the realtime endpoint failed
    #[error("Connection error: {0}")]
    Connect(String),

    /// WebSocket protocol error on an established connection
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// The transport was closed, locally or by the server
    #[error("Transport closed")]
    TransportClosed,

    /// Inbound frame that is not a valid envelope
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Two subscriptions derive the same topic
    #[error("Duplicate subscription for topic '{0}'")]
    DuplicateSubscription(String),

    /// Invalid subscription descriptor or publish topic
    #[error("Channel error: {0}")]
    Channel(String),

    /// No live transport to write to
    #[error("Not connected")]
    NotConnected,

    /// The reconnect budget was spent without a successful dial
    #[error("Reconnect attempts exhausted after {attempts} attempts")]
    ReconnectExhausted { attempts: u32 },

    /// The session has been stopped
    #[error("Session stopped")]
    Stopped,

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failure reported by a subscription handler
    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),
}

impl From<url::ParseError> for RealtimeError {
    fn from(err: url::ParseError) -> Self {
        Self::Config(format!("invalid URL: {}", err))
    }
}

/// Failure indicator returned by a subscription's consume callback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self(err.to_string())
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

/// Convenience type alias for `Result<T, RealtimeError>`.
pub type Result<T> = std::result::Result<T, RealtimeError>;

/// Return type of subscription handlers.
pub type HandlerResult = std::result::Result<(), HandlerError>;
