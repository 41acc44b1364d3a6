use std::fmt;

/// Lifecycle of a [`RealtimeSession`](super::RealtimeSession).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Built, `start` not called yet.
    Idle,
    /// Dialing for the first time.
    Connecting,
    /// Transport up, join envelopes being written.
    Joining,
    /// Joined and reading.
    Active,
    /// Connection lost, redialing with backoff.
    Reconnecting,
    /// Terminal.
    Stopped,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Joining => "joining",
            Self::Active => "active",
            Self::Reconnecting => "reconnecting",
            Self::Stopped => "stopped",
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self == Self::Stopped
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
