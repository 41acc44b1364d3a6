use crate::types::constants::phoenix_events;

/// Phoenix system events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemEvent {
    /// Join channel
    Join,
    /// Leave channel
    Leave,
    /// Reply to a message
    Reply,
    /// Close channel
    Close,
    /// Error event
    Error,
    /// Heartbeat
    Heartbeat,
}

impl SystemEvent {
    /// Returns `None` for anything that is not a Phoenix system event.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            phoenix_events::JOIN => Some(Self::Join),
            phoenix_events::LEAVE => Some(Self::Leave),
            phoenix_events::REPLY => Some(Self::Reply),
            phoenix_events::CLOSE => Some(Self::Close),
            phoenix_events::ERROR => Some(Self::Error),
            phoenix_events::HEARTBEAT => Some(Self::Heartbeat),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Join => phoenix_events::JOIN,
            Self::Leave => phoenix_events::LEAVE,
            Self::Reply => phoenix_events::REPLY,
            Self::Close => phoenix_events::CLOSE,
            Self::Error => phoenix_events::ERROR,
            Self::Heartbeat => phoenix_events::HEARTBEAT,
        }
    }

    /// Protocol housekeeping that never reaches a handler.
    pub fn is_housekeeping(&self) -> bool {
        matches!(self, Self::Reply | Self::Close | Self::Heartbeat)
    }
}

impl std::fmt::Display for SystemEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether an inbound event name is dropped by the dispatcher.
pub fn is_housekeeping(event: &str) -> bool {
    SystemEvent::parse(event).is_some_and(|e| e.is_housekeeping())
}
