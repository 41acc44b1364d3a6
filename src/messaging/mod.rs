// Messaging module - Event classification and message routing
pub mod event;
pub mod router;

pub use event::{SystemEvent, is_housekeeping};
pub use router::{MessageRouter, RouteOutcome};
