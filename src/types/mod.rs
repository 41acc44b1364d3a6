pub mod constants;
pub mod error;
pub mod message;

pub use constants::*;
pub use error::{HandlerError, HandlerResult, RealtimeError, Result};
pub use message::Envelope;
