//! Serial command/response diagnostics for multi-servo controllers.
//!
//! servoprobe drives a servo controller that accepts `S<id>,<angle>\n` lines
//! over a serial link and answers with free-form text lines.
//!
//! # Crate Structure
//!
//! - [`transport`]: Serial byte streams and port discovery
//! - [`frame`]: Command validation/encoding and response reading
//! - [`session`]: One open connection with a scoped lifecycle
//! - [`sequence`]: Best-effort test sequences composed from single exchanges

pub mod sequence;
pub mod session;

pub use sequence::{CancelFlag, SequenceConfig};
pub use session::{Session, SessionConfig, SessionError, SessionResult};

/// Re-export transport types.
pub mod transport {
    pub use servoprobe_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use servoprobe_frame::*;
}
