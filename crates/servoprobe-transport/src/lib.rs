//! Serial byte-stream transport for servo controller diagnostics.
//!
//! Provides a small interface over a serial link:
//! - [`ByteStream`]: `Read + Write` plus a count of bytes waiting to be read
//! - [`SerialStream`]: a [`ByteStream`] backed by an OS serial port
//! - [`discovery`]: port enumeration with pluggable match predicates
//!
//! This is the lowest layer of servoprobe. The command codec and the session
//! both work against [`ByteStream`], so anything that can report pending
//! bytes can stand in for real hardware.

pub mod discovery;
pub mod error;
pub mod serial;
pub mod traits;

pub use discovery::{find_port, list_ports, PortInfo, PortKind, PortMatcher};
pub use error::{Result, TransportError};
pub use serial::{SerialStream, DEFAULT_BAUD_RATE};
pub use traits::ByteStream;
