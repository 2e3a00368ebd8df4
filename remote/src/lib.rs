//! Networking for `nw`: endpoints, the single-connection session state machine and the
//! counted byte pump.
//!
//! There is no framing on the wire. A session carries one raw byte stream and the
//! stream ends when the sending side shuts down its half of the connection.

pub mod endpoint;
pub mod session;
pub mod streams;

pub use endpoint::Endpoint;
pub use session::{Closed, Connected, Listening};
