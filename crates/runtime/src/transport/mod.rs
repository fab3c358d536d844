//! Line transports between a client and the relay.
//!
//! A transport moves complete envelope lines. Received lines are buffered
//! by whoever owns the socket and handed to the simulation thread in
//! arrival order on [`Transport::drain_lines`].
mod local;
mod tcp;

pub use local::{LocalHub, LocalTransport};
pub use tcp::TcpTransport;

use crate::error::TransportError;

pub trait Transport {
    /// Sends one line. The transport appends the newline.
    fn send_line(&mut self, line: &str) -> Result<(), TransportError>;

    /// Takes every line received since the last call, oldest first.
    ///
    /// Returns [`TransportError::Closed`] once the connection is gone and
    /// nothing is left to drain.
    fn drain_lines(&mut self) -> Result<Vec<String>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
        (**self).send_line(line)
    }

    fn drain_lines(&mut self) -> Result<Vec<String>, TransportError> {
        (**self).drain_lines()
    }
}
