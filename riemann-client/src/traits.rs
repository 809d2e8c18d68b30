use crate::{errors::Result, models::Protocol, proto::Msg};

/// A connection to a Riemann collector over one transport
///
/// Implementations own their socket, open it on first use and drop it after
/// any failure so the next call starts from a fresh connection.
pub trait Transport: Send {
    /// Which protocol this transport speaks
    fn protocol(&self) -> Protocol;

    /// Send a message to the collector
    ///
    /// Stream transports wait for and return the collector's acknowledgement.
    /// Datagram transports return `Ok(None)` once the payload is handed to the OS.
    fn send(&mut self, msg: &Msg) -> Result<Option<Msg>>;

    /// Whether a socket is currently open
    fn is_connected(&self) -> bool;

    /// Drop the current socket, if any
    fn close(&mut self);
}
