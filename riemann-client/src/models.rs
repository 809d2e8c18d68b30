use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::ClientError;

/// Default port of the Riemann collector for both TCP and UDP
pub const DEFAULT_PORT: u16 = 5555;

/// Largest payload the UDP transport will put in a single datagram
pub const MAX_DATAGRAM_SIZE: usize = 16384;

/// Largest acknowledgement frame the TCP transport will read
pub const MAX_RESPONSE_SIZE: u32 = 64 * 1024 * 1024;

/// Transport used to reach the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            other => Err(ClientError::Configuration(format!(
                "Invalid protocol '{}', expected one of [tcp, udp]",
                other
            ))),
        }
    }
}

/// Configuration for a [`RiemannClient`](crate::RiemannClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Transport to use
    pub protocol: Protocol,
    /// Collector host name or address
    pub host: String,
    /// Collector port
    pub port: u16,
    /// Connect, read and write timeout
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(protocol: Protocol, host: impl Into<String>, port: u16) -> Self {
        Self {
            protocol,
            host: host.into(),
            port,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `host:port` form used when resolving the collector
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(Protocol::Tcp, "localhost", DEFAULT_PORT)
    }
}
