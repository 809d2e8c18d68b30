use prost::Message;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{
    errors::{ClientError, Result},
    models::{ClientConfig, Protocol, MAX_DATAGRAM_SIZE, MAX_RESPONSE_SIZE},
    proto::{Event, Msg},
    traits::Transport,
};

fn resolve(addr: &str) -> Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = addr.to_socket_addrs()?.collect();
    if addrs.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("No addresses resolved for {}", addr),
        )
        .into());
    }
    Ok(addrs)
}

/// Write `payload` with the collector's 4-byte big-endian length prefix
fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| ClientError::MessageTooLarge {
        size: payload.len(),
        limit: u32::MAX as usize,
    })?;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

/// Read one length-prefixed response and decode it
fn read_frame<R: Read>(reader: &mut R) -> Result<Msg> {
    let mut header = [0u8; 4];
    reader.read_exact(&mut header)?;
    let len = u32::from_be_bytes(header);
    if len > MAX_RESPONSE_SIZE {
        return Err(ClientError::ResponseTooLarge(len));
    }

    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body)?;
    Ok(Msg::decode(body.as_slice())?)
}

/// Length-prefixed stream transport with acknowledgement checking
#[derive(Debug)]
pub struct TcpTransport {
    addr: String,
    timeout: Duration,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    /// Create a transport for `addr` (e.g., "localhost:5555"); nothing is opened yet
    pub fn new(addr: &str, timeout: Duration) -> Self {
        Self {
            addr: addr.to_string(),
            timeout,
            stream: None,
        }
    }

    fn connect(&self) -> Result<TcpStream> {
        let mut last_error = None;
        for sock_addr in resolve(&self.addr)? {
            match TcpStream::connect_timeout(&sock_addr, self.timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(self.timeout))?;
                    stream.set_write_timeout(Some(self.timeout))?;
                    stream.set_nodelay(true)?;
                    debug!("Connected to Riemann at {} over tcp", sock_addr);
                    return Ok(stream);
                }
                Err(e) => {
                    debug!("Connection to {} failed: {}", sock_addr, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "No address to connect to"))
            .into())
    }

    /// Execute operation with connection, creating it if needed
    ///
    /// The stream is only kept when the operation succeeds.
    fn with_connection<F, R>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&mut TcpStream) -> Result<R>,
    {
        let mut stream = match self.stream.take() {
            Some(stream) => stream,
            None => self.connect()?,
        };

        match f(&mut stream) {
            Ok(value) => {
                self.stream = Some(stream);
                Ok(value)
            }
            Err(e) => {
                warn!("Dropping tcp connection to {}: {}", self.addr, e);
                Err(e)
            }
        }
    }
}

impl Transport for TcpTransport {
    fn protocol(&self) -> Protocol {
        Protocol::Tcp
    }

    fn send(&mut self, msg: &Msg) -> Result<Option<Msg>> {
        let payload = msg.encode_to_vec();
        self.with_connection(|stream| {
            write_frame(stream, &payload)?;
            let response = read_frame(stream)?;
            if response.is_ok() {
                Ok(Some(response))
            } else {
                Err(ClientError::Server(response.error.unwrap_or_else(|| {
                    "Collector did not acknowledge the message".to_string()
                })))
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn close(&mut self) {
        self.stream = None;
    }
}

/// Fire-and-forget datagram transport
#[derive(Debug)]
pub struct UdpTransport {
    addr: String,
    timeout: Duration,
    socket: Option<UdpSocket>,
}

impl UdpTransport {
    pub fn new(addr: &str, timeout: Duration) -> Self {
        Self {
            addr: addr.to_string(),
            timeout,
            socket: None,
        }
    }

    fn open(&self) -> Result<UdpSocket> {
        let target = resolve(&self.addr)?[0];
        let local = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local)?;
        socket.set_write_timeout(Some(self.timeout))?;
        socket.connect(target)?;
        debug!("Opened udp socket towards Riemann at {}", target);
        Ok(socket)
    }
}

impl Transport for UdpTransport {
    fn protocol(&self) -> Protocol {
        Protocol::Udp
    }

    fn send(&mut self, msg: &Msg) -> Result<Option<Msg>> {
        let payload = msg.encode_to_vec();
        if payload.len() > MAX_DATAGRAM_SIZE {
            return Err(ClientError::MessageTooLarge {
                size: payload.len(),
                limit: MAX_DATAGRAM_SIZE,
            });
        }

        let socket = match self.socket.take() {
            Some(socket) => socket,
            None => self.open()?,
        };

        match socket.send(&payload) {
            Ok(sent) if sent == payload.len() => {
                self.socket = Some(socket);
                Ok(None)
            }
            Ok(sent) => Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("Sent {} of {} bytes", sent, payload.len()),
            )
            .into()),
            Err(e) => {
                warn!("Dropping udp socket towards {}: {}", self.addr, e);
                Err(e.into())
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    fn close(&mut self) {
        self.socket = None;
    }
}

/// Client for sending events to a Riemann collector
///
/// Sends are serialized through an internal lock because the TCP
/// acknowledgement must be read right after its own write.
pub struct RiemannClient {
    config: ClientConfig,
    transport: Mutex<Box<dyn Transport>>,
}

impl RiemannClient {
    /// Create a client for the configured protocol; the socket opens on first send
    pub fn new(config: ClientConfig) -> Self {
        let addr = config.address();
        let transport: Box<dyn Transport> = match config.protocol {
            Protocol::Tcp => Box::new(TcpTransport::new(&addr, config.timeout)),
            Protocol::Udp => Box::new(UdpTransport::new(&addr, config.timeout)),
        };
        Self::with_transport(config, transport)
    }

    /// Validate a textual protocol name and create the matching client
    pub fn configure(protocol: &str, host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let protocol: Protocol = protocol.parse()?;
        Ok(Self::new(
            ClientConfig::new(protocol, host, port).with_timeout(timeout),
        ))
    }

    /// Create a client around an existing transport
    pub fn with_transport(config: ClientConfig, transport: Box<dyn Transport>) -> Self {
        Self {
            config,
            transport: Mutex::new(transport),
        }
    }

    /// Send a single event
    pub fn send_event(&self, event: Event) -> Result<()> {
        self.send_events(vec![event])
    }

    /// Send a batch of events in one message
    pub fn send_events(&self, events: Vec<Event>) -> Result<()> {
        let msg = Msg::with_events(events);
        let mut transport = self
            .transport
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        transport.send(&msg)?;
        Ok(())
    }

    pub fn protocol(&self) -> Protocol {
        self.config.protocol
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.transport
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_connected()
    }

    /// Drop the open socket; the next send reconnects
    pub fn close(&self) {
        self.transport
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .close();
    }
}

impl std::fmt::Debug for RiemannClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiemannClient")
            .field("config", &self.config)
            .finish()
    }
}
