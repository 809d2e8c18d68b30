//! Fake Riemann collectors listening on loopback

use prost::Message;
use riemann_client::Msg;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream, UdpSocket};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// The collector's binary acknowledgement: length 2, `ok = true`
pub const OK_RESPONSE: &[u8] = b"\x00\x00\x00\x02\x10\x01";

pub struct FakeCollector {
    pub port: u16,
    pub requests: Receiver<Msg>,
}

impl FakeCollector {
    /// Accept one TCP connection and answer each request with `response`
    pub fn tcp(response: &'static [u8]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake collector");
        let port = listener.local_addr().unwrap().port();
        let (tx, requests) = mpsc::channel();

        thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            while let Some(request) = read_request(&mut stream) {
                if stream.write_all(response).is_err() || tx.send(request).is_err() {
                    return;
                }
            }
        });

        Self { port, requests }
    }

    /// Receive datagrams and decode each as a message
    pub fn udp() -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").expect("bind fake collector");
        let port = socket.local_addr().unwrap().port();
        let (tx, requests) = mpsc::channel();

        thread::spawn(move || {
            let mut buf = [0u8; 65536];
            while let Ok(len) = socket.recv(&mut buf) {
                let Ok(msg) = Msg::decode(&buf[..len]) else {
                    continue;
                };
                if tx.send(msg).is_err() {
                    return;
                }
            }
        });

        Self { port, requests }
    }

    pub fn next_request(&self) -> Msg {
        self.requests
            .recv_timeout(TIMEOUT)
            .expect("collector received nothing")
    }
}

fn read_request(stream: &mut TcpStream) -> Option<Msg> {
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).ok()?;
    let mut body = vec![0u8; u32::from_be_bytes(header) as usize];
    stream.read_exact(&mut body).ok()?;
    Msg::decode(body.as_slice()).ok()
}

/// A port with nothing listening on it
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
