//! TCP transport for the host platform.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use marquee_client::Transport;
use tracing::{debug, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const READ_CHUNK: usize = 512;

/// Non-blocking TCP stream with a local receive buffer.
///
/// The client polls one byte at a time; the transport drains the socket in
/// chunks into a queue so those polls never touch the kernel more than once
/// per tick.
#[derive(Debug, Default)]
pub struct TcpTransport {
    stream: Option<TcpStream>,
    buffer: VecDeque<u8>,
}

impl TcpTransport {
    pub fn new() -> Self {
        TcpTransport::default()
    }

    /// Pull whatever the socket has ready into the local buffer.
    fn fill(&mut self) {
        let mut lost = false;
        if let Some(stream) = self.stream.as_mut() {
            let mut chunk = [0u8; READ_CHUNK];
            loop {
                match stream.read(&mut chunk) {
                    Ok(0) => {
                        debug!("peer closed the connection");
                        lost = true;
                        break;
                    }
                    Ok(count) => self.buffer.extend(&chunk[..count]),
                    Err(ref error) if error.kind() == io::ErrorKind::WouldBlock => break,
                    Err(error) => {
                        warn!("socket read failed: {}", error);
                        lost = true;
                        break;
                    }
                }
            }
        }
        if lost {
            self.stream = None;
        }
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self, host: &str, port: u16) -> io::Result<()> {
        self.stop();
        let mut last_error = None;
        for addr in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
                Ok(stream) => {
                    stream.set_nonblocking(true)?;
                    stream.set_nodelay(true)?;
                    debug!("connected to {}", addr);
                    self.stream = Some(stream);
                    return Ok(());
                }
                Err(error) => last_error = Some(error),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, "no addresses resolved")
        }))
    }

    fn available(&mut self) -> usize {
        self.fill();
        self.buffer.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        if self.buffer.is_empty() {
            self.fill();
        }
        self.buffer.pop_front()
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "transport is stopped",
            ));
        };
        match stream.write_all(bytes) {
            Ok(()) => Ok(bytes.len()),
            Err(error) => {
                self.stream = None;
                Err(error)
            }
        }
    }

    fn stop(&mut self) {
        if self.stream.take().is_some() {
            debug!("transport stopped");
        }
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_loopback_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("local addr").port();

        let mut transport = TcpTransport::new();
        transport.connect("127.0.0.1", port).expect("connect");

        let (mut server, _) = listener.accept().expect("accept");
        transport.write(b"ping").expect("write");
        let mut request = [0u8; 4];
        server.read_exact(&mut request).expect("server read");
        assert_eq!(&request, b"ping");

        server.write_all(b"+OK\r\n").expect("server write");
        let mut received = Vec::new();
        for _ in 0..100 {
            while let Some(byte) = transport.read_byte() {
                received.push(byte);
            }
            if received.len() >= 5 {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(received, b"+OK\r\n");
    }

    #[test]
    fn test_connect_to_closed_port_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        drop(listener);

        let mut transport = TcpTransport::new();
        assert!(transport.connect("127.0.0.1", port).is_err());
        assert!(transport.write(b"x").is_err());
    }

    #[test]
    fn test_stop_discards_buffered_bytes() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("local addr").port();

        let mut transport = TcpTransport::new();
        transport.connect("127.0.0.1", port).expect("connect");
        let (mut server, _) = listener.accept().expect("accept");
        server.write_all(b"stale").expect("server write");

        for _ in 0..100 {
            if transport.available() > 0 {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        transport.stop();
        assert_eq!(transport.available(), 0);
        assert_eq!(transport.read_byte(), None);
    }
}
