//! Byte transport to the queue server.

use std::collections::VecDeque;
use std::io;

/// Non-blocking byte stream between the client and the queue server.
///
/// The client polls; nothing here may block. `read_byte` returns whatever
/// single byte is already buffered, or `None`. Implementations own any
/// buffering needed to honor that.
pub trait Transport {
    /// Open a connection. Any previous connection is discarded.
    fn connect(&mut self, host: &str, port: u16) -> io::Result<()>;

    /// Bytes ready to read without blocking.
    fn available(&mut self) -> usize;

    /// Take one buffered byte, if any.
    fn read_byte(&mut self) -> Option<u8>;

    /// Write `bytes`, returning how many were accepted.
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Drop the connection and discard buffered bytes.
    fn stop(&mut self);
}

// ============================================================================
// Scripted Transport
// ============================================================================

/// Deterministic in-memory transport for exercising the client without a
/// server.
///
/// Tests queue server bytes with [`ScriptedTransport::serve`] and inspect
/// what the client wrote with [`ScriptedTransport::take_written`]. Connect
/// attempts can be made to fail to exercise the retry policy.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    inbox: VecDeque<u8>,
    written: Vec<u8>,
    connected: bool,
    connects: u32,
    refusals: u32,
}

impl ScriptedTransport {
    /// Create a disconnected transport with nothing scripted.
    pub fn new() -> Self {
        ScriptedTransport::default()
    }

    /// Queue bytes for the client to read.
    pub fn serve(&mut self, bytes: &[u8]) {
        self.inbox.extend(bytes);
    }

    /// Make the next `count` connect attempts fail.
    pub fn refuse_next_connects(&mut self, count: u32) {
        self.refusals = count;
    }

    /// Everything the client has written since the last take.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Drain and return everything the client has written.
    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.written)
    }

    /// Successful connects so far.
    pub fn connect_count(&self) -> u32 {
        self.connects
    }

    /// True while a connection is open.
    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

impl Transport for ScriptedTransport {
    fn connect(&mut self, _host: &str, _port: u16) -> io::Result<()> {
        if self.refusals > 0 {
            self.refusals -= 1;
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "scripted refusal",
            ));
        }
        self.connected = true;
        self.connects += 1;
        self.inbox.clear();
        Ok(())
    }

    fn available(&mut self) -> usize {
        self.inbox.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.inbox.pop_front()
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        if !self.connected {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "transport is stopped",
            ));
        }
        self.written.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn stop(&mut self) {
        self.connected = false;
        self.inbox.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_served_bytes_come_back_in_order() {
        let mut transport = ScriptedTransport::new();
        transport.connect("example", 1).unwrap();
        transport.serve(b"ab");
        assert_eq!(transport.available(), 2);
        assert_eq!(transport.read_byte(), Some(b'a'));
        assert_eq!(transport.read_byte(), Some(b'b'));
        assert_eq!(transport.read_byte(), None);
    }

    #[test]
    fn test_refusals_fail_then_clear() {
        let mut transport = ScriptedTransport::new();
        transport.refuse_next_connects(1);
        assert!(transport.connect("example", 1).is_err());
        assert!(transport.connect("example", 1).is_ok());
        assert_eq!(transport.connect_count(), 1);
    }

    #[test]
    fn test_stop_discards_buffered_bytes() {
        let mut transport = ScriptedTransport::new();
        transport.connect("example", 1).unwrap();
        transport.serve(b"stale");
        transport.stop();
        assert_eq!(transport.available(), 0);
        assert!(transport.write(b"x").is_err());
    }
}
