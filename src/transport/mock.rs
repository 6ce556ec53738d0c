//! Mock transport for testing

use super::Transport;
use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// Mock transport for unit testing
///
/// Clones share state, so a test keeps one handle while the service
/// owns another: datagrams pushed through the test handle appear on
/// the service's `try_recv`, and everything the service sends is
/// recorded for inspection.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

struct MockTransportInner {
    inbound: VecDeque<(Vec<u8>, SocketAddr)>,
    sent: Vec<(Vec<u8>, SocketAddr)>,
    fail_sends: bool,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        MockTransport {
            inner: Arc::new(Mutex::new(MockTransportInner {
                inbound: VecDeque::new(),
                sent: Vec::new(),
                fail_sends: false,
            })),
        }
    }

    /// Queue a datagram to be received
    pub fn push_datagram(&self, data: &[u8], from: SocketAddr) {
        let mut inner = self.inner.lock().unwrap();
        inner.inbound.push_back((data.to_vec(), from));
    }

    /// Get all sent datagrams with their destinations
    pub fn sent(&self) -> Vec<(Vec<u8>, SocketAddr)> {
        let inner = self.inner.lock().unwrap();
        inner.sent.clone()
    }

    /// Get all sent datagrams and clear the record
    pub fn take_sent(&self) -> Vec<(Vec<u8>, SocketAddr)> {
        let mut inner = self.inner.lock().unwrap();
        std::mem::take(&mut inner.sent)
    }

    /// Make every subsequent send fail with a broken-pipe error
    pub fn set_fail_sends(&self, fail: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_sends = fail;
    }
}

impl Transport for MockTransport {
    fn try_recv(&mut self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>> {
        let mut inner = self.inner.lock().unwrap();
        match inner.inbound.pop_front() {
            Some((data, from)) => {
                // Oversized datagrams truncate, same as a real socket
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok(Some((len, from)))
            }
            None => Ok(None),
        }
    }

    fn send_to(&mut self, data: &[u8], dest: SocketAddr) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_sends {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "mock send failure",
            )));
        }
        inner.sent.push((data.to_vec(), dest));
        Ok(data.len())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([10, 0, 0, 1], port))
    }

    #[test]
    fn test_datagram_boundaries_preserved() {
        let mock = MockTransport::new();
        mock.push_datagram(&[0xA0], addr(1000));
        mock.push_datagram(&[0xB0, 0x01], addr(2000));

        let mut handle = mock.clone();
        let mut buf = [0u8; 16];

        let (len, from) = handle.try_recv(&mut buf).unwrap().unwrap();
        assert_eq!((len, from), (1, addr(1000)));
        assert_eq!(buf[0], 0xA0);

        let (len, from) = handle.try_recv(&mut buf).unwrap().unwrap();
        assert_eq!((len, from), (2, addr(2000)));
        assert!(handle.try_recv(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_sent_record_and_failure_injection() {
        let mock = MockTransport::new();
        let mut handle = mock.clone();

        handle.send_to(&[0xA1], addr(9999)).unwrap();
        assert_eq!(mock.sent(), vec![(vec![0xA1], addr(9999))]);

        mock.set_fail_sends(true);
        assert!(handle.send_to(&[0xA1], addr(9999)).is_err());

        mock.set_fail_sends(false);
        handle.send_to(&[0xA3], addr(1)).unwrap();
        assert_eq!(mock.take_sent().len(), 2);
        assert!(mock.sent().is_empty());
    }
}
