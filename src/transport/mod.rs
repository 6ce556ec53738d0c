//! Transport layer for datagram I/O abstraction

use crate::error::Result;
use std::net::SocketAddr;

mod mock;
mod udp;

pub use mock::MockTransport;
pub use udp::UdpTransport;

/// Datagram transport trait for the service socket
///
/// One instance carries the whole protocol: requests in, acks, hello
/// broadcasts and event packets out. Implementations must never block
/// the caller; the service loop owns its own pacing.
pub trait Transport: Send {
    /// Receive one pending datagram into `buf`, without blocking
    ///
    /// Returns the payload length and source address, or `Ok(None)`
    /// when nothing is queued. A datagram longer than `buf` is
    /// delivered truncated to `buf.len()`.
    fn try_recv(&mut self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>>;

    /// Send one datagram to `dest`, returns number of bytes sent
    fn send_to(&mut self, data: &[u8], dest: SocketAddr) -> Result<usize>;
}
