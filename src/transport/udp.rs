//! UDP transport bound to the service port

use super::Transport;
use crate::error::Result;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

/// Non-blocking UDP socket with broadcast enabled
///
/// Binds all interfaces on the service port. The same socket receives
/// requests, answers them and carries the hello broadcast, so clients
/// see one consistent peer address.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Bind the service socket on `port`
    ///
    /// A failure here (port in use, permission) is a startup error;
    /// the daemon has nothing to serve without the socket.
    pub fn bind(port: u16) -> Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port))?;
        socket.set_broadcast(true)?;
        socket.set_nonblocking(true)?;
        Ok(Self { socket })
    }

    /// Local address the socket is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

impl Transport for UdpTransport {
    fn try_recv(&mut self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>> {
        match self.socket.recv_from(buf) {
            Ok((len, addr)) => Ok(Some((len, addr))),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            // Some platforms surface ICMP port-unreachable from an
            // earlier send as a receive error. The peer is gone, not
            // the socket; report empty and let session recovery react.
            Err(e) if e.kind() == io::ErrorKind::ConnectionReset => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn send_to(&mut self, data: &[u8], dest: SocketAddr) -> Result<usize> {
        Ok(self.socket.send_to(data, dest)?)
    }
}
