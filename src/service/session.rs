//! Single-client session slot

use crate::service::status::ServiceStatus;
use std::net::SocketAddr;
use std::sync::Arc;

/// The one authorized streaming peer, if any
///
/// Owned by the loop thread; every change is mirrored into the shared
/// [`ServiceStatus`] so observers never touch loop state. A newly
/// authorized address silently replaces the previous one, which is the
/// whole session model: last authorized client wins.
pub struct Session {
    client: Option<SocketAddr>,
    status: Arc<ServiceStatus>,
}

impl Session {
    pub fn new(status: Arc<ServiceStatus>) -> Self {
        Self {
            client: None,
            status,
        }
    }

    pub fn client(&self) -> Option<SocketAddr> {
        self.client
    }

    pub fn is_attached(&self) -> bool {
        self.client.is_some()
    }

    /// Attach (or replace) the streaming client
    pub fn attach(&mut self, addr: SocketAddr) {
        self.update(Some(addr));
    }

    /// Detach the streaming client
    pub fn detach(&mut self) {
        self.update(None);
    }

    fn update(&mut self, next: Option<SocketAddr>) {
        if self.client == next {
            return;
        }
        match &next {
            Some(addr) => log::info!("Streaming to client: {}", addr),
            None => log::info!("Streaming paused (no client attached)"),
        }
        self.client = next;
        self.status.set_client(next);
    }
}
