//! Shared service status for external observers

use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Read-only view of the running service
///
/// Shared with controller or UI threads that poll it for display. The
/// counters cover streamed sensor-event packets only; control acks and
/// hello broadcasts are deliberately not counted, so a quiet link with
/// an attached client reads as zero traffic.
#[derive(Debug, Default)]
pub struct ServiceStatus {
    client: Mutex<Option<SocketAddr>>,
    packets_sent: AtomicU64,
    bytes_sent: AtomicU64,
}

impl ServiceStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address of the attached client, if any
    pub fn client_addr(&self) -> Option<SocketAddr> {
        *self.client.lock()
    }

    /// Sensor-event packets sent since the last reset
    pub fn packets_sent(&self) -> u64 {
        self.packets_sent.load(Ordering::Relaxed)
    }

    /// Sensor-event bytes sent since the last reset
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    pub(crate) fn set_client(&self, addr: Option<SocketAddr>) {
        *self.client.lock() = addr;
    }

    pub(crate) fn record_event_packet(&self, bytes: u64) {
        self.packets_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self) {
        self.set_client(None);
        self.packets_sent.store(0, Ordering::Relaxed);
        self.bytes_sent.store(0, Ordering::Relaxed);
    }
}
