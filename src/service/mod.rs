//! Sensor broadcast service: session, dispatch and the driving loop
//!
//! This module implements the UDP service that answers discovery and
//! control requests and streams sensor readings to the one attached
//! client. It is optimized for a steady low-latency event stream on
//! small devices.
//!
//! # Design Principles
//!
//! ## Single Client
//!
//! Exactly one streaming peer at a time. There is no handshake and no
//! lease: the last address that passes an authorized state-changing
//! request becomes the client, replacing whoever held the slot.
//! Discovery (`DetectDevice`), liveness (`PingDevice`) and enumeration
//! stay stateless and are answered for anyone.
//!
//! ## Two Threads, One Swap
//!
//! | Actor | Runs | Touches |
//! |-------|------|---------|
//! | Service loop | `SensorService::run` | socket, session, table |
//! | Provider threads | platform callbacks | event batcher only |
//!
//! Providers never see the socket and the loop never blocks on a
//! provider. The only shared mutable state is the [`EventBatcher`],
//! drained by swapping vectors under a short lock, and the read-only
//! [`ServiceStatus`] mirror for observers.
//!
//! ## Tick Anatomy
//!
//! Every pass of the loop:
//!
//! 1. Broadcast a hello beacon when the interval elapsed
//! 2. Drain and dispatch all queued request datagrams
//! 3. If a client is attached, drain both event queues and send each
//!    reading as one datagram, samples before triggers
//! 4. Sleep: remainder of the tick while attached (floor 1ms), the
//!    longer idle interval while not
//!
//! A transport error inside step 2 or 3 degrades the service instead
//! of stopping it: all sensors are disabled, queues dropped and the
//! client detached, while the loop keeps running so discovery still
//! works and a client can re-attach.

mod dispatcher;

pub mod batcher;
pub mod session;
pub mod status;
pub mod table;

pub use batcher::EventBatcher;
pub use status::ServiceStatus;
pub use table::{SensorDescriptor, SensorTable};

use crate::config::Config;
use crate::core::provider::SensorProvider;
use crate::error::Result;
use crate::protocol::{self, Response, MAX_PACKET_LEN};
use crate::protocol::wire::PacketBuffer;
use crate::transport::Transport;
use session::Session;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The sensor broadcast service
///
/// Owns the transport, the provider and all protocol state. Construct
/// it, hand the [`ServiceStatus`] and run flag to whoever needs them,
/// then call [`run`](Self::run) on a dedicated thread.
pub struct SensorService {
    transport: Box<dyn Transport>,
    provider: Box<dyn SensorProvider>,
    table: SensorTable,
    session: Session,
    batcher: Arc<EventBatcher>,
    status: Arc<ServiceStatus>,
    /// Reusable outbound packet buffer; reset before every packet
    scratch: PacketBuffer,
    password: String,
    port: u16,
    tick_interval: Duration,
    idle_interval: Duration,
    hello_interval: Duration,
    running: Arc<AtomicBool>,
}

impl SensorService {
    /// Wire up the service: sink registration and sensor enumeration
    ///
    /// Fails when the provider cannot enumerate; a service with no
    /// descriptor table has nothing to offer.
    pub fn new(
        config: &Config,
        transport: Box<dyn Transport>,
        mut provider: Box<dyn SensorProvider>,
    ) -> Result<Self> {
        let status = Arc::new(ServiceStatus::new());
        let batcher = Arc::new(EventBatcher::new());
        provider.set_sink(batcher.clone());

        let table = SensorTable::from_provider(provider.as_mut())?;
        log::info!("Initialized {} sensor descriptor(s)", table.len());

        Ok(Self {
            transport,
            provider,
            table,
            session: Session::new(status.clone()),
            batcher,
            status,
            scratch: PacketBuffer::new(),
            password: config.network.password.clone(),
            port: config.network.port,
            tick_interval: Duration::from_millis(config.timing.tick_ms),
            idle_interval: Duration::from_millis(config.timing.idle_ms),
            hello_interval: Duration::from_millis(config.timing.hello_ms),
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Shared status handle for observer threads
    pub fn status(&self) -> Arc<ServiceStatus> {
        self.status.clone()
    }

    /// Shared run flag; clearing it stops [`run`](Self::run) at the
    /// next tick
    pub fn run_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Run the service loop until the run flag is cleared
    pub fn run(&mut self) -> Result<()> {
        log::info!(
            "Service loop started (tick {}ms, idle {}ms, hello every {}ms)",
            self.tick_interval.as_millis(),
            self.idle_interval.as_millis(),
            self.hello_interval.as_millis()
        );
        self.status.reset();

        let mut rx_buf = [0u8; MAX_PACKET_LEN];
        let mut last_hello: Option<Instant> = None;

        while self.running.load(Ordering::Relaxed) {
            let tick_start = Instant::now();

            if hello_due(last_hello, tick_start, self.hello_interval) {
                self.broadcast_hello();
                last_hello = Some(tick_start);
            }

            self.tick_and_recover(&mut rx_buf);

            let elapsed = tick_start.elapsed();
            let sleep = if self.session.is_attached() {
                // Keep the tick cadence but always yield at least 1ms
                self.tick_interval
                    .saturating_sub(elapsed)
                    .max(Duration::from_millis(1))
            } else {
                self.idle_interval
            };
            std::thread::sleep(sleep);
        }

        log::info!("Service loop stopping");
        self.disable_all_sensors();
        self.session.detach();
        log::info!("Service stopped");
        Ok(())
    }

    /// One tick with transport-failure recovery
    ///
    /// Degraded link: stop streaming, drop all protocol state, keep
    /// the loop alive so discovery continues and a client can come
    /// back.
    fn tick_and_recover(&mut self, rx_buf: &mut [u8]) {
        if let Err(e) = self.tick(rx_buf) {
            log::error!("Tick failed: {}; disabling sensors and detaching client", e);
            self.disable_all_sensors();
            self.session.detach();
        }
    }

    fn tick(&mut self, rx_buf: &mut [u8]) -> Result<()> {
        self.process_requests(rx_buf)?;
        self.flush_events()?;
        Ok(())
    }

    /// Drain and dispatch every request datagram queued this tick
    fn process_requests(&mut self, rx_buf: &mut [u8]) -> Result<()> {
        while let Some((len, src)) = self.transport.try_recv(rx_buf)? {
            if len == 0 {
                // Valid UDP, carries nothing
                continue;
            }
            self.handle_datagram(&rx_buf[..len], src)?;
        }
        Ok(())
    }

    /// Send every queued reading to the attached client
    ///
    /// Readings whose sensor was disabled between production and drain
    /// are discarded; their uid may already mean nothing to the client.
    fn flush_events(&mut self) -> Result<()> {
        let Some(client) = self.session.client() else {
            return Ok(());
        };

        let samples = self.batcher.drain_samples();
        let triggers = self.batcher.drain_triggers();
        if samples.is_empty() && triggers.is_empty() {
            return Ok(());
        }

        let mut sent = 0u32;
        for event in samples.iter().chain(triggers.iter()) {
            let Some(desc) = self.table.by_handle(event.handle) else {
                continue;
            };
            if !desc.enabled {
                continue;
            }
            protocol::encode_sensor_event(
                &mut self.scratch,
                desc.uid,
                event.timestamp,
                &event.values,
            );
            self.transport.send_to(self.scratch.as_bytes(), client)?;
            self.status.record_event_packet(self.scratch.len() as u64);
            sent += 1;
        }

        if sent > 0 {
            log::trace!("Flushed {} event packet(s) to {}", sent, client);
        }
        Ok(())
    }

    /// Broadcast the hello beacon
    ///
    /// Failures are routine while an interface is down, so they are
    /// logged and skipped; discovery resumes on the next interval.
    fn broadcast_hello(&mut self) {
        Response::Hello.encode_into(&mut self.scratch);
        let dest = SocketAddr::from((Ipv4Addr::BROADCAST, self.port));
        match self.transport.send_to(self.scratch.as_bytes(), dest) {
            Ok(_) => log::trace!("Hello broadcast to port {}", self.port),
            Err(e) => log::warn!("Hello broadcast failed: {}", e),
        }
    }

    /// Disable every sensor and drop queued readings
    fn disable_all_sensors(&mut self) {
        self.table.disable_all(self.provider.as_mut());
        self.batcher.clear();
    }
}

/// True when a hello broadcast is due at `now`
///
/// The first tick always broadcasts so a freshly started service is
/// discoverable immediately.
fn hello_due(last: Option<Instant>, now: Instant, interval: Duration) -> bool {
    match last {
        None => true,
        Some(t) => now.duration_since(t) >= interval,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::core::provider::{EventSink, SensorProvider};
    use crate::core::types::SensorInfo;
    use crate::transport::MockTransport;
    use std::sync::Mutex;

    /// Everything a scripted provider was asked to do
    #[derive(Debug, Default)]
    pub(crate) struct ProviderLog {
        pub subscribed: Vec<(usize, u8)>,
        pub unsubscribed: Vec<usize>,
        pub unsubscribe_all_calls: usize,
    }

    /// Provider with a fixed sensor list and inspectable call log
    pub(crate) struct ScriptedProvider {
        infos: Vec<SensorInfo>,
        refuse_subscribe: bool,
        pub log: Arc<Mutex<ProviderLog>>,
    }

    impl ScriptedProvider {
        pub fn new(infos: Vec<SensorInfo>) -> Self {
            Self {
                infos,
                refuse_subscribe: false,
                log: Arc::new(Mutex::new(ProviderLog::default())),
            }
        }

        pub fn refusing(infos: Vec<SensorInfo>) -> Self {
            Self {
                refuse_subscribe: true,
                ..Self::new(infos)
            }
        }
    }

    impl SensorProvider for ScriptedProvider {
        fn enumerate(&mut self) -> Result<Vec<SensorInfo>> {
            Ok(self.infos.clone())
        }

        fn set_sink(&mut self, _sink: Arc<dyn EventSink>) {}

        fn subscribe(&mut self, handle: usize, rate: u8) -> bool {
            self.log.lock().unwrap().subscribed.push((handle, rate));
            !self.refuse_subscribe
        }

        fn unsubscribe(&mut self, handle: usize) {
            self.log.lock().unwrap().unsubscribed.push(handle);
        }

        fn unsubscribe_all(&mut self) {
            self.log.lock().unwrap().unsubscribe_all_calls += 1;
        }
    }

    /// Two streaming sensors plus a one-shot, enough for every scenario
    pub(crate) fn standard_sensors() -> Vec<SensorInfo> {
        vec![
            SensorInfo::streaming(1, "accelerometer"),
            SensorInfo::streaming(4, "gyroscope"),
            SensorInfo::one_shot(17, "significant motion"),
        ]
    }

    /// Service over a mock transport with a scripted provider
    pub(crate) fn mock_service(
        password: &str,
    ) -> (SensorService, MockTransport, Arc<Mutex<ProviderLog>>) {
        let mut config = Config::default();
        config.network.password = password.to_string();
        let transport = MockTransport::new();
        let provider = ScriptedProvider::new(standard_sensors());
        let log = provider.log.clone();
        let service =
            SensorService::new(&config, Box::new(transport.clone()), Box::new(provider)).unwrap();
        (service, transport, log)
    }

    /// Encode a request the way a client would
    pub(crate) fn client_bytes(request: &crate::protocol::Request) -> Vec<u8> {
        let mut buf = PacketBuffer::new();
        request.encode_into(&mut buf);
        buf.as_bytes().to_vec()
    }
}
