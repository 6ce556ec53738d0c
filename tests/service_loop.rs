//! Integration tests for the sensor broadcast service loop.
//!
//! Each test runs the real service loop on its own thread over a mock
//! transport, with the simulated provider generating readings, and plays
//! the client side by pushing request datagrams and decoding what the
//! service sends back. Loop timings are shrunk so a whole
//! attach/stream/detach cycle fits well under a second.

use indriya_io::config::Config;
use indriya_io::protocol::wire::PacketBuffer;
use indriya_io::protocol::{opcode, Request, Response};
use indriya_io::providers::create_provider;
use indriya_io::transport::MockTransport;
use indriya_io::{SensorService, ServiceStatus};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

fn client_addr() -> SocketAddr {
    SocketAddr::from(([192, 168, 1, 50], 38000))
}

fn wait_until<F: Fn() -> bool>(cond: F, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}

/// Service loop on its own thread, stopped and joined on drop
struct Harness {
    transport: MockTransport,
    status: Arc<ServiceStatus>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Harness {
    fn start(password: &str) -> Self {
        let mut config = Config::default();
        config.network.password = password.to_string();
        // Fast cadence keeps the tests short
        config.timing.tick_ms = 2;
        config.timing.idle_ms = 2;
        config.timing.hello_ms = 25;
        config.provider.seed = 7;

        let transport = MockTransport::new();
        let provider = create_provider(&config).expect("sim provider");
        let mut service = SensorService::new(&config, Box::new(transport.clone()), provider)
            .expect("service construction");

        let status = service.status();
        let running = service.run_flag();
        let thread = thread::Builder::new()
            .name("service-loop".to_string())
            .spawn(move || {
                service.run().expect("service loop failed");
            })
            .unwrap();

        Harness {
            transport,
            status,
            running,
            thread: Some(thread),
        }
    }

    /// Push one request datagram as the client
    fn send(&self, request: &Request) {
        let mut buf = PacketBuffer::new();
        request.encode_into(&mut buf);
        self.transport.push_datagram(buf.as_bytes(), client_addr());
    }

    /// Every decodable response sent to the client so far
    fn unicast_replies(&self) -> Vec<Response> {
        self.transport
            .sent()
            .iter()
            .filter(|(_, dest)| *dest == client_addr())
            .filter_map(|(bytes, _)| Response::decode(bytes).ok().flatten())
            .collect()
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[test]
fn test_discovery_enumeration_and_ping() {
    let h = Harness::start("");

    h.send(&Request::DetectDevice);
    h.send(&Request::PingDevice);
    h.send(&Request::EnumerateSensors);

    assert!(wait_until(
        || {
            let replies = h.unicast_replies();
            replies.contains(&Response::Hello)
                && replies.contains(&Response::Pong)
                && replies.iter().any(|r| matches!(r, Response::SensorList(_)))
        },
        Duration::from_secs(2),
    ));

    let replies = h.unicast_replies();
    let list = replies
        .iter()
        .find_map(|r| match r {
            Response::SensorList(entries) => Some(entries.clone()),
            _ => None,
        })
        .unwrap();

    // The simulated provider serves six sensors; uids follow list order
    assert_eq!(list.len(), 6);
    for (i, entry) in list.iter().enumerate() {
        assert_eq!(entry.uid, i as u8);
    }
    assert!(list.iter().any(|e| e.name.contains("accelerometer")));
}

#[test]
fn test_hello_broadcast_cadence() {
    let h = Harness::start("");
    let broadcast = SocketAddr::from(([255, 255, 255, 255], 9999));

    // 25ms interval: several beacons arrive well inside the timeout
    assert!(wait_until(
        || {
            h.transport
                .sent()
                .iter()
                .filter(|(bytes, dest)| {
                    *dest == broadcast && bytes.first() == Some(&opcode::HELLO)
                })
                .count()
                >= 4
        },
        Duration::from_secs(2),
    ));
}

#[test]
fn test_enable_stream_disable_flow() {
    let h = Harness::start("");

    h.send(&Request::EnableSensor {
        password: String::new(),
        uid: 0,
        enabled: true,
        rate: 0,
    });

    assert!(wait_until(
        || h.unicast_replies()
            .contains(&Response::EnableAck { success: true, uid: 0 }),
        Duration::from_secs(2),
    ));
    assert_eq!(h.status.client_addr(), Some(client_addr()));

    // Accelerometer readings stream at the subscribed cadence
    assert!(wait_until(
        || {
            h.unicast_replies()
                .iter()
                .filter(|r| matches!(r, Response::SensorEvent { uid: 0, .. }))
                .count()
                >= 5
        },
        Duration::from_secs(2),
    ));

    let events: Vec<(i64, usize)> = h
        .unicast_replies()
        .iter()
        .filter_map(|r| match r {
            Response::SensorEvent {
                uid: 0,
                timestamp,
                values,
            } => Some((*timestamp, values.len())),
            _ => None,
        })
        .collect();
    assert!(events.iter().all(|(_, n)| *n == 3));
    // Production order survives batching and flushing
    assert!(events.windows(2).all(|w| w[0].0 <= w[1].0));

    assert!(h.status.packets_sent() >= 5);
    assert!(h.status.bytes_sent() > 0);

    h.send(&Request::DisableAllSensors {
        password: String::new(),
    });
    assert!(wait_until(
        || h.unicast_replies()
            .contains(&Response::DisableAllAck { success: true }),
        Duration::from_secs(2),
    ));
    assert_eq!(h.status.client_addr(), None);

    // Stream is fully stopped once the ack is out
    h.transport.take_sent();
    thread::sleep(Duration::from_millis(100));
    assert!(h
        .transport
        .take_sent()
        .iter()
        .all(|(bytes, _)| bytes.first() != Some(&opcode::SENSOR_EVENT)));
}

#[test]
fn test_wrong_password_is_refused() {
    let h = Harness::start("sesame");

    h.send(&Request::EnableSensor {
        password: "wrong".to_string(),
        uid: 0,
        enabled: true,
        rate: 0,
    });
    assert!(wait_until(
        || h.unicast_replies()
            .contains(&Response::EnableAck { success: false, uid: 0 }),
        Duration::from_secs(2),
    ));
    assert_eq!(h.status.client_addr(), None);

    // The right password attaches as usual
    h.send(&Request::EnableSensor {
        password: "sesame".to_string(),
        uid: 1,
        enabled: true,
        rate: 0,
    });
    assert!(wait_until(
        || h.unicast_replies()
            .contains(&Response::EnableAck { success: true, uid: 1 }),
        Duration::from_secs(2),
    ));
    assert_eq!(h.status.client_addr(), Some(client_addr()));
}

#[test]
fn test_send_failure_recovery() {
    let h = Harness::start("");

    h.send(&Request::EnableSensor {
        password: String::new(),
        uid: 0,
        enabled: true,
        rate: 0,
    });
    assert!(wait_until(
        || h.status.client_addr().is_some(),
        Duration::from_secs(2)
    ));
    assert!(wait_until(
        || h.status.packets_sent() > 0,
        Duration::from_secs(2)
    ));

    // Break the link; the next flush detaches and disables everything
    h.transport.set_fail_sends(true);
    assert!(wait_until(
        || h.status.client_addr().is_none(),
        Duration::from_secs(2)
    ));

    // The loop is still alive and answers discovery
    h.transport.set_fail_sends(false);
    h.transport.take_sent();
    h.send(&Request::DetectDevice);
    assert!(wait_until(
        || h.unicast_replies().contains(&Response::Hello),
        Duration::from_secs(2),
    ));
}
