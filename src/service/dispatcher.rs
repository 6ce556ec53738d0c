//! Request dispatch: decode, authorize, act, acknowledge

use super::SensorService;
use crate::error::Result;
use crate::protocol::{Request, Response};
use std::net::SocketAddr;

impl SensorService {
    /// Decode and handle one inbound datagram
    ///
    /// Malformed datagrams and unknown opcodes are dropped without a
    /// response; a stray packet must never disturb the running stream.
    /// Transport failures while answering propagate to the tick so the
    /// loop can degrade the session.
    pub(crate) fn handle_datagram(&mut self, datagram: &[u8], src: SocketAddr) -> Result<()> {
        let request = match Request::decode(datagram) {
            Ok(Some(request)) => request,
            Ok(None) => {
                log::trace!("Ignoring opcode {:#04x} from {}", datagram[0], src);
                return Ok(());
            }
            Err(e) => {
                if log::log_enabled!(log::Level::Debug) {
                    let preview: String = datagram
                        .iter()
                        .take(16)
                        .map(|b| format!("{:02X} ", b))
                        .collect();
                    log::debug!(
                        "Dropping malformed datagram from {} ({}): {}",
                        src,
                        e,
                        preview.trim_end()
                    );
                }
                return Ok(());
            }
        };

        log::debug!("Handling {:#04x} from {}", datagram[0], src);
        match request {
            Request::DetectDevice => self.send_response(&Response::Hello, src),
            Request::PingDevice => self.send_response(&Response::Pong, src),
            Request::EnumerateSensors => {
                let entries = self.table.entries();
                self.send_response(&Response::SensorList(entries), src)
            }
            Request::EnableSensor {
                password,
                uid,
                enabled,
                rate,
            } => self.handle_enable_sensor(src, &password, uid, enabled, rate),
            Request::DisableAllSensors { password } => self.handle_disable_all(src, &password),
        }
    }

    /// Enable or disable one sensor and ack with the resulting state
    ///
    /// Under a valid password the requester takes the streaming slot
    /// whenever the request succeeded or any sensor remains enabled;
    /// otherwise the slot is vacated. An unauthorized request changes
    /// nothing and acks failure.
    fn handle_enable_sensor(
        &mut self,
        src: SocketAddr,
        password: &str,
        uid: u8,
        enabled: bool,
        rate: u8,
    ) -> Result<()> {
        let mut success = false;
        if self.authorized(password) {
            success = self
                .table
                .set_enabled(self.provider.as_mut(), uid, enabled, rate);
            if success || self.table.any_enabled() {
                self.session.attach(src);
            } else {
                self.session.detach();
            }
        } else {
            log::debug!("Rejected enable request from {}: wrong password", src);
        }
        self.send_response(&Response::EnableAck { success, uid }, src)
    }

    /// Disable everything, vacate the session, ack success
    fn handle_disable_all(&mut self, src: SocketAddr, password: &str) -> Result<()> {
        let mut success = false;
        if self.authorized(password) {
            self.disable_all_sensors();
            self.session.detach();
            success = true;
        } else {
            log::debug!("Rejected disable-all request from {}: wrong password", src);
        }
        self.send_response(&Response::DisableAllAck { success }, src)
    }

    /// An empty configured password authorizes every request
    fn authorized(&self, password: &str) -> bool {
        self.password.is_empty() || password == self.password
    }

    fn send_response(&mut self, response: &Response, dest: SocketAddr) -> Result<()> {
        response.encode_into(&mut self.scratch);
        self.transport.send_to(self.scratch.as_bytes(), dest)?;
        Ok(())
    }
}
