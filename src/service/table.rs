//! Sensor descriptor table and subscription state

use crate::core::provider::SensorProvider;
use crate::core::types::SensorInfo;
use crate::error::Result;
use crate::protocol::SensorEntry;

/// Most sensors one service instance can expose; bounded by the u8
/// count in the enumerate response
pub const MAX_SENSORS: usize = 255;

/// One sensor as the wire sees it, plus live subscription state
#[derive(Debug, Clone)]
pub struct SensorDescriptor {
    /// Wire identifier; equals the provider's enumeration index
    pub uid: u8,
    /// Platform sensor type code
    pub kind: u8,
    pub name: String,
    pub one_shot: bool,
    /// True while the provider is subscribed for this sensor
    pub enabled: bool,
    /// Rate code of the active subscription
    pub rate: u8,
}

/// Fixed table of descriptors built once from provider enumeration
///
/// uids are assigned contiguously from 0 in enumeration order, so a
/// uid doubles as both the table index and the provider handle. The
/// table never changes size after construction; only the `enabled`
/// and `rate` fields move.
pub struct SensorTable {
    sensors: Vec<SensorDescriptor>,
}

impl SensorTable {
    /// Enumerate the provider and build the descriptor table
    pub fn from_provider(provider: &mut dyn SensorProvider) -> Result<Self> {
        let infos = provider.enumerate()?;
        if infos.len() > MAX_SENSORS {
            log::warn!(
                "Provider reports {} sensors, exposing first {}",
                infos.len(),
                MAX_SENSORS
            );
        }

        let sensors: Vec<SensorDescriptor> = infos
            .into_iter()
            .take(MAX_SENSORS)
            .enumerate()
            .map(|(i, info)| Self::descriptor_from_info(i as u8, info))
            .collect();

        for s in &sensors {
            log::debug!(
                "Sensor {}: {} (kind {}{})",
                s.uid,
                s.name,
                s.kind,
                if s.one_shot { ", one-shot" } else { "" }
            );
        }
        Ok(Self { sensors })
    }

    fn descriptor_from_info(uid: u8, info: SensorInfo) -> SensorDescriptor {
        SensorDescriptor {
            uid,
            kind: info.kind,
            name: info.name,
            one_shot: info.one_shot,
            enabled: false,
            rate: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn get(&self, uid: u8) -> Option<&SensorDescriptor> {
        self.sensors.get(uid as usize)
    }

    /// Look up by provider handle (same index space as uid)
    pub fn by_handle(&self, handle: usize) -> Option<&SensorDescriptor> {
        self.sensors.get(handle)
    }

    pub fn any_enabled(&self) -> bool {
        self.sensors.iter().any(|s| s.enabled)
    }

    /// Rows for the enumerate response
    pub fn entries(&self) -> Vec<SensorEntry> {
        self.sensors
            .iter()
            .map(|s| SensorEntry {
                uid: s.uid,
                kind: s.kind,
                name: s.name.clone(),
            })
            .collect()
    }

    /// Apply an enable or disable request to one sensor
    ///
    /// Returns the resulting enabled state, which is what the ack
    /// reports: enabling answers true only when the subscription took,
    /// and disabling answers false. Stock clients rely on reading the
    /// ack that way. A request matching the current state is a no-op
    /// that reports the state unchanged.
    pub fn set_enabled(
        &mut self,
        provider: &mut dyn SensorProvider,
        uid: u8,
        enabled: bool,
        rate: u8,
    ) -> bool {
        let Some(slot) = self.sensors.get_mut(uid as usize) else {
            log::warn!("Enable request for unknown sensor uid {}", uid);
            return false;
        };

        if slot.enabled != enabled {
            if slot.enabled {
                provider.unsubscribe(slot.uid as usize);
                slot.enabled = false;
                slot.rate = 0;
                log::info!("Sensor {} ({}) disabled", slot.uid, slot.name);
            } else {
                slot.enabled = provider.subscribe(slot.uid as usize, rate);
                if slot.enabled {
                    slot.rate = rate;
                    log::info!("Sensor {} ({}) enabled at rate {}", slot.uid, slot.name, rate);
                } else {
                    log::warn!("Provider refused subscription for sensor {} ({})", slot.uid, slot.name);
                }
            }
        }
        slot.enabled
    }

    /// Disable every sensor
    pub fn disable_all(&mut self, provider: &mut dyn SensorProvider) {
        provider.unsubscribe_all();
        let mut count = 0;
        for slot in &mut self.sensors {
            if slot.enabled {
                count += 1;
            }
            slot.enabled = false;
            slot.rate = 0;
        }
        if count > 0 {
            log::info!("Disabled {} sensor(s)", count);
        }
    }
}
