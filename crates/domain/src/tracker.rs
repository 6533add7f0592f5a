//! Last-known device state, used to spot changes made between cycles.

use std::collections::HashMap;

use crate::device::{Device, DeviceKind};
use crate::history::HistoryEntry;
use crate::id::DeviceId;
use crate::threshold::Thresholds;

/// Remembers every device as it looked after the last successful cycle.
#[derive(Debug, Clone, Default)]
pub struct ChangeTracker {
    known: HashMap<DeviceId, Device>,
}

impl ChangeTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Activity entries for every device whose `last_event_at` moved.
    ///
    /// Devices seen for the first time produce nothing. A sensor that
    /// crossed a threshold reports the first crossing in its direction of
    /// travel; anything else echoes the device's last event.
    #[must_use]
    pub fn detect(&self, devices: &[Device], thresholds: &Thresholds) -> Vec<HistoryEntry> {
        devices
            .iter()
            .filter_map(|device| {
                let previous = self.known.get(&device.id)?;
                if previous.last_event_at == device.last_event_at {
                    return None;
                }
                let crossing = match device.kind {
                    DeviceKind::Sensor => thresholds.first_crossing(previous.level, device.level),
                    DeviceKind::Actuator => None,
                };
                Some(match crossing {
                    Some(crossing) => crossing.to_entry(&device.name, device.last_event_at),
                    None => HistoryEntry::new(
                        device.name.clone(),
                        device.last_event.clone(),
                        device.value_label(),
                        device.last_event_at,
                    ),
                })
            })
            .collect()
    }

    /// Replace the remembered state with `devices`.
    pub fn remember(&mut self, devices: &[Device]) {
        self.known = devices
            .iter()
            .map(|device| (device.id.clone(), device.clone()))
            .collect();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.known.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}
