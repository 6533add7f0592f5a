//! Read model pushed to rendering surfaces after every cycle.

use serde::{Deserialize, Serialize};

use crate::device::{Device, LevelBand};
use crate::history::HistoryEntry;
use crate::roles::Role;
use crate::safety::Alert;
use crate::time::Timestamp;

/// Tank volumes in litres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TankCapacities {
    pub main_litres: u32,
    pub backup_litres: u32,
}

impl Default for TankCapacities {
    fn default() -> Self {
        Self {
            main_litres: 2000,
            backup_litres: 1000,
        }
    }
}

impl TankCapacities {
    #[must_use]
    pub fn for_role(self, role: Role) -> Option<u32> {
        match role {
            Role::MainSensor => Some(self.main_litres),
            Role::BackupSensor => Some(self.backup_litres),
            _ => None,
        }
    }
}

/// Volume figures of a tank sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TankVolume {
    pub litres: u32,
    pub capacity_litres: u32,
}

/// A device as rendered, with the figures dashboards need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceView {
    #[serde(flatten)]
    pub device: Device,
    pub value_label: String,
    pub band: Option<LevelBand>,
    pub volume: Option<TankVolume>,
}

impl DeviceView {
    #[must_use]
    pub fn new(device: Device, capacities: TankCapacities) -> Self {
        let band = device.is_sensor().then(|| device.level.band());
        let volume = capacities
            .for_role(device.role)
            .filter(|_| device.is_sensor())
            .map(|capacity_litres| TankVolume {
                litres: device.level.litres(capacity_litres),
                capacity_litres,
            });
        Self {
            value_label: device.value_label(),
            band,
            volume,
            device,
        }
    }
}

/// Everything a dashboard needs to redraw itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub devices: Vec<DeviceView>,
    /// Most recent persisted history, newest first.
    pub history: Vec<HistoryEntry>,
    /// Changes spotted locally between cycles, newest first.
    pub activity: Vec<HistoryEntry>,
    pub alerts: Vec<Alert>,
    pub generated_at: Timestamp,
    pub roles_resolved: bool,
}

impl Snapshot {
    #[must_use]
    pub fn device(&self, name: &str) -> Option<&DeviceView> {
        self.devices.iter().find(|view| view.device.name == name)
    }

    #[must_use]
    pub fn by_role(&self, role: Role) -> Option<&DeviceView> {
        self.devices.iter().find(|view| view.device.role == role)
    }
}
