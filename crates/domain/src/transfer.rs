//! Water transfer physics for one tick.

use serde::{Deserialize, Serialize};

use crate::device::Level;
use crate::id::DeviceId;
use crate::roles::ResolvedRoles;

pub const EVENT_RECEIVING: &str = "Receiving water...";
pub const EVENT_TRANSFERRING: &str = "Transferring water...";
pub const EVENT_FILLING: &str = "Filling...";
pub const EVENT_CONSUMPTION: &str = "Simulated consumption";

/// Per-tick level deltas, in percentage points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferRates {
    /// Added to the main tank while the main pump runs.
    pub main_inflow: u8,
    /// Drawn from the backup tank while the main pump runs.
    pub backup_outflow: u8,
    /// Added to the backup tank while the backup pump runs.
    pub backup_fill: u8,
    /// Drawn from the main tank by a manual consumption.
    pub consumption_step: u8,
}

impl Default for TransferRates {
    fn default() -> Self {
        Self {
            main_inflow: 5,
            backup_outflow: 10,
            backup_fill: 10,
            consumption_step: 5,
        }
    }
}

/// A sensor level write planned for this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelChange {
    pub device: DeviceId,
    pub device_name: String,
    pub before: Level,
    pub after: Level,
    pub event: &'static str,
}

/// Sensor writes for one tick. At most one change per sensor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferPlan {
    pub main: Option<LevelChange>,
    pub backup: Option<LevelChange>,
}

impl TransferPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.main.is_none() && self.backup.is_none()
    }

    pub fn changes(&self) -> impl Iterator<Item = &LevelChange> {
        self.main.iter().chain(self.backup.iter())
    }
}

/// Compute the sensor writes for one tick.
///
/// Both rules read the levels as they were before the tick; when both touch
/// the backup tank their effects are folded into a single change.
#[must_use]
pub fn simulate(roles: &ResolvedRoles<'_>, rates: TransferRates) -> TransferPlan {
    let main = roles.main_sensor;
    let backup = roles.backup_sensor;

    let transferring = roles.main_pump.state && !main.level.is_full() && !backup.level.is_empty();
    let filling = roles.backup_pump.state && !backup.level.is_full();

    let mut plan = TransferPlan::default();

    if transferring {
        plan.main = Some(LevelChange {
            device: main.id.clone(),
            device_name: main.name.clone(),
            before: main.level,
            after: main.level.shifted(i64::from(rates.main_inflow)),
            event: EVENT_RECEIVING,
        });
    }

    let mut backup_level = backup.level;
    let mut backup_event = None;
    if transferring {
        backup_level = backup_level.shifted(-i64::from(rates.backup_outflow));
        backup_event = Some(EVENT_TRANSFERRING);
    }
    if filling {
        backup_level = backup_level.shifted(i64::from(rates.backup_fill));
        backup_event = Some(EVENT_FILLING);
    }
    if let Some(event) = backup_event {
        plan.backup = Some(LevelChange {
            device: backup.id.clone(),
            device_name: backup.name.clone(),
            before: backup.level,
            after: backup_level,
            event,
        });
    }

    plan
}
