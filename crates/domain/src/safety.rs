//! Alerts and the protective pump interlock.
//!
//! Alerts are recomputed from scratch on every cycle. The interlock forces
//! the main pump off whenever it would run the backup tank dry; the
//! supervisor remembers that it already fired so the shutoff is only logged
//! once per unsafe episode.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::device::Level;
use crate::id::DeviceId;
use crate::roles::ResolvedRoles;

pub const EVENT_SAFETY_SHUTOFF: &str = "Safety Shutoff";

/// Alert severity, ordered as dashboards style them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Info,
    Danger,
    Success,
}

impl Severity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Danger => "danger",
            Self::Success => "success",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transient message shown next to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub severity: Severity,
    pub message: String,
}

impl Alert {
    fn new(severity: Severity, message: &str) -> Self {
        Self {
            severity,
            message: message.to_string(),
        }
    }
}

pub const MSG_LOW_CAPACITY: &str = "Low capacity in main tank";
pub const MSG_MAIN_FULL: &str = "Main tank full";
pub const MSG_BACKUP_EMPTY: &str = "Backup tank empty: main pump shut off for protection";
pub const MSG_BACKUP_FULL: &str = "Backup tank full";

/// Alert boundaries. All comparisons are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyLimits {
    /// Main tank at or below this raises a warning.
    pub low_capacity: u8,
    /// Main tank at or above this is reported full.
    pub main_full: u8,
    /// Backup tank at or above this is reported full.
    pub backup_full: u8,
    /// Backup tank at or below this trips the interlock.
    pub backup_empty: u8,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            low_capacity: 25,
            main_full: 95,
            backup_full: 95,
            backup_empty: 0,
        }
    }
}

/// Pump write requested by the interlock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shutoff {
    pub pump: DeviceId,
    pub pump_name: String,
    /// `true` the first tick of an unsafe episode: append the history entry.
    pub log: bool,
}

/// Outcome of one supervision pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafetyReport {
    pub alerts: Vec<Alert>,
    pub shutoff: Option<Shutoff>,
}

/// Alert rules plus the shutoff latch.
#[derive(Debug, Clone, Default)]
pub struct SafetySupervisor {
    limits: SafetyLimits,
    latched: bool,
}

impl SafetySupervisor {
    #[must_use]
    pub fn new(limits: SafetyLimits) -> Self {
        Self {
            limits,
            latched: false,
        }
    }

    #[must_use]
    pub fn limits(&self) -> SafetyLimits {
        self.limits
    }

    /// Whether an unsafe episode is currently latched.
    #[must_use]
    pub fn is_latched(&self) -> bool {
        self.latched
    }

    /// Forget the current episode, so the next unsafe pass logs again.
    ///
    /// Used when the shutoff could not be written.
    pub fn release(&mut self) {
        self.latched = false;
    }

    /// Evaluate every rule in order against the current levels.
    pub fn evaluate(&mut self, roles: &ResolvedRoles<'_>) -> SafetyReport {
        let limits = self.limits;
        let main = roles.main_sensor.level;
        let backup = roles.backup_sensor.level;
        let mut report = SafetyReport::default();

        if main <= Level::new(limits.low_capacity.into()) {
            report.alerts.push(Alert::new(Severity::Warning, MSG_LOW_CAPACITY));
        }
        if main >= Level::new(limits.main_full.into()) {
            report.alerts.push(Alert::new(Severity::Info, MSG_MAIN_FULL));
        }

        let unsafe_now = roles.main_pump.state && backup <= Level::new(limits.backup_empty.into());
        if unsafe_now {
            report.alerts.push(Alert::new(Severity::Danger, MSG_BACKUP_EMPTY));
            report.shutoff = Some(Shutoff {
                pump: roles.main_pump.id.clone(),
                pump_name: roles.main_pump.name.clone(),
                log: !self.latched,
            });
        }
        self.latched = unsafe_now;

        if backup >= Level::new(limits.backup_full.into()) {
            report.alerts.push(Alert::new(Severity::Success, MSG_BACKUP_FULL));
        }

        report
    }
}
