//! Functional roles and the device classifier.
//!
//! The control cycle needs exactly one device in each of four positions:
//! main pump, backup pump, main sensor, backup sensor. Roles are tagged on
//! the device when it is registered; name inference only covers records
//! created before the tag existed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::device::{Device, DeviceKind};
use crate::error::{RoleUnresolved, ValidationError};

/// Functional position a device occupies in the installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    MainPump,
    BackupPump,
    MainSensor,
    BackupSensor,
    #[default]
    Other,
}

const BACKUP_MARKERS: [&str; 2] = ["respaldo", "backup"];
const MAIN_MARKER: &str = "principal";
/// Matched as a whole word only, so "Remaining" stays unassigned.
const MAIN_WORD: &str = "main";

impl Role {
    /// The four positions the control cycle needs filled.
    pub const FUNCTIONAL: [Self; 4] = [
        Self::MainPump,
        Self::BackupPump,
        Self::MainSensor,
        Self::BackupSensor,
    ];

    /// Infer the role of an untagged record from its name.
    ///
    /// Pumps: a name mentioning "respaldo"/"backup" is the backup pump, any
    /// other pump is the main one. Sensors: "principal" or the word "main" is
    /// the main sensor, "respaldo"/"backup" the backup one, anything else
    /// `Other`.
    #[must_use]
    pub fn infer(kind: DeviceKind, name: &str) -> Self {
        let name = name.to_lowercase();
        let is_backup = BACKUP_MARKERS.iter().any(|m| name.contains(m));
        match kind {
            DeviceKind::Actuator if is_backup => Self::BackupPump,
            DeviceKind::Actuator => Self::MainPump,
            DeviceKind::Sensor if is_main_sensor_name(&name) => Self::MainSensor,
            DeviceKind::Sensor if is_backup => Self::BackupSensor,
            DeviceKind::Sensor => Self::Other,
        }
    }

    /// The device kind this role requires, if any.
    #[must_use]
    pub fn kind(self) -> Option<DeviceKind> {
        match self {
            Self::MainPump | Self::BackupPump => Some(DeviceKind::Actuator),
            Self::MainSensor | Self::BackupSensor => Some(DeviceKind::Sensor),
            Self::Other => None,
        }
    }

    /// Check the role can be held by a device of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::RoleKindMismatch`] when it cannot.
    pub fn check_kind(self, kind: DeviceKind) -> Result<(), ValidationError> {
        match self.kind() {
            Some(required) if required != kind => Err(ValidationError::RoleKindMismatch {
                role: self,
                kind: kind.as_str(),
            }),
            _ => Ok(()),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MainPump => "main_pump",
            Self::BackupPump => "backup_pump",
            Self::MainSensor => "main_sensor",
            Self::BackupSensor => "backup_sensor",
            Self::Other => "other",
        }
    }
}

fn is_main_sensor_name(name: &str) -> bool {
    name.contains(MAIN_MARKER)
        || name
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == MAIN_WORD)
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "main_pump" => Ok(Self::MainPump),
            "backup_pump" => Ok(Self::BackupPump),
            "main_sensor" => Ok(Self::MainSensor),
            "backup_sensor" => Ok(Self::BackupSensor),
            "other" | "" => Ok(Self::Other),
            other => Err(ValidationError::UnknownRole(other.to_string())),
        }
    }
}

/// Result of classifying a device collection: each role filled by at most
/// one device.
#[derive(Debug, Clone, Default)]
pub struct RoleAssignment<'a> {
    pub main_pump: Option<&'a Device>,
    pub backup_pump: Option<&'a Device>,
    pub main_sensor: Option<&'a Device>,
    pub backup_sensor: Option<&'a Device>,
}

impl<'a> RoleAssignment<'a> {
    /// Classify devices by role.
    ///
    /// A role claimed by more than one device is ambiguous and left empty.
    #[must_use]
    pub fn classify(devices: &'a [Device]) -> Self {
        let pick = |role: Role| {
            let mut matching = devices.iter().filter(|d| d.role == role);
            match (matching.next(), matching.next()) {
                (Some(device), None) => Some(device),
                _ => None,
            }
        };
        Self {
            main_pump: pick(Role::MainPump),
            backup_pump: pick(Role::BackupPump),
            main_sensor: pick(Role::MainSensor),
            backup_sensor: pick(Role::BackupSensor),
        }
    }

    /// Roles left empty after classification.
    #[must_use]
    pub fn missing(&self) -> Vec<Role> {
        Role::FUNCTIONAL
            .into_iter()
            .filter(|role| self.get(*role).is_none())
            .collect()
    }

    #[must_use]
    pub fn get(&self, role: Role) -> Option<&'a Device> {
        match role {
            Role::MainPump => self.main_pump,
            Role::BackupPump => self.backup_pump,
            Role::MainSensor => self.main_sensor,
            Role::BackupSensor => self.backup_sensor,
            Role::Other => None,
        }
    }

    /// Require all four roles.
    ///
    /// # Errors
    ///
    /// Returns [`RoleUnresolved`] listing every empty role.
    pub fn resolve(self) -> Result<ResolvedRoles<'a>, RoleUnresolved> {
        match (
            self.main_pump,
            self.backup_pump,
            self.main_sensor,
            self.backup_sensor,
        ) {
            (Some(main_pump), Some(backup_pump), Some(main_sensor), Some(backup_sensor)) => {
                Ok(ResolvedRoles {
                    main_pump,
                    backup_pump,
                    main_sensor,
                    backup_sensor,
                })
            }
            _ => Err(RoleUnresolved {
                missing: self.missing(),
            }),
        }
    }
}

/// All four functional devices, borrowed from a fetched collection.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedRoles<'a> {
    pub main_pump: &'a Device,
    pub backup_pump: &'a Device,
    pub main_sensor: &'a Device,
    pub backup_sensor: &'a Device,
}

impl<'a> ResolvedRoles<'a> {
    /// Classify and resolve in one step.
    ///
    /// # Errors
    ///
    /// Returns [`RoleUnresolved`] when any role is missing or ambiguous.
    pub fn from_devices(devices: &'a [Device]) -> Result<Self, RoleUnresolved> {
        RoleAssignment::classify(devices).resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Level;

    fn device(name: &str, kind: DeviceKind) -> Device {
        Device::builder().name(name).kind(kind).build().unwrap()
    }

    fn installation() -> Vec<Device> {
        vec![
            device("BombaDeAgua", DeviceKind::Actuator),
            device("BombaDeAgua Respaldo", DeviceKind::Actuator),
            device("Tinaco Principal", DeviceKind::Sensor),
            device("Tinaco Respaldo", DeviceKind::Sensor),
        ]
    }

    #[test]
    fn should_infer_pump_roles_from_names() {
        assert_eq!(
            Role::infer(DeviceKind::Actuator, "BombaDeAgua"),
            Role::MainPump
        );
        assert_eq!(
            Role::infer(DeviceKind::Actuator, "Bomba RESPALDO"),
            Role::BackupPump
        );
        assert_eq!(
            Role::infer(DeviceKind::Actuator, "Backup pump"),
            Role::BackupPump
        );
    }

    #[test]
    fn should_not_read_main_inside_other_words() {
        assert_eq!(
            Role::infer(DeviceKind::Sensor, "Remaining water"),
            Role::Other
        );
        assert_eq!(
            Role::infer(DeviceKind::Sensor, "Domain tank respaldo"),
            Role::BackupSensor
        );
    }

    #[test]
    fn should_infer_sensor_roles_from_names() {
        assert_eq!(
            Role::infer(DeviceKind::Sensor, "Nivel Tinaco PRINCIPAL"),
            Role::MainSensor
        );
        assert_eq!(
            Role::infer(DeviceKind::Sensor, "nivel respaldo"),
            Role::BackupSensor
        );
        assert_eq!(Role::infer(DeviceKind::Sensor, "Cistern"), Role::Other);
        assert_eq!(
            Role::infer(DeviceKind::Sensor, "Main tank"),
            Role::MainSensor
        );
    }

    #[test]
    fn should_resolve_all_four_roles() {
        let devices = installation();
        let roles = ResolvedRoles::from_devices(&devices).unwrap();
        assert_eq!(roles.main_pump.name, "BombaDeAgua");
        assert_eq!(roles.backup_pump.name, "BombaDeAgua Respaldo");
        assert_eq!(roles.main_sensor.name, "Tinaco Principal");
        assert_eq!(roles.backup_sensor.name, "Tinaco Respaldo");
    }

    #[test]
    fn should_leave_pumps_empty_when_no_actuators() {
        let devices: Vec<Device> = installation()
            .into_iter()
            .filter(Device::is_sensor)
            .collect();
        let assignment = RoleAssignment::classify(&devices);
        assert!(assignment.main_pump.is_none());
        assert!(assignment.backup_pump.is_none());
        assert_eq!(assignment.missing(), vec![Role::MainPump, Role::BackupPump]);

        let err = assignment.resolve().unwrap_err();
        assert_eq!(err.missing, vec![Role::MainPump, Role::BackupPump]);
    }

    #[test]
    fn should_treat_duplicate_role_as_unresolved() {
        let mut devices = installation();
        devices.push(
            Device::builder()
                .name("Second main tank")
                .role(Role::MainSensor)
                .level(Level::new(10))
                .build()
                .unwrap(),
        );
        let assignment = RoleAssignment::classify(&devices);
        assert!(assignment.main_sensor.is_none());
        assert!(assignment.backup_sensor.is_some());
    }

    #[test]
    fn should_prefer_explicit_role_over_name() {
        let devices = vec![
            Device::builder()
                .name("Pump A")
                .role(Role::BackupPump)
                .build()
                .unwrap(),
            Device::builder()
                .name("Pump B respaldo")
                .role(Role::MainPump)
                .build()
                .unwrap(),
        ];
        let assignment = RoleAssignment::classify(&devices);
        assert_eq!(assignment.backup_pump.unwrap().name, "Pump A");
        assert_eq!(assignment.main_pump.unwrap().name, "Pump B respaldo");
    }

    #[test]
    fn should_parse_role_from_snake_case() {
        assert_eq!("main_pump".parse::<Role>().unwrap(), Role::MainPump);
        assert_eq!("".parse::<Role>().unwrap(), Role::Other);
        assert!("boiler".parse::<Role>().is_err());
    }
}
