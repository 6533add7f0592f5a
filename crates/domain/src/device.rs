//! Device: a pump or a level sensor living in the device store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MalformedDevice, TwinTankError, ValidationError};
use crate::id::DeviceId;
use crate::roles::Role;
use crate::time::Timestamp;

/// Fill percentage of a tank, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Level(u8);

impl Level {
    pub const EMPTY: Self = Self(0);
    pub const FULL: Self = Self(100);

    /// Build a level from any integer, clamping into `0..=100`.
    #[must_use]
    pub fn new(value: i64) -> Self {
        // Clamped first, so the narrowing cast cannot truncate.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Self(value.clamp(0, 100) as u8)
    }

    #[must_use]
    pub fn percent(self) -> u8 {
        self.0
    }

    /// Add a signed delta, clamping the result.
    #[must_use]
    pub fn shifted(self, delta: i64) -> Self {
        Self::new(i64::from(self.0).saturating_add(delta))
    }

    #[must_use]
    pub fn is_full(self) -> bool {
        self == Self::FULL
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }

    /// Colour band used by dashboards.
    #[must_use]
    pub fn band(self) -> LevelBand {
        match self.0 {
            0..25 => LevelBand::Critical,
            25..50 => LevelBand::Low,
            _ => LevelBand::Normal,
        }
    }

    /// Volume held by a tank of `capacity_litres` at this level.
    #[must_use]
    pub fn litres(self, capacity_litres: u32) -> u32 {
        let litres = (u64::from(self.0) * u64::from(capacity_litres) + 50) / 100;
        u32::try_from(litres).unwrap_or(capacity_litres)
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Self::new)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Coarse classification of a [`Level`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelBand {
    Critical,
    Low,
    Normal,
}

/// What a store record is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Actuator,
    Sensor,
}

impl DeviceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Actuator => "actuator",
            Self::Sensor => "sensor",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind column of a raw store record, which also covers history rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Device(DeviceKind),
    Log,
}

impl FromStr for RecordKind {
    type Err = MalformedDevice;

    /// Case-insensitive; accepts the Spanish spelling used by older stores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "actuator" | "actuador" => Ok(Self::Device(DeviceKind::Actuator)),
            "sensor" => Ok(Self::Device(DeviceKind::Sensor)),
            "log" => Ok(Self::Log),
            _ => Err(MalformedDevice::UnknownKind {
                id: String::new(),
                kind: s.to_string(),
            }),
        }
    }
}

/// A pump or a level sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub kind: DeviceKind,
    pub role: Role,
    /// On/off for actuators; always `false` for sensors.
    pub state: bool,
    /// Fill level for sensors; always empty for actuators.
    pub level: Level,
    pub last_event_at: Timestamp,
    pub last_event: String,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    #[must_use]
    pub fn is_actuator(&self) -> bool {
        self.kind == DeviceKind::Actuator
    }

    #[must_use]
    pub fn is_sensor(&self) -> bool {
        self.kind == DeviceKind::Sensor
    }

    /// Short human readable value: `On`/`Off` for pumps, `NN%` for sensors.
    #[must_use]
    pub fn value_label(&self) -> String {
        match self.kind {
            DeviceKind::Actuator => on_off_label(self.state).to_string(),
            DeviceKind::Sensor => self.level.to_string(),
        }
    }

    /// Ensure the device is a pump.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotAnActuator`] otherwise.
    pub fn expect_actuator(&self) -> Result<(), ValidationError> {
        if self.is_actuator() {
            Ok(())
        } else {
            Err(ValidationError::NotAnActuator {
                name: self.name.clone(),
            })
        }
    }

    /// Ensure the device is a level sensor.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotASensor`] otherwise.
    pub fn expect_sensor(&self) -> Result<(), ValidationError> {
        if self.is_sensor() {
            Ok(())
        } else {
            Err(ValidationError::NotASensor {
                name: self.name.clone(),
            })
        }
    }

    /// Ensure the device is the sensor of the main tank.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotASensor`] for a pump and
    /// [`ValidationError::NotTheMainSensor`] for any other sensor.
    pub fn expect_main_sensor(&self) -> Result<(), ValidationError> {
        self.expect_sensor()?;
        if self.role == Role::MainSensor {
            Ok(())
        } else {
            Err(ValidationError::NotTheMainSensor {
                name: self.name.clone(),
            })
        }
    }

    /// Apply a partial update in place, as the store would.
    pub fn apply(&mut self, patch: &DevicePatch) {
        if let Some(state) = patch.state {
            self.state = state;
        }
        if let Some(level) = patch.level {
            self.level = level;
        }
        if let Some(at) = patch.last_event_at {
            self.last_event_at = at;
        }
        if let Some(event) = &patch.last_event {
            self.last_event.clone_from(event);
        }
    }
}

/// Event text stamped on freshly registered devices.
pub const EVENT_DEVICE_CREATED: &str = "Device created";

/// `On` / `Off` label used in event values.
#[must_use]
pub fn on_off_label(state: bool) -> &'static str {
    if state { "On" } else { "Off" }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    name: Option<String>,
    kind: Option<DeviceKind>,
    role: Option<Role>,
    state: bool,
    level: Level,
    last_event_at: Option<Timestamp>,
    last_event: Option<String>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<DeviceId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: DeviceKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    #[must_use]
    pub fn state(mut self, state: bool) -> Self {
        self.state = state;
        self
    }

    #[must_use]
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn last_event_at(mut self, at: Timestamp) -> Self {
        self.last_event_at = Some(at);
        self
    }

    #[must_use]
    pub fn last_event(mut self, event: impl Into<String>) -> Self {
        self.last_event = Some(event.into());
        self
    }

    /// Consume the builder and return a [`Device`].
    ///
    /// A missing kind is derived from the role; a missing role is inferred
    /// from the name.
    ///
    /// # Errors
    ///
    /// Returns [`TwinTankError::Validation`] if the name is empty, and
    /// [`TwinTankError::MalformedDevice`] if neither kind nor a typed role
    /// was given.
    pub fn build(self) -> Result<Device, TwinTankError> {
        let name = self.name.unwrap_or_default();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        let id = self.id.unwrap_or_else(DeviceId::random);
        let kind = match (self.kind, self.role.and_then(Role::kind)) {
            (Some(kind), _) | (None, Some(kind)) => kind,
            (None, None) => {
                return Err(MalformedDevice::MissingKind {
                    id: id.to_string(),
                }
                .into());
            }
        };
        let role = self.role.unwrap_or_else(|| Role::infer(kind, &name));
        role.check_kind(kind)?;

        Ok(Device {
            id,
            name,
            kind,
            role,
            state: kind == DeviceKind::Actuator && self.state,
            level: if kind == DeviceKind::Sensor {
                self.level
            } else {
                Level::EMPTY
            },
            last_event_at: self.last_event_at.unwrap_or_else(crate::time::now),
            last_event: self.last_event.unwrap_or_default(),
        })
    }
}

/// A device about to be registered in the store (no id yet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDevice {
    pub name: String,
    pub kind: DeviceKind,
    pub role: Role,
}

impl NewDevice {
    /// Prepare a registration, inferring the role from the name when none is given.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] on an empty name or a role that does not
    /// fit the kind.
    pub fn new(
        name: impl Into<String>,
        kind: DeviceKind,
        role: Option<Role>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let role = role.unwrap_or_else(|| Role::infer(kind, &name));
        let device = Self { name, kind, role };
        device.validate()?;
        Ok(device)
    }

    /// Check the name is set and the role fits the kind.
    ///
    /// # Errors
    ///
    /// Returns the first violated [`ValidationError`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        self.role.check_kind(self.kind)
    }
}

/// Partial update of a device; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DevicePatch {
    pub state: Option<bool>,
    pub level: Option<Level>,
    pub last_event_at: Option<Timestamp>,
    pub last_event: Option<String>,
}

impl DevicePatch {
    /// Patch a pump state, stamping the event.
    #[must_use]
    pub fn state(state: bool, event: impl Into<String>, at: Timestamp) -> Self {
        Self {
            state: Some(state),
            level: None,
            last_event_at: Some(at),
            last_event: Some(event.into()),
        }
    }

    /// Patch a sensor level, stamping the event.
    #[must_use]
    pub fn level(level: Level, event: impl Into<String>, at: Timestamp) -> Self {
        Self {
            state: None,
            level: Some(level),
            last_event_at: Some(at),
            last_event: Some(event.into()),
        }
    }
}
