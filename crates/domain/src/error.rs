//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`TwinTankError`] via `#[from]`.

use crate::roles::Role;

/// Top-level error shared by every crate in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum TwinTankError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The device store could not be reached, answered with a non-2xx
    /// status, returned an undecodable body, or timed out.
    #[error("device store unavailable")]
    StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("functional roles unresolved")]
    RoleUnresolved(#[from] RoleUnresolved),

    #[error("malformed device record")]
    MalformedDevice(#[from] MalformedDevice),
}

impl TwinTankError {
    /// Wrap any error as [`TwinTankError::StoreUnavailable`].
    pub fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::StoreUnavailable(Box::new(err))
    }

    /// Whether this error means the store could not be used this cycle.
    #[must_use]
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

/// A domain invariant was violated.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("device {name:?} is not an actuator")]
    NotAnActuator { name: String },

    #[error("device {name:?} is not a sensor")]
    NotASensor { name: String },

    #[error("device {name:?} is not the main tank sensor")]
    NotTheMainSensor { name: String },

    #[error("role {role} does not fit a device of kind {kind}")]
    RoleKindMismatch { role: Role, kind: &'static str },

    #[error("unknown role {0:?}")]
    UnknownRole(String),

    #[error("thresholds must be strictly ascending within 1..=100, got {0:?}")]
    InvalidThresholds(Vec<u8>),
}

/// A requested record does not exist.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// One or more of the four functional roles could not be matched to
/// exactly one device.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unresolved roles: {}", format_roles(.missing))]
pub struct RoleUnresolved {
    pub missing: Vec<Role>,
}

/// A store record could not be turned into a device.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MalformedDevice {
    #[error("record {id:?} has no kind")]
    MissingKind { id: String },

    #[error("record {id:?} has unknown kind {kind:?}")]
    UnknownKind { id: String, kind: String },

    #[error("record has no id")]
    MissingId,
}

fn format_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_validation_error_with_from() {
        let err: TwinTankError = ValidationError::EmptyName.into();
        assert!(matches!(
            err,
            TwinTankError::Validation(ValidationError::EmptyName)
        ));
    }

    #[test]
    fn should_display_not_found_error() {
        let err = NotFoundError {
            entity: "Device",
            id: "42".to_string(),
        };
        assert_eq!(err.to_string(), "Device 42 not found");
    }

    #[test]
    fn should_list_missing_roles_in_display() {
        let err = RoleUnresolved {
            missing: vec![Role::MainPump, Role::BackupSensor],
        };
        assert_eq!(
            err.to_string(),
            "unresolved roles: main_pump, backup_sensor"
        );
    }

    #[test]
    fn should_flag_store_errors() {
        let io = std::io::Error::other("connection refused");
        let err = TwinTankError::store(io);
        assert!(err.is_store_unavailable());
        assert!(!TwinTankError::from(ValidationError::EmptyName).is_store_unavailable());
    }
}
