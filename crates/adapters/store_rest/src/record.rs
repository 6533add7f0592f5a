//! Wire format of the device collection.
//!
//! Every row of the collection shares one shape; `tipo` tells devices and
//! history rows apart. Field names follow the store, not the domain.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use twintank_domain::device::{
    Device, DeviceKind, DevicePatch, EVENT_DEVICE_CREATED, Level, NewDevice, RecordKind,
};
use twintank_domain::error::MalformedDevice;
use twintank_domain::history::HistoryEntry;
use twintank_domain::id::DeviceId;
use twintank_domain::roles::Role;
use twintank_domain::time::{self, Timestamp};

const KIND_ACTUATOR: &str = "actuador";
const KIND_SENSOR: &str = "sensor";
const KIND_LOG: &str = "log";

/// A row as the store returns it. Every field may be missing.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Record {
    id: Option<Value>,
    nombre: Option<String>,
    tipo: Option<String>,
    rol: Option<String>,
    estado: Option<bool>,
    valor: Option<Value>,
    ultimaactividad: Option<Value>,
    ultimevento: Option<String>,
}

/// A decoded row.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Row {
    Device(Device),
    Log(HistoryEntry),
}

impl Record {
    /// Decode a row. Missing values fall back to defaults; only rows without
    /// an id or a recognisable kind are rejected.
    pub(crate) fn into_row(self) -> Result<Row, MalformedDevice> {
        let id = self
            .id
            .as_ref()
            .and_then(scalar_to_string)
            .ok_or(MalformedDevice::MissingId)?;
        let Some(tipo) = self.tipo.as_deref() else {
            return Err(MalformedDevice::MissingKind { id });
        };
        let kind = tipo.parse::<RecordKind>().map_err(|_| MalformedDevice::UnknownKind {
            id: id.clone(),
            kind: tipo.to_string(),
        })?;

        let name = self.nombre.unwrap_or_default();
        let at = self
            .ultimaactividad
            .as_ref()
            .and_then(scalar_to_i64)
            .map_or(time::from_unix(0), time::from_unix);
        let event = self.ultimevento.unwrap_or_default();

        Ok(match kind {
            RecordKind::Log => Row::Log(HistoryEntry {
                id: Some(DeviceId::new(id)),
                device_name: name,
                event,
                value: self.valor.as_ref().and_then(scalar_to_string).unwrap_or_default(),
                recorded_at: at,
            }),
            RecordKind::Device(kind) => {
                let role = resolve_role(self.rol.as_deref(), kind, &name, &id);
                Row::Device(Device {
                    id: DeviceId::new(id),
                    name,
                    kind,
                    role,
                    state: kind == DeviceKind::Actuator && self.estado.unwrap_or(false),
                    level: match kind {
                        DeviceKind::Sensor => self
                            .valor
                            .as_ref()
                            .and_then(scalar_to_i64)
                            .map_or(Level::EMPTY, Level::new),
                        DeviceKind::Actuator => Level::EMPTY,
                    },
                    last_event_at: at,
                    last_event: event,
                })
            }
        })
    }
}

fn resolve_role(tag: Option<&str>, kind: DeviceKind, name: &str, id: &str) -> Role {
    let tagged = tag
        .filter(|t| !t.trim().is_empty())
        .map(str::parse::<Role>);
    match tagged {
        Some(Ok(role)) if role.check_kind(kind).is_ok() => role,
        Some(_) => {
            tracing::warn!(id, ?tag, "ignoring unusable role tag, inferring from name");
            Role::infer(kind, name)
        }
        None => Role::infer(kind, name),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// Float casts saturate; levels are clamped afterwards anyway.
#[allow(clippy::cast_possible_truncation)]
fn scalar_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    }
}

fn kind_label(kind: DeviceKind) -> &'static str {
    match kind {
        DeviceKind::Actuator => KIND_ACTUATOR,
        DeviceKind::Sensor => KIND_SENSOR,
    }
}

/// Body of a device registration.
#[derive(Debug, Serialize)]
pub(crate) struct CreateBody<'a> {
    nombre: &'a str,
    tipo: &'static str,
    rol: Role,
    estado: bool,
    valor: u8,
    ultimaactividad: i64,
    ultimevento: &'static str,
}

impl<'a> CreateBody<'a> {
    pub(crate) fn new(device: &'a NewDevice, at: Timestamp) -> Self {
        Self {
            nombre: &device.name,
            tipo: kind_label(device.kind),
            rol: device.role,
            estado: false,
            valor: 0,
            ultimaactividad: time::to_unix(at),
            ultimevento: EVENT_DEVICE_CREATED,
        }
    }
}

/// Body of a partial update: unset fields are left out entirely.
#[derive(Debug, Serialize)]
pub(crate) struct PatchBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    estado: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valor: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ultimaactividad: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ultimevento: Option<&'a str>,
}

impl<'a> From<&'a DevicePatch> for PatchBody<'a> {
    fn from(patch: &'a DevicePatch) -> Self {
        Self {
            estado: patch.state,
            valor: patch.level.map(Level::percent),
            ultimaactividad: patch.last_event_at.map(time::to_unix),
            ultimevento: patch.last_event.as_deref(),
        }
    }
}

/// Body of a history row. `estado` is always sent, as `null`.
#[derive(Debug, Serialize)]
pub(crate) struct LogBody<'a> {
    nombre: &'a str,
    tipo: &'static str,
    ultimevento: &'a str,
    valor: &'a str,
    ultimaactividad: i64,
    estado: Option<bool>,
}

impl<'a> From<&'a HistoryEntry> for LogBody<'a> {
    fn from(entry: &'a HistoryEntry) -> Self {
        Self {
            nombre: &entry.device_name,
            tipo: KIND_LOG,
            ultimevento: &entry.event,
            valor: &entry.value,
            ultimaactividad: time::to_unix(entry.recorded_at),
            estado: None,
        }
    }
}
