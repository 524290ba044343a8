//! Typed settings of an IOU device and the rules for changing them.
//!
//! The controller is the source of truth for these values. Locally they only
//! change through [`IouDeviceSettings::apply`], which is fed with the
//! properties the controller echoes back after a create or update.

use crate::core::domain::{
    error::ValidationError,
    model::module_settings::{IouModuleSettings, MAX_ADAPTERS, adapters_within_limit},
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Settings key holding the number of Ethernet adapters.
pub const ETHERNET_ADAPTERS: &str = "ethernet_adapters";
/// Settings key holding the number of serial adapters.
pub const SERIAL_ADAPTERS: &str = "serial_adapters";

/// Settings of an IOU device as stored by the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct IouDeviceSettings {
    /// Path of the IOU image on the compute.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub path: String,
    /// Checksum of the image.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub md5sum: String,
    /// Startup-config reference as known by the compute.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub startup_config: String,
    /// Private-config reference as known by the compute.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub private_config: String,
    /// Layer 1 keepalive messages.
    pub l1_keepalives: bool,
    /// When true the IOU default RAM and NVRAM sizes apply and `ram`/`nvram`
    /// are ignored.
    pub use_default_iou_values: bool,
    /// RAM in MB.
    pub ram: u32,
    /// NVRAM in KB.
    pub nvram: u32,
    pub ethernet_adapters: u32,
    pub serial_adapters: u32,
    /// Console TCP port, once allocated by the compute.
    pub console: Option<u16>,
    pub console_host: Option<String>,
    /// Content of the IOU license file last pushed to the compute.
    pub iourc_content: Option<String>,
}

impl IouDeviceSettings {
    /// Initial settings of a device that has not been created yet.
    pub fn from_module(module: &IouModuleSettings) -> Self {
        Self {
            path: String::new(),
            md5sum: String::new(),
            startup_config: String::new(),
            private_config: String::new(),
            l1_keepalives: false,
            use_default_iou_values: module.use_default_iou_values,
            ram: module.ram,
            nvram: module.nvram,
            ethernet_adapters: module.ethernet_adapters,
            serial_adapters: module.serial_adapters,
            console: None,
            console_host: None,
            iourc_content: None,
        }
    }

    /// Settings as a flat name → value mapping.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            // A struct of plain fields always serializes to an object.
            _ => Map::new(),
        }
    }

    /// Computes the parameters an update has to send: every field of `update`
    /// whose value differs from the stored one. Config file references are
    /// not part of the result; they are resolved separately.
    pub fn diff(&self, update: &SettingsUpdate) -> Map<String, Value> {
        let current = self.to_map();
        let requested = match serde_json::to_value(update) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };

        requested
            .into_iter()
            .filter(|(name, value)| current.get(name).is_some_and(|stored| stored != value))
            .collect()
    }

    /// Applies the values confirmed by the controller.
    ///
    /// Keys that are not settings are ignored, as are values equal to the
    /// stored ones. Every changed value is type-checked first; a single
    /// wrong-typed value, or adapter counts an IOU image cannot hold, rejects
    /// the whole response and leaves the settings untouched.
    pub fn apply(&mut self, response: &Map<String, Value>) -> Result<SettingsChanges, ValidationError> {
        let stored = self.to_map();
        let mut candidate = stored.clone();
        let mut changes = Vec::new();

        for (key, value) in response {
            let Some(old) = stored.get(key) else {
                continue;
            };
            if old == value {
                continue;
            }

            let mut probe = stored.clone();
            probe.insert(key.clone(), value.clone());
            let parsed = serde_json::from_value::<IouDeviceSettings>(Value::Object(probe))
                .map_err(|e| ValidationError::Field {
                    field: key.clone(),
                    message: format!("unexpected value {}: {}", value, e),
                })?;

            // Compare in stored form, a null string reads as empty
            let new = parsed.to_map().remove(key).unwrap_or(Value::Null);
            if &new == old {
                continue;
            }

            candidate.insert(key.clone(), new.clone());
            changes.push(SettingChange {
                key: key.clone(),
                old: old.clone(),
                new,
            });
        }

        if changes.is_empty() {
            return Ok(SettingsChanges::default());
        }

        let next: IouDeviceSettings = serde_json::from_value(Value::Object(candidate))
            .map_err(|e| ValidationError::Format(format!("Invalid settings response: {}", e)))?;
        let changes = SettingsChanges { changes };

        if changes.adapters_changed()
            && !adapters_within_limit(next.ethernet_adapters, next.serial_adapters)
        {
            let field = changes
                .iter()
                .find(|c| c.key == ETHERNET_ADAPTERS || c.key == SERIAL_ADAPTERS)
                .map(|c| c.key.clone())
                .unwrap_or_else(|| ETHERNET_ADAPTERS.to_string());
            return Err(ValidationError::Field {
                field,
                message: format!(
                    "{} Ethernet and {} serial adapters exceed the maximum of {}",
                    next.ethernet_adapters, next.serial_adapters, MAX_ADAPTERS
                ),
            });
        }

        *self = next;
        Ok(changes)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// One setting overwritten by [`IouDeviceSettings::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct SettingChange {
    pub key: String,
    pub old: Value,
    pub new: Value,
}

/// The outcome of applying a controller response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsChanges {
    changes: Vec<SettingChange>,
}

impl SettingsChanges {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SettingChange> {
        self.changes.iter()
    }

    /// Names of the settings that changed, in response order.
    pub fn keys(&self) -> Vec<String> {
        self.changes.iter().map(|c| c.key.clone()).collect()
    }

    /// True when either adapter count changed, which invalidates the ports.
    pub fn adapters_changed(&self) -> bool {
        self.changes
            .iter()
            .any(|c| c.key == ETHERNET_ADAPTERS || c.key == SERIAL_ADAPTERS)
    }
}

/// Where a startup-config or private-config comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A local file that still has to be read.
    Path(PathBuf),
    /// Config text that is already loaded.
    Content(String),
}

/// A partial set of settings requested by the caller.
///
/// Only fields set to `Some` take part in a create or an update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5sum: Option<String>,
    #[serde(skip)]
    pub startup_config: Option<ConfigSource>,
    #[serde(skip)]
    pub private_config: Option<ConfigSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l1_keepalives: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_default_iou_values: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nvram: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ethernet_adapters: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_adapters: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub console: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub console_host: Option<String>,
}

impl SettingsUpdate {
    /// The non-config fields as a parameter mapping.
    pub fn to_params(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}
