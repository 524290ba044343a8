//! Module-wide IOU settings shared by every IOU device.
//!
//! These values are read once at start-up and handed to each device as a
//! read-only `Arc`. They provide the license (iourc) path pushed on create and
//! start, and the defaults new devices begin with.

use crate::core::domain::error::{Gns3Error, Gns3Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Maximum number of adapters (Ethernet and serial combined) an IOU image
/// accepts.
pub const MAX_ADAPTERS: u32 = 16;

/// True when the combined adapter count fits in an IOU image.
pub fn adapters_within_limit(ethernet_adapters: u32, serial_adapters: u32) -> bool {
    ethernet_adapters
        .checked_add(serial_adapters)
        .is_some_and(|total| total <= MAX_ADAPTERS)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IouModuleSettings {
    /// Path of the IOU license file. Its content is sent with every create
    /// and start request.
    pub iourc_path: Option<PathBuf>,
    pub use_default_iou_values: bool,
    /// Default RAM in MB.
    pub ram: u32,
    /// Default NVRAM in KB.
    pub nvram: u32,
    pub ethernet_adapters: u32,
    pub serial_adapters: u32,
}

impl Default for IouModuleSettings {
    fn default() -> Self {
        Self {
            iourc_path: None,
            use_default_iou_values: true,
            ram: 256,
            nvram: 128,
            ethernet_adapters: 2,
            serial_adapters: 2,
        }
    }
}

impl IouModuleSettings {
    /// Reads and validates settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Gns3Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| Gns3Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate settings from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> Gns3Result<Self> {
        let settings: IouModuleSettings =
            toml::from_str(s).map_err(|e| Gns3Error::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Gns3Result<()> {
        if self.ram == 0 {
            return Err(Gns3Error::Config("ram must be > 0".to_string()));
        }
        if self.nvram == 0 {
            return Err(Gns3Error::Config("nvram must be > 0".to_string()));
        }
        if !adapters_within_limit(self.ethernet_adapters, self.serial_adapters) {
            return Err(Gns3Error::Config(format!(
                "ethernet_adapters + serial_adapters must be <= {}, got {} + {}",
                MAX_ADAPTERS, self.ethernet_adapters, self.serial_adapters
            )));
        }
        Ok(())
    }

    /// The license path, if one is configured and non-empty.
    pub fn iourc_path(&self) -> Option<&Path> {
        self.iourc_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }
}
