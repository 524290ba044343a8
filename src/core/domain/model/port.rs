//! Network ports of an IOU device.
//!
//! An IOU device exposes four ports per adapter slot. Slots below the number
//! of Ethernet adapters carry Ethernet ports, the remaining slots carry serial
//! ports.

use crate::core::domain::model::module_settings::MAX_ADAPTERS;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Number of ports hosted by every IOU adapter.
pub const PORTS_PER_ADAPTER: u32 = 4;

/// The link type of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum PortKind {
    Ethernet,
    Serial,
}

impl PortKind {
    /// Prefix used in full port names, e.g. `Ethernet0/1`.
    pub fn long_name_type(&self) -> &'static str {
        match self {
            PortKind::Ethernet => "Ethernet",
            PortKind::Serial => "Serial",
        }
    }

    /// Prefix used in abbreviated port names, e.g. `e0/1`.
    pub fn short_name_type(&self) -> &'static str {
        match self {
            PortKind::Ethernet => "e",
            PortKind::Serial => "s",
        }
    }
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.long_name_type())
    }
}

/// A single connection point identified by (kind, adapter, port).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Port {
    kind: PortKind,
    adapter_number: u32,
    port_number: u32,
    name: String,
    short_name: String,
}

impl Port {
    pub fn new(kind: PortKind, adapter_number: u32, port_number: u32) -> Self {
        let suffix = format!("{}/{}", adapter_number, port_number);
        Self {
            kind,
            adapter_number,
            port_number,
            name: format!("{}{}", kind.long_name_type(), suffix),
            short_name: format!("{}{}", kind.short_name_type(), suffix),
        }
    }

    pub fn kind(&self) -> PortKind {
        self.kind
    }

    /// The slot hosting this port.
    pub fn adapter_number(&self) -> u32 {
        self.adapter_number
    }

    /// Index of this port within its adapter (0..4).
    pub fn port_number(&self) -> u32 {
        self.port_number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }
}

/// Builds the complete port list for the given adapter counts.
///
/// Ports come out in ascending slot order, then ascending port order. Zero
/// adapters of a kind is valid and simply yields no ports of that kind.
pub fn build_ports(ethernet_adapters: u32, serial_adapters: u32) -> Vec<Port> {
    let adapters = ethernet_adapters.saturating_add(serial_adapters);
    let mut ports = Vec::with_capacity((adapters.min(MAX_ADAPTERS) * PORTS_PER_ADAPTER) as usize);

    for slot in 0..adapters {
        let kind = if slot < ethernet_adapters {
            PortKind::Ethernet
        } else {
            PortKind::Serial
        };
        for port_number in 0..PORTS_PER_ADAPTER {
            let port = Port::new(kind, slot, port_number);
            debug!(port = %port.name(), "port has been added");
            ports.push(port);
        }
    }

    ports
}
