use crate::core::domain::error::{Gns3Result, ValidationError};

/// Default port of the GNS3 controller HTTP API.
pub const DEFAULT_CONTROLLER_PORT: u16 = 3080;

/// A validated GNS3 controller port number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gns3Port(u16);

impl Gns3Port {
    /// Creates a new port after validation.
    pub fn new(port: u16) -> Gns3Result<Self> {
        validate_port(port)?;
        Ok(Self(port))
    }

    /// Creates a new port without validation.
    #[cfg(test)]
    pub(crate) fn new_unchecked(port: u16) -> Self {
        Self(port)
    }

    /// Returns the port number.
    pub fn get(&self) -> u16 {
        self.0
    }
}

impl Default for Gns3Port {
    fn default() -> Self {
        Self(DEFAULT_CONTROLLER_PORT)
    }
}

/// Validates a port number.
pub(crate) fn validate_port(port: u16) -> Result<(), ValidationError> {
    if port == 0 {
        return Err(ValidationError::Field {
            field: "port".to_string(),
            message: "Port cannot be 0".to_string(),
        });
    }
    // All ports 1-65535 are valid.
    Ok(())
}
