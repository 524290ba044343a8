use crate::core::domain::error::{Gns3Result, ValidationError};
use std::fmt;

const MAX_HOSTNAME_LENGTH: usize = 253;
const MAX_LABEL_LENGTH: usize = 63;

/// Represents a validated GNS3 controller host address
///
/// This value object encapsulates a host name or IPv4 address and ensures
/// every label meets the RFC 1035 requirements for valid hostnames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gns3Host(String);

impl Gns3Host {
    /// Creates a new Gns3Host instance with validation
    ///
    /// # Arguments
    ///
    /// * `host` - The hostname to validate and wrap
    ///
    /// # Returns
    ///
    /// * `Ok(Gns3Host)` if validation succeeds
    /// * `Err(Gns3Error)` if validation fails
    pub fn new(host: impl Into<String>) -> Gns3Result<Self> {
        let host = host.into();
        validate_host(&host)?;
        Ok(Self(host))
    }

    /// Returns the host as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Gns3Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_label(label: &str) -> Result<(), ValidationError> {
    if label.is_empty() || label.len() > MAX_LABEL_LENGTH {
        return Err(ValidationError::Format(format!(
            "Label must be between 1 and {} characters",
            MAX_LABEL_LENGTH
        )));
    }

    if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::Format(
            "Label can only contain alphanumeric characters and hyphens".to_string(),
        ));
    }

    if label.starts_with('-') || label.ends_with('-') {
        return Err(ValidationError::Format(
            "Label cannot start or end with hyphen".to_string(),
        ));
    }

    Ok(())
}

/// Validates a host name.
pub(crate) fn validate_host(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Field {
            field: "host".to_string(),
            message: "Host cannot be empty".to_string(),
        });
    }

    if value.len() > MAX_HOSTNAME_LENGTH {
        return Err(ValidationError::ConstraintViolation(format!(
            "Host length exceeds maximum of {} characters",
            MAX_HOSTNAME_LENGTH
        )));
    }

    for label in value.split('.') {
        validate_label(label)?;
    }

    Ok(())
}
