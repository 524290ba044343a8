use crate::core::domain::{
    error::{Gns3Result, ValidationError},
    value_object::{gns3_host::Gns3Host, gns3_port::Gns3Port},
};
use std::fmt;

/// Version prefix of the controller REST API.
const API_PREFIX: &str = "v2";

const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];
const MAX_URL_LENGTH: usize = 2083;

/// Represents a validated GNS3 controller base URL
///
/// Combines a `Gns3Host` and a `Gns3Port` into the root URL of the controller
/// and composes API endpoints from it.
///
/// # Examples
///
/// ```
/// use gns3_iou::{Gns3Host, Gns3Port, Gns3Url};
///
/// let host = Gns3Host::new("gns3.example.com").unwrap();
/// let port = Gns3Port::new(3080).unwrap();
/// let url = Gns3Url::new(&host, &port, false).unwrap();
///
/// assert_eq!(
///     url.endpoint("projects").unwrap(),
///     "http://gns3.example.com:3080/v2/projects"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gns3Url(url::Url);

impl Gns3Url {
    pub fn new(host: &Gns3Host, port: &Gns3Port, secure: bool) -> Gns3Result<Self> {
        let scheme = if secure { "https" } else { "http" };
        let url = format!("{}://{}:{}/", scheme, host, port.get());
        Ok(Self(validate_url(&url)?))
    }

    /// Wraps an already formed base URL, as produced by a mock server.
    #[cfg(test)]
    pub(crate) fn new_unchecked(url: &str) -> Self {
        Self(url::Url::parse(url).expect("mock server URL should parse"))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Composes the full URL of an API endpoint below the versioned prefix.
    pub fn endpoint(&self, path: &str) -> Gns3Result<String> {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return Err(ValidationError::Field {
                field: "path".to_string(),
                message: "Endpoint path cannot be empty".to_string(),
            }
            .into());
        }
        if path.contains("//") || path.split('/').any(|segment| segment == "..") {
            return Err(ValidationError::Format(format!("Invalid endpoint path: {}", path)).into());
        }

        let base = self.0.as_str().trim_end_matches('/');
        Ok(format!("{}/{}/{}", base, API_PREFIX, path))
    }
}

impl fmt::Display for Gns3Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Validates a base URL string.
pub(crate) fn validate_url(url: &str) -> Result<url::Url, ValidationError> {
    if url.is_empty() {
        return Err(ValidationError::Field {
            field: "url".to_string(),
            message: "URL cannot be empty".to_string(),
        });
    }

    if url.len() > MAX_URL_LENGTH {
        return Err(ValidationError::Format(format!(
            "URL exceeds maximum length of {} characters",
            MAX_URL_LENGTH
        )));
    }

    let parsed = url::Url::parse(url)
        .map_err(|e| ValidationError::Format(format!("Invalid URL format: {}", e)))?;

    if !ALLOWED_SCHEMES.contains(&parsed.scheme()) {
        return Err(ValidationError::ConstraintViolation(format!(
            "Invalid scheme. Must be one of: {}",
            ALLOWED_SCHEMES.join(", ")
        )));
    }

    Ok(parsed)
}
