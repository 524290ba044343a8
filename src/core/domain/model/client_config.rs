//! Configuration of the controller client.

use crate::core::domain::error::ValidationError;
use std::num::NonZeroU32;
use std::time::Duration;

/// Client-side throttling of controller requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst_size: u32,
}

impl RateLimitConfig {
    /// Returns the quota parameters as non-zero values.
    pub(crate) fn quota(&self) -> Result<(NonZeroU32, NonZeroU32), ValidationError> {
        let rate = NonZeroU32::new(self.requests_per_second).ok_or_else(|| ValidationError::Field {
            field: "requests_per_second".to_string(),
            message: "Rate limit must be greater than 0".to_string(),
        })?;
        let burst = NonZeroU32::new(self.burst_size).ok_or_else(|| ValidationError::Field {
            field: "burst_size".to_string(),
            message: "Burst size must be greater than 0".to_string(),
        })?;
        Ok((rate, burst))
    }
}

/// Settings applied to every request sent to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Optional throttling; `None` disables it.
    pub rate_limit: Option<RateLimitConfig>,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rate_limit: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}
