//! The seam between devices and the controller.

use crate::core::domain::error::Gns3Result;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

/// Sends a request to the controller and resolves with its JSON response.
///
/// `path` is relative to the versioned API root, e.g.
/// `projects/{project_id}/nodes`. Implementations map controller-reported
/// failures to `Gns3Error::Api` and unreachable controllers to
/// `Gns3Error::Connection`. An empty response body resolves to `Value::Null`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ControllerTransport: Send + Sync {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Gns3Result<Value>;
}
