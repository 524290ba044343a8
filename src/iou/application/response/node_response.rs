use crate::core::domain::error::{Gns3Result, ValidationError};
use serde::Deserialize;
use serde_json::{Map, Value};

/// A node as returned by the controller after create, update and lifecycle
/// requests.
///
/// Device settings may be reported at the top level, inside `properties`, or
/// both; [`NodeResponse::settings_values`] merges them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeResponse {
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl NodeResponse {
    /// Parses a controller response. An empty body is an empty response.
    pub fn from_value(value: Value) -> Gns3Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value).map_err(|e| {
            ValidationError::Format(format!("Unexpected node response: {}", e)).into()
        })
    }

    /// Top-level values overlaid with `properties`.
    pub fn settings_values(&self) -> Map<String, Value> {
        let mut values = self.fields.clone();
        for (key, value) in &self.properties {
            values.insert(key.clone(), value.clone());
        }
        values
    }
}

/// Body of `GET /projects/{project_id}/nodes/{node_id}/configs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NodeConfigs {
    #[serde(default)]
    pub startup_config_content: Option<String>,
    #[serde(default)]
    pub private_config_content: Option<String>,
}

impl NodeConfigs {
    pub fn from_value(value: Value) -> Gns3Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value).map_err(|e| {
            ValidationError::Format(format!("Unexpected configs response: {}", e)).into()
        })
    }
}
