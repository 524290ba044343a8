use serde::Serialize;
use serde_json::{Map, Value};

/// Node type the controller uses for IOU devices.
pub const IOU_NODE_TYPE: &str = "iou";

/// Compute used when none is specified.
pub const LOCAL_COMPUTE: &str = "local";

/// Body of `POST /projects/{project_id}/nodes`.
#[derive(Debug, Serialize)]
pub struct CreateNodeRequest {
    pub name: String,
    pub node_type: &'static str,
    pub compute_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub properties: Map<String, Value>,
}

/// Body of `PUT /projects/{project_id}/nodes/{node_id}`.
#[derive(Debug, Serialize)]
pub struct UpdateNodeRequest {
    pub properties: Map<String, Value>,
}
