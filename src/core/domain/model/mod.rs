pub mod client_config;
pub mod device_event;
pub mod iou_settings;
pub mod module_settings;
pub mod node_status;
pub mod port;
