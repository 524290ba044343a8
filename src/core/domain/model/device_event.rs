//! Notifications emitted by devices for the user interface.

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// An outward notification about a device.
///
/// Events are fire-and-forget and delivered in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// A request failed or a response was rejected.
    Error { device_id: u32, message: String },
    /// Something the user should look at; the operation carried on.
    Warning { device_id: u32, message: String },
    /// Free-form progress information.
    Info(String),
}

impl DeviceEvent {
    pub fn device_id(&self) -> Option<u32> {
        match self {
            DeviceEvent::Error { device_id, .. } | DeviceEvent::Warning { device_id, .. } => {
                Some(*device_id)
            }
            DeviceEvent::Info(_) => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            DeviceEvent::Error { message, .. } | DeviceEvent::Warning { message, .. } => message,
            DeviceEvent::Info(message) => message,
        }
    }
}

pub type EventSender = UnboundedSender<DeviceEvent>;
pub type EventReceiver = UnboundedReceiver<DeviceEvent>;

/// Creates a new event channel.
pub fn event_channel() -> (EventSender, EventReceiver) {
    unbounded_channel()
}
