mod core;
mod iou;


pub use crate::core::domain::error::{Gns3Error, Gns3Result, ValidationError};
pub use crate::core::domain::model::{
    client_config::{ClientConfig, RateLimitConfig},
    device_event::{DeviceEvent, EventReceiver, EventSender, event_channel},
    iou_settings::{ConfigSource, IouDeviceSettings, SettingChange, SettingsUpdate},
    module_settings::{IouModuleSettings, MAX_ADAPTERS},
    node_status::NodeStatus,
    port::{PORTS_PER_ADAPTER, Port, PortKind, build_ports},
};
pub use crate::core::domain::value_object::{
    DEFAULT_CONTROLLER_PORT, Gns3Host, Gns3Port, Gns3Url, normalize_filename,
};
pub use crate::core::infrastructure::transport::ControllerTransport;
pub use crate::iou::application::service::iou_device::IouDevice;

use crate::core::infrastructure::api_client::ApiClient;
use serde::Deserialize;
use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};

/// A client for driving IOU devices on a GNS3 controller
///
/// This client provides a safe, ergonomic interface for:
/// - Reaching the controller REST API
/// - Creating IOU device handles bound to a project
/// - Sharing module-wide IOU settings between devices
///
/// # Examples
///
/// ```no_run
/// use gns3_iou::{Gns3Client, Gns3Result, IouModuleSettings, SettingsUpdate, event_channel};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Gns3Result<()> {
///     let client = Gns3Client::builder()
///         .host("127.0.0.1")?
///         .port(3080)?
///         .secure(false)
///         .build()?;
///
///     let (events, _rx) = event_channel();
///     let module = Arc::new(IouModuleSettings::default());
///     let mut device = client.iou_device("R1", "a1e920ca-338a-4e9f-b363-aa607b09dd80", module, events);
///     device
///         .create("i86bi-linux-l3-adventerprisek9-15.4.1T.bin", None, SettingsUpdate::default())
///         .await?;
///     device.start().await?;
///     Ok(())
/// }
/// ```
pub struct Gns3Client {
    api_client: Arc<ApiClient>,
    next_device_id: AtomicU32,
}

/// Builder for Gns3Client configuration
#[derive(Debug, Default)]
pub struct Gns3ClientBuilder {
    host: Option<String>,
    port: Option<u16>,
    secure: bool,
    config: ClientConfig,
}

impl Gns3ClientBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Gns3Result<Self> {
        self.host = Some(host.into());
        Ok(self)
    }

    pub fn port(mut self, port: u16) -> Gns3Result<Self> {
        self.port = Some(port);
        Ok(self)
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Throttles requests to the controller.
    pub fn rate_limit(mut self, requests_per_second: u32, burst_size: u32) -> Self {
        self.config.rate_limit = Some(RateLimitConfig {
            requests_per_second,
            burst_size,
        });
        self
    }

    pub fn request_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn build(self) -> Gns3Result<Gns3Client> {
        let host = Gns3Host::new(self.host.ok_or_else(|| ValidationError::Field {
            field: "host".to_string(),
            message: "Host is required".to_string(),
        })?)?;

        let port = Gns3Port::new(self.port.unwrap_or(DEFAULT_CONTROLLER_PORT))?;
        let url = Gns3Url::new(&host, &port, self.secure)?;
        let api_client = ApiClient::new(url, &self.config)?;

        Ok(Gns3Client::from_api_client(api_client))
    }
}

/// Version information reported by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ControllerVersion {
    pub version: String,
    #[serde(default)]
    pub local: bool,
}

impl Gns3Client {
    /// Creates a new builder for Gns3Client configuration
    pub fn builder() -> Gns3ClientBuilder {
        Gns3ClientBuilder::default()
    }

    pub(crate) fn from_api_client(api_client: ApiClient) -> Self {
        Self {
            api_client: Arc::new(api_client),
            next_device_id: AtomicU32::new(1),
        }
    }

    /// Returns the root URL of the controller.
    pub fn base_url(&self) -> &Gns3Url {
        self.api_client.base_url()
    }

    /// Queries the controller version; a cheap way to check reachability.
    ///
    /// # Errors
    ///
    /// This method will return an error if:
    /// - The controller is unreachable
    /// - The response format is invalid
    pub async fn version(&self) -> Gns3Result<ControllerVersion> {
        self.api_client.get("version").await
    }

    /// Creates a handle for a new IOU device in `project_id`.
    ///
    /// Each handle gets a fresh local id. Nothing is sent to the controller
    /// until [`IouDevice::create`] is awaited.
    pub fn iou_device(
        &self,
        name: impl Into<String>,
        project_id: impl Into<String>,
        module: Arc<IouModuleSettings>,
        events: EventSender,
    ) -> IouDevice {
        let id = self.next_device_id.fetch_add(1, Ordering::Relaxed);
        let transport: Arc<dyn ControllerTransport> = self.api_client.clone();
        IouDevice::new(id, name, project_id, module, transport, events)
    }
}
