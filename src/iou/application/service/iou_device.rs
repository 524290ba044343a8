//! IOU device handle: ports, settings and the controller exchanges that
//! change them.

use crate::{
    core::{
        domain::{
            error::{Gns3Error, Gns3Result, ValidationError},
            model::{
                device_event::{DeviceEvent, EventSender},
                iou_settings::{ConfigSource, IouDeviceSettings, SettingsChanges, SettingsUpdate},
                module_settings::IouModuleSettings,
                node_status::NodeStatus,
                port::{Port, build_ports},
            },
            value_object::normalize_filename,
        },
        infrastructure::{fs, transport::ControllerTransport},
    },
    iou::application::{
        request::node_request::{CreateNodeRequest, IOU_NODE_TYPE, LOCAL_COMPUTE, UpdateNodeRequest},
        response::node_response::{NodeConfigs, NodeResponse},
    },
};
use reqwest::Method;
use serde_json::{Map, Value};
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, error, info};

const STARTUP_CONFIG_SUFFIX: &str = "_startup-config.cfg";
const PRIVATE_CONFIG_SUFFIX: &str = "_private-config.cfg";
const MAX_HOSTNAME_LENGTH: usize = 63;

/// A Cisco IOU device hosted on a GNS3 controller.
///
/// The device keeps a local copy of its settings and the ports derived from
/// its adapter counts. Both only change once the controller has confirmed a
/// request: every mutating method takes `&mut self` and updates the state
/// after the awaited exchange succeeded, so an observer sees either the old or
/// the new state. Failures are returned to the caller and also emitted as
/// [`DeviceEvent::Error`] for the user interface.
pub struct IouDevice {
    id: u32,
    name: String,
    project_id: String,
    compute_id: String,
    node_id: Option<String>,
    status: NodeStatus,
    ports: Vec<Port>,
    settings: IouDeviceSettings,
    module: Arc<IouModuleSettings>,
    transport: Arc<dyn ControllerTransport>,
    events: EventSender,
}

impl IouDevice {
    /// Creates a local handle. Nothing is sent until [`IouDevice::create`].
    pub fn new(
        id: u32,
        name: impl Into<String>,
        project_id: impl Into<String>,
        module: Arc<IouModuleSettings>,
        transport: Arc<dyn ControllerTransport>,
        events: EventSender,
    ) -> Self {
        let name = name.into();
        info!(device = %name, "IOU instance is being created");
        Self {
            id,
            name,
            project_id: project_id.into(),
            compute_id: LOCAL_COMPUTE.to_string(),
            node_id: None,
            status: NodeStatus::Created,
            ports: Vec::new(),
            settings: IouDeviceSettings::from_module(&module),
            module,
            transport,
            events,
        }
    }

    /// Places the node on another compute than the local one.
    pub fn with_compute(mut self, compute_id: impl Into<String>) -> Self {
        self.compute_id = compute_id.into();
        self
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn compute_id(&self) -> &str {
        &self.compute_id
    }

    /// The controller's identifier, `None` until the node is created.
    pub fn node_id(&self) -> Option<&str> {
        self.node_id.as_deref()
    }

    pub fn status(&self) -> NodeStatus {
        self.status
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn settings(&self) -> &IouDeviceSettings {
        &self.settings
    }

    /// Console TCP port, once allocated.
    pub fn console(&self) -> Option<u16> {
        self.settings.console
    }

    /// Replaces every port with the set derived from the given adapter counts.
    pub fn regenerate_ports(&mut self, ethernet_adapters: u32, serial_adapters: u32) {
        self.ports = build_ports(ethernet_adapters, serial_adapters);
    }

    /// Parameters for the create request: the image path, resolved config
    /// contents, the license content and the additional settings.
    pub async fn build_create_params(
        &self,
        image_path: &str,
        additional: &SettingsUpdate,
    ) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("path".to_string(), Value::String(image_path.to_string()));
        self.add_config_contents(additional, &mut params).await;
        self.add_iourc_content(&mut params).await;
        params.extend(additional.to_params());
        params
    }

    /// Parameters for an update: resolved config contents plus every setting
    /// whose requested value differs from the stored one.
    pub async fn build_update_params(&self, update: &SettingsUpdate) -> Map<String, Value> {
        let mut params = Map::new();
        self.add_config_contents(update, &mut params).await;
        params.extend(self.settings.diff(update));
        params
    }

    /// Applies values confirmed by the controller and regenerates the ports
    /// when an adapter count changed.
    ///
    /// Returns the names of the settings that changed. A wrong-typed value for
    /// a known setting rejects the whole response without touching anything.
    pub fn reconcile(&mut self, response: &Map<String, Value>) -> Gns3Result<Vec<String>> {
        let changes = self.apply_settings(response)?;

        if changes.adapters_changed() {
            debug!(
                device = %self.name,
                ethernet = self.settings.ethernet_adapters,
                serial = self.settings.serial_adapters,
                "number of adapters has changed"
            );
            self.regenerate_ports(self.settings.ethernet_adapters, self.settings.serial_adapters);
        }

        Ok(changes.keys())
    }

    /// Creates the node on the controller.
    ///
    /// `additional` may carry config files as [`ConfigSource::Path`]; they are
    /// read and sent as content. Unreadable files are logged and skipped.
    ///
    /// When the controller creates the node but answers with settings that
    /// are rejected, the node id is still stored and the error returned.
    pub async fn create(
        &mut self,
        image_path: &str,
        node_id: Option<String>,
        additional: SettingsUpdate,
    ) -> Gns3Result<()> {
        let properties = self.build_create_params(image_path, &additional).await;
        let request = CreateNodeRequest {
            name: self.name.clone(),
            node_type: IOU_NODE_TYPE,
            compute_id: self.compute_id.clone(),
            node_id,
            properties,
        };
        let body = to_body(&request)?;
        let path = format!("projects/{}/nodes", self.project_id);

        let response = self
            .send(Method::POST, &path, Some(body))
            .await
            .map_err(|e| self.report_error("creating", e))?;
        let response = NodeResponse::from_value(response).map_err(|e| self.report_error("creating", e))?;

        // The node exists remotely from here on, even if its settings are rejected
        self.node_id = response.node_id.clone();
        self.apply_settings(&response.settings_values())?;
        self.status = response
            .status
            .as_deref()
            .and_then(NodeStatus::from_controller)
            .unwrap_or(NodeStatus::Stopped);
        self.regenerate_ports(self.settings.ethernet_adapters, self.settings.serial_adapters);

        info!(device = %self.name, node_id = ?self.node_id, "IOU device has been created");
        Ok(())
    }

    /// Starts the node. Does nothing when it is already running.
    pub async fn start(&mut self) -> Gns3Result<()> {
        if self.status == NodeStatus::Started {
            debug!(device = %self.name, "already running");
            return Ok(());
        }

        let path = self.node_path(Some("start"))?;
        let mut params = Map::new();
        self.add_iourc_content(&mut params).await;

        debug!(device = %self.name, "is starting");
        self.send(Method::POST, &path, Some(Value::Object(params)))
            .await
            .map_err(|e| self.report_error("starting", e))?;

        self.status = NodeStatus::Started;
        self.emit(DeviceEvent::Info(format!("{} has started", self.name)));
        Ok(())
    }

    /// Stops the node. Does nothing when it is already stopped.
    pub async fn stop(&mut self) -> Gns3Result<()> {
        if self.status == NodeStatus::Stopped {
            debug!(device = %self.name, "already stopped");
            return Ok(());
        }

        let path = self.node_path(Some("stop"))?;
        self.send(Method::POST, &path, Some(Value::Object(Map::new())))
            .await
            .map_err(|e| self.report_error("stopping", e))?;

        self.status = NodeStatus::Stopped;
        self.emit(DeviceEvent::Info(format!("{} has stopped", self.name)));
        Ok(())
    }

    /// Restarts the node.
    pub async fn reload(&mut self) -> Gns3Result<()> {
        let path = self.node_path(Some("reload"))?;
        self.send(Method::POST, &path, Some(Value::Object(Map::new())))
            .await
            .map_err(|e| self.report_error("reloading", e))?;

        self.status = NodeStatus::Started;
        Ok(())
    }

    /// Deletes the node from the controller and drops its ports.
    pub async fn delete(&mut self) -> Gns3Result<()> {
        let path = self.node_path(None)?;
        self.send(Method::DELETE, &path, None)
            .await
            .map_err(|e| self.report_error("deleting", e))?;

        info!(device = %self.name, "IOU device has been deleted");
        self.node_id = None;
        self.status = NodeStatus::Created;
        self.ports.clear();
        Ok(())
    }

    /// Sends the settings that differ from the stored ones and reconciles with
    /// the controller's answer.
    ///
    /// Returns `false` when nothing differed and no request was sent.
    pub async fn update(&mut self, update: SettingsUpdate) -> Gns3Result<bool> {
        let properties = self.build_update_params(&update).await;
        if properties.is_empty() {
            debug!(device = %self.name, "no settings changed, update skipped");
            return Ok(false);
        }

        let path = self.node_path(None)?;
        let body = to_body(&UpdateNodeRequest { properties })?;
        let response = self
            .send(Method::PUT, &path, Some(body))
            .await
            .map_err(|e| self.report_error("updating", e))?;
        let response = NodeResponse::from_value(response).map_err(|e| self.report_error("updating", e))?;

        self.reconcile(&response.settings_values())?;
        Ok(true)
    }

    /// Asks the compute to write the running configs to its startup files.
    pub async fn save_config(&self) -> Gns3Result<()> {
        let path = self.node_path(Some("configs/save"))?;
        self.send(Method::POST, &path, Some(Value::Object(Map::new())))
            .await
            .map_err(|e| self.report_error("saving configs", e))?;

        info!(device = %self.name, "configs have been saved");
        self.emit(DeviceEvent::Info(format!("{}: configs have been saved", self.name)));
        Ok(())
    }

    /// Exports the startup-config and private-config to the given files.
    ///
    /// A target is written only when it is given, non-empty, and the
    /// controller returned content for it. Write failures become warnings and
    /// do not stop the other write. Returns the files written.
    pub async fn export_config(
        &self,
        startup_config_path: Option<&Path>,
        private_config_path: Option<&Path>,
    ) -> Gns3Result<Vec<PathBuf>> {
        let configs = self.fetch_configs().await?;
        let targets = [
            ("startup-config", startup_config_path, configs.startup_config_content.as_deref()),
            ("private-config", private_config_path, configs.private_config_content.as_deref()),
        ];

        let mut written = Vec::new();
        for (label, target, content) in targets {
            let (Some(target), Some(content)) = (target, content) else {
                continue;
            };
            if target.as_os_str().is_empty() {
                continue;
            }
            if self.write_config(label, target, content).await {
                written.push(target.to_path_buf());
            }
        }
        Ok(written)
    }

    /// Exports both configs into `directory` using the device naming
    /// convention. Returns the files written.
    pub async fn export_config_to_directory(&self, directory: &Path) -> Gns3Result<Vec<PathBuf>> {
        let configs = self.fetch_configs().await?;
        let targets = [
            ("startup-config", self.startup_config_file_name(), configs.startup_config_content.as_deref()),
            ("private-config", self.private_config_file_name(), configs.private_config_content.as_deref()),
        ];

        let mut written = Vec::new();
        for (label, file_name, content) in targets {
            let Some(content) = content else {
                continue;
            };
            let target = directory.join(file_name);
            if self.write_config(label, &target, content).await {
                written.push(target);
            }
        }
        Ok(written)
    }

    /// Pushes a local startup-config file to the device.
    pub async fn import_config(&mut self, path: impl Into<PathBuf>) -> Gns3Result<bool> {
        self.update(SettingsUpdate {
            startup_config: Some(ConfigSource::Path(path.into())),
            ..Default::default()
        })
        .await
    }

    /// Pushes a local private-config file to the device.
    pub async fn import_private_config(&mut self, path: impl Into<PathBuf>) -> Gns3Result<bool> {
        self.update(SettingsUpdate {
            private_config: Some(ConfigSource::Path(path.into())),
            ..Default::default()
        })
        .await
    }

    /// Imports the configs found in `directory` under the device naming
    /// convention.
    ///
    /// A missing startup-config is reported as a warning; the private-config
    /// is optional. Returns `false` when nothing was found and no request was
    /// sent.
    pub async fn import_config_from_directory(&mut self, directory: &Path) -> Gns3Result<bool> {
        let startup_config = self.startup_config_file_name();
        let private_config = self.private_config_file_name();
        let mut update = SettingsUpdate::default();

        let startup_path = directory.join(&startup_config);
        if is_file(&startup_path).await {
            update.startup_config = Some(ConfigSource::Path(startup_path));
        } else {
            self.emit(DeviceEvent::Warning {
                device_id: self.id,
                message: format!(
                    "no startup-config file could be found, expected file name: {}",
                    startup_config
                ),
            });
        }

        let private_path = directory.join(&private_config);
        if is_file(&private_path).await {
            update.private_config = Some(ConfigSource::Path(private_path));
        } else {
            debug!(
                device = %self.name,
                expected = %private_config,
                "no private-config file could be found"
            );
        }

        if update.startup_config.is_none() && update.private_config.is_none() {
            return Ok(false);
        }
        self.update(update).await
    }

    /// Human-readable summary of the device.
    pub fn info(&self) -> String {
        let state = if self.status == NodeStatus::Started {
            "started"
        } else {
            "stopped"
        };

        let memories_info = if self.settings.use_default_iou_values {
            "default RAM and NVRAM IOU values".to_string()
        } else {
            format!(
                "{} MB RAM and {} KB NVRAM",
                self.settings.ram, self.settings.nvram
            )
        };

        let console = self
            .settings
            .console
            .map(|port| port.to_string())
            .unwrap_or_else(|| "none".to_string());
        let image_name = Path::new(&self.settings.path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut info = format!(
            "Device {name} is {state}\n  \
             Node ID is {id}, server's IOU device ID is {node_id}\n  \
             Hardware is Cisco IOU generic device with {memories_info}\n  \
             Device's server runs on {compute}, console is on port {console}\n  \
             Image is {image_name}\n  \
             {ethernet} Ethernet adapters and {serial} serial adapters installed\n",
            name = self.name,
            id = self.id,
            node_id = self.node_id.as_deref().unwrap_or("none"),
            compute = self.compute_id,
            ethernet = self.settings.ethernet_adapters,
            serial = self.settings.serial_adapters,
        );
        for port in &self.ports {
            info.push_str(&format!("     {}\n", port.name()));
        }
        info
    }

    /// Checks a hostname against IOS rules: letters, digits, `_` and `-`
    /// only, at most 63 characters.
    pub fn validate_hostname(hostname: &str) -> bool {
        !hostname.is_empty()
            && hostname.chars().count() <= MAX_HOSTNAME_LENGTH
            && hostname
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    }

    fn startup_config_file_name(&self) -> String {
        format!("{}{}", normalize_filename(&self.name), STARTUP_CONFIG_SUFFIX)
    }

    fn private_config_file_name(&self) -> String {
        format!("{}{}", normalize_filename(&self.name), PRIVATE_CONFIG_SUFFIX)
    }

    fn node_path(&self, action: Option<&str>) -> Gns3Result<String> {
        let node_id = self.node_id.as_deref().ok_or_else(|| ValidationError::Field {
            field: "node_id".to_string(),
            message: format!("node {} has not been created", self.name),
        })?;
        let base = format!("projects/{}/nodes/{}", self.project_id, node_id);
        Ok(match action {
            Some(action) => format!("{}/{}", base, action),
            None => base,
        })
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Gns3Result<Value> {
        self.transport.request(method, path, body).await
    }

    async fn fetch_configs(&self) -> Gns3Result<NodeConfigs> {
        let path = self.node_path(Some("configs"))?;
        let response = self
            .send(Method::GET, &path, None)
            .await
            .map_err(|e| self.report_error("exporting configs", e))?;
        NodeConfigs::from_value(response).map_err(|e| self.report_error("exporting configs", e))
    }

    async fn write_config(&self, label: &str, target: &Path, content: &str) -> bool {
        info!(device = %self.name, path = %target.display(), "saving {}", label);
        match fs::write_text(target, content).await {
            Ok(()) => true,
            Err(e) => {
                self.emit(DeviceEvent::Warning {
                    device_id: self.id,
                    message: format!(
                        "Could not export {} to {}: {}",
                        label,
                        target.display(),
                        e
                    ),
                });
                false
            }
        }
    }

    /// Applies a response to the settings, logging each transition. Rejected
    /// responses are reported and leave the settings untouched.
    fn apply_settings(&mut self, values: &Map<String, Value>) -> Gns3Result<SettingsChanges> {
        let changes = match self.settings.apply(values) {
            Ok(changes) => changes,
            Err(e) => return Err(self.report_error("applying settings", e.into())),
        };

        for change in changes.iter() {
            info!(
                device = %self.name,
                "updating {} from '{}' to '{}'",
                change.key,
                change.old,
                change.new
            );
        }
        Ok(changes)
    }

    async fn add_config_contents(&self, update: &SettingsUpdate, params: &mut Map<String, Value>) {
        let sources = [
            ("startup_config_content", update.startup_config.as_ref()),
            ("private_config_content", update.private_config.as_ref()),
        ];
        for (key, source) in sources {
            let Some(source) = source else {
                continue;
            };
            if let Some(content) = self.resolve_config(source).await {
                params.insert(key.to_string(), Value::String(content));
            }
        }
    }

    async fn resolve_config(&self, source: &ConfigSource) -> Option<String> {
        match source {
            ConfigSource::Content(content) => Some(content.clone()),
            ConfigSource::Path(path) => match fs::read_text(path).await {
                Ok(content) => Some(content),
                Err(e) => {
                    error!(
                        device = %self.name,
                        path = %path.display(),
                        error = %e,
                        "cannot read config file"
                    );
                    None
                }
            },
        }
    }

    /// Attaches the license file content when the module points at a
    /// readable text file.
    async fn add_iourc_content(&self, params: &mut Map<String, Value>) {
        let Some(iourc_path) = self.module.iourc_path() else {
            return;
        };

        match fs::read_text(iourc_path).await {
            Ok(content) => {
                params.insert("iourc_content".to_string(), Value::String(content));
            }
            Err(e) => {
                error!(path = %iourc_path.display(), error = %e, "can't use iourc file");
            }
        }
    }

    /// Logs the failure, emits an error event and hands the error back.
    fn report_error(&self, action: &str, err: Gns3Error) -> Gns3Error {
        error!(device = %self.name, error = %err, "error while {}", action);
        let message = match &err {
            Gns3Error::Api { message, .. } => message.clone(),
            other => other.to_string(),
        };
        self.emit(DeviceEvent::Error {
            device_id: self.id,
            message,
        });
        err
    }

    fn emit(&self, event: DeviceEvent) {
        // A dropped receiver only means nobody is listening.
        let _ = self.events.send(event);
    }
}

impl fmt::Debug for IouDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IouDevice")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("project_id", &self.project_id)
            .field("node_id", &self.node_id)
            .field("status", &self.status)
            .field("ports", &self.ports.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for IouDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IOU device")
    }
}

fn to_body<T: serde::Serialize>(request: &T) -> Gns3Result<Value> {
    serde_json::to_value(request)
        .map_err(|e| ValidationError::Format(format!("Cannot encode request: {}", e)).into())
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}
