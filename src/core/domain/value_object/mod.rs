mod filename;
mod gns3_host;
mod gns3_port;
mod gns3_url;

pub use filename::normalize_filename;
pub use gns3_host::Gns3Host;
pub use gns3_port::{DEFAULT_CONTROLLER_PORT, Gns3Port};
pub use gns3_url::Gns3Url;

