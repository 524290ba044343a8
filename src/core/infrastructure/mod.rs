pub mod api_client;
pub mod fs;
pub mod transport;
