pub mod node_request;
