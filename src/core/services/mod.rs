pub mod config_service;
pub mod connection_service;
pub mod resource_service;
