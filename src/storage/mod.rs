//! Storage layer for modstack-relay
//!
//! The stand-in for host option storage: a TOML config file for settings
//! and the OS keyring for the API key.

use crate::error::StorageError;

pub mod config;
pub mod credentials;

type Result<T> = std::result::Result<T, StorageError>;
