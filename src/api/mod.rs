//! API layer - ModStack HTTP client, models and webhook verification

pub mod client;
pub mod connection;
pub mod models;
pub mod webhook;
