pub mod cache;
pub mod services;
