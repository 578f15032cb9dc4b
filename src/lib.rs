//! # modstack-relay
//!
//! Client library and embed widget protocol for the ModStack AI support service.
//!
//! A site connects with an API key, lists its chatbots and ticket forms,
//! relays chat messages and ticket submissions, verifies inbound webhooks and
//! mounts the vendor's chat widget on its pages.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use modstack_relay::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> modstack_relay::Result<()> {
//!     let config = Config::load(None)?;
//!     let client = ModStackClient::with_api_key(config.get_api_url(None), "modstack_wp_...".into())?;
//!
//!     let chatbots = client.list_resources(ResourceKind::Chatbots).await?;
//!
//!     let mut page = VirtualDocument::new("https://example.com");
//!     let mut widget = EmbedWidget::mount(WidgetConfig::new(&chatbots[0].id), &client.base_url, &mut page)?;
//!     widget.open(&mut page);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │        API / Embed Layers           │  HTTP client, webhooks, widget protocol
//! ├─────────────────────────────────────┤
//! │          Core Layer                 │  Connection and resource services
//! ├─────────────────────────────────────┤
//! │        Storage Layer                │  Config file, keyring credentials
//! ├─────────────────────────────────────┤
//! │         Utils Layer                 │  Validation, sanitizing, logging
//! └─────────────────────────────────────┘
//! ```

pub use error::AppError;

/// Commonly used types in one import.
pub mod prelude {
    pub use crate::Result;
    pub use crate::error::AppError;

    pub use crate::api::client::ModStackClient;
    pub use crate::api::models::{ChatRequest, RemoteResource, ResourceKind, TicketRequest};
    pub use crate::api::webhook::{WebhookHandler, WebhookReceiver, verify_webhook_signature};

    pub use crate::embed::{EmbedHost, EmbedWidget, GlobalWidget, VirtualDocument, WidgetConfig};

    pub use crate::core::services::resource_service::ResourceService;
    pub use crate::storage::config::Config;
    pub use crate::storage::credentials::Credentials;
}

/// API layer - HTTP client, models, connection state and webhooks.
pub mod api;

/// Embed layer - floating widget, inline embeds and the host document contract.
pub mod embed;

/// Business logic layer - services over the API client.
pub mod core;

/// Storage layer - TOML configuration and OS keyring credentials.
pub mod storage;

/// Display layer - table output for the CLI.
pub mod display;

/// Command-line interface.
pub mod cli;

/// Error handling - domain errors with severity and troubleshooting hints.
pub mod error;

/// Validation, text sanitizing and logging helpers.
pub mod utils;

pub type Result<T> = std::result::Result<T, AppError>;
