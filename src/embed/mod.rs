//! Embed layer - chat widget, inline embeds and the host document contract

pub mod config;
pub mod host;
pub mod message;
pub mod widget;

pub use config::{EmbedKind, Length, Position, Theme, WidgetConfig};
pub use host::{EmbedHost, HostEvent, VirtualDocument};
pub use widget::{EmbedWidget, GlobalWidget, InlineEmbed, InlineKind, WidgetState};
