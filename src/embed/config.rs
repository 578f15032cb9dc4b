//! Widget configuration with documented defaults and embed URL building

use crate::error::EmbedError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

pub const DEFAULT_WIDGET_TITLE: &str = "Chat Support";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme '{}' (expected light or dark)", other)),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    #[default]
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::BottomRight => "bottom-right",
            Position::BottomLeft => "bottom-left",
            Position::TopRight => "top-right",
            Position::TopLeft => "top-left",
        }
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bottom-right" => Ok(Position::BottomRight),
            "bottom-left" => Ok(Position::BottomLeft),
            "top-right" => Ok(Position::TopRight),
            "top-left" => Ok(Position::TopLeft),
            other => Err(format!(
                "unknown position '{}' (expected bottom-right, bottom-left, top-right or top-left)",
                other
            )),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A CSS length as used by the embeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    Px(u32),
    Percent(u32),
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Px(v) => write!(f, "{}px", v),
            Length::Percent(v) => write!(f, "{}%", v),
        }
    }
}

impl FromStr for Length {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid length '{}'", s))
        };

        if let Some(v) = s.strip_suffix('%') {
            Ok(Length::Percent(parse(v)?))
        } else if let Some(v) = s.strip_suffix("px") {
            Ok(Length::Px(parse(v)?))
        } else {
            Ok(Length::Px(parse(s)?))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: Length,
    pub height: Length,
}

/// The three embed variants. They share URL building and origin rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedKind {
    /// Floating launcher + pane with open/close state
    ChatWidget,
    /// Chatbot iframe rendered in place
    InlineChatbot,
    /// Ticket form iframe rendered in place
    InlineTicketForm,
}

impl EmbedKind {
    pub fn embed_path(&self) -> &'static str {
        match self {
            EmbedKind::ChatWidget | EmbedKind::InlineChatbot => "/embed/chat",
            EmbedKind::InlineTicketForm => "/embed/form",
        }
    }

    pub fn id_param(&self) -> &'static str {
        match self {
            EmbedKind::ChatWidget | EmbedKind::InlineChatbot => "modbot_id",
            EmbedKind::InlineTicketForm => "form_id",
        }
    }

    pub fn resource_label(&self) -> &'static str {
        match self {
            EmbedKind::ChatWidget | EmbedKind::InlineChatbot => "Modbot",
            EmbedKind::InlineTicketForm => "Form",
        }
    }

    pub fn has_toggle(&self) -> bool {
        matches!(self, EmbedKind::ChatWidget)
    }

    pub fn default_dimensions(&self) -> Dimensions {
        match self {
            EmbedKind::ChatWidget => Dimensions {
                width: Length::Px(400),
                height: Length::Px(600),
            },
            EmbedKind::InlineChatbot => Dimensions {
                width: Length::Percent(100),
                height: Length::Px(500),
            },
            EmbedKind::InlineTicketForm => Dimensions {
                width: Length::Percent(100),
                height: Length::Px(400),
            },
        }
    }
}

/// Options for one embed instance; fixed for the lifetime of that instance
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetConfig {
    pub resource_id: String,
    pub theme: Theme,
    pub position: Position,
    pub title: String,
    pub dimensions: Dimensions,
}

impl WidgetConfig {
    /// Floating chat widget defaults: light, bottom-right, 400x600px, "Chat Support"
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self::for_kind(EmbedKind::ChatWidget, resource_id)
    }

    pub fn for_kind(kind: EmbedKind, resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            theme: Theme::default(),
            position: Position::default(),
            title: DEFAULT_WIDGET_TITLE.to_string(),
            dimensions: kind.default_dimensions(),
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_height(mut self, height: Length) -> Self {
        self.dimensions.height = height;
        self
    }

    pub fn with_width(mut self, width: Length) -> Self {
        self.dimensions.width = width;
        self
    }

    pub(crate) fn validate(&self, kind: EmbedKind) -> Result<(), EmbedError> {
        if self.resource_id.trim().is_empty() {
            return Err(EmbedError::MissingResourceId {
                kind: kind.resource_label().to_string(),
            });
        }
        Ok(())
    }
}

pub(crate) fn parse_api_url(api_url: &str) -> Result<Url, EmbedError> {
    crate::utils::validation::validate_url(api_url).map_err(|_| EmbedError::InvalidApiUrl {
        url: api_url.to_string(),
    })
}

/// `{api_url}/embed/{chat|form}?{id_param}=..&theme=..&embedded=true&origin=..`
pub fn build_embed_url(
    api_url: &Url,
    kind: EmbedKind,
    resource_id: &str,
    theme: Theme,
    host_origin: &str,
) -> Url {
    let mut url = api_url.clone();
    let path = format!(
        "{}{}",
        api_url.path().trim_end_matches('/'),
        kind.embed_path()
    );
    url.set_path(&path);
    url.set_query(None);
    url.set_fragment(None);
    url.query_pairs_mut()
        .append_pair(kind.id_param(), resource_id)
        .append_pair("theme", theme.as_str())
        .append_pair("embedded", "true")
        .append_pair("origin", host_origin);
    url
}
