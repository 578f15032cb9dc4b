//! Cross-frame message protocol between the host page and the embed iframe

use serde::Serialize;
use serde_json::Value;
use url::Url;

/// Messages the embed iframe may send to the host page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    Resize { height: u32 },
    Close,
    Notification { message: String },
}

impl InboundMessage {
    /// Parse `{type, ...payload}`. Returns `None` for anything unrecognized.
    ///
    /// `resize` accepts the height either nested (`{"payload": {"height": 650}}`)
    /// or flat (`{"height": 650}`); the nested form wins when both are present.
    pub fn parse(data: &Value) -> Option<Self> {
        let kind = data.get("type")?.as_str()?;
        match kind {
            "resize" => {
                let height = data
                    .get("payload")
                    .and_then(|p| p.get("height"))
                    .or_else(|| data.get("height"))
                    .and_then(read_height)?;
                Some(InboundMessage::Resize { height })
            }
            "close" => Some(InboundMessage::Close),
            "notification" => {
                let message = data
                    .get("payload")
                    .and_then(|p| p.get("message"))
                    .or_else(|| data.get("message"))
                    .and_then(Value::as_str)?;
                Some(InboundMessage::Notification {
                    message: message.to_string(),
                })
            }
            _ => None,
        }
    }
}

fn read_height(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .and_then(|h| u32::try_from(h).ok()),
        Value::String(s) => s.trim().trim_end_matches("px").trim().parse().ok(),
        _ => None,
    }
}

/// Messages the host page sends to the embed iframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    WidgetOpened,
    WidgetClosed,
}

impl OutboundMessage {
    /// Wire form, `{"type": "widget_opened"}`
    pub fn to_value(&self) -> Value {
        // unit variants under a string tag always serialize
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Exact-origin allow list. Opaque origins ("null") never match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginAllowList {
    origins: Vec<String>,
}

impl OriginAllowList {
    pub fn from_api_url(api_url: &Url) -> Self {
        Self {
            origins: vec![api_url.origin().ascii_serialization()],
        }
    }

    /// The origin outbound messages are targeted at
    pub fn primary(&self) -> &str {
        self.origins.first().map(String::as_str).unwrap_or("null")
    }

    pub fn allows(&self, origin: &str) -> bool {
        let Some(normalized) = normalize_origin(origin) else {
            return false;
        };
        self.origins.iter().any(|o| *o == normalized)
    }
}

fn normalize_origin(origin: &str) -> Option<String> {
    let url = Url::parse(origin.trim()).ok()?;
    let origin = url.origin();
    if !origin.is_tuple() {
        return None;
    }
    Some(origin.ascii_serialization())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_resize_nested_and_flat() {
        assert_eq!(
            InboundMessage::parse(&json!({"type": "resize", "payload": {"height": 650}})),
            Some(InboundMessage::Resize { height: 650 })
        );
        assert_eq!(
            InboundMessage::parse(&json!({"type": "resize", "height": 700})),
            Some(InboundMessage::Resize { height: 700 })
        );
        assert_eq!(
            InboundMessage::parse(&json!({"type": "resize", "height": "720px"})),
            Some(InboundMessage::Resize { height: 720 })
        );
        assert_eq!(InboundMessage::parse(&json!({"type": "resize"})), None);
        assert_eq!(
            InboundMessage::parse(&json!({"type": "resize", "height": -5})),
            None
        );
    }

    #[test]
    fn test_parse_close_and_notification() {
        assert_eq!(
            InboundMessage::parse(&json!({"type": "close"})),
            Some(InboundMessage::Close)
        );
        assert_eq!(
            InboundMessage::parse(&json!({"type": "notification", "payload": {"message": "Saved"}})),
            Some(InboundMessage::Notification {
                message: "Saved".to_string()
            })
        );
    }

    #[test]
    fn test_parse_ignores_unknown_and_malformed() {
        assert_eq!(InboundMessage::parse(&json!({"type": "explode"})), None);
        assert_eq!(InboundMessage::parse(&json!({"height": 10})), None);
        assert_eq!(InboundMessage::parse(&json!("resize")), None);
        assert_eq!(InboundMessage::parse(&json!({"type": 7})), None);
    }

    #[test]
    fn test_outbound_wire_format() {
        assert_eq!(
            serde_json::to_value(OutboundMessage::WidgetOpened).unwrap(),
            json!({"type": "widget_opened"})
        );
        assert_eq!(
            OutboundMessage::WidgetClosed.to_value(),
            json!({"type": "widget_closed"})
        );
    }

    #[test]
    fn test_origin_allow_list() {
        let api = Url::parse("https://api.modstack.ai/functions/v1").unwrap();
        let allow = OriginAllowList::from_api_url(&api);

        assert_eq!(allow.primary(), "https://api.modstack.ai");
        assert!(allow.allows("https://api.modstack.ai"));
        assert!(allow.allows("https://api.modstack.ai/"));
        assert!(!allow.allows("https://evil.example"));
        assert!(!allow.allows("http://api.modstack.ai"));
        assert!(!allow.allows("https://api.modstack.ai:8443"));
        assert!(!allow.allows("https://api.modstack.ai.evil.example"));
        assert!(!allow.allows("null"));
        assert!(!allow.allows(""));
    }
}
