use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Custom deserializer: accepts string or numeric IDs and normalizes to String
fn deserialize_flexible_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        _ => Ok(None),
    }
}

/// Which remote resource list to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Chatbots,
    TicketForms,
}

impl ResourceKind {
    pub fn path(&self) -> &'static str {
        match self {
            ResourceKind::Chatbots => "/modbots",
            ResourceKind::TicketForms => "/ticket-forms",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Chatbots => "modbots",
            ResourceKind::TicketForms => "ticket forms",
        }
    }

    /// Keys a list may be wrapped under in the response body
    fn envelope_keys(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::Chatbots => &["data", "modbots", "chatbots"],
            ResourceKind::TicketForms => &["data", "ticket_forms", "forms"],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A chatbot or ticket form owned by the remote service
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RemoteResource {
    #[serde(deserialize_with = "deserialize_flexible_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, alias = "fieldsCount")]
    pub fields_count: Option<u32>,
}

impl RemoteResource {
    pub fn status_or_default(&self) -> &str {
        self.status.as_deref().unwrap_or("active")
    }

    /// Shortcode a page author pastes to embed this resource
    pub fn shortcode(&self, kind: ResourceKind) -> String {
        match kind {
            ResourceKind::Chatbots => format!("[modstack-chatbot id=\"{}\"]", self.id),
            ResourceKind::TicketForms => format!("[modstack-ticket-form id=\"{}\"]", self.id),
        }
    }
}

/// Parse a listing body: a bare array, a single resource object, or an
/// object wrapping the array under one of the kind's envelope keys.
pub fn parse_resource_list(
    kind: ResourceKind,
    body: Value,
) -> Result<Vec<RemoteResource>, serde_json::Error> {
    match body {
        Value::Array(_) => serde_json::from_value(body),
        Value::Object(mut map) => {
            for key in kind.envelope_keys() {
                if let Some(inner @ Value::Array(_)) = map.remove(*key) {
                    return serde_json::from_value(inner);
                }
            }
            let single: RemoteResource = serde_json::from_value(Value::Object(map))?;
            Ok(vec![single])
        }
        Value::Null => Ok(Vec::new()),
        other => serde_json::from_value(other),
    }
}

/// Successful connection test result
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionInfo {
    pub message: String,
    pub data: Value,
}

/// Diagnostics for a failed connection test. Operator-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebugInfo {
    pub status_code: u16,
    pub response_body: String,
    pub api_url: String,
    pub api_key_length: usize,
}

/// Analytics metadata injected into relayed requests
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RequestMetadata {
    pub source: String,
    pub site_url: String,
    pub page_url: String,
}

#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub message: String,
    pub resource_id: String,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub page_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatPayload {
    pub message: String,
    pub chatbot_id: String,
    pub session_id: String,
    pub user_id: String,
    pub metadata: RequestMetadata,
}

/// Reply text arrives as `reply` or `response`; `reply` wins when both are set
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(from = "RawChatReply")]
pub struct ChatReply {
    pub reply: Option<String>,
    pub session_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawChatReply {
    #[serde(default)]
    reply: Option<String>,
    #[serde(default)]
    response: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    session_id: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RawChatReply> for ChatReply {
    fn from(raw: RawChatReply) -> Self {
        Self {
            reply: raw.reply.or(raw.response),
            session_id: raw.session_id,
            extra: raw.extra,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TicketRequest {
    pub form_id: String,
    pub form_fields: BTreeMap<String, String>,
    pub page_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TicketPayload {
    pub form_id: String,
    pub form_data: BTreeMap<String, String>,
    pub metadata: RequestMetadata,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TicketReceipt {
    #[serde(default, alias = "ticket_id", deserialize_with = "deserialize_optional_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_id_accepts_string_and_number() {
        let resource: RemoteResource =
            serde_json::from_value(json!({"id": "abc", "name": "Bot"})).unwrap();
        assert_eq!(resource.id, "abc");

        let resource: RemoteResource =
            serde_json::from_value(json!({"id": 42, "name": "Bot"})).unwrap();
        assert_eq!(resource.id, "42");

        let result: Result<RemoteResource, _> =
            serde_json::from_value(json!({"id": null, "name": "Bot"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_resource_camel_case_aliases() {
        let resource: RemoteResource = serde_json::from_value(json!({
            "id": "f1",
            "name": "Support",
            "createdAt": "2024-01-02",
            "fieldsCount": 5
        }))
        .unwrap();
        assert_eq!(resource.created_at.as_deref(), Some("2024-01-02"));
        assert_eq!(resource.fields_count, Some(5));
        assert_eq!(resource.status_or_default(), "active");
    }

    #[test]
    fn test_parse_resource_list_shapes() {
        let single = parse_resource_list(ResourceKind::Chatbots, json!({"id": "1", "name": "Bot"}))
            .unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].name, "Bot");

        let array = parse_resource_list(
            ResourceKind::Chatbots,
            json!([{"id": "1", "name": "A"}, {"id": "2", "name": "B"}]),
        )
        .unwrap();
        assert_eq!(array.len(), 2);

        let wrapped = parse_resource_list(
            ResourceKind::TicketForms,
            json!({"success": true, "forms": [{"id": 7, "name": "Contact"}]}),
        )
        .unwrap();
        assert_eq!(wrapped[0].id, "7");

        let empty = parse_resource_list(ResourceKind::Chatbots, json!([])).unwrap();
        assert!(empty.is_empty());

        assert!(parse_resource_list(ResourceKind::Chatbots, json!("nope")).is_err());
    }

    #[test]
    fn test_chat_reply_text_fields() {
        let reply: ChatReply =
            serde_json::from_value(json!({"response": "Hi", "session_id": 12})).unwrap();
        assert_eq!(reply.reply.as_deref(), Some("Hi"));
        assert_eq!(reply.session_id.as_deref(), Some("12"));

        let reply: ChatReply = serde_json::from_value(json!({
            "reply": "Primary",
            "response": "Secondary",
            "sources": []
        }))
        .unwrap();
        assert_eq!(reply.reply.as_deref(), Some("Primary"));
        assert!(reply.extra.contains_key("sources"));
        assert!(!reply.extra.contains_key("response"));
    }

    #[test]
    fn test_shortcode() {
        let resource = RemoteResource {
            id: "9".to_string(),
            name: "Bot".to_string(),
            status: None,
            description: None,
            created_at: None,
            fields_count: None,
        };
        assert_eq!(
            resource.shortcode(ResourceKind::Chatbots),
            "[modstack-chatbot id=\"9\"]"
        );
        assert_eq!(
            resource.shortcode(ResourceKind::TicketForms),
            "[modstack-ticket-form id=\"9\"]"
        );
    }

    #[test]
    fn test_chat_reply_and_ticket_receipt() {
        let reply: ChatReply =
            serde_json::from_value(json!({"response": "Hi!", "session_id": 12, "tokens": 3}))
                .unwrap();
        assert_eq!(reply.reply.as_deref(), Some("Hi!"));
        assert_eq!(reply.session_id.as_deref(), Some("12"));
        assert_eq!(reply.extra.get("tokens"), Some(&json!(3)));

        let receipt: TicketReceipt =
            serde_json::from_value(json!({"ticket_id": "T-1", "status": "open"})).unwrap();
        assert_eq!(receipt.id.as_deref(), Some("T-1"));
        assert_eq!(receipt.status.as_deref(), Some("open"));
    }
}
