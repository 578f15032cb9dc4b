//! Inbound webhook verification and dispatch.
//!
//! The remote service signs each webhook body with the site's API key:
//! `X-ModStack-Signature: sha256=<hex(HMAC-SHA256(body, api_key))>`.

use crate::error::WebhookError;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-ModStack-Signature";
const SIGNATURE_PREFIX: &str = "sha256=";

/// Compute the `sha256=<hex>` signature header value for a payload.
pub fn compute_signature(payload: &[u8], api_key: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(api_key.as_bytes()).ok()?;
    mac.update(payload);
    Some(format!(
        "{}{}",
        SIGNATURE_PREFIX,
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Check a signature header against the payload. Never panics; an empty key
/// or header is always a mismatch.
pub fn verify_webhook_signature(payload: &[u8], signature_header: &str, api_key: &str) -> bool {
    if api_key.is_empty() || signature_header.is_empty() {
        return false;
    }

    let Some(expected) = compute_signature(payload, api_key) else {
        log::warn!("failed to create HMAC for webhook verification");
        return false;
    };

    expected.as_bytes().ct_eq(signature_header.as_bytes()).into()
}

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    TicketCreated(Value),
    TicketUpdated(Value),
    ChatMessage(Value),
    Unknown(String),
}

impl WebhookEvent {
    pub fn name(&self) -> &str {
        match self {
            WebhookEvent::TicketCreated(_) => "ticket.created",
            WebhookEvent::TicketUpdated(_) => "ticket.updated",
            WebhookEvent::ChatMessage(_) => "chat.message",
            WebhookEvent::Unknown(name) => name,
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    data: Value,
}

pub fn parse_event(body: &[u8]) -> Result<WebhookEvent, WebhookError> {
    let envelope: Envelope =
        serde_json::from_slice(body).map_err(|e| WebhookError::InvalidPayload {
            message: e.to_string(),
        })?;

    Ok(match envelope.event.as_deref() {
        Some("ticket.created") => WebhookEvent::TicketCreated(envelope.data),
        Some("ticket.updated") => WebhookEvent::TicketUpdated(envelope.data),
        Some("chat.message") => WebhookEvent::ChatMessage(envelope.data),
        Some(other) => WebhookEvent::Unknown(other.to_string()),
        None => WebhookEvent::Unknown("none".to_string()),
    })
}

/// Receives dispatched webhook events. Implemented by the host integration.
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    async fn ticket_created(&self, data: &Value);
    async fn ticket_updated(&self, data: &Value);
    async fn chat_message(&self, data: &Value);
}

/// Handler that only logs; used when no integration is wired in.
#[derive(Debug, Default)]
pub struct LoggingHandler;

#[async_trait]
impl WebhookHandler for LoggingHandler {
    async fn ticket_created(&self, data: &Value) {
        log::info!("ticket.created: {}", data);
    }

    async fn ticket_updated(&self, data: &Value) {
        log::info!("ticket.updated: {}", data);
    }

    async fn chat_message(&self, data: &Value) {
        log::info!("chat.message: {}", data);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    pub body: &'static str,
    /// Name of the dispatched event, for accepted requests
    pub event: Option<String>,
}

impl WebhookResponse {
    fn ok(event: &WebhookEvent) -> Self {
        Self {
            status: 200,
            body: "OK",
            event: Some(event.name().to_string()),
        }
    }

    fn unauthorized() -> Self {
        Self {
            status: 401,
            body: "Invalid signature",
            event: None,
        }
    }

    fn bad_request() -> Self {
        Self {
            status: 400,
            body: "Invalid JSON",
            event: None,
        }
    }
}

pub struct WebhookReceiver<H> {
    api_key: Option<String>,
    handler: H,
}

impl<H: WebhookHandler> WebhookReceiver<H> {
    pub fn new(api_key: Option<String>, handler: H) -> Self {
        Self { api_key, handler }
    }

    pub fn verify(&self, payload: &[u8], signature_header: &str) -> bool {
        verify_webhook_signature(
            payload,
            signature_header,
            self.api_key.as_deref().unwrap_or_default(),
        )
    }

    /// Verify, parse and dispatch one webhook request.
    ///
    /// The payload is not parsed at all unless the signature matches.
    pub async fn receive(&self, body: &[u8], signature_header: Option<&str>) -> WebhookResponse {
        if !self.verify(body, signature_header.unwrap_or_default()) {
            log::warn!("rejected webhook with invalid signature");
            return WebhookResponse::unauthorized();
        }

        let event = match parse_event(body) {
            Ok(event) => event,
            Err(e) => {
                log::warn!("{}", e);
                return WebhookResponse::bad_request();
            }
        };

        self.dispatch(&event).await;
        WebhookResponse::ok(&event)
    }

    pub async fn dispatch(&self, event: &WebhookEvent) {
        match event {
            WebhookEvent::TicketCreated(data) => self.handler.ticket_created(data).await,
            WebhookEvent::TicketUpdated(data) => self.handler.ticket_updated(data).await,
            WebhookEvent::ChatMessage(data) => self.handler.chat_message(data).await,
            WebhookEvent::Unknown(name) => log::warn!("Unknown ModStack webhook event: {}", name),
        }
    }
}
