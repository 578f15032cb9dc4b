use crate::api::models::{
    ChatPayload, ChatReply, ChatRequest, ConnectionInfo, DebugInfo, RemoteResource,
    RequestMetadata, ResourceKind, TicketPayload, TicketReceipt, TicketRequest,
    parse_resource_list,
};
use crate::error::ApiError;
use crate::utils::error_helpers::{convert_json_error, convert_request_error};
use crate::utils::text::{sanitize_key, sanitize_text};
use crate::utils::validation::{require_param, validate_api_key, validate_url};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Shorter timeout for the interactive connection test
pub const CONNECTION_TEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_API_URL: &str = "https://api.modstack.ai";
/// `source` value injected into relayed request metadata
pub const METADATA_SOURCE: &str = "host-cms";
const USER_AGENT: &str = concat!("ModStack-Relay/", env!("CARGO_PKG_VERSION"));
const CONNECTION_FAILED_MESSAGE: &str = "Authentication failed. Please check your API key.";
const API_FAILED_MESSAGE: &str = "API request failed";

#[derive(Debug, Clone)]
pub struct ModStackClient {
    client: Client,
    pub base_url: String,
    api_key: Option<String>,
    site_url: String,
    timeout_secs: u64,
}

impl ModStackClient {
    // Create baseClient with default settings
    pub fn new(base_url: String) -> Result<Self, ApiError> {
        validate_url(&base_url)?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| convert_request_error(e, "client_init", DEFAULT_TIMEOUT_SECS))?;

        Ok(ModStackClient {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            api_key: None,
            site_url: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    pub fn with_api_key(base_url: String, api_key: String) -> Result<Self, ApiError> {
        let mut client = ModStackClient::new(base_url)?;
        if !api_key.trim().is_empty() {
            client.api_key = Some(api_key.trim().to_string());
        }
        Ok(client)
    }

    /// Site URL reported in relayed request metadata
    pub fn with_site_url(mut self, site_url: impl Into<String>) -> Self {
        self.site_url = site_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs.max(1);
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Request against the admin endpoints, authenticated with `x-api-key`
    pub fn build_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .timeout(Duration::from_secs(self.timeout_secs));

        if let Some(api_key) = &self.api_key {
            request = request.header("x-api-key", api_key);
        }

        request
    }

    /// Request against the `/api/v1` endpoints, authenticated with a bearer token
    pub fn build_v1_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .timeout(Duration::from_secs(self.timeout_secs));

        if let Some(api_key) = &self.api_key {
            request = request.header(AUTHORIZATION, format!("Bearer {}", api_key));
        }

        request
    }

    /// Test a candidate key/URL pair without touching the stored credentials.
    ///
    /// Local validation failures return before any request is sent.
    pub async fn test_connection(
        &self,
        api_key: &str,
        api_url: &str,
    ) -> Result<ConnectionInfo, ApiError> {
        let api_key = api_key.trim();
        let api_url = api_url.trim();
        if api_key.is_empty() {
            return Err(ApiError::MissingParameter {
                parameter: "api_key".to_string(),
            });
        }
        if api_url.is_empty() {
            return Err(ApiError::MissingParameter {
                parameter: "api_url".to_string(),
            });
        }
        validate_api_key(api_key)?;
        validate_url(api_url)?;

        let endpoint = "/test-connection";
        let url = format!("{}{}", api_url.trim_end_matches('/'), endpoint);
        let timeout_secs = self.timeout_secs.min(CONNECTION_TEST_TIMEOUT_SECS);
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", api_key)
            .header(CONTENT_TYPE, "application/json")
            .timeout(Duration::from_secs(timeout_secs))
            .send()
            .await
            .map_err(|e| convert_request_error(e, endpoint, timeout_secs))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| convert_request_error(e, endpoint, timeout_secs))?;

        let parsed = serde_json::from_str::<Value>(&body);
        match (status, parsed) {
            (200, Ok(data)) => Ok(ConnectionInfo {
                message: "Connection successful!".to_string(),
                data,
            }),
            (_, parsed) => {
                let message = parsed
                    .ok()
                    .as_ref()
                    .and_then(remote_message)
                    .unwrap_or_else(|| CONNECTION_FAILED_MESSAGE.to_string());
                log::warn!("Connection test failed with status {}", status);

                Err(ApiError::Remote {
                    status,
                    endpoint: endpoint.to_string(),
                    message,
                    debug: Some(Box::new(DebugInfo {
                        status_code: status,
                        response_body: body,
                        api_url: url,
                        api_key_length: api_key.len(),
                    })),
                })
            }
        }
    }

    /// List chatbots or ticket forms using the stored API key
    pub async fn list_resources(&self, kind: ResourceKind) -> Result<Vec<RemoteResource>, ApiError> {
        if !self.is_configured() {
            return Err(ApiError::NotConfigured);
        }

        let endpoint = kind.path();
        log::debug!("GET {}{}", self.base_url, endpoint);

        let response = self
            .build_request(Method::GET, endpoint)
            .send()
            .await
            .map_err(|e| convert_request_error(e, endpoint, self.timeout_secs))?;

        let status = response.status().as_u16();
        let fetch_failed = || ApiError::FetchFailed {
            kind: kind.label().to_string(),
            status,
        };

        if status != 200 {
            log::warn!("Listing {} failed with status {}", kind, status);
            return Err(fetch_failed());
        }

        let body: Value = response.json().await.map_err(|_| fetch_failed())?;
        parse_resource_list(kind, body).map_err(|e| {
            log::warn!("Unexpected {} listing shape: {}", kind, e);
            fetch_failed()
        })
    }

    pub async fn send_chat_message(&self, request: ChatRequest) -> Result<ChatReply, ApiError> {
        let message = require_param(Some(&request.message), "message")?;
        let resource_id = require_param(Some(&request.resource_id), "chatbot_id")?;
        if !self.is_configured() {
            return Err(ApiError::NotConfigured);
        }

        let payload = ChatPayload {
            message: sanitize_text(message),
            chatbot_id: sanitize_text(resource_id),
            session_id: sanitize_text(request.session_id.as_deref().unwrap_or_default()),
            user_id: sanitize_text(request.user_id.as_deref().unwrap_or_default()),
            metadata: self.metadata(request.page_url.as_deref()),
        };

        let endpoint = "/api/v1/chat";
        let response = self
            .build_v1_request(Method::POST, endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| convert_request_error(e, endpoint, self.timeout_secs))?;

        self.handle_response(response, endpoint).await
    }

    pub async fn submit_ticket(&self, request: TicketRequest) -> Result<TicketReceipt, ApiError> {
        let form_id = require_param(Some(&request.form_id), "form_id")?;
        if !self.is_configured() {
            return Err(ApiError::NotConfigured);
        }

        let form_data: BTreeMap<String, String> = request
            .form_fields
            .iter()
            .map(|(key, value)| (sanitize_key(key), sanitize_text(value)))
            .filter(|(key, _)| !key.is_empty())
            .collect();

        let payload = TicketPayload {
            form_id: sanitize_text(form_id),
            form_data,
            metadata: self.metadata(request.page_url.as_deref()),
        };

        let endpoint = "/api/v1/tickets";
        let response = self
            .build_v1_request(Method::POST, endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| convert_request_error(e, endpoint, self.timeout_secs))?;

        self.handle_response(response, endpoint).await
    }

    fn metadata(&self, page_url: Option<&str>) -> RequestMetadata {
        let page_url = page_url
            .and_then(|url| validate_url(url).ok())
            .map(|url| url.to_string())
            .unwrap_or_default();

        RequestMetadata {
            source: METADATA_SOURCE.to_string(),
            site_url: self.site_url.clone(),
            page_url,
        }
    }

    pub async fn handle_response<T>(&self, response: Response, endpoint: &str) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| convert_request_error(e, endpoint, self.timeout_secs))?;

        if status >= 400 {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .as_ref()
                .and_then(remote_message)
                .unwrap_or_else(|| API_FAILED_MESSAGE.to_string());

            return Err(ApiError::Remote {
                status,
                endpoint: endpoint.to_string(),
                message,
                debug: None,
            });
        }

        serde_json::from_str(&body).map_err(|e| convert_json_error(e, status, endpoint))
    }
}

fn remote_message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}
