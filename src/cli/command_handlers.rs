use crate::api::client::ModStackClient;
use crate::api::models::{ChatRequest, ResourceKind, TicketRequest};
use crate::api::webhook::{LoggingHandler, WebhookReceiver};
use crate::cli::main_types::{
    ConfigCommands, EmbedCommands, EmbedTarget, ListCommands, WebhookCommands,
};
use crate::core::services::config_service::ConfigService;
use crate::core::services::connection_service::ConnectionService;
use crate::core::services::resource_service::ResourceService;
use crate::display::TableDisplay;
use crate::embed::config::WidgetConfig;
use crate::embed::host::VirtualDocument;
use crate::embed::widget::{EmbedWidget, GlobalWidget, InlineEmbed, InlineKind};
use crate::error::{AppError, CliError, EmbedError, StorageError, WebhookError};
use crate::storage::config::Config;
use crate::storage::credentials::Credentials;
use crate::utils::error_helpers::convert_io_to_display_error;
use crate::utils::logging::print_verbose;
use crate::utils::validation::validate_api_key;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

const LOCAL_ORIGIN: &str = "http://localhost";

#[derive(Default)]
pub struct ConfigHandler;

impl ConfigHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle(
        &self,
        command: ConfigCommands,
        config: &Config,
        config_path: Option<PathBuf>,
        api_key: Option<&str>,
        key_status: &str,
        verbose: bool,
    ) -> Result<(), AppError> {
        match command {
            ConfigCommands::Show => {
                print_verbose(verbose, "Attempting config show command");

                let widget = &config.widget;
                let rows = vec![
                    ("api_url", config.get_api_url(None)),
                    (
                        "site_url",
                        config.site_url.clone().unwrap_or_else(|| "(not set)".to_string()),
                    ),
                    ("timeout_seconds", config.timeout_secs().to_string()),
                    ("api_key", key_status.to_string()),
                    ("widget.enabled", widget.enabled.to_string()),
                    (
                        "widget.chatbot",
                        if widget.chatbot_id.is_empty() {
                            "(not set)".to_string()
                        } else {
                            widget.chatbot_id.clone()
                        },
                    ),
                    ("widget.theme", widget.theme.to_string()),
                    ("widget.position", widget.position.to_string()),
                    ("widget.title", widget.title.clone()),
                ];

                println!("Current Configuration:");
                println!("{}", TableDisplay::new().render_settings(&rows)?);
                Ok(())
            }
            ConfigCommands::Set {
                api_url,
                site_url,
                timeout,
                widget_enabled,
                chatbot,
                theme,
                position,
                title,
            } => {
                print_verbose(verbose, "Attempting config set command");

                let updates: Vec<(&str, String)> = [
                    ("api-url", api_url),
                    ("site-url", site_url),
                    ("timeout", timeout.map(|t| t.to_string())),
                    ("widget.enabled", widget_enabled.map(|e| e.to_string())),
                    ("widget.chatbot", chatbot),
                    ("widget.theme", theme.map(|t| t.to_string())),
                    ("widget.position", position.map(|p| p.to_string())),
                    ("widget.title", title),
                ]
                .into_iter()
                .filter_map(|(field, value)| value.map(|v| (field, v)))
                .collect();

                if updates.is_empty() {
                    return Err(AppError::Cli(CliError::InvalidArguments(
                        "Nothing to set. Pass at least one option, e.g. --api-url".to_string(),
                    )));
                }

                let mut service = ConfigService::new(config.clone());
                for (field, value) in &updates {
                    service.set_field(field, value)?;
                    print_verbose(verbose, &format!("Set {} = {}", field, value));
                }
                service.save_config(config_path)?;

                println!("✅ Configuration saved ({} setting(s) updated)", updates.len());
                Ok(())
            }
            ConfigCommands::SetKey => {
                print_verbose(verbose, "Attempting config set-key command");

                let key = match api_key.filter(|k| !k.trim().is_empty()) {
                    Some(key) => key.trim().to_string(),
                    None => rpassword::prompt_password("ModStack API key: ")
                        .map_err(|e| CliError::Input(e.to_string()))?
                        .trim()
                        .to_string(),
                };
                validate_api_key(&key)?;

                let mut credentials = Credentials::default();
                credentials.set_api_key(key);
                credentials.save()?;

                println!("✅ API key stored in the OS keyring");
                Ok(())
            }
            ConfigCommands::ClearKey => {
                print_verbose(verbose, "Attempting config clear-key command");
                Credentials::default().clear()?;
                println!("✅ Stored API key removed");
                Ok(())
            }
        }
    }
}

#[derive(Default)]
pub struct ConnectionHandler;

impl ConnectionHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle(
        &self,
        client: ModStackClient,
        api_key: &str,
        api_url: &str,
        verbose: bool,
    ) -> Result<(), AppError> {
        print_verbose(verbose, &format!("Testing connection to {}", api_url));

        let mut service = ConnectionService::new(Arc::new(client));
        match service.test(api_key, api_url).await {
            Ok(info) => {
                println!("✅ {}", info.message);
                print_verbose(verbose, &format!("Response: {}", info.data));
                Ok(())
            }
            Err(e) => {
                // debug payloads are operator-only
                let debug = e.debug_info().filter(|_| verbose).map(|debug| {
                    serde_json::to_string_pretty(debug).unwrap_or_else(|_| format!("{:?}", debug))
                });

                let error = AppError::Api(e);
                println!("❌ Connection failed: {}", error.display_friendly());
                if let Some(debug) = debug {
                    println!("Debug info:\n{}", debug);
                }
                Err(error)
            }
        }
    }
}

#[derive(Default)]
pub struct ListHandler;

impl ListHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle(
        &self,
        command: ListCommands,
        client: ModStackClient,
        verbose: bool,
    ) -> Result<(), AppError> {
        let (kind, limit) = match command {
            ListCommands::Chatbots { limit } => (ResourceKind::Chatbots, limit),
            ListCommands::TicketForms { limit } => (ResourceKind::TicketForms, limit),
        };
        print_verbose(verbose, &format!("Fetching {}", kind));

        let service = ResourceService::new(Arc::new(client));
        let resources = service.list(kind).await?;

        if resources.is_empty() {
            println!("No {} found", kind);
            return Ok(());
        }

        println!("Found {} {}", resources.len(), kind);
        println!(
            "{}",
            TableDisplay::new().render_resources(kind, &resources, limit)?
        );
        Ok(())
    }
}

#[derive(Default)]
pub struct StatusHandler;

impl StatusHandler {
    pub fn new() -> Self {
        Self
    }

    /// Connection test and both listings run concurrently
    pub async fn handle(
        &self,
        client: ModStackClient,
        api_key: &str,
        api_url: &str,
        verbose: bool,
    ) -> Result<(), AppError> {
        print_verbose(verbose, "Checking connection and resources concurrently");

        let client = Arc::new(client);
        let mut connection = ConnectionService::new(Arc::clone(&client));
        let resources = ResourceService::new(client);

        let (connected, chatbots, forms) = futures::join!(
            connection.test(api_key, api_url),
            resources.list(ResourceKind::Chatbots),
            resources.list(ResourceKind::TicketForms),
        );

        println!("ModStack Status:");
        println!("================");
        println!("API URL: {}", api_url);
        match &connected {
            Ok(info) => println!("Connection: ✅ {}", info.message),
            Err(e) => println!("Connection: ❌ {}", e),
        }
        for (kind, result) in [(ResourceKind::Chatbots, &chatbots), (ResourceKind::TicketForms, &forms)] {
            match result {
                Ok(list) => println!("{}: {}", kind, list.len()),
                Err(e) => println!("{}: ❌ {}", kind, e),
            }
        }

        connected.map(|_| ()).map_err(AppError::Api)
    }
}

#[derive(Default)]
pub struct MessageHandler;

impl MessageHandler {
    pub fn new() -> Self {
        Self
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn chat(
        &self,
        client: &ModStackClient,
        chatbot: String,
        message: String,
        session: Option<String>,
        user: Option<String>,
        page_url: Option<String>,
        verbose: bool,
    ) -> Result<(), AppError> {
        print_verbose(verbose, &format!("Sending chat message to {}", chatbot));

        let reply = client
            .send_chat_message(ChatRequest {
                message,
                resource_id: chatbot,
                session_id: session,
                user_id: user,
                page_url,
            })
            .await?;

        match &reply.reply {
            Some(text) => println!("{}", text),
            None => println!("(no reply text)"),
        }
        if let Some(session_id) = &reply.session_id {
            print_verbose(verbose, &format!("Session: {}", session_id));
        }
        Ok(())
    }

    pub async fn ticket(
        &self,
        client: &ModStackClient,
        form: String,
        fields: &[String],
        page_url: Option<String>,
        verbose: bool,
    ) -> Result<(), AppError> {
        let form_fields = parse_fields(fields)?;
        print_verbose(
            verbose,
            &format!("Submitting {} field(s) to form {}", form_fields.len(), form),
        );

        let receipt = client
            .submit_ticket(TicketRequest {
                form_id: form,
                form_fields,
                page_url,
            })
            .await?;

        match &receipt.id {
            Some(id) => println!("✅ Ticket submitted: {}", id),
            None => println!("✅ Ticket submitted"),
        }
        if let Some(status) = &receipt.status {
            println!("Status: {}", status);
        }
        Ok(())
    }
}

/// `key=value` pairs; the value may itself contain `=`
pub fn parse_fields(fields: &[String]) -> Result<BTreeMap<String, String>, AppError> {
    fields
        .iter()
        .map(|field| {
            field
                .split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .filter(|(k, _)| !k.is_empty())
                .ok_or_else(|| {
                    AppError::Cli(CliError::InvalidArguments(format!(
                        "Invalid field '{}'. Use key=value",
                        field
                    )))
                })
        })
        .collect()
}

#[derive(Default)]
pub struct WebhookCommandHandler;

impl WebhookCommandHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle(
        &self,
        command: WebhookCommands,
        api_key: Option<String>,
        verbose: bool,
    ) -> Result<(), AppError> {
        match command {
            WebhookCommands::Verify { payload, signature } => {
                print_verbose(verbose, &format!("Reading webhook payload from {}", payload));

                let body = std::fs::read(&payload).map_err(|source| StorageError::FileIo {
                    path: payload.clone(),
                    source,
                })?;

                let receiver = WebhookReceiver::new(api_key, LoggingHandler);
                let response = receiver.receive(&body, Some(signature.trim())).await;
                let status_line = format!("{} {}", response.status, response.body);

                match response.status {
                    200 => {
                        println!("✅ Signature valid ({})", status_line);
                        if let Some(event) = &response.event {
                            println!("Event: {}", event);
                        }
                    }
                    401 => {
                        println!("❌ Signature does not match ({})", status_line);
                        return Err(AppError::Webhook(WebhookError::SignatureInvalid));
                    }
                    _ => {
                        println!("❌ Payload rejected ({})", status_line);
                        return Err(AppError::Webhook(WebhookError::InvalidPayload {
                            message: response.body.to_string(),
                        }));
                    }
                }
                Ok(())
            }
        }
    }
}

#[derive(Default)]
pub struct EmbedHandler;

impl EmbedHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, command: EmbedCommands, config: &Config, verbose: bool) -> Result<(), AppError> {
        match command {
            EmbedCommands::Url { embed } => {
                let mut doc = self.document(embed.origin.as_deref(), config);
                let api_url = config.get_api_url(embed.connection.api_url.as_deref());
                let url = match inline_kind(embed.kind) {
                    None => {
                        let widget = EmbedWidget::mount(
                            WidgetConfig::new(embed.id.as_str()).with_theme(embed.theme),
                            &api_url,
                            &mut doc,
                        )?;
                        widget.iframe_url().to_string()
                    }
                    Some(kind) => {
                        let inline = InlineEmbed::mount(
                            kind,
                            WidgetConfig::for_kind(kind.embed_kind(), embed.id.as_str())
                                .with_theme(embed.theme),
                            &api_url,
                            &mut doc,
                            None,
                        )?;
                        inline.iframe_url().to_string()
                    }
                };
                println!("{}", url);
                Ok(())
            }
            EmbedCommands::Preview {
                embed,
                position,
                title,
                height,
                open,
            } => {
                let mut doc = self.document(embed.origin.as_deref(), config);
                let api_url = config.get_api_url(embed.connection.api_url.as_deref());
                print_verbose(verbose, &format!("Mounting {:?} embed from {}", embed.kind, api_url));

                let url = match inline_kind(embed.kind) {
                    None => {
                        let mut widget_config =
                            WidgetConfig::new(embed.id.as_str()).with_theme(embed.theme);
                        widget_config.position = position.unwrap_or_default();
                        if let Some(title) = title {
                            widget_config.title = title;
                        }
                        if let Some(height) = height {
                            widget_config = widget_config.with_height(height);
                        }
                        let mut widget = EmbedWidget::mount(widget_config, &api_url, &mut doc)?;
                        if open {
                            widget.open(&mut doc);
                        }
                        widget.iframe_url().to_string()
                    }
                    Some(kind) => {
                        let mut inline_config =
                            WidgetConfig::for_kind(kind.embed_kind(), embed.id.as_str())
                                .with_theme(embed.theme);
                        if let Some(height) = height {
                            inline_config = inline_config.with_height(height);
                        }
                        let inline =
                            InlineEmbed::mount(kind, inline_config, &api_url, &mut doc, None)?;
                        inline.iframe_url().to_string()
                    }
                };

                self.print_document(&url, &doc, "embed preview")
            }
            EmbedCommands::Global {
                origin,
                open,
                connection,
            } => {
                let widget_config = config.widget_config().ok_or(EmbedError::NotConfigured)?;
                let mut doc = self.document(origin.as_deref(), config);
                let api_url = config.get_api_url(connection.api_url.as_deref());
                print_verbose(
                    verbose,
                    &format!("Installing global widget for {}", widget_config.resource_id),
                );

                let mut global = GlobalWidget::new();
                let widget = global.install(widget_config, &api_url, &mut doc)?;
                if open {
                    widget.open(&mut doc);
                }
                let url = widget.iframe_url().to_string();

                self.print_document(&url, &doc, "embed global")
            }
        }
    }

    fn print_document(&self, url: &str, doc: &VirtualDocument, operation: &str) -> Result<(), AppError> {
        let mut output = format!("iframe: {}\n\n{}", url, doc.render());
        for message in doc.posted_messages() {
            output.push_str(&format!(
                "\nposted {} -> {}",
                message.message, message.target_origin
            ));
        }

        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", output.trim_end())
            .map_err(|e| convert_io_to_display_error(e, operation))?;
        Ok(())
    }

    fn document(&self, origin: Option<&str>, config: &Config) -> VirtualDocument {
        let origin = origin
            .map(str::to_string)
            .or_else(|| config.site_url.clone())
            .unwrap_or_else(|| LOCAL_ORIGIN.to_string());
        VirtualDocument::new(origin)
    }
}

fn inline_kind(target: EmbedTarget) -> Option<InlineKind> {
    match target {
        EmbedTarget::Chat => None,
        EmbedTarget::Chatbot => Some(InlineKind::Chatbot),
        EmbedTarget::Form => Some(InlineKind::TicketForm),
    }
}
