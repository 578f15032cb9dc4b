use crate::api::client::{DEFAULT_API_URL, ModStackClient};
use crate::cli::command_handlers::{
    ConfigHandler, ConnectionHandler, EmbedHandler, ListHandler, MessageHandler, StatusHandler,
    WebhookCommandHandler,
};
use crate::cli::main_types::{Commands, ConnectionArgs};
use crate::error::AppError;
use crate::storage::config::Config;
use crate::storage::credentials::{Credentials, KeySource};
use crate::utils::logging::print_verbose;
use crate::utils::text::mask_secret;
use std::path::PathBuf;

pub struct Dispatcher {
    config: Config,
    config_path: Option<PathBuf>,
    verbose: bool,
    api_key: Option<String>,
}

impl Dispatcher {
    pub fn new(
        config: Config,
        config_path: Option<PathBuf>,
        verbose: bool,
        api_key: Option<String>,
    ) -> Self {
        Self {
            config,
            config_path,
            verbose,
            api_key,
        }
    }

    fn log_verbose(&self, msg: &str) {
        print_verbose(self.verbose, msg);
    }

    /// `--api-key`/`MODSTACK_API_KEY` first; the keyring is only read when
    /// neither is set
    fn resolve_api_key(&self) -> (Option<String>, KeySource) {
        let has_explicit = self.api_key.as_ref().is_some_and(|k| !k.trim().is_empty())
            || Credentials::get_api_key().is_some();

        let credentials = if has_explicit {
            Credentials::default()
        } else {
            match Credentials::load_default() {
                Ok(credentials) => credentials,
                Err(e) => {
                    log::warn!("could not read the OS keyring: {}", e);
                    Credentials::default()
                }
            }
        };

        let (key, source) = credentials.resolve(self.api_key.as_deref());
        self.log_verbose(&format!("API key source: {:?}", source));
        (key, source)
    }

    fn key_status(&self) -> String {
        match self.resolve_api_key() {
            (Some(key), source) => format!("{} ({:?})", mask_secret(&key), source),
            (None, _) => "(not set)".to_string(),
        }
    }

    fn create_client(
        &self,
        connection: &ConnectionArgs,
        api_key: Option<String>,
    ) -> Result<ModStackClient, AppError> {
        let api_url = self.config.get_api_url(connection.api_url.as_deref());
        self.log_verbose(&format!("Using API URL: {}", api_url));

        let mut client = match api_key {
            Some(key) => ModStackClient::with_api_key(api_url, key)?,
            None => ModStackClient::new(api_url)?,
        }
        .with_timeout(self.config.timeout_secs());

        if let Some(site_url) = &self.config.site_url {
            client = client.with_site_url(site_url.clone());
        }
        Ok(client)
    }

    pub async fn dispatch(&self, command: Commands) -> Result<(), AppError> {
        match command {
            Commands::Config { command } => {
                ConfigHandler::new()
                    .handle(
                        command,
                        &self.config,
                        self.config_path.clone(),
                        self.api_key.as_deref(),
                        &self.key_status(),
                        self.verbose,
                    )
                    .await
            }
            Commands::TestConnection { connection } => {
                // the candidate URL is validated by the test itself, after the key
                let client = ModStackClient::new(DEFAULT_API_URL.to_string())?
                    .with_timeout(self.config.timeout_secs());
                let api_key = self.resolve_api_key().0.unwrap_or_default();
                let api_url = self.config.get_api_url(connection.api_url.as_deref());
                ConnectionHandler::new()
                    .handle(client, &api_key, &api_url, self.verbose)
                    .await
            }
            Commands::List {
                command,
                connection,
            } => {
                let client = self.create_client(&connection, self.resolve_api_key().0)?;
                ListHandler::new().handle(command, client, self.verbose).await
            }
            Commands::Status { connection } => {
                let api_key = self.resolve_api_key().0;
                let client = self.create_client(&connection, api_key.clone())?;
                let api_key = api_key.unwrap_or_default();
                let api_url = self.config.get_api_url(connection.api_url.as_deref());
                StatusHandler::new()
                    .handle(client, &api_key, &api_url, self.verbose)
                    .await
            }
            Commands::Chat {
                chatbot,
                message,
                session,
                user,
                page_url,
                connection,
            } => {
                let client = self.create_client(&connection, self.resolve_api_key().0)?;
                MessageHandler::new()
                    .chat(&client, chatbot, message, session, user, page_url, self.verbose)
                    .await
            }
            Commands::Ticket {
                form,
                fields,
                page_url,
                connection,
            } => {
                let client = self.create_client(&connection, self.resolve_api_key().0)?;
                MessageHandler::new()
                    .ticket(&client, form, &fields, page_url, self.verbose)
                    .await
            }
            Commands::Webhook { command } => {
                let api_key = self.resolve_api_key().0;
                WebhookCommandHandler::new()
                    .handle(command, api_key, self.verbose)
                    .await
            }
            Commands::Embed { command } => {
                EmbedHandler::new().handle(command, &self.config, self.verbose)
            }
        }
    }
}
