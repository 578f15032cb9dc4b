use crate::embed::config::{Length, Position, Theme};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "modstack-cli")]
#[command(about = "Command line interface for the ModStack AI support service")]
#[command(version)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub config_dir: Option<String>,

    #[arg(long, global = true, env = "MODSTACK_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Overrides for where requests are sent
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// API base URL (overrides MODSTACK_API_URL and the config file)
    #[arg(long, global = true)]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Test the API key and URL against the service
    TestConnection {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// List remote resources
    List {
        #[command(subcommand)]
        command: ListCommands,
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Connection test and resource counts, fetched concurrently
    Status {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Relay a chat message to a chatbot
    Chat {
        /// Chatbot (modbot) ID
        #[arg(long)]
        chatbot: String,
        #[arg(long)]
        message: String,
        #[arg(long)]
        session: Option<String>,
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        page_url: Option<String>,
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Submit a ticket through a ticket form
    Ticket {
        /// Ticket form ID
        #[arg(long)]
        form: String,
        /// Form fields in key=value format
        #[arg(long = "field", action = clap::ArgAction::Append)]
        fields: Vec<String>,
        #[arg(long)]
        page_url: Option<String>,
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Webhook utilities
    Webhook {
        #[command(subcommand)]
        command: WebhookCommands,
    },
    /// Embed URL and widget preview
    Embed {
        #[command(subcommand)]
        command: EmbedCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the current configuration
    Show,
    /// Set configuration values
    Set {
        #[arg(long)]
        api_url: Option<String>,
        #[arg(long)]
        site_url: Option<String>,
        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        #[arg(long)]
        widget_enabled: Option<bool>,
        /// Chatbot shown in the site-wide widget
        #[arg(long)]
        chatbot: Option<String>,
        #[arg(long)]
        theme: Option<Theme>,
        #[arg(long)]
        position: Option<Position>,
        #[arg(long)]
        title: Option<String>,
    },
    /// Store the API key in the OS keyring (prompts unless --api-key is given)
    SetKey,
    /// Remove the stored API key
    ClearKey,
}

#[derive(Subcommand, Debug)]
pub enum ListCommands {
    /// List chatbots (modbots)
    Chatbots {
        /// Limit the number of rows shown
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List ticket forms
    TicketForms {
        /// Limit the number of rows shown
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Subcommand, Debug)]
pub enum WebhookCommands {
    /// Verify a webhook payload against its signature header
    Verify {
        /// File holding the raw request body
        #[arg(long)]
        payload: String,
        /// Value of the X-ModStack-Signature header
        #[arg(long)]
        signature: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedTarget {
    /// Floating chat widget
    Chat,
    /// Inline chatbot
    Chatbot,
    /// Inline ticket form
    Form,
}

#[derive(Args, Debug, Clone)]
pub struct EmbedArgs {
    #[arg(long, value_enum)]
    pub kind: EmbedTarget,
    /// Chatbot or ticket form ID
    #[arg(long)]
    pub id: String,
    #[arg(long, default_value = "light")]
    pub theme: Theme,
    /// Host page origin (defaults to the configured site URL)
    #[arg(long)]
    pub origin: Option<String>,
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

#[derive(Subcommand, Debug)]
pub enum EmbedCommands {
    /// Print the iframe URL for an embed
    Url {
        #[command(flatten)]
        embed: EmbedArgs,
    },
    /// Mount an embed on an in-memory page and print the result
    Preview {
        #[command(flatten)]
        embed: EmbedArgs,
        #[arg(long)]
        position: Option<Position>,
        #[arg(long)]
        title: Option<String>,
        /// Frame height, e.g. 650px or 80%
        #[arg(long)]
        height: Option<Length>,
        /// Open the floating widget after mounting
        #[arg(long)]
        open: bool,
    },
    /// Install the site-wide widget from the saved widget settings
    Global {
        /// Host page origin (defaults to the configured site URL)
        #[arg(long)]
        origin: Option<String>,
        /// Open the widget after installing
        #[arg(long)]
        open: bool,
        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ticket_fields() {
        let cli = Cli::try_parse_from([
            "modstack-cli",
            "ticket",
            "--form",
            "f1",
            "--field",
            "email=a@b.test",
            "--field",
            "subject=Help",
        ])
        .unwrap();

        match cli.command {
            Commands::Ticket { form, fields, .. } => {
                assert_eq!(form, "f1");
                assert_eq!(fields, vec!["email=a@b.test", "subject=Help"]);
            }
            _ => panic!("expected ticket command"),
        }
    }

    #[test]
    fn test_parse_embed_args() {
        let cli = Cli::try_parse_from([
            "modstack-cli",
            "embed",
            "url",
            "--kind",
            "form",
            "--id",
            "f1",
            "--theme",
            "dark",
        ])
        .unwrap();

        match cli.command {
            Commands::Embed {
                command: EmbedCommands::Url { embed },
            } => {
                assert_eq!(embed.kind, EmbedTarget::Form);
                assert_eq!(embed.theme, Theme::Dark);
                assert!(embed.origin.is_none());
            }
            _ => panic!("expected embed url command"),
        }
    }

    #[test]
    fn test_rejects_unknown_theme() {
        let result = Cli::try_parse_from([
            "modstack-cli",
            "config",
            "set",
            "--theme",
            "neon",
        ]);
        assert!(result.is_err());
    }
}
