//! Command-line interface parsing and handling
//!
//! Parses arguments and dispatches into either the chat UI or one of the
//! configuration subcommands.

use std::env;
use std::error::Error;
use std::fs::OpenOptions;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::core::store::Store;
use crate::ui::builtin_themes::load_builtin_themes;
use crate::ui::chat_loop::{run_chat, run_config_error_screen};

#[derive(Parser)]
#[command(name = "confidant")]
#[command(about = "A terminal companion for daily wellbeing, powered by Gemini")]
#[command(
    long_about = "Confidant is a full-screen terminal companion for checking in on your day. \
It chats over the Gemini API with streaming replies, keeps multiple named \
conversations, and records moods and journal entries locally.\n\n\
Environment Variables:\n\
  GEMINI_API_KEY    Your Google AI Studio API key (required)\n\
  RUST_LOG          Enable diagnostic logging to the data directory\n\n\
Controls:\n\
  Type              Enter your message in the input field\n\
  Enter             Send the message\n\
  Alt+Enter         Insert a newline\n\
  Esc               Stop the reply being written\n\
  PgUp/PgDn         Scroll through chat history\n\
  Ctrl+C            Quit the application\n\n\
Commands:\n\
  /help             List all slash commands\n\
  /mood             Log how you are feeling\n\
  /journal          Open the journal"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for chat (e.g. gemini-2.5-flash)
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Override the generative language API base URL
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Disable Google Search grounding for replies
    #[arg(long, global = true)]
    pub no_search: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// List the built-in color themes
    Themes,
    /// Set a configuration value
    Set {
        /// Configuration key to set (model, base-url, web-search)
        key: String,
        /// Value to store for the key
        value: String,
    },
    /// Reset a configuration value to its default
    Unset {
        /// Configuration key to unset (model, base-url, web-search)
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    match args.command.as_ref().unwrap_or(&Commands::Chat) {
        Commands::Themes => {
            println!("Built-in themes:");
            for theme in load_builtin_themes() {
                println!("  {:<10} {}", theme.id, theme.display_name);
            }
            Ok(())
        }
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            match key.as_str() {
                "model" => config.model = Some(value.clone()),
                "base-url" => config.base_url = Some(value.clone()),
                "web-search" => match value.as_str() {
                    "true" | "on" => config.web_search = Some(true),
                    "false" | "off" => config.web_search = Some(false),
                    _ => {
                        eprintln!("❌ Invalid value for web-search: {value} (use true or false)");
                        std::process::exit(1);
                    }
                },
                _ => {
                    eprintln!("❌ Unknown config key: {key}");
                    std::process::exit(1);
                }
            }
            config.save()?;
            println!("✅ Set {key} to: {value}");
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = Config::load()?;
            match key.as_str() {
                "model" => config.model = None,
                "base-url" => config.base_url = None,
                "web-search" => config.web_search = None,
                _ => {
                    eprintln!("❌ Unknown config key: {key}");
                    std::process::exit(1);
                }
            }
            config.save()?;
            println!("✅ Unset {key}");
            Ok(())
        }
        Commands::Chat => {
            let mut config = Config::load()?;
            if let Some(model) = args.model {
                config.model = Some(model);
            }
            if let Some(base_url) = args.base_url {
                config.base_url = Some(base_url);
            }
            if args.no_search {
                config.web_search = Some(false);
            }

            let store = Store::open()?;
            init_tracing(&store);

            let api_key = env::var("GEMINI_API_KEY").unwrap_or_default();
            if api_key.trim().is_empty() {
                let detail = "The GEMINI_API_KEY environment variable is not set.";
                run_config_error_screen(detail)?;
                return Err(detail.into());
            }

            run_chat(config, store, api_key).await
        }
    }
}

/// Route tracing output to a file in the data directory, but only when the
/// caller asked for it via RUST_LOG. Writing to stderr would corrupt the
/// alternate screen.
fn init_tracing(store: &Store) {
    if env::var("RUST_LOG").is_err() {
        return;
    }
    let file = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(store.log_path())
    {
        Ok(file) => file,
        Err(err) => {
            eprintln!("⚠️  Could not open log file: {err}");
            return;
        }
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
