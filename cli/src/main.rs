mod commands;
mod config;
mod transport;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::Config;
use transport::HttpTransport;

#[derive(Parser)]
#[command(name = "wa-tester")]
#[command(about = "Manually exercise a WhatsApp-sending backend API")]
#[command(version)]
struct Cli {
    /// Backend API root (overrides WA_TESTER_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message and print the backend's response
    Send {
        #[command(subcommand)]
        kind: SendKind,
    },
    /// List messages known to the backend
    Messages {
        #[arg(long, default_value_t = wa_tester_core::client::DEFAULT_PAGE)]
        page: u32,
        #[arg(long, default_value_t = wa_tester_core::client::DEFAULT_LIMIT)]
        limit: u32,
    },
    /// Show the backend's phone status
    Status,
}

#[derive(Subcommand)]
pub(crate) enum SendKind {
    /// Plain text message
    Text {
        #[command(flatten)]
        recipient: Recipient,
        #[arg(long)]
        message: String,
    },
    /// Image by URL, or uploaded from a local file
    Image(MediaArgs),
    /// Document by URL
    Document(DocumentArgs),
    /// Audio by URL, or uploaded from a local file
    Audio(MediaArgs),
    /// Coordinates with an optional address
    Location(LocationArgs),
}

#[derive(Args)]
pub(crate) struct Recipient {
    /// Phone number or group id
    #[arg(long)]
    pub(crate) to: String,
    /// Treat the recipient as a group
    #[arg(long)]
    pub(crate) group: bool,
}

#[derive(Args)]
pub(crate) struct MediaArgs {
    #[command(flatten)]
    pub(crate) recipient: Recipient,
    /// Public URL of the media
    #[arg(long, required_unless_present = "file", conflicts_with = "file")]
    pub(crate) url: Option<String>,
    /// Upload this file to the asset host first
    #[arg(long)]
    pub(crate) file: Option<PathBuf>,
    #[arg(long)]
    pub(crate) caption: Option<String>,
}

#[derive(Args)]
pub(crate) struct DocumentArgs {
    #[command(flatten)]
    pub(crate) recipient: Recipient,
    #[arg(long)]
    pub(crate) url: String,
    #[arg(long)]
    pub(crate) caption: Option<String>,
}

#[derive(Args)]
pub(crate) struct LocationArgs {
    #[command(flatten)]
    pub(crate) recipient: Recipient,
    #[arg(long, allow_hyphen_values = true, requires = "lng", conflicts_with = "here")]
    pub(crate) lat: Option<String>,
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    pub(crate) lng: Option<String>,
    /// Use the position from WA_TESTER_LOCATION
    #[arg(long)]
    pub(crate) here: bool,
    #[arg(long)]
    pub(crate) address: Option<String>,
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    init_tracing(&config.log_level, cli.json);

    let transport = HttpTransport::new()?;
    let outcome = match cli.command {
        Commands::Send { kind } => commands::send(&config, &transport, kind)?,
        Commands::Messages { page, limit } => commands::messages(&config, &transport, page, limit),
        Commands::Status => commands::status(&config, &transport),
    };

    println!("{}", serde_json::to_string_pretty(&outcome.to_value())?);
    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
