mod app;
mod presenter;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app::{App, OutputFormat, PublishRequest};
use crate::status::{Report, Status};

#[derive(Parser)]
#[command(name = "chat-archiver")]
#[command(about = "Archive ChatGPT conversations and publish them to GitHub")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short, default_value = "false")]
    debug: bool,

    /// Override the data directory
    #[arg(long, env = "CHAT_ARCHIVER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a URL is a supported chat page
    Check {
        url: String,
    },
    /// Extract a conversation from a saved chat page
    Extract {
        /// Saved HTML of the chat page
        html_file: PathBuf,
        /// URL the page was saved from
        #[arg(long)]
        url: Option<String>,
        /// Store the conversation
        #[arg(long)]
        save: bool,
        /// Print JSON instead of Markdown
        #[arg(long)]
        json: bool,
    },
    /// List saved conversations
    List,
    /// Print a saved conversation
    Show {
        id: String,
        #[arg(long, value_enum, default_value = "markdown")]
        format: OutputFormat,
    },
    /// Connect to GitHub with the device flow
    Login,
    /// Disconnect GitHub
    Logout,
    /// Show the GitHub connection state
    Status,
    /// Commit a saved conversation to a GitHub repository
    Publish {
        id: String,
        /// Repository name
        #[arg(long)]
        repo: String,
        /// Create the repository first
        #[arg(long)]
        create: bool,
        /// Description for a created repository
        #[arg(long)]
        description: Option<String>,
        /// Path inside the repository
        #[arg(long)]
        path: Option<String>,
        /// Commit message
        #[arg(long)]
        message: Option<String>,
        #[arg(long, value_enum, default_value = "markdown")]
        format: OutputFormat,
    },
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(debug)
                .with_file(false),
        )
        .init();
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if cli.debug {
        eprintln!("{}", "[DEBUG] Debug mode enabled".dimmed());
    }

    match run(cli).await {
        Ok(report) => report.print(),
        Err(e) => {
            tracing::debug!("Command failed: {:?}", e);
            Status::error(e.to_string()).print();
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<Report> {
    let mut config = chat_core::Config::new();
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }
    let app = App::open(config)?;

    match cli.command {
        Commands::Check { url } => app.check(&url),
        Commands::Extract {
            html_file,
            url,
            save,
            json,
        } => app.extract(&html_file, url.as_deref(), save, json).await,
        Commands::List => app.list().await,
        Commands::Show { id, format } => app.show(&id, format).await,
        Commands::Login => {
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("{}", "Cancelling authorization...".yellow());
                    on_interrupt.cancel();
                }
            });
            app.login(&cancel).await
        }
        Commands::Logout => app.logout().await,
        Commands::Status => app.status().await,
        Commands::Publish {
            id,
            repo,
            create,
            description,
            path,
            message,
            format,
        } => {
            app.publish(PublishRequest {
                id,
                repo,
                create,
                description,
                path,
                message,
                format,
            })
            .await
        }
    }
}
