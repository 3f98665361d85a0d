use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use che_dash::config::DashConfig;
use che_dash::list::PageKey;

mod cmd;

#[derive(Parser)]
#[command(name = "che-dash")]
#[command(version, about = "Terminal dashboard for workspaces and factories")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Answer yes to every confirmation prompt
    #[arg(long, global = true)]
    pub yes: bool,

    /// Workspace server URL. Overrides dash.toml.
    #[arg(long, global = true, env = "CHE_API_URL")]
    pub api_url: Option<String>,

    /// Items per page. Overrides dash.toml.
    #[arg(long, global = true, env = "CHE_DASH_PAGE_SIZE")]
    pub page_size: Option<u32>,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List or delete factories created by the current user
    Factories {
        #[command(subcommand)]
        command: EntityCommands,
    },
    /// List or delete workspaces
    Workspaces {
        #[command(subcommand)]
        command: EntityCommands,
    },
    /// Show product branding
    Branding {
        #[command(subcommand)]
        command: BrandingCommands,
    },
    /// Warm the IDE script for a browser
    Ide {
        #[command(subcommand)]
        command: IdeCommands,
    },
    /// Run a fake workspace server seeded with demo data
    MockServer {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Answer paged listings with a Link header
        #[arg(long)]
        links: bool,

        /// Number of demo factories
        #[arg(long, default_value = "12")]
        factories: usize,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum EntityCommands {
    List {
        /// Page to show after the first one loads (first, prev, next, last)
        #[arg(long)]
        page: Option<PageKey>,

        /// Only show entries whose name contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
    Delete {
        /// Ids to delete from the loaded page
        ids: Vec<String>,

        /// Select every entry shown on the page
        #[arg(long)]
        all: bool,

        #[arg(long)]
        page: Option<PageKey>,

        #[arg(short, long)]
        search: Option<String>,
    },
}

#[derive(Subcommand, Clone)]
pub enum BrandingCommands {
    Show {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Clone)]
pub enum IdeCommands {
    Prefetch {
        #[arg(long)]
        user_agent: Option<String>,

        /// IE document mode (8, 9 or 10)
        #[arg(long)]
        document_mode: Option<u32>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    Show,
    Validate,
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let config = DashConfig::with_cli_args(
        project_dir,
        cli.verbose,
        cli.yes,
        cli.api_url.clone(),
        cli.page_size,
    )?;
    let _log_guard = che_dash::logging::init_logging(
        &config.toml.logging,
        config.log_dir().as_deref(),
        config.verbose,
    )?;

    match cli.command {
        Commands::Factories { command } => cmd::cmd_factories(&config, command).await?,
        Commands::Workspaces { command } => cmd::cmd_workspaces(&config, command).await?,
        Commands::Branding {
            command: BrandingCommands::Show { json },
        } => cmd::cmd_branding_show(&config, json).await?,
        Commands::Ide {
            command:
                IdeCommands::Prefetch {
                    user_agent,
                    document_mode,
                },
        } => cmd::cmd_ide_prefetch(&config, user_agent, document_mode).await?,
        Commands::MockServer {
            host,
            port,
            links,
            factories,
        } => cmd::cmd_mock_server(host, port, links, factories).await?,
        Commands::Config { command } => cmd::cmd_config(&config, command)?,
    }

    Ok(())
}
