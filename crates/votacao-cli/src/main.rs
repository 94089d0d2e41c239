//! votacao CLI: serve the voting API and administer its state offline.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use votacao_core::identity::IdentityStrategy;

mod commands;

#[derive(Parser)]
#[command(name = "votacao", version, about = "Classroom voting and feedback server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,

        /// Override the configured bind address
        #[arg(long)]
        bind: Option<String>,
    },

    /// Create a starter config and seed file
    Init,

    /// Check a seed file for inconsistencies
    Validate {
        /// Seed file (defaults to the configured or embedded seed)
        #[arg(long)]
        seed: Option<PathBuf>,

        /// Identity matching to check against: exact, overlap
        #[arg(long)]
        identity: Option<IdentityStrategy>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the rankings of one class
    Report {
        /// Class id (e.g. "M")
        #[arg(long)]
        class: String,

        /// Output format: text, markdown, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Export the full state as JSON or a spreadsheet
    Export {
        /// Output format: json, xlsx
        #[arg(long, default_value = "json")]
        format: String,

        /// Output file (defaults to the download file name)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Clear every vote and star
    Reset {
        /// Rebuild all state from the seed instead
        #[arg(long)]
        reseed: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("votacao=info,tower_http=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { config, port, bind } => commands::serve::execute(config, port, bind).await,
        Commands::Init => commands::init::execute(),
        Commands::Validate {
            seed,
            identity,
            config,
        } => commands::validate::execute(seed, identity, config),
        Commands::Report {
            class,
            format,
            config,
        } => commands::report::execute(class, format, config).await,
        Commands::Export {
            format,
            output,
            config,
        } => commands::export::execute(format, output, config).await,
        Commands::Reset { reseed, config } => commands::reset::execute(reseed, config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
