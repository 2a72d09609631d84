use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use uplift::common::{self, ServeOverrides};
use uplift::server;

#[derive(Parser)]
#[command(name = "uplift")]
#[command(about = "Static asset server with conditional caching")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve a directory of static assets
    Serve {
        #[arg(long, help = "Directory to serve")]
        root: Option<PathBuf>,
        #[arg(long, help = "Listen port")]
        port: Option<u16>,
        #[arg(long, help = "Listen host")]
        host: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("uplift=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { root, port, host } => {
            let config = common::load_config()?;
            let config = common::apply_overrides(config, &ServeOverrides { host, port, root });

            // Fail fast on a missing root before binding anything.
            if !config.root.is_dir() {
                anyhow::bail!("Asset root not found: {}", config.root.display());
            }

            server::run(config).await
        }
    }
}
