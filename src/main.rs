use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use trade_enricher::adapter::inbound::http::create_router;
use trade_enricher::error::Result;
use trade_enricher::infrastructure::bootstrap::bootstrap;
use trade_enricher::infrastructure::config::settings::Config;

/// Enrich trade CSV with product names from a shared product cache.
#[derive(Parser, Debug)]
#[command(name = "trade-enricher", version, about)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override `server.bind`.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let mut config = match Config::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    config.init_logging();
    info!("trade-enricher starting");

    tokio::select! {
        result = serve(config) => {
            if let Err(e) = result {
                error!(error = %e, "Fatal error");
                std::process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    info!("trade-enricher stopped");
}

async fn serve(config: Config) -> Result<()> {
    let state = bootstrap(&config).await?;
    let listener = TcpListener::bind(&config.server.bind).await?;
    info!(addr = %config.server.bind, "Listening");

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
