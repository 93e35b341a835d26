use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use lob_matching::Config;
use lob_matching::api::{self, AppState};

/// Single-instrument limit order book matching engine.
#[derive(Parser, Debug)]
#[command(name = "lob-matching")]
struct Args {
    /// Address to bind the HTTP API to (overrides BIND_ADDR)
    #[arg(long)]
    bind: Option<String>,

    /// Market pair served by this engine (overrides MARKET_NAME)
    #[arg(long)]
    market: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut config = Config::from_env();
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(market) = args.market {
        config.market_name = market;
    }

    let state = Arc::new(AppState::new(&config.market_name, config.tick_size));
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(
        addr = %config.bind_addr,
        market = %config.market_name,
        tick_size = %config.tick_size,
        "matching engine API listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
