//! Standalone blackjack room server
//!
//! Usage: cargo run -p blackjack_web --bin blackjack-server -- --port 8080

use blackjack_web::{config, AppConfig, LogFormat, WebServer};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "blackjack-server", about = "Multi-room blackjack table server")]
struct Cli {
    /// Address to bind to
    #[arg(long)]
    host: Option<String>,
    /// Port to bind to
    #[arg(long, short)]
    port: Option<u16>,
    /// Minimum opening bet at every table
    #[arg(long)]
    min_bet: Option<u64>,
    /// Decks per shoe
    #[arg(long)]
    decks: Option<usize>,
    /// Seconds of inactivity before a turn is forced
    #[arg(long)]
    turn_timeout_secs: Option<u64>,
    /// Balance given to new ledger accounts
    #[arg(long)]
    starting_balance: Option<u64>,
    /// Fixed shuffle seed
    #[arg(long)]
    seed: Option<u64>,
    /// Append settled rounds to this JSONL file
    #[arg(long)]
    round_log: Option<PathBuf>,
    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn apply(self, cfg: &mut AppConfig) {
        if let Some(v) = self.host {
            cfg.host = v;
        }
        if let Some(v) = self.port {
            cfg.port = v;
        }
        if let Some(v) = self.min_bet {
            cfg.min_bet = v;
        }
        if let Some(v) = self.decks {
            cfg.decks = v;
        }
        if let Some(v) = self.turn_timeout_secs {
            cfg.turn_timeout_secs = v;
        }
        if let Some(v) = self.starting_balance {
            cfg.starting_balance = v;
        }
        if let Some(v) = self.seed {
            cfg.seed = Some(v);
        }
        if let Some(v) = self.round_log {
            cfg.round_log = Some(v);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    blackjack_web::init_logging(format)?;

    let resolved = config::load_with_sources()?;
    let mut cfg = resolved.config;
    cli.apply(&mut cfg);
    cfg.validate()?;

    tracing::info!(
        host = %cfg.host,
        port = cfg.port,
        min_bet = cfg.min_bet,
        decks = cfg.decks,
        turn_timeout_secs = cfg.turn_timeout_secs,
        sources = ?resolved.sources,
        "starting blackjack server"
    );

    let server = WebServer::new(&cfg)?;
    let handle = server.start().await?;
    tracing::info!(addr = %handle.address(), rooms = cfg.rooms.len(), "server running");

    tokio::signal::ctrl_c().await?;

    tracing::info!("shutting down");
    handle.shutdown().await?;
    tracing::info!("server stopped cleanly");

    Ok(())
}
