//! # svgclock
//!
//! One binary, two services: `svgclock edge` serves the clock images and
//! `svgclock purge` runs the purge coordinator. Adapters are picked and wired
//! here; nothing below this file knows which concrete ones are in use.

mod serve;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "svgclock", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve clock images (`SVGCLOCK_EDGE__*`).
    Edge,
    /// Run the purge coordinator (`SVGCLOCK_PURGE__*`).
    Purge,
    /// Print the SHA-256 digest to configure for a bearer token.
    HashToken {
        /// The plaintext token shared with the edge.
        #[arg(value_parser = parse_bearer_token)]
        token: String,
    },
}

fn parse_bearer_token(token: &str) -> Result<String, String> {
    if services::is_bearer_token(token) {
        Ok(token.to_string())
    } else {
        Err("token must be non-empty and contain no whitespace".to_string())
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    let json = std::env::var("SVGCLOCK_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    configs::load_dotenv();
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Edge => {
            let settings = configs::EdgeSettings::load().context("loading edge settings")?;
            serve::run_edge(settings).await
        }
        Command::Purge => {
            let settings = configs::PurgeSettings::load().context("loading purge settings")?;
            serve::run_purge(settings).await
        }
        Command::HashToken { token } => {
            println!("{}", auth_adapters::token_digest_hex(&token));
            Ok(())
        }
    }
}
