//! Interactive terminal chat against a Stargaze server.

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use stargaze_client::page::load_session;
use stargaze_client::render::render_message;
use stargaze_client::{ChatPage, HttpChatTransport, DEFAULT_BASE_URL};
use stargaze_core::AuthCallbacks;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Stargaze Chat - Ask about your starred GitHub repositories")]
struct Cli {
    #[clap(long, short, default_value = DEFAULT_BASE_URL, help = "Stargaze server base URL")]
    server: String,

    #[clap(long, help = "Session or decoded token JSON file for the signed-in user")]
    session: Option<PathBuf>,

    #[clap(long, help = "Request timeout in seconds (no timeout by default)")]
    timeout: Option<u64>,

    #[clap(long, short, default_value = "warn")]
    log_level: String,

    #[clap(long, help = "Log auth callback inputs at debug level")]
    debug_auth: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level_filter = cli.log_level.parse().unwrap_or(LevelFilter::Warn);
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .init();

    let callbacks = AuthCallbacks::default().with_debug(cli.debug_auth);
    let session = match &cli.session {
        Some(path) => Some(load_session(path, &callbacks)?),
        None => None,
    };

    let mut transport = HttpChatTransport::new(&cli.server);
    if let Some(seconds) = cli.timeout {
        transport = transport.with_timeout(Duration::from_secs(seconds));
    }
    if let Err(e) = transport.health_check().await {
        log::warn!("Server at {} is not healthy: {}", transport.base_url(), e);
    }

    let mut page = ChatPage::new(session, Box::new(transport));
    println!("{}", page.greeting());
    println!("Type a question and press Enter. /quit exits.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "" => continue,
            "/quit" => break,
            _ => {}
        }

        page.widget.submit(line).await;
        if let Some(reply) = page.widget.history().last().filter(|m| m.is_assistant()) {
            println!("\n{}\n", render_message(reply));
        }
    }

    Ok(())
}
