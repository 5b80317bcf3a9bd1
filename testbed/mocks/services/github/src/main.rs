use clap::Parser;
use github_mock::{MockServer, RepositoryFixture};

#[derive(Parser)]
#[command(name = "github-mock")]
#[command(about = "Mock GitHub REST API serving starred repositories from a fixture")]
struct Args {
    /// YAML fixture mapping user logins to starred repositories
    #[arg(short, long)]
    fixture: Option<std::path::PathBuf>,

    #[arg(short, long, default_value = "127.0.0.1:8090")]
    bind_addr: String,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level.parse().unwrap_or(log::LevelFilter::Info))
        .init();

    let server = match &args.fixture {
        Some(path) => {
            log::info!("Loading fixtures from {}", path.display());
            let content = std::fs::read_to_string(path)?;
            MockServer::with_fixture(RepositoryFixture::from_yaml(&content)?)
        }
        None => {
            log::info!("No fixture file given, using default test fixture");
            MockServer::new()
        }
    };

    server.serve(&args.bind_addr).await
}
