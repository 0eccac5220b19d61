use anyhow::Context;
use clap::Parser;
use game_server::GameBackend;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "game-server", about = "In-memory profile and matchmaking services")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "GAME_SERVER_LISTEN", default_value = "127.0.0.1:8080")]
    listen: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build runtime")?;
    let _g = rt.enter();
    rt.block_on(run_server(args))
}

async fn run_server(args: Args) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&args.listen)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen))?;
    tracing::info!(addr = %args.listen, "game server listening");
    game_server::serve(listener, GameBackend::new()).await
}
