use anyhow::Context;
use clap::Parser;
use loadgen::client::HttpClient;
use loadgen::config::{Cli, DatabaseArgs, Workload};
use loadgen::dispatch::Dispatcher;
use loadgen::runner::{self, RunConfig, RunSummary};
use loadgen::statistics::Statistics;
use loadgen::store::SqliteStore;
use loadgen::telemetry::{aggregator_task, ChannelSink};
use loadgen::workload::{GameMatch, PlayerLoad, PlayerSignup, StorePlayerLoad};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build runtime")?;
    let _guard = rt.enter();
    rt.block_on(run_loadgen(cli))
}

async fn run_loadgen(cli: Cli) -> anyhow::Result<()> {
    let config = cli.run.to_config();
    let (sink, rx) = ChannelSink::new();
    let aggregator = tokio::spawn(aggregator_task(rx));

    let summary = run_workload(cli.workload, config, sink).await;
    // Every sink clone is gone once the users are, which ends the aggregator.
    let stats: Statistics = aggregator.await.context("Failed to join aggregator")?;
    let summary = summary?;
    if stats.is_empty() {
        tracing::warn!("no requests were recorded");
    } else {
        println!("\nResults:\n{stats}");
    }
    println!("{summary}");
    Ok(())
}

async fn run_workload(workload: Workload, config: RunConfig, sink: ChannelSink) -> anyhow::Result<RunSummary> {
    match workload {
        Workload::Players(target) => {
            let client = HttpClient::new(&target.host, sink);
            runner::run(config, move |_| {
                let client = client.clone();
                async move { Ok::<_, anyhow::Error>(PlayerLoad::new(client)) }
            })
            .await
        }
        Workload::Signup(target) => {
            let client = HttpClient::new(&target.host, sink);
            runner::run(config, move |_| {
                let client = client.clone();
                async move { Ok::<_, anyhow::Error>(PlayerSignup::new(client)) }
            })
            .await
        }
        Workload::Matches(target) => {
            let client = HttpClient::new(&target.host, sink);
            runner::run(config, move |_| {
                let client = client.clone();
                async move { Ok::<_, anyhow::Error>(GameMatch::new(client)) }
            })
            .await
        }
        Workload::StorePlayers(db) => run_store_players(db, config, sink).await,
    }
}

async fn run_store_players(db: DatabaseArgs, config: RunConfig, sink: ChannelSink) -> anyhow::Result<RunSummary> {
    if db.create_schema {
        SqliteStore::connect(&db.database_url)
            .await
            .context("Failed to open database")?
            .ensure_schema()
            .await
            .context("Failed to create schema")?;
    }
    let path = db.path().to_string();
    let url = db.database_url;
    tracing::info!(database = %path, "running store workload");
    runner::run(config, move |_| {
        let sink = sink.clone();
        let url = url.clone();
        let path = path.clone();
        async move {
            // One connection per simulated user.
            let store = SqliteStore::connect(&url)
                .await
                .context("Failed to open database")?;
            let dispatcher = Dispatcher::new(store, sink).with_context("database", path);
            Ok::<_, anyhow::Error>(StorePlayerLoad::new(dispatcher))
        }
    })
    .await
}
