use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::runner::RunConfig;
use crate::store::DatabasePath;

#[derive(Debug, Parser)]
#[command(name = "loadgen", about = "Synthetic load for the game backend services")]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub workload: Workload,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Number of simulated users
    #[arg(long, short = 'u', env = "LOADGEN_USERS", default_value_t = 16)]
    pub users: usize,
    /// Tasks per user, defaults to 100 when no run time is given
    #[arg(long, short = 'i', env = "LOADGEN_ITERATIONS")]
    pub iterations: Option<u64>,
    /// Stop after this many seconds
    #[arg(long, env = "LOADGEN_RUN_TIME")]
    pub run_time: Option<u64>,
    /// Users started per second
    #[arg(long, env = "LOADGEN_SPAWN_RATE")]
    pub spawn_rate: Option<f64>,
    /// Pause after each task, in milliseconds
    #[arg(long, env = "LOADGEN_WAIT_MS", default_value_t = 0)]
    pub wait_ms: u64,
}

impl RunArgs {
    #[must_use]
    pub fn to_config(&self) -> RunConfig {
        let run_time = self.run_time.map(Duration::from_secs);
        let iterations = match (self.iterations, run_time) {
            (None, None) => Some(100),
            (iterations, _) => iterations,
        };
        RunConfig {
            users: self.users,
            iterations,
            run_time,
            spawn_rate: self.spawn_rate,
            wait: Duration::from_millis(self.wait_ms),
        }
    }
}

#[derive(Debug, Args)]
pub struct HttpTarget {
    /// Base URI of the target service
    #[arg(long, env = "LOADGEN_HOST", default_value = "http://127.0.0.1:8080")]
    pub host: String,
}

#[derive(Debug, Args)]
pub struct DatabaseArgs {
    #[arg(long, env = "LOADGEN_PROJECT", default_value = "development")]
    pub project: String,
    #[arg(long, env = "LOADGEN_INSTANCE", default_value = "cymbal-games")]
    pub instance: String,
    #[arg(long, env = "LOADGEN_DATABASE", default_value = "my_game")]
    pub database: String,
    /// Connection URL of the statement store
    #[arg(long, env = "LOADGEN_DATABASE_URL", default_value = "sqlite://game.db?mode=rwc")]
    pub database_url: String,
    /// Create the players table before the run
    #[arg(long)]
    pub create_schema: bool,
}

impl DatabaseArgs {
    #[must_use]
    pub fn path(&self) -> DatabasePath {
        DatabasePath {
            project: self.project.clone(),
            instance: self.instance.clone(),
            database: self.database.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Workload {
    /// Create players and look them up, 1:5
    Players(HttpTarget),
    /// Create players only
    Signup(HttpTarget),
    /// Create a game and close it
    Matches(HttpTarget),
    /// Insert and read players directly in the database
    StorePlayers(DatabaseArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_iteration_budget() {
        let cli = Cli::try_parse_from(["loadgen", "players"]).unwrap();
        let config = cli.run.to_config();
        assert_eq!(config.users, 16);
        assert_eq!(config.iterations, Some(100));
        assert_eq!(config.run_time, None);
        match cli.workload {
            Workload::Players(target) => assert_eq!(target.host, "http://127.0.0.1:8080"),
            other => panic!("unexpected workload {other:?}"),
        }
    }

    #[test]
    fn run_time_alone_disables_iteration_budget() {
        let cli = Cli::try_parse_from(["loadgen", "--run-time", "30", "matches", "--host", "http://x:1"]).unwrap();
        let config = cli.run.to_config();
        assert_eq!(config.iterations, None);
        assert_eq!(config.run_time, Some(Duration::from_secs(30)));
    }

    #[test]
    fn store_players_builds_database_path() {
        let cli = Cli::try_parse_from([
            "loadgen",
            "store-players",
            "--project",
            "p",
            "--instance",
            "i",
            "--database",
            "d",
        ])
        .unwrap();
        let Workload::StorePlayers(db) = cli.workload else {
            panic!("expected store-players");
        };
        assert_eq!(db.path().to_string(), "projects/p/instances/i/databases/d");
        assert!(!db.create_schema);
    }
}
