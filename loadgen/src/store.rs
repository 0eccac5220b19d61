//! Statement execution backends.

use std::fmt;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("statement failed: {0}")]
    Sql(#[from] sqlx::Error),
}

/// Something that can run SQL-like statements either against a consistent
/// snapshot or inside a read-write transaction.
#[async_trait]
pub trait StatementStore: Send + Sync {
    /// Returns the number of rows observed.
    async fn snapshot_read(&self, statement: &str) -> Result<u64, StoreError>;

    /// Returns the number of rows affected.
    async fn run_in_transaction(&self, statement: &str) -> Result<u64, StoreError>;
}

/// Project / instance / database triple naming the target database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabasePath {
    pub project: String,
    pub instance: String,
    pub database: String,
}

impl fmt::Display for DatabasePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/instances/{}/databases/{}",
            self.project, self.instance, self.database
        )
    }
}

const PLAYERS_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS players (
    playerUUID TEXT PRIMARY KEY NOT NULL,
    player_name TEXT NOT NULL,
    email TEXT NOT NULL,
    user_password TEXT NOT NULL,
    created TEXT NOT NULL,
    updated TEXT,
    stats TEXT,
    account_balance REAL NOT NULL DEFAULT 0,
    is_logged_in INTEGER NOT NULL DEFAULT 0,
    last_login TEXT,
    valid_email INTEGER NOT NULL DEFAULT 0,
    current_game TEXT,
    active_skinUUID TEXT
)";

/// SQLite backed store. Each simulated user opens its own, holding a single
/// connection.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Creates the `players` table if it is missing.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(PLAYERS_SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl StatementStore for SqliteStore {
    async fn snapshot_read(&self, statement: &str) -> Result<u64, StoreError> {
        // A deferred transaction that is never written to reads from one snapshot.
        let mut tx = self.pool.begin().await?;
        let rows = sqlx::query(statement).fetch_all(&mut *tx).await?;
        tx.rollback().await?;
        Ok(rows.len() as u64)
    }

    async fn run_in_transaction(&self, statement: &str) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let done = sqlx::query(statement).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(done.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> SqliteStore {
        let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
        store.ensure_schema().await.unwrap();
        store
    }

    #[tokio::test]
    async fn write_then_read_counts_rows() {
        let store = memory_store().await;
        let affected = store
            .run_in_transaction(
                "INSERT INTO players (playerUUID, player_name, email, user_password, created) VALUES \
                 ('a', 'n', 'e@gmail.com', 'p', CURRENT_TIMESTAMP), \
                 ('b', 'm', 'f@yahoo.com', 'q', CURRENT_TIMESTAMP)",
            )
            .await
            .unwrap();
        assert_eq!(affected, 2);
        let seen = store
            .snapshot_read("SELECT playerUUID FROM players")
            .await
            .unwrap();
        assert_eq!(seen, 2);
    }

    #[tokio::test]
    async fn failed_write_is_rolled_back() {
        let store = memory_store().await;
        let insert = "INSERT INTO players (playerUUID, player_name, email, user_password, created) \
                      VALUES ('dup', 'n', 'e@gmail.com', 'p', CURRENT_TIMESTAMP)";
        store.run_in_transaction(insert).await.unwrap();
        assert!(store.run_in_transaction(insert).await.is_err());
        assert_eq!(
            store.snapshot_read("SELECT * FROM players").await.unwrap(),
            1
        );
    }

    #[test]
    fn database_path_display() {
        let path = DatabasePath {
            project: "p".into(),
            instance: "i".into(),
            database: "d".into(),
        };
        assert_eq!(path.to_string(), "projects/p/instances/i/databases/d");
    }
}
