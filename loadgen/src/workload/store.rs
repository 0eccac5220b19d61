use async_trait::async_trait;
use game_load_util::{generate, NewPlayer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use crate::dispatch::Dispatcher;
use crate::error::TaskError;
use crate::runner::{User, Weighted};
use crate::store::StatementStore;
use crate::telemetry::EventSink;

pub const ADD_PLAYER_OP: &str = "add_player";
pub const COUNT_PLAYERS_OP: &str = "count_players";

const COUNT_PLAYERS_SQL: &str = "SELECT playerUUID FROM players LIMIT 100";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StoreTask {
    CreatePlayer,
    CountPlayers,
}

const STORE_TASKS: &[Weighted<StoreTask>] = &[
    Weighted::new(StoreTask::CreatePlayer, 1),
    Weighted::new(StoreTask::CountPlayers, 1),
];

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[must_use]
pub fn insert_player_statement(player_uuid: &str, player: &NewPlayer) -> String {
    format!(
        "INSERT INTO players (playerUUID, player_name, email, user_password, created, active_skinUUID) \
         VALUES ({}, {}, {}, {}, CURRENT_TIMESTAMP, '1')",
        quote(player_uuid),
        quote(&player.player_name),
        quote(&player.email),
        quote(&player.password),
    )
}

/// Writes players straight into the database, bypassing the HTTP services.
pub struct StorePlayerLoad<S, K> {
    dispatcher: Dispatcher<S, K>,
    rng: StdRng,
}

impl<S, K> StorePlayerLoad<S, K>
where
    S: StatementStore,
    K: EventSink,
{
    #[must_use]
    pub fn new(dispatcher: Dispatcher<S, K>) -> Self {
        Self {
            dispatcher,
            rng: StdRng::from_entropy(),
        }
    }

    pub async fn create_player(&mut self) -> Result<(), TaskError> {
        let player = generate::new_player(&mut self.rng);
        let stmt = insert_player_statement(&Uuid::new_v4().to_string(), &player);
        if self.dispatcher.dispatch(ADD_PLAYER_OP, "write", &stmt).await?.is_none() {
            tracing::debug!(player = %player.player_name, "player insert failed");
        }
        Ok(())
    }

    pub async fn count_players(&self) -> Result<(), TaskError> {
        self.dispatcher
            .dispatch(COUNT_PLAYERS_OP, "read", COUNT_PLAYERS_SQL)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl<S, K> User for StorePlayerLoad<S, K>
where
    S: StatementStore + 'static,
    K: EventSink + 'static,
{
    type Task = StoreTask;

    const NAME: &'static str = "store-players";

    fn tasks() -> &'static [Weighted<StoreTask>] {
        STORE_TASKS
    }

    async fn perform(&mut self, task: StoreTask) -> Result<(), TaskError> {
        match task {
            StoreTask::CreatePlayer => self.create_player().await,
            StoreTask::CountPlayers => self.count_players().await,
        }
    }
}
