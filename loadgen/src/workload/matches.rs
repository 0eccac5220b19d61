use async_trait::async_trait;
use game_load_util::CloseGameRequest;

use super::{GAMES_CLOSE_PATH, GAMES_CREATE_PATH};
use crate::client::HttpClient;
use crate::error::TaskError;
use crate::runner::{User, Weighted};
use crate::telemetry::EventSink;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MatchTask {
    CreateGame,
}

const MATCH_TASKS: &[Weighted<MatchTask>] = &[Weighted::new(MatchTask::CreateGame, 1)];

/// Opens a game and closes it straight away.
pub struct GameMatch<K> {
    client: HttpClient<K>,
}

impl<K: EventSink> GameMatch<K> {
    #[must_use]
    pub fn new(client: HttpClient<K>) -> Self {
        Self { client }
    }

    /// Not atomic: a failed close leaves the game open.
    pub async fn create_and_close(&self) -> Result<(), TaskError> {
        let created = self
            .client
            .post(GAMES_CREATE_PATH)
            .await?
            .success(GAMES_CREATE_PATH)?;
        let close = CloseGameRequest::from_create_response(&created.body);
        tracing::debug!(game = %close.game_uuid, "closing game");
        self.client
            .put_json(GAMES_CLOSE_PATH, &close)
            .await?
            .success(GAMES_CLOSE_PATH)?;
        Ok(())
    }
}

#[async_trait]
impl<K: EventSink + 'static> User for GameMatch<K> {
    type Task = MatchTask;

    const NAME: &'static str = "matches";

    fn tasks() -> &'static [Weighted<MatchTask>] {
        MATCH_TASKS
    }

    async fn perform(&mut self, task: MatchTask) -> Result<(), TaskError> {
        match task {
            MatchTask::CreateGame => self.create_and_close().await,
        }
    }
}
