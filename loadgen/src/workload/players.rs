use async_trait::async_trait;
use game_load_util::generate;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{PLAYERS_PATH, PLAYER_BY_ID_NAME};
use crate::client::HttpClient;
use crate::error::TaskError;
use crate::runner::{User, Weighted};
use crate::session::{IdentifierPool, UserSession};
use crate::telemetry::EventSink;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlayerTask {
    CreatePlayer,
    GetPlayer,
}

// 5:1 reads to writes
const PLAYER_TASKS: &[Weighted<PlayerTask>] = &[
    Weighted::new(PlayerTask::CreatePlayer, 1),
    Weighted::new(PlayerTask::GetPlayer, 5),
];

async fn create_player<K: EventSink>(
    client: &HttpClient<K>,
    rng: &mut StdRng,
) -> Result<(), TaskError> {
    let player = generate::new_player(rng);
    client
        .post_json(PLAYERS_PATH, &player)
        .await?
        .success(PLAYERS_PATH)?;
    Ok(())
}

/// Creates players and looks up existing ones by id.
pub struct PlayerLoad<K> {
    client: HttpClient<K>,
    session: UserSession,
    rng: StdRng,
}

impl<K: EventSink> PlayerLoad<K> {
    #[must_use]
    pub fn new(client: HttpClient<K>) -> Self {
        Self {
            client,
            session: UserSession::new(),
            rng: StdRng::from_entropy(),
        }
    }

    #[inline]
    pub fn session(&self) -> &UserSession {
        &self.session
    }

    pub async fn fetch_pool(&self) -> Result<IdentifierPool, TaskError> {
        // An empty player table is served as `null`.
        let ids: Option<Vec<String>> = self
            .client
            .get(PLAYERS_PATH)
            .await?
            .success(PLAYERS_PATH)?
            .json(PLAYERS_PATH)?;
        Ok(IdentifierPool::new(ids.unwrap_or_default()))
    }

    pub async fn get_player(&mut self) -> Result<(), TaskError> {
        let id = self.session.pool()?.choose(&mut self.rng)?;
        let path = format!("{PLAYERS_PATH}/{id}");
        self.client
            .get_named(&path, PLAYER_BY_ID_NAME)
            .await?
            .success(&path)?;
        Ok(())
    }
}

#[async_trait]
impl<K: EventSink + 'static> User for PlayerLoad<K> {
    type Task = PlayerTask;

    const NAME: &'static str = "players";

    fn tasks() -> &'static [Weighted<PlayerTask>] {
        PLAYER_TASKS
    }

    async fn on_start(&mut self) -> Result<(), TaskError> {
        let pool = self.fetch_pool().await?;
        tracing::debug!(ids = pool.len(), "fetched player pool");
        self.session.activate(pool);
        Ok(())
    }

    async fn perform(&mut self, task: PlayerTask) -> Result<(), TaskError> {
        match task {
            PlayerTask::CreatePlayer => create_player(&self.client, &mut self.rng).await,
            PlayerTask::GetPlayer => self.get_player().await,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SignupTask {
    CreatePlayer,
}

const SIGNUP_TASKS: &[Weighted<SignupTask>] = &[Weighted::new(SignupTask::CreatePlayer, 1)];

/// Write-only sign-up traffic, no lookups.
pub struct PlayerSignup<K> {
    client: HttpClient<K>,
    rng: StdRng,
}

impl<K: EventSink> PlayerSignup<K> {
    #[must_use]
    pub fn new(client: HttpClient<K>) -> Self {
        Self {
            client,
            rng: StdRng::from_entropy(),
        }
    }
}

#[async_trait]
impl<K: EventSink + 'static> User for PlayerSignup<K> {
    type Task = SignupTask;

    const NAME: &'static str = "signup";

    fn tasks() -> &'static [Weighted<SignupTask>] {
        SIGNUP_TASKS
    }

    async fn perform(&mut self, task: SignupTask) -> Result<(), TaskError> {
        match task {
            SignupTask::CreatePlayer => create_player(&self.client, &mut self.rng).await,
        }
    }
}
