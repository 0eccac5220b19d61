//! In-memory stand-in for the profile and matchmaking services.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use game_load_util::{NewPlayer, PlayerProfile, PlayerStats};
use rand::seq::SliceRandom;
use uuid::Uuid;

/// `GET /players` never returns more ids than this.
pub const PLAYER_LIST_LIMIT: usize = 10_000;
/// Upper bound of players assigned to a new game.
pub const PLAYERS_PER_GAME: usize = 100;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("New player has invalid email '{0}'")]
    InvalidEmail(String),
    #[error("Game '{0}' does not exist")]
    UnknownGame(String),
    #[error("Error closing game '{0}'")]
    AlreadyFinished(String),
    #[error("No players found for game '{0}'")]
    NoPlayers(String),
}

#[derive(Debug)]
struct Game {
    players: Vec<String>,
    winner: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    order: Vec<String>,
    players: HashMap<String, PlayerProfile>,
    games: HashMap<String, Game>,
}

#[derive(Clone, Default)]
pub struct GameBackend {
    state: Arc<Mutex<State>>,
}

fn valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

impl GameBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_player(&self, new: NewPlayer) -> Result<String, BackendError> {
        if !valid_email(&new.email) {
            return Err(BackendError::InvalidEmail(new.email));
        }
        let id = Uuid::new_v4().to_string();
        let profile = PlayerProfile {
            player_uuid: id.clone(),
            player_name: new.player_name,
            email: new.email,
            stats: PlayerStats::default(),
            current_game: None,
        };
        let mut state = self.lock();
        state.order.push(id.clone());
        state.players.insert(id.clone(), profile);
        Ok(id)
    }

    #[must_use]
    pub fn player_ids(&self) -> Vec<String> {
        self.lock()
            .order
            .iter()
            .take(PLAYER_LIST_LIMIT)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn player(&self, id: &str) -> Option<PlayerProfile> {
        self.lock().players.get(id).cloned()
    }

    /// Creates a game and locks a random sample of idle players into it.
    pub fn create_game(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let mut state = self.lock();
        let idle: Vec<String> = state
            .order
            .iter()
            .filter(|p| {
                state
                    .players
                    .get(*p)
                    .is_some_and(|p| p.current_game.is_none())
            })
            .cloned()
            .collect();
        let chosen: Vec<String> = idle
            .choose_multiple(&mut rand::thread_rng(), PLAYERS_PER_GAME)
            .cloned()
            .collect();
        for p in &chosen {
            if let Some(profile) = state.players.get_mut(p) {
                profile.current_game = Some(id.clone());
            }
        }
        state.games.insert(
            id.clone(),
            Game {
                players: chosen,
                winner: None,
            },
        );
        id
    }

    /// Picks a random winner, updates every participant's stats and frees them
    /// for the next game. Returns the winner id.
    pub fn close_game(&self, id: &str) -> Result<String, BackendError> {
        let mut state = self.lock();
        let state = &mut *state;
        let game = state
            .games
            .get_mut(id)
            .ok_or_else(|| BackendError::UnknownGame(id.to_string()))?;
        if game.winner.is_some() {
            return Err(BackendError::AlreadyFinished(id.to_string()));
        }
        let winner = game
            .players
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| BackendError::NoPlayers(id.to_string()))?;
        for p in &game.players {
            let Some(profile) = state.players.get_mut(p) else {
                continue;
            };
            if profile.current_game.as_deref() != Some(id) {
                continue;
            }
            profile.current_game = None;
            profile.stats.games_played += 1;
            if *p == winner {
                profile.stats.games_won += 1;
            }
        }
        game.winner = Some(winner.clone());
        Ok(winner)
    }
}
