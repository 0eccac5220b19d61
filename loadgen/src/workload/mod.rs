//! Simulated users for each load profile.

mod matches;
mod players;
mod store;

pub use matches::{GameMatch, MatchTask};
pub use players::{PlayerLoad, PlayerSignup, PlayerTask, SignupTask};
pub use store::{insert_player_statement, StorePlayerLoad, StoreTask, ADD_PLAYER_OP, COUNT_PLAYERS_OP};

pub const PLAYERS_PATH: &str = "/players";
/// Telemetry name shared by every `GET /players/{id}`.
pub const PLAYER_BY_ID_NAME: &str = "/players/[id]";
pub const GAMES_CREATE_PATH: &str = "/games/create";
pub const GAMES_CLOSE_PATH: &str = "/games/close";
