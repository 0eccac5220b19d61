pub mod drain;
pub mod generate;

use bytes::Bytes;
use http_body_util::Full;

#[inline]
pub fn empty_body() -> Full<Bytes> {
    Full::new(Bytes::new())
}

#[inline]
pub fn byte_body<B: Into<Bytes>>(bytes: B) -> Full<Bytes> {
    Full::new(bytes.into())
}

/// Body of `POST /players`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NewPlayer {
    pub player_name: String,
    pub email: String,
    pub password: String,
}

impl NewPlayer {
    #[must_use]
    pub fn new(player_name: String, email: String, password: String) -> Self {
        Self {
            player_name,
            email,
            password,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlayerStats {
    pub games_played: u32,
    pub games_won: u32,
}

/// Response of `GET /players/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlayerProfile {
    #[serde(rename = "playerUUID")]
    pub player_uuid: String,
    pub player_name: String,
    pub email: String,
    pub stats: PlayerStats,
    #[serde(default)]
    pub current_game: Option<String>,
}

/// Body of `PUT /games/close`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CloseGameRequest {
    #[serde(rename = "gameUUID")]
    pub game_uuid: String,
}

impl CloseGameRequest {
    #[must_use]
    pub fn new(game_uuid: String) -> Self {
        Self { game_uuid }
    }

    /// Builds the close request from the raw `POST /games/create` body, which is
    /// the new game id as a quoted JSON string.
    #[must_use]
    pub fn from_create_response(body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body);
        Self::new(text.trim().replace('"', ""))
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorMessage {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_request_strips_quotes() {
        let req = CloseGameRequest::from_create_response(b"\"abc-123\"");
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            serde_json::json!({"gameUUID": "abc-123"})
        );
    }

    #[test]
    fn close_request_ignores_trailing_newline() {
        let req = CloseGameRequest::from_create_response(b"\"abc-123\"\n");
        assert_eq!(req.game_uuid, "abc-123");
    }

    #[test]
    fn new_player_uses_wire_names() {
        let p = NewPlayer::new("n".into(), "e@gmail.com".into(), "p".into());
        assert_eq!(
            serde_json::to_value(&p).unwrap(),
            serde_json::json!({"player_name": "n", "email": "e@gmail.com", "password": "p"})
        );
    }
}
