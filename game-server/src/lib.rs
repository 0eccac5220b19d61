pub mod backend;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use game_load_util::{CloseGameRequest, ErrorMessage, NewPlayer, PlayerProfile};
use tokio::net::TcpListener;

pub use backend::{BackendError, GameBackend};

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let body = ErrorMessage {
            message: self.to_string(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

pub fn router(backend: GameBackend) -> Router {
    Router::new()
        .route("/players", get(get_player_ids))
        .route("/players", post(create_player))
        .route("/players/:id", get(get_player))
        .route("/games/create", post(create_game))
        .route("/games/close", put(close_game))
        .with_state(backend)
}

/// Serves until the listener fails.
pub async fn serve(listener: TcpListener, backend: GameBackend) -> anyhow::Result<()> {
    axum::serve(listener, router(backend)).await?;
    Ok(())
}

#[inline]
async fn get_player_ids(State(backend): State<GameBackend>) -> Json<Vec<String>> {
    Json(backend.player_ids())
}

async fn get_player(
    State(backend): State<GameBackend>,
    Path(id): Path<String>,
) -> Result<Json<PlayerProfile>, (StatusCode, Json<ErrorMessage>)> {
    backend.player(&id).map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorMessage {
                message: "player not found".to_string(),
            }),
        )
    })
}

async fn create_player(
    State(backend): State<GameBackend>,
    Json(new): Json<NewPlayer>,
) -> Result<(StatusCode, Json<String>), BackendError> {
    let id = backend.add_player(new)?;
    tracing::debug!(player = %id, "created player");
    Ok((StatusCode::CREATED, Json(id)))
}

#[inline]
async fn create_game(State(backend): State<GameBackend>) -> (StatusCode, Json<String>) {
    (StatusCode::CREATED, Json(backend.create_game()))
}

async fn close_game(
    State(backend): State<GameBackend>,
    Json(req): Json<CloseGameRequest>,
) -> Result<Json<String>, BackendError> {
    let winner = backend.close_game(&req.game_uuid)?;
    tracing::debug!(game = %req.game_uuid, winner = %winner, "closed game");
    Ok(Json(winner))
}
