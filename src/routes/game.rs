use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::game::{BoardSnapshot, DeviceStatus, FlipRequest, FlipResponse, StartResponse},
    error::AppError,
    services::game_service,
    state::SharedState,
};

/// Routes the kiosk page drives the game with.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/game", get(get_board))
        .route("/game/start", post(start_game))
        .route("/game/flip", post(flip_card))
        .route("/device", get(get_device))
}

/// Deal a fresh board, or get the locked screen when this device already played.
#[utoipa::path(
    post,
    path = "/game/start",
    tag = "game",
    responses(
        (status = 200, description = "Board dealt or device locked", body = StartResponse)
    )
)]
pub async fn start_game(State(state): State<SharedState>) -> Result<Json<StartResponse>, AppError> {
    let response = game_service::start_session(&state).await?;
    Ok(Json(response))
}

/// Turn a card face up.
#[utoipa::path(
    post,
    path = "/game/flip",
    tag = "game",
    request_body = FlipRequest,
    responses(
        (status = 200, description = "Flip applied or ignored", body = FlipResponse),
        (status = 400, description = "Position outside the board"),
        (status = 409, description = "No game in progress")
    )
)]
pub async fn flip_card(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<FlipRequest>>,
) -> Result<Json<FlipResponse>, AppError> {
    let response = game_service::flip_card(&state, payload.position).await?;
    Ok(Json(response))
}

/// Current board, for a renderer that (re)connects mid-game.
#[utoipa::path(
    get,
    path = "/game",
    tag = "game",
    responses(
        (status = 200, description = "Current board", body = BoardSnapshot),
        (status = 404, description = "No game has been started")
    )
)]
pub async fn get_board(State(state): State<SharedState>) -> Result<Json<BoardSnapshot>, AppError> {
    let board = game_service::current_board(&state).await?;
    Ok(Json(board))
}

/// Persisted play counter and lock flag.
#[utoipa::path(
    get,
    path = "/device",
    tag = "game",
    responses(
        (status = 200, description = "Device counters", body = DeviceStatus),
        (status = 503, description = "Device storage unavailable")
    )
)]
pub async fn get_device(State(state): State<SharedState>) -> Result<Json<DeviceStatus>, AppError> {
    let status = game_service::device_status(&state).await?;
    Ok(Json(status))
}
