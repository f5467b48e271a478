//! Wire types for the kiosk game endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::state::{
    deck::{CardState, FaceId},
    state_machine::{GameOutcome, Session},
};

/// Largest board the image slots allow (10 pairs).
const MAX_POSITION: usize = 19;

/// One card as the renderer sees it. The face is only revealed once turned up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CardView {
    pub position: usize,
    pub state: CardState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face: Option<FaceId>,
}

/// Coarse status of the session shown by the kiosk page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Playing,
    Won,
    Lost,
}

/// Full picture of the board, sent on deal and returned by every game endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BoardSnapshot {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub pair_count: u8,
    pub max_attempts: u32,
    pub attempts: u32,
    pub attempts_left: u32,
    pub matched_pairs: u8,
    /// True while a mismatched pair is face up and input is ignored.
    pub locked: bool,
    pub cards: Vec<CardView>,
}

impl From<&Session> for BoardSnapshot {
    fn from(session: &Session) -> Self {
        let rules = session.rules();
        let status = match session.outcome() {
            None => SessionStatus::Playing,
            Some(GameOutcome::Won) => SessionStatus::Won,
            Some(GameOutcome::Lost) => SessionStatus::Lost,
        };

        Self {
            session_id: session.id(),
            status,
            pair_count: rules.pair_count,
            max_attempts: rules.max_attempts,
            attempts: session.attempts(),
            attempts_left: session.attempts_left(),
            matched_pairs: session.matched_pairs(),
            locked: session.is_locked(),
            cards: session
                .deck()
                .iter()
                .map(|card| CardView {
                    position: card.position,
                    state: card.state,
                    face: (card.state != CardState::Hidden).then_some(card.face),
                })
                .collect(),
        }
    }
}

/// Result screen contents once a session terminates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct GameResult {
    pub outcome: GameOutcome,
    pub title: String,
    pub message: String,
    pub attempts: u32,
    pub attempts_left: u32,
    pub matched_pairs: u8,
    /// `sms:` deep link pre-filled with the share message, present after a win.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms_link: Option<String>,
}

/// Answer to a session start request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StartResponse {
    /// A fresh board was dealt.
    Dealt { board: BoardSnapshot },
    /// The device already used its play; no board was dealt.
    Locked { message: String },
}

/// Request to turn a card face up.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct FlipRequest {
    #[validate(range(max = MAX_POSITION))]
    #[schema(maximum = 19)]
    pub position: usize,
}

/// Answer to a flip request. Ignored flips still return the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FlipResponse {
    pub board: BoardSnapshot,
    /// Why the flip was ignored, when it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored: Option<String>,
    /// Present when this flip ended the session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<GameResult>,
}

/// Persisted device counters, for kiosk staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeviceStatus {
    pub plays: u64,
    pub locked: bool,
}
