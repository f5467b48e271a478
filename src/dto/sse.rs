use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::game::{BoardSnapshot, GameResult},
    state::deck::FaceId,
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to the renderer when it connects.
pub struct Handshake {
    pub stream: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast when a fresh board is dealt.
pub struct BoardDealtEvent(pub BoardSnapshot);

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a card turns face up.
pub struct CardFlippedEvent {
    pub position: usize,
    pub face: FaceId,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when two face-up cards form a pair.
pub struct CardsMatchedEvent {
    pub positions: [usize; 2],
    pub face: FaceId,
    pub attempts: u32,
    pub attempts_left: u32,
    pub matched_pairs: u8,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when two face-up cards differ and input is locked.
pub struct BoardLockedEvent {
    pub positions: [usize; 2],
    pub attempts: u32,
    pub attempts_left: u32,
    /// How long the pair stays visible before turning back over.
    pub hide_after_ms: u64,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a mismatched pair turned back over and input is accepted again.
pub struct CardsHiddenEvent {
    pub positions: [usize; 2],
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast when the session terminates.
pub struct GameOverEvent(pub GameResult);

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast instead of a board when the device already used its play.
pub struct DeviceLockedEvent {
    pub message: String,
}
