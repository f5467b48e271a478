use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        game::{BoardSnapshot, GameResult},
        sse::{
            BoardDealtEvent, BoardLockedEvent, CardFlippedEvent, CardsHiddenEvent,
            CardsMatchedEvent, DeviceLockedEvent, GameOverEvent, ServerEvent,
        },
    },
    state::{SharedState, deck::FaceId},
};

const EVENT_BOARD_DEALT: &str = "board.dealt";
const EVENT_CARD_FLIPPED: &str = "card.flipped";
const EVENT_CARDS_MATCHED: &str = "cards.matched";
const EVENT_BOARD_LOCKED: &str = "board.locked";
const EVENT_CARDS_HIDDEN: &str = "cards.hidden";
const EVENT_GAME_OVER: &str = "game.over";
const EVENT_DEVICE_LOCKED: &str = "device.locked";

/// Broadcast a freshly dealt board so the renderer can lay out one element per card.
pub fn broadcast_board_dealt(state: &SharedState, board: &BoardSnapshot) {
    send_board_event(state, EVENT_BOARD_DEALT, &BoardDealtEvent(board.clone()));
}

/// Broadcast that a card turned face up.
pub fn broadcast_card_flipped(state: &SharedState, position: usize, face: FaceId) {
    send_board_event(
        state,
        EVENT_CARD_FLIPPED,
        &CardFlippedEvent { position, face },
    );
}

/// Broadcast a found pair with the updated counters.
pub fn broadcast_cards_matched(
    state: &SharedState,
    positions: [usize; 2],
    face: FaceId,
    board: &BoardSnapshot,
) {
    let payload = CardsMatchedEvent {
        positions,
        face,
        attempts: board.attempts,
        attempts_left: board.attempts_left,
        matched_pairs: board.matched_pairs,
    };
    send_board_event(state, EVENT_CARDS_MATCHED, &payload);
}

/// Broadcast that input is locked while a mismatched pair stays visible.
pub fn broadcast_board_locked(
    state: &SharedState,
    positions: [usize; 2],
    board: &BoardSnapshot,
    hide_after_ms: u64,
) {
    let payload = BoardLockedEvent {
        positions,
        attempts: board.attempts,
        attempts_left: board.attempts_left,
        hide_after_ms,
    };
    send_board_event(state, EVENT_BOARD_LOCKED, &payload);
}

/// Broadcast that a mismatched pair turned back over.
pub fn broadcast_cards_hidden(state: &SharedState, positions: [usize; 2]) {
    send_board_event(state, EVENT_CARDS_HIDDEN, &CardsHiddenEvent { positions });
}

/// Broadcast the result screen.
pub fn broadcast_game_over(state: &SharedState, result: &GameResult) {
    send_board_event(state, EVENT_GAME_OVER, &GameOverEvent(result.clone()));
}

/// Broadcast the permanent locked screen.
pub fn broadcast_device_locked(state: &SharedState, message: &str) {
    let payload = DeviceLockedEvent {
        message: message.to_string(),
    };
    send_board_event(state, EVENT_DEVICE_LOCKED, &payload);
}

fn send_board_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.board_events().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize board SSE payload"),
    }
}
