//! Kiosk game controller: owns the single [`Session`], applies flips, runs the
//! mismatch timer and drives the device store, tracking sink and renderer events.

use std::time::Duration;

use reqwest::Url;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::{CountOn, NotifyOn},
    dao::device_store,
    dto::game::{BoardSnapshot, DeviceStatus, FlipResponse, GameResult, StartResponse},
    error::ServiceError,
    services::{
        notifier::{self, Notification, NotificationKind},
        sse_events,
    },
    state::{
        SharedState,
        state_machine::{FlipOutcome, FlipRejection, GameOutcome, Session},
    },
};

/// Start a session, or report the locked screen when this device already played.
///
/// The lock flag is read under the session write guard, so a start cannot slip in
/// while a finishing flip is still persisting the lock.
pub async fn start_session(state: &SharedState) -> Result<StartResponse, ServiceError> {
    let variant = &state.config().variant;

    let board = {
        let mut slot = state.session().write().await;

        if variant.lock_after_play && device_locked(state).await {
            *slot = None;
            let message = state.config().messages.locked.clone();
            sse_events::broadcast_device_locked(state, &message);
            info!("device already played; showing locked screen");
            return Ok(StartResponse::Locked { message });
        }

        let session = Session::deal(variant.rules, &mut rand::rng());
        let board = BoardSnapshot::from(&session);
        *slot = Some(session);
        sse_events::broadcast_board_dealt(state, &board);
        board
    };
    info!(session_id = %board.session_id, pairs = board.pair_count, "dealt new board");

    if variant.count_on == CountOn::Start {
        record_play(state).await;
    }
    if variant.notify_on == NotifyOn::Start {
        notifier::dispatch(
            state.notifier(),
            Notification::new(NotificationKind::Play, board.session_id, 0, 0),
        );
    }

    Ok(StartResponse::Dealt { board })
}

/// Turn the card at `position` face up.
///
/// Flips the rules ignore still answer with the board plus the reason; only a
/// position outside the board or a missing session is an error. A finishing flip
/// keeps the session guard until the termination side effects are persisted.
pub async fn flip_card(
    state: &SharedState,
    position: usize,
) -> Result<FlipResponse, ServiceError> {
    let mut slot = state.session().write().await;
    let (board, finished) = {
        let Some(session) = slot.as_mut() else {
            return Err(ServiceError::InvalidState("no game in progress".into()));
        };

        let flip = match session.flip(position) {
            Ok(flip) => flip,
            Err(rejection @ FlipRejection::UnknownCard { .. }) => {
                return Err(ServiceError::InvalidInput(rejection.to_string()));
            }
            Err(rejection) => {
                debug!(position, reason = %rejection, "flip ignored");
                return Ok(FlipResponse {
                    board: BoardSnapshot::from(&*session),
                    ignored: Some(rejection.to_string()),
                    result: None,
                });
            }
        };

        let board = BoardSnapshot::from(&*session);
        match flip.outcome {
            FlipOutcome::Selected { position, face } => {
                sse_events::broadcast_card_flipped(state, position, face);
            }
            FlipOutcome::Matched { first, second, face } => {
                sse_events::broadcast_card_flipped(state, second, face);
                sse_events::broadcast_cards_matched(state, [first, second], face, &board);
            }
            FlipOutcome::Mismatched { first, second, face } => {
                let delay = state.config().variant.mismatch_delay;
                sse_events::broadcast_card_flipped(state, second, face);
                sse_events::broadcast_board_locked(
                    state,
                    [first, second],
                    &board,
                    delay.as_millis() as u64,
                );
                schedule_mismatch_resolution(state.clone(), session.id(), delay);
            }
        }

        (board, flip.finished)
    };

    let result = match finished {
        Some(outcome) => Some(finish_session(state, &board, outcome).await),
        None => None,
    };
    drop(slot);

    Ok(FlipResponse {
        board,
        ignored: None,
        result,
    })
}

/// Snapshot of the current board.
pub async fn current_board(state: &SharedState) -> Result<BoardSnapshot, ServiceError> {
    state
        .read_session(|session| session.map(BoardSnapshot::from))
        .await
        .ok_or_else(|| ServiceError::NotFound("no game has been started".into()))
}

/// Persisted counters for this device.
pub async fn device_status(state: &SharedState) -> Result<DeviceStatus, ServiceError> {
    let store = state.device_store();
    let plays = device_store::play_count(store).await?;
    let locked = device_store::is_locked(store).await?;
    Ok(DeviceStatus { plays, locked })
}

/// Clear the one-time lock so the device can play again.
pub async fn reset_device_lock(state: &SharedState) -> Result<(), ServiceError> {
    device_store::clear_lock(state.device_store()).await?;
    info!("device lock cleared");
    Ok(())
}

/// Turn a mismatched pair back over once `delay` elapsed.
///
/// The timer always runs to completion; it only touches the session it was scheduled for.
fn schedule_mismatch_resolution(state: SharedState, session_id: Uuid, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        let mut slot = state.session().write().await;
        let Some(session) = slot.as_mut().filter(|session| session.id() == session_id) else {
            debug!(%session_id, "session replaced before mismatch resolved");
            return;
        };
        if let Some((first, second)) = session.resolve_mismatch() {
            sse_events::broadcast_cards_hidden(&state, [first, second]);
        }
    });
}

/// Run the termination side effects and build the result screen.
///
/// Store and tracking failures are logged and never change the outcome. A win
/// persists exactly like a loss; only the message differs.
async fn finish_session(
    state: &SharedState,
    board: &BoardSnapshot,
    outcome: GameOutcome,
) -> GameResult {
    let config = state.config();
    let variant = &config.variant;
    info!(
        session_id = %board.session_id,
        ?outcome,
        attempts = board.attempts,
        matched_pairs = board.matched_pairs,
        "session finished"
    );

    if variant.lock_after_play {
        if let Err(err) = device_store::set_locked(state.device_store()).await {
            warn!(error = %err, "failed to persist device lock");
        }
    }
    if variant.count_on == CountOn::Finish {
        record_play(state).await;
    }
    if outcome == GameOutcome::Won && variant.notify_on == NotifyOn::Win {
        notifier::dispatch(
            state.notifier(),
            Notification::new(
                NotificationKind::Win,
                board.session_id,
                board.attempts,
                board.matched_pairs,
            ),
        );
    }

    let messages = &config.messages;
    let (title, message, sms_link) = match outcome {
        GameOutcome::Won => (
            messages.win_title.clone(),
            messages.win.clone(),
            variant.sms_message.as_deref().and_then(sms_link),
        ),
        GameOutcome::Lost => (messages.lose_title.clone(), messages.lose.clone(), None),
    };

    let result = GameResult {
        outcome,
        title,
        message,
        attempts: board.attempts,
        attempts_left: board.attempts_left,
        matched_pairs: board.matched_pairs,
        sms_link,
    };
    sse_events::broadcast_game_over(state, &result);
    result
}

async fn device_locked(state: &SharedState) -> bool {
    match device_store::is_locked(state.device_store()).await {
        Ok(locked) => locked,
        Err(err) => {
            warn!(error = %err, "could not read lock flag; treating device as unlocked");
            false
        }
    }
}

async fn record_play(state: &SharedState) {
    match device_store::increment_play_count(state.device_store()).await {
        Ok(plays) => debug!(plays, "play counted"),
        Err(err) => warn!(error = %err, "failed to update play counter"),
    }
}

fn sms_link(message: &str) -> Option<String> {
    match Url::parse_with_params("sms:", &[("body", message)]) {
        Ok(url) => Some(url.to_string()),
        Err(err) => {
            warn!(error = %err, "could not build SMS link");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::VariantPreset,
        dao::device_store::{
            DeviceStore, LOCK_FLAG_KEY, PLAY_COUNT_KEY, memory::MemoryDeviceStore,
        },
        dto::game::SessionStatus,
        state::{
            AppState,
            deck::{CardState, Deck},
            state_machine::Rules,
            testing::{
                FailingNotifier, FailingStore, RecordingNotifier, SlowStore, config_for,
                memory_state, settle,
            },
        },
    };

    /// Replace the dealt deck with a known layout: pairs sit side by side.
    async fn install_ordered_deck(state: &SharedState) {
        let rules: Rules = state.config().variant.rules;
        let faces = (1..=rules.pair_count).flat_map(|face| [face, face]).collect();
        *state.session().write().await = Some(Session::with_deck(rules, Deck::from_faces(faces)));
    }

    async fn dealt(state: &SharedState) {
        let response = start_session(state).await.unwrap();
        assert!(matches!(response, StartResponse::Dealt { .. }));
        install_ordered_deck(state).await;
    }

    async fn flip_pair(state: &SharedState, first: usize, second: usize) -> FlipResponse {
        flip_card(state, first).await.unwrap();
        flip_card(state, second).await.unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn perfect_mini_game_wins_in_four_attempts() {
        let (state, store, notifier) = memory_state(config_for(VariantPreset::Mini));
        dealt(&state).await;

        let mut last = None;
        for pair in 0..4 {
            last = Some(flip_pair(&state, pair * 2, pair * 2 + 1).await);
        }
        let last = last.unwrap();
        let result = last.result.expect("winning flip carries the result");
        assert_eq!(result.outcome, GameOutcome::Won);
        assert_eq!(result.attempts, 4);
        assert_eq!(result.matched_pairs, 4);
        assert_eq!(result.title, "WINNER!");
        assert_eq!(last.board.status, SessionStatus::Won);

        // mini counts and notifies on start, then locks
        settle().await;
        assert_eq!(store.get(PLAY_COUNT_KEY).await.unwrap().as_deref(), Some("1"));
        assert_eq!(store.get(LOCK_FLAG_KEY).await.unwrap().as_deref(), Some("1"));
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, NotificationKind::Play);
    }

    #[tokio::test(start_paused = true)]
    async fn six_mismatches_lose_the_mini_game() {
        let (state, store, _notifier) = memory_state(config_for(VariantPreset::Mini));
        dealt(&state).await;
        let delay = state.config().variant.mismatch_delay;

        let mut last = None;
        for _ in 0..6 {
            last = Some(flip_pair(&state, 0, 2).await);
            tokio::time::sleep(delay + Duration::from_millis(10)).await;
        }
        let last = last.unwrap();
        let result = last.result.expect("sixth mismatch ends the game");
        assert_eq!(result.outcome, GameOutcome::Lost);
        assert_eq!(result.attempts_left, 0);
        assert_eq!(result.sms_link, None);

        let after = flip_card(&state, 4).await.unwrap();
        assert!(after.ignored.is_some());
        assert_eq!(after.board.attempts, 6);
        assert!(after.board.cards.iter().all(|card| card.state == CardState::Hidden));

        // a loss locks the device exactly like a win
        assert_eq!(store.get(LOCK_FLAG_KEY).await.unwrap().as_deref(), Some("1"));
        assert!(matches!(
            start_session(&state).await.unwrap(),
            StartResponse::Locked { .. }
        ));
        assert!(matches!(
            current_board(&state).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn start_waits_for_the_finishing_flip_to_persist_the_lock() {
        let store = MemoryDeviceStore::default();
        let state = AppState::new(
            config_for(VariantPreset::Deluxe),
            Arc::new(SlowStore::new(store.clone(), Duration::from_millis(50))),
            Arc::new(RecordingNotifier::default()),
        );
        dealt(&state).await;
        for pair in 0..9 {
            flip_pair(&state, pair * 2, pair * 2 + 1).await;
        }
        flip_card(&state, 18).await.unwrap();

        let finishing = tokio::spawn({
            let state = state.clone();
            async move { flip_card(&state, 19).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        let second = start_session(&state).await.unwrap();
        let result = finishing.await.unwrap().unwrap().result;
        assert_eq!(result.map(|result| result.outcome), Some(GameOutcome::Won));
        assert!(
            matches!(second, StartResponse::Locked { .. }),
            "one-play device dealt a second board: {second:?}"
        );
        assert_eq!(store.get(LOCK_FLAG_KEY).await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test(start_paused = true)]
    async fn mismatch_unlocks_after_the_delay() {
        let (state, _store, _notifier) = memory_state(config_for(VariantPreset::Classic));
        dealt(&state).await;
        let mut events = state.board_events().subscribe();

        let response = flip_pair(&state, 0, 2).await;
        assert!(response.board.locked);

        let blocked = flip_card(&state, 4).await.unwrap();
        assert!(blocked.ignored.is_some());

        tokio::time::sleep(Duration::from_millis(1_010)).await;
        let board = current_board(&state).await.unwrap();
        assert!(!board.locked);
        assert_eq!(board.cards[0].state, CardState::Hidden);
        assert_eq!(board.cards[2].state, CardState::Hidden);

        let mut names = Vec::new();
        while let Ok(event) = events.try_recv() {
            names.extend(event.event);
        }
        assert_eq!(
            names,
            ["card.flipped", "card.flipped", "board.locked", "cards.hidden"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stale_timer_does_not_touch_a_new_session() {
        let (state, _store, _notifier) = memory_state(config_for(VariantPreset::Classic));
        dealt(&state).await;
        flip_pair(&state, 0, 2).await;

        dealt(&state).await;
        flip_card(&state, 5).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1_100)).await;
        let board = current_board(&state).await.unwrap();
        assert_eq!(board.cards[5].state, CardState::Flipped);
        assert_eq!(board.attempts, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn locked_device_gets_locked_screen_without_a_deck() {
        let (state, store, _notifier) = memory_state(config_for(VariantPreset::Deluxe));
        dealt(&state).await;
        for pair in 0..10 {
            flip_pair(&state, pair * 2, pair * 2 + 1).await;
        }
        assert_eq!(store.get(LOCK_FLAG_KEY).await.unwrap().as_deref(), Some("1"));

        let response = start_session(&state).await.unwrap();
        match response {
            StartResponse::Locked { message } => {
                assert_eq!(message, state.config().messages.locked)
            }
            other => panic!("expected locked screen, got {other:?}"),
        }
        assert!(matches!(
            current_board(&state).await,
            Err(ServiceError::NotFound(_))
        ));

        reset_device_lock(&state).await.unwrap();
        assert!(matches!(
            start_session(&state).await.unwrap(),
            StartResponse::Dealt { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn classic_win_counts_and_notifies_once() {
        let (state, _store, notifier) = memory_state(config_for(VariantPreset::Classic));
        dealt(&state).await;
        let mut result = None;
        for pair in 0..8 {
            result = flip_pair(&state, pair * 2, pair * 2 + 1).await.result;
        }
        let result = result.unwrap();
        assert!(result.sms_link.as_deref().unwrap().starts_with("sms:?body="));

        settle().await;
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, NotificationKind::Win);
        assert_eq!(sent[0].attempts, 8);

        let status = device_status(&state).await.unwrap();
        assert_eq!(status.plays, 1);
        assert!(!status.locked);
    }

    #[tokio::test(start_paused = true)]
    async fn broken_collaborators_do_not_change_the_outcome() {
        let state = AppState::new(
            config_for(VariantPreset::Deluxe),
            Arc::new(FailingStore),
            Arc::new(FailingNotifier),
        );
        dealt(&state).await;
        let mut result = None;
        for pair in 0..10 {
            result = flip_pair(&state, pair * 2, pair * 2 + 1).await.result;
        }
        settle().await;
        assert_eq!(result.unwrap().outcome, GameOutcome::Won);

        assert!(matches!(
            start_session(&state).await.unwrap(),
            StartResponse::Dealt { .. }
        ));
        assert!(matches!(
            device_status(&state).await,
            Err(ServiceError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn flips_need_a_session_and_a_real_position() {
        let (state, _store, _notifier) = memory_state(config_for(VariantPreset::Mini));
        assert!(matches!(
            flip_card(&state, 0).await,
            Err(ServiceError::InvalidState(_))
        ));

        start_session(&state).await.unwrap();
        assert!(matches!(
            flip_card(&state, 8).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }
}
