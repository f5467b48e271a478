use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::deck::{CardState, Deck, FaceId};

/// Board dimensions and attempt budget a session is played with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rules {
    /// Number of distinct pairs on the board.
    pub pair_count: u8,
    /// Attempts (pairs of flips) allowed before the session is lost.
    pub max_attempts: u32,
}

/// Where the current turn stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// No card selected.
    Idle,
    /// First card face up, waiting for the second.
    OneSelected {
        /// Position of the first card.
        first: usize,
    },
    /// Two mismatched cards are face up and the board is locked until they hide again.
    Resolving {
        /// Position of the first card.
        first: usize,
        /// Position of the second card.
        second: usize,
    },
}

/// Final result of a terminated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    /// Every pair was found within the attempt budget.
    Won,
    /// The attempt budget ran out with pairs remaining.
    Lost,
}

/// Reasons a flip is ignored. None of them mutate the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FlipRejection {
    /// The position does not exist on this board.
    #[error("no card at position {position} (board has {len} cards)")]
    UnknownCard {
        /// Requested position.
        position: usize,
        /// Number of cards on the board.
        len: usize,
    },
    /// The session already ended.
    #[error("session already terminated ({0:?})")]
    Terminated(GameOutcome),
    /// Every allowed attempt was used while pairs remain.
    #[error("no attempts left")]
    OutOfAttempts,
    /// A mismatched pair is still face up.
    #[error("board is locked while a mismatch resolves")]
    Locked,
    /// The selected card was clicked again.
    #[error("card {0} is already selected")]
    SameCard(usize),
    /// The card is face up already.
    #[error("card {0} is already flipped")]
    AlreadyFlipped(usize),
    /// The card belongs to a found pair.
    #[error("card {0} is already matched")]
    AlreadyMatched(usize),
}

/// What an accepted flip did to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipOutcome {
    /// First card of a turn turned face up.
    Selected {
        /// Flipped position.
        position: usize,
        /// Face revealed.
        face: FaceId,
    },
    /// Second card matched the first; both stay face up.
    Matched {
        /// Position of the first card.
        first: usize,
        /// Position of the second card.
        second: usize,
        /// Shared face.
        face: FaceId,
    },
    /// Second card did not match; the board stays locked until
    /// [`Session::resolve_mismatch`] runs.
    Mismatched {
        /// Position of the first card.
        first: usize,
        /// Position of the second card.
        second: usize,
        /// Face revealed by the second card.
        face: FaceId,
    },
}

/// Result of an accepted flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flip {
    /// Board change caused by the flip.
    pub outcome: FlipOutcome,
    /// Set when this flip terminated the session.
    pub finished: Option<GameOutcome>,
}

/// One memory game on one kiosk: the dealt deck plus turn and attempt accounting.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    rules: Rules,
    deck: Deck,
    attempts: u32,
    matched_pairs: u8,
    phase: TurnPhase,
    outcome: Option<GameOutcome>,
}

impl Session {
    /// Deal a freshly shuffled deck for `rules`.
    pub fn deal<R: Rng + ?Sized>(rules: Rules, rng: &mut R) -> Self {
        Self::with_deck(rules, Deck::shuffled(rules.pair_count, rng))
    }

    /// Start a session on a pre-built deck.
    pub fn with_deck(rules: Rules, deck: Deck) -> Self {
        Self {
            id: Uuid::new_v4(),
            rules,
            deck,
            attempts: 0,
            matched_pairs: 0,
            phase: TurnPhase::Idle,
            outcome: None,
        }
    }

    /// Unique identifier of this session, used to discard stale timers.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Rules this session is played with.
    pub fn rules(&self) -> Rules {
        self.rules
    }

    /// Dealt cards.
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Completed pairs of flips so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Attempts still available.
    pub fn attempts_left(&self) -> u32 {
        self.rules.max_attempts.saturating_sub(self.attempts)
    }

    /// Pairs found so far.
    pub fn matched_pairs(&self) -> u8 {
        self.matched_pairs
    }

    /// Current turn phase.
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// True while a mismatched pair waits to be hidden again.
    pub fn is_locked(&self) -> bool {
        matches!(self.phase, TurnPhase::Resolving { .. })
    }

    /// True once the session has been won or lost.
    pub fn is_terminated(&self) -> bool {
        self.outcome.is_some()
    }

    /// Final result, if any.
    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    /// Turn the card at `position` face up and advance the turn.
    pub fn flip(&mut self, position: usize) -> Result<Flip, FlipRejection> {
        let card = self.deck.get(position).ok_or(FlipRejection::UnknownCard {
            position,
            len: self.deck.len(),
        })?;

        if let Some(outcome) = self.outcome {
            return Err(FlipRejection::Terminated(outcome));
        }
        if self.attempts >= self.rules.max_attempts && self.matched_pairs < self.rules.pair_count
        {
            return Err(FlipRejection::OutOfAttempts);
        }

        match (self.phase, card.state) {
            (TurnPhase::Resolving { .. }, _) => return Err(FlipRejection::Locked),
            (TurnPhase::OneSelected { first }, _) if first == position => {
                return Err(FlipRejection::SameCard(position));
            }
            (_, CardState::Flipped) => return Err(FlipRejection::AlreadyFlipped(position)),
            (_, CardState::Matched) => return Err(FlipRejection::AlreadyMatched(position)),
            (_, CardState::Hidden) => {}
        }

        let face = card.face;
        self.set_state(position, CardState::Flipped);

        let TurnPhase::OneSelected { first } = self.phase else {
            self.phase = TurnPhase::OneSelected { first: position };
            return Ok(Flip {
                outcome: FlipOutcome::Selected { position, face },
                finished: None,
            });
        };

        self.attempts += 1;
        let second = position;
        let first_face = self.deck.get(first).map(|card| card.face);

        let outcome = if first_face == Some(face) {
            self.set_state(first, CardState::Matched);
            self.set_state(second, CardState::Matched);
            self.matched_pairs += 1;
            self.phase = TurnPhase::Idle;
            FlipOutcome::Matched {
                first,
                second,
                face,
            }
        } else {
            self.phase = TurnPhase::Resolving { first, second };
            FlipOutcome::Mismatched {
                first,
                second,
                face,
            }
        };

        Ok(Flip {
            outcome,
            finished: self.evaluate_termination(),
        })
    }

    /// Hide a mismatched pair and unlock the board. Returns the hidden positions, or
    /// `None` when nothing was pending.
    ///
    /// Runs even on a terminated session so the last mismatched pair turns back over.
    pub fn resolve_mismatch(&mut self) -> Option<(usize, usize)> {
        let TurnPhase::Resolving { first, second } = self.phase else {
            return None;
        };
        self.set_state(first, CardState::Hidden);
        self.set_state(second, CardState::Hidden);
        self.phase = TurnPhase::Idle;
        Some((first, second))
    }

    /// Win beats loss when the last allowed attempt also completes the board.
    fn evaluate_termination(&mut self) -> Option<GameOutcome> {
        let outcome = if self.matched_pairs == self.rules.pair_count {
            GameOutcome::Won
        } else if self.attempts >= self.rules.max_attempts {
            GameOutcome::Lost
        } else {
            return None;
        };
        self.outcome = Some(outcome);
        Some(outcome)
    }

    fn set_state(&mut self, position: usize, state: CardState) {
        if let Some(card) = self.deck.get_mut(position) {
            card.state = state;
        }
    }
}
