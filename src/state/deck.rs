//! Deck construction for the memory board.

use rand::Rng;
use serde::Serialize;
use utoipa::ToSchema;

/// Identifier shared by the two cards of a pair (`1..=pair_count`).
pub type FaceId = u8;

/// Visual state of a single card on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CardState {
    /// Face down and selectable.
    Hidden,
    /// Face up while waiting for the turn to resolve.
    Flipped,
    /// Part of a found pair; stays face up for the rest of the session.
    Matched,
}

/// One card dealt on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Pair identifier, mapped to an image by the renderer.
    pub face: FaceId,
    /// Index of the card in the dealt deck.
    pub position: usize,
    /// Current flip state.
    pub state: CardState,
}

/// Ordered cards of a session. Every face in `1..=pair_count` appears exactly twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Shuffle a fresh deck of `pair_count` pairs.
    pub fn shuffled<R: Rng + ?Sized>(pair_count: u8, rng: &mut R) -> Self {
        Self::from_faces(build_faces(pair_count, rng))
    }

    /// Lay out cards in the exact face order given, all hidden.
    pub fn from_faces(faces: Vec<FaceId>) -> Self {
        let cards = faces
            .into_iter()
            .enumerate()
            .map(|(position, face)| Card {
                face,
                position,
                state: CardState::Hidden,
            })
            .collect();
        Self { cards }
    }

    /// Number of cards on the board.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// True when no card was dealt.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Borrow the card at `position`.
    pub fn get(&self, position: usize) -> Option<&Card> {
        self.cards.get(position)
    }

    pub(crate) fn get_mut(&mut self, position: usize) -> Option<&mut Card> {
        self.cards.get_mut(position)
    }

    /// Iterate the cards in board order.
    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }
}

/// Produce `2 * pair_count` faces, each identifier twice, in Fisher–Yates order.
pub fn build_faces<R: Rng + ?Sized>(pair_count: u8, rng: &mut R) -> Vec<FaceId> {
    let mut faces: Vec<FaceId> = (1..=pair_count).flat_map(|face| [face, face]).collect();
    fisher_yates(&mut faces, rng);
    faces
}

/// In-place Fisher–Yates: walk from the last index down to 1 and swap with a uniform
/// index in `[0, i]`.
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}
