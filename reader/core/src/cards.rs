//! Card Deck Data Model and Draw Algorithms
//!
//! Cards are immutable records supplied by a deck store. Draws are uniform
//! and without replacement: no card id appears twice within one session's
//! drawn set.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of cards in the base spread
pub const SPREAD_SIZE: usize = 3;

/// Card identifier (stable across deck loads)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(pub String);

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single card in a deck
///
/// Never mutated after load; the deck store is the source of truth.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Card {
    /// Stable card identifier
    pub id: CardId,
    /// Display name
    pub name: String,
    /// Short keyword line
    pub keyword: String,
    /// Longer interpretive meaning
    pub meaning: String,
    /// Sort position within the deck
    pub ordinal: u32,
}

/// Narrative position a draw is bound to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    /// First draw: the situation as it stands
    PastPresent,
    /// Second draw: the inner, emotional undercurrent
    Inner,
    /// Third draw: the direction things are heading
    Future,
    /// Any draw beyond the base spread
    Supplementary,
}

impl Position {
    /// Position for the i-th draw of a session
    #[must_use]
    pub fn of_index(index: usize) -> Self {
        match index {
            0 => Self::PastPresent,
            1 => Self::Inner,
            2 => Self::Future,
            _ => Self::Supplementary,
        }
    }

    /// Semantic role description, used when building prompts
    #[must_use]
    pub fn role_text(&self) -> &'static str {
        match self {
            Self::PastPresent => "the past and present situation",
            Self::Inner => "the inner feelings and undercurrents",
            Self::Future => "the future direction and likely outcome",
            Self::Supplementary => "an additional message on top of the spread",
        }
    }

    /// Ordinal label for reveal announcements ("first", "second", ...)
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::PastPresent => "first",
            Self::Inner => "second",
            Self::Future => "third",
            Self::Supplementary => "extra",
        }
    }
}

/// A card bound to a narrative position for the current session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DrawnCard {
    /// The drawn card
    pub card: Card,
    /// The position it was drawn into
    pub position: Position,
}

/// Draw the base spread: [`SPREAD_SIZE`] distinct cards, uniformly at random
/// without replacement, bound to positions in draw order.
///
/// The deck must hold at least [`SPREAD_SIZE`] cards; the orchestrator
/// validates this before starting a reading.
pub fn draw_spread<R: Rng>(deck: &[Card], rng: &mut R) -> Vec<DrawnCard> {
    deck.choose_multiple(rng, SPREAD_SIZE)
        .cloned()
        .enumerate()
        .map(|(i, card)| DrawnCard {
            card,
            position: Position::of_index(i),
        })
        .collect()
}

/// Draw one supplementary card, excluding every id already drawn this session.
///
/// Returns `None` when no eligible card remains.
pub fn draw_supplementary<R: Rng>(
    deck: &[Card],
    drawn: &[DrawnCard],
    rng: &mut R,
) -> Option<DrawnCard> {
    let eligible: Vec<&Card> = deck
        .iter()
        .filter(|c| !drawn.iter().any(|d| d.card.id == c.id))
        .collect();

    eligible.choose(rng).map(|card| DrawnCard {
        card: (*card).clone(),
        position: Position::Supplementary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn deck(n: usize) -> Vec<Card> {
        (0..n)
            .map(|i| Card {
                id: CardId(format!("card_{i}")),
                name: format!("Card {i}"),
                keyword: format!("keyword {i}"),
                meaning: format!("meaning {i}"),
                ordinal: i as u32,
            })
            .collect()
    }

    #[test]
    fn test_spread_has_distinct_cards_from_deck() {
        let deck = deck(10);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let spread = draw_spread(&deck, &mut rng);
            assert_eq!(spread.len(), SPREAD_SIZE);

            for (i, drawn) in spread.iter().enumerate() {
                assert_eq!(drawn.position, Position::of_index(i));
                assert!(deck.iter().any(|c| c.id == drawn.card.id));
            }

            let mut ids: Vec<_> = spread.iter().map(|d| d.card.id.clone()).collect();
            ids.sort_by(|a, b| a.0.cmp(&b.0));
            ids.dedup();
            assert_eq!(ids.len(), SPREAD_SIZE);
        }
    }

    #[test]
    fn test_supplementary_never_repeats() {
        let deck = deck(6);
        let mut rng = StdRng::seed_from_u64(42);
        let mut drawn = draw_spread(&deck, &mut rng);

        // Drain the remaining three cards one at a time
        for _ in 0..3 {
            let extra = draw_supplementary(&deck, &drawn, &mut rng).unwrap();
            assert_eq!(extra.position, Position::Supplementary);
            assert!(!drawn.iter().any(|d| d.card.id == extra.card.id));
            drawn.push(extra);
        }

        // Deck is now exhausted
        assert!(draw_supplementary(&deck, &drawn, &mut rng).is_none());
    }

    #[test]
    fn test_position_of_index() {
        assert_eq!(Position::of_index(0), Position::PastPresent);
        assert_eq!(Position::of_index(1), Position::Inner);
        assert_eq!(Position::of_index(2), Position::Future);
        assert_eq!(Position::of_index(3), Position::Supplementary);
        assert_eq!(Position::of_index(9), Position::Supplementary);
    }
}
