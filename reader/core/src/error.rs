//! Error Taxonomy
//!
//! Every failure class the core can produce. All of them are caught at the
//! call site that produced them and converted into a transcript message, a
//! notification, or a no-op - nothing here is fatal to the process. The
//! worst case is a stalled session requiring a manual reset.

use thiserror::Error;

use crate::generate::GenerateError;
use crate::store::StoreError;

/// Errors surfaced by Reader operations
#[derive(Debug, Error)]
pub enum ReadingError {
    /// The concern was blank; the user must correct their input
    #[error("concern must not be blank")]
    BlankConcern,

    /// The deck has not loaded (or holds too few cards) for a reading
    #[error("the deck is not ready")]
    DeckNotReady,

    /// A follow-up action was invoked with no reading in progress
    #[error("no active reading")]
    NoActiveReading,

    /// The text backend failed; a fallback message was shown instead
    #[error("text generation failed: {0}")]
    Generation(#[from] GenerateError),

    /// No undrawn card remains for a supplementary draw
    #[error("no undrawn cards remain in the deck")]
    DeckExhausted,

    /// The archive write failed (logged and swallowed by reset)
    #[error("failed to archive reading: {0}")]
    Persistence(StoreError),

    /// The deck store could not be reached; the session cannot start
    #[error("deck store unavailable: {0}")]
    BackendUnavailable(StoreError),
}
