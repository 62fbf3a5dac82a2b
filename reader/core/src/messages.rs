//! Reader Messages
//!
//! Messages sent from the Reader to presentation surfaces. These represent all
//! the ways the orchestration layer can communicate with a connected UI
//! (TUI, `WebUI`, mobile, headless test harness).
//!
//! # Design Philosophy
//!
//! The Reader is the "voice" of arcana: it decides what is said and when.
//! Surfaces are pure renderers that display what the Reader tells them to.
//! This separation enables:
//!
//! - Hot-swappable surfaces (switch from TUI to web mid-session)
//! - Headless operation for testing and automation
//! - Clean separation of concerns

use serde::{Deserialize, Serialize};

use crate::cards::Position;
use crate::session::ReadingPhase;

/// Messages from Reader to a presentation surface
///
/// These messages tell the surface what to display. The surface should not
/// have any business logic - just render what it's told.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ReaderMessage {
    /// A complete transcript message to display
    Message {
        /// Unique message ID for tracking
        id: MessageId,
        /// Who sent this message
        role: MessageRole,
        /// The message content
        content: String,
    },

    /// A paced reveal update for a message still being "typed"
    ///
    /// `content` is the full prefix revealed so far; each update replaces the
    /// previous one, so surfaces can render it as a single growing bubble.
    StreamUpdate {
        /// Message ID the reveal belongs to
        message_id: MessageId,
        /// The prefix revealed so far
        content: String,
    },

    /// The paced reveal has finished
    StreamEnd {
        /// Message ID that completed
        message_id: MessageId,
        /// The final complete content
        final_content: String,
    },

    /// The reading advanced to a new phase
    Phase {
        /// The new phase
        phase: ReadingPhase,
    },

    /// A card was drawn for the current reading
    CardDrawn {
        /// Narrative position the card was drawn into
        position: Position,
        /// Card name
        name: String,
    },

    /// Deck availability information
    DeckInfo {
        /// Deck identity the cards belong to
        deck_id: String,
        /// Number of cards loaded
        card_count: usize,
        /// Whether the deck is ready for a reading
        ready: bool,
    },

    /// System notification
    Notify {
        /// Notification level
        level: NotifyLevel,
        /// Message content
        message: String,
    },

    /// A finished reading was written to the archive
    Archived {
        /// Identifier assigned by the archive store
        reading_id: String,
    },
}

/// Message identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a new unique message ID
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        Self(format!("msg_{id}"))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

/// Who sent a transcript message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    /// The querent (the person asking)
    User,
    /// The reader persona
    Assistant,
}

/// Notification levels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    /// Informational
    Info,
    /// Warning
    Warning,
    /// Error
    Error,
}
