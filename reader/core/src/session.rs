//! Session Management
//!
//! One session is one reading: from concern submission through the final
//! synthesis. The Reader owns the session exclusively; nothing else mutates
//! it. The transcript is append-only - messages are never reordered or
//! deleted mid-session.

use serde::{Deserialize, Serialize};

use crate::cards::DrawnCard;
use crate::messages::{MessageId, MessageRole};

/// A message in the reading transcript
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: MessageId,
    /// Who sent this message
    pub role: MessageRole,
    /// Message content
    pub content: String,
}

impl Message {
    /// Create a new message
    pub fn new(role: MessageRole, content: String) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content,
        }
    }
}

/// Phase of the active reading
///
/// Phases advance strictly forward during a reading; only [`Session::clear`]
/// (driven by the Reader's reset) returns to `Idle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadingPhase {
    /// No active reading
    Idle,
    /// Concern accepted; opening remark being produced
    Opening,
    /// Cosmetic shuffle delay
    Shuffling,
    /// Announcing the card at the given spread index
    Revealing(usize),
    /// Interpreting the card at the given spread index
    Interpreting(usize),
    /// Synthesizing the whole spread
    Summarizing,
    /// Reading delivered; follow-up actions available
    Complete,
}

impl ReadingPhase {
    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Waiting for a concern",
            Self::Opening => "Listening...",
            Self::Shuffling => "Shuffling the deck...",
            Self::Revealing(_) => "Turning a card...",
            Self::Interpreting(_) => "Reading the card...",
            Self::Summarizing => "Weighing the whole spread...",
            Self::Complete => "Reading complete",
        }
    }
}

/// The active reading session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    /// The concern as the user stated it
    pub concern: String,
    /// Short derived summary shown as the session title
    pub display_title: String,
    /// Cards drawn so far, in draw order
    pub drawn: Vec<DrawnCard>,
    /// Append-only transcript
    pub transcript: Vec<Message>,
    /// Current phase
    pub phase: ReadingPhase,
    /// Spread index currently (or last) being interpreted
    pub interpretation_index: usize,
    /// Whether the final synthesis has been delivered
    pub finalized: bool,
    /// Reset generation; requests tagged with an older generation are stale
    pub generation: u64,
}

impl Session {
    /// Create an empty session
    pub fn new() -> Self {
        Self {
            concern: String::new(),
            display_title: String::new(),
            drawn: Vec::new(),
            transcript: Vec::new(),
            phase: ReadingPhase::Idle,
            interpretation_index: 0,
            finalized: false,
            generation: 0,
        }
    }

    /// Append a message and return its id
    pub fn append(&mut self, role: MessageRole, content: String) -> MessageId {
        let msg = Message::new(role, content);
        let id = msg.id.clone();
        self.transcript.push(msg);
        id
    }

    /// Append an already-constructed message (keeps an id allocated earlier,
    /// e.g. while its content was still being revealed)
    pub fn append_message(&mut self, msg: Message) {
        self.transcript.push(msg);
    }

    /// Whether a reading has started (cards drawn)
    pub fn is_started(&self) -> bool {
        !self.drawn.is_empty()
    }

    /// Names of drawn cards in draw order
    pub fn drawn_names(&self) -> Vec<String> {
        self.drawn.iter().map(|d| d.card.name.clone()).collect()
    }

    /// Number of assistant messages in the transcript
    pub fn assistant_count(&self) -> usize {
        self.transcript
            .iter()
            .filter(|m| m.role == MessageRole::Assistant)
            .count()
    }

    /// Clear the session back to `Idle` and bump the generation so any
    /// in-flight response for the old reading is discarded on arrival
    pub fn clear(&mut self) {
        self.concern.clear();
        self.display_title.clear();
        self.drawn.clear();
        self.transcript.clear();
        self.phase = ReadingPhase::Idle;
        self.interpretation_index = 0;
        self.finalized = false;
        self.generation += 1;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
