//! Store Traits
//!
//! Trait definitions for the remote data store. The Reader only ever reads
//! cards and writes finished readings; everything else about the store is
//! out of its hands.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::cards::Card;

/// Errors from the remote store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport-level failure
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Store answered with a non-success status
    #[error("store returned {status}: {message}")]
    BadStatus {
        /// HTTP status code
        status: u16,
        /// Error body or reason
        message: String,
    },

    /// Response rows could not be decoded
    #[error("failed to decode store response: {0}")]
    Decode(String),
}

/// Read-only source of card decks
#[async_trait]
pub trait DeckProvider: Send + Sync {
    /// Fetch the full card set for one deck identity, ordered by ordinal
    async fn list_cards(&self, deck_id: &str) -> Result<Vec<Card>, StoreError>;
}

/// Summary of one finished (or abandoned) reading
#[derive(Clone, Debug)]
pub struct ReadingRecord {
    /// Stable per-deck user id
    pub user_id: String,
    /// Display name the user gave
    pub user_name: String,
    /// The concern as stated
    pub concern: String,
    /// Derived session title
    pub title: String,
    /// Names of drawn cards, in draw order
    pub cards_drawn: Vec<String>,
    /// When the reading ended
    pub created_at: DateTime<Utc>,
}

/// Write-only sink for finished readings
///
/// A failed write is logged and swallowed by the caller - it never blocks
/// the user-visible reset flow.
#[async_trait]
pub trait SessionArchiver: Send + Sync {
    /// Persist a reading summary, returning the id assigned by the store
    async fn save_reading(&self, record: &ReadingRecord) -> Result<String, StoreError>;
}
