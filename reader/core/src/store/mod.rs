//! Remote Store Collaborators
//!
//! Thin request/response wrappers around the remote data store: the deck
//! provider (read-only card source) and the session archiver (write-only
//! sink for finished readings). Neither holds internal state.

mod rest;
mod traits;

pub use rest::RestStore;
pub use traits::{DeckProvider, ReadingRecord, SessionArchiver, StoreError};
