//! User Identity and Visit Tracking
//!
//! The host environment persists a stable per-deck user id, the user's name,
//! and a per-deck visit counter. That storage is modeled as an injected
//! key-value store with namespaced keys; the Reader itself only ever receives
//! the resolved [`UserProfile`] and never touches storage.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Key under which the user's name is stored (shared across decks)
const USER_NAME_KEY: &str = "arcana.user_name";

/// Minimal key-value persistence, localStorage-shaped
pub trait KvStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Option<String>;
    /// Write a value
    fn set(&self, key: &str, value: String);
}

/// In-memory key-value store
#[derive(Default)]
pub struct MemoryKvStore {
    inner: RwLock<HashMap<String, String>>,
}

impl MemoryKvStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.inner.write().insert(key.to_string(), value);
    }
}

/// Which greeting the session opens with
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GreetingPhase {
    /// No stored name yet; the host must ask for one first
    NameRequired,
    /// Known name, but first visit to this deck
    FirstVisit,
    /// Known name and a prior visit to this deck
    Returning,
}

/// Resolved identity handed to the Reader
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserProfile {
    /// Stable per-deck user id
    pub user_id: String,
    /// Stored display name, if any
    pub user_name: Option<String>,
    /// Visits to this deck, including the current one
    pub visit_count: u32,
    /// Greeting phase derived from name + visit count
    pub greeting: GreetingPhase,
}

impl UserProfile {
    /// Name to address the user by in prompts and greetings
    pub fn display_name(&self) -> &str {
        self.user_name.as_deref().unwrap_or("seeker")
    }
}

/// Resolve the profile for one deck, counting this call as a visit.
///
/// Creates and persists a fresh user id on first contact. Keys are
/// namespaced per deck; the name is shared across decks.
pub fn resolve_profile(store: &dyn KvStore, deck_id: &str) -> UserProfile {
    let id_key = format!("arcana.user_id.{deck_id}");
    let visit_key = format!("arcana.visit_count.{deck_id}");

    let user_id = match store.get(&id_key) {
        Some(id) => id,
        None => {
            let id = format!("seeker_{}", uuid::Uuid::new_v4());
            store.set(&id_key, id.clone());
            tracing::debug!(deck_id, user_id = %id, "Created new user id");
            id
        }
    };

    let visit_count = store
        .get(&visit_key)
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(0)
        + 1;
    store.set(&visit_key, visit_count.to_string());

    let user_name = store.get(USER_NAME_KEY);
    let greeting = match (&user_name, visit_count) {
        (None, _) => GreetingPhase::NameRequired,
        (Some(_), 1) => GreetingPhase::FirstVisit,
        (Some(_), _) => GreetingPhase::Returning,
    };

    UserProfile {
        user_id,
        user_name,
        visit_count,
        greeting,
    }
}

/// Persist the user's name (shared across decks)
pub fn store_user_name(store: &dyn KvStore, name: &str) {
    store.set(USER_NAME_KEY, name.trim().to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_contact_requires_name() {
        let store = MemoryKvStore::new();
        let profile = resolve_profile(&store, "classic");

        assert_eq!(profile.greeting, GreetingPhase::NameRequired);
        assert_eq!(profile.visit_count, 1);
        assert!(profile.user_id.starts_with("seeker_"));
        assert_eq!(profile.display_name(), "seeker");
    }

    #[test]
    fn test_user_id_is_stable_per_deck() {
        let store = MemoryKvStore::new();
        let first = resolve_profile(&store, "classic");
        let second = resolve_profile(&store, "classic");
        let other_deck = resolve_profile(&store, "lunar");

        assert_eq!(first.user_id, second.user_id);
        assert_ne!(first.user_id, other_deck.user_id);
        assert_eq!(second.visit_count, 2);
    }

    #[test]
    fn test_greeting_phases() {
        let store = MemoryKvStore::new();
        store_user_name(&store, "Mina");

        let first = resolve_profile(&store, "classic");
        assert_eq!(first.greeting, GreetingPhase::FirstVisit);
        assert_eq!(first.display_name(), "Mina");

        let second = resolve_profile(&store, "classic");
        assert_eq!(second.greeting, GreetingPhase::Returning);

        // A different deck starts its own visit count
        let lunar = resolve_profile(&store, "lunar");
        assert_eq!(lunar.greeting, GreetingPhase::FirstVisit);
    }
}
