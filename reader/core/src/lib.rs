//! Reader Core - Headless Reading Orchestration for arcana
//!
//! This crate provides the orchestration logic for arcana's turn-based tarot
//! readings, completely independent of any UI framework. It can drive a TUI,
//! web UI, native GUI, mobile app, or run headless for testing/automation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     Presentation Surfaces                         │
//! │     ┌─────────┐    ┌─────────┐    ┌─────────────────────┐        │
//! │     │   TUI   │    │   Web   │    │  Mobile / Headless  │        │
//! │     └────┬────┘    └────┬────┘    └──────────┬──────────┘        │
//! │          └──────────────┴────────────────────┘                   │
//! │                         │                                        │
//! │                 ReaderMessage (down)                             │
//! │                         │                                        │
//! └─────────────────────────┼────────────────────────────────────────┘
//!                           │
//! ┌─────────────────────────┼────────────────────────────────────────┐
//! │                    READER CORE                                    │
//! │  ┌──────────────────────┴────────────────────────────────────┐   │
//! │  │                      Reader                                │   │
//! │  │  ┌─────────┐  ┌──────────┐  ┌──────────┐  ┌────────────┐  │   │
//! │  │  │ Session │  │   Deck   │  │Typewriter│  │  Backend   │  │   │
//! │  │  │ (phase) │  │  (draws) │  │ (pacing) │  │  (Gemini)  │  │   │
//! │  │  └─────────┘  └──────────┘  └──────────┘  └────────────┘  │   │
//! │  └───────────────────────────────────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Reader`]: the orchestration struct that drives a reading end to end
//! - [`ReaderMessage`]: messages sent from the Reader to presentation surfaces
//! - [`Session`]: the active reading - transcript, drawn cards, phase
//! - [`TextGenerator`]: trait over the generative text backend
//! - [`DeckProvider`] / [`SessionArchiver`]: traits over the remote store
//! - [`Typewriter`]: paced reveal of complete responses
//!
//! # Quick Start
//!
//! ```ignore
//! use reader_core::{
//!     GeminiClient, MemoryKvStore, Reader, ReaderConfig, RestStore,
//!     profile,
//! };
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (tx, mut rx) = mpsc::channel(100);
//!
//!     let config = ReaderConfig::from_env();
//!     let store = Arc::new(RestStore::from_env());
//!     let kv = MemoryKvStore::new();
//!     profile::store_user_name(&kv, "Mina");
//!     let who = profile::resolve_profile(&kv, &config.deck_id);
//!
//!     let mut reader = Reader::new(
//!         GeminiClient::from_env(),
//!         store.clone(),
//!         store,
//!         who,
//!         config,
//!         tx,
//!     );
//!
//!     reader.start().await.unwrap();
//!     tokio::spawn(async move {
//!         while let Some(msg) = rx.recv().await {
//!             // Render message to the surface
//!         }
//!     });
//!     reader.start_reading("career change").await.unwrap();
//! }
//! ```
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework. It's pure orchestration logic that can be used anywhere.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cards;
pub mod clock;
pub mod config;
pub mod error;
pub mod generate;
pub mod logging;
pub mod messages;
pub mod profile;
pub mod prompt;
pub mod reader;
pub mod session;
pub mod store;
pub mod typewriter;

// Re-exports for convenience
pub use cards::{Card, CardId, DrawnCard, Position, SPREAD_SIZE};
pub use clock::{Clock, NoDelayClock, TokioClock};
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ReaderConfig, ReaderToml,
};
pub use error::ReadingError;
pub use generate::{GeminiClient, GenerateError, GenerationOptions, TextGenerator};
pub use messages::{MessageId, MessageRole, NotifyLevel, ReaderMessage};
pub use profile::{GreetingPhase, KvStore, MemoryKvStore, UserProfile};
pub use reader::Reader;
pub use session::{Message, ReadingPhase, Session};
pub use store::{DeckProvider, ReadingRecord, RestStore, SessionArchiver, StoreError};
pub use typewriter::{prefixes, RevealFrame, Typewriter};
