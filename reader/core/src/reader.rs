//! Reader - The Orchestration Core
//!
//! The Reader is the "voice" of arcana. It owns the session's phase state
//! machine, selects cards, builds per-position prompts, calls the text
//! backend, paces each response through the typewriter, and decides the next
//! transition.
//!
//! # Design Philosophy
//!
//! The Reader is UI-agnostic. It doesn't know or care whether it's talking to
//! a TUI, web page, or test harness; it communicates through
//! [`ReaderMessage`] sent over an mpsc channel.
//!
//! Control flow is a single logical thread with cooperative suspension: one
//! outstanding generation call at a time, delays and reveal pacing awaited on
//! the injected [`Clock`]. Between suspension points, session mutation is
//! synchronous - no two phase transitions can interleave for one session.
//! Every generation request is tagged with the session generation it belongs
//! to; a response arriving after a reset is discarded instead of corrupting
//! the fresh session.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;

use crate::cards::{self, Card, SPREAD_SIZE};
use crate::clock::{Clock, TokioClock};
use crate::config::ReaderConfig;
use crate::error::ReadingError;
use crate::generate::{GenerateError, GenerationOptions, TextGenerator};
use crate::messages::{MessageId, MessageRole, NotifyLevel, ReaderMessage};
use crate::profile::{GreetingPhase, UserProfile};
use crate::prompt;
use crate::session::{Message, ReadingPhase, Session};
use crate::store::{DeckProvider, ReadingRecord, SessionArchiver};
use crate::typewriter::{RevealFrame, Typewriter};

/// Sampling for per-card interpretations
const INTERPRETATION_OPTIONS: GenerationOptions = GenerationOptions {
    temperature: 0.9,
    top_p: 0.95,
    top_k: 40,
    max_output_tokens: 200,
};

/// Sampling for the final synthesis
const SUMMARY_OPTIONS: GenerationOptions = GenerationOptions {
    temperature: 0.9,
    top_p: 0.95,
    top_k: 40,
    max_output_tokens: 250,
};

/// Sampling for follow-up actions (supplementary, advice, fortune)
const FOLLOWUP_OPTIONS: GenerationOptions = GenerationOptions {
    temperature: 0.9,
    top_p: 0.95,
    top_k: 40,
    max_output_tokens: 100,
};

/// Sampling for the short helper calls (title, opening remark)
const SHORT_OPTIONS: GenerationOptions = GenerationOptions {
    temperature: 0.9,
    top_p: 0.95,
    top_k: 40,
    max_output_tokens: 100,
};

/// Opening line used when the generated remark is unavailable
const FALLBACK_OPENING: &str = "Your concern hangs in the air. Let me shuffle the cards.";

/// Transcript message used when a generation call fails mid-reading
const FALLBACK_INTERPRETATION: &str =
    "An error occurred while interpreting the cards. When you are ready, \
     ask for more or start a fresh reading.";

/// The Reader - headless reading orchestration core
pub struct Reader<G: TextGenerator> {
    /// Configuration
    config: ReaderConfig,
    /// Text generation backend
    generator: Arc<G>,
    /// Card source
    deck_provider: Arc<dyn DeckProvider>,
    /// Finished-reading sink
    archiver: Arc<dyn SessionArchiver>,
    /// Delay source for cosmetic pauses
    clock: Arc<dyn Clock>,
    /// Paced text reveal
    typewriter: Typewriter,
    /// Draw randomness
    rng: StdRng,
    /// Resolved identity of the querent
    profile: UserProfile,
    /// Loaded deck (read-only after load)
    deck: Vec<Card>,
    /// The active session
    session: Session,
    /// Channel to the presentation surface
    tx: mpsc::Sender<ReaderMessage>,
}

impl<G: TextGenerator + 'static> Reader<G> {
    /// Create a new Reader
    pub fn new(
        generator: G,
        deck_provider: Arc<dyn DeckProvider>,
        archiver: Arc<dyn SessionArchiver>,
        profile: UserProfile,
        config: ReaderConfig,
        tx: mpsc::Sender<ReaderMessage>,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(TokioClock);
        let typewriter = Typewriter::new(
            Duration::from_millis(config.type_interval_ms),
            Arc::clone(&clock),
        );

        Self {
            config,
            generator: Arc::new(generator),
            deck_provider,
            archiver,
            clock,
            typewriter,
            rng: StdRng::from_entropy(),
            profile,
            deck: Vec::new(),
            session: Session::new(),
            tx,
        }
    }

    /// Replace the delay source (deterministic tests, headless runs)
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.typewriter = Typewriter::new(
            Duration::from_millis(self.config.type_interval_ms),
            Arc::clone(&clock),
        );
        self.clock = clock;
        self
    }

    /// Seed the draw randomness (reproducible draws)
    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// The active session (read-only)
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current reading phase
    pub fn phase(&self) -> ReadingPhase {
        self.session.phase
    }

    /// Whether the deck holds enough cards for a reading
    pub fn is_ready(&self) -> bool {
        self.deck.len() >= SPREAD_SIZE
    }

    /// Load the deck and probe the text backend.
    ///
    /// An unreachable text backend is a warning (the first call may fail);
    /// an unreachable deck store means no reading can start.
    pub async fn start(&mut self) -> Result<(), ReadingError> {
        if !self.generator.health_check().await {
            self.notify(
                NotifyLevel::Warning,
                "Text backend not reachable - the first reading may be slow",
            )
            .await;
        }

        match self.deck_provider.list_cards(&self.config.deck_id).await {
            Ok(cards) => {
                tracing::info!(deck_id = %self.config.deck_id, count = cards.len(), "Deck loaded");
                self.deck = cards;
                self.send(ReaderMessage::DeckInfo {
                    deck_id: self.config.deck_id.clone(),
                    card_count: self.deck.len(),
                    ready: self.is_ready(),
                })
                .await;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Deck load failed");
                self.notify(
                    NotifyLevel::Error,
                    "The deck could not be loaded. Please try again shortly.",
                )
                .await;
                Err(ReadingError::BackendUnavailable(e))
            }
        }
    }

    /// Begin a reading for `concern` and drive it through to completion.
    ///
    /// Positions are interpreted strictly in order; the interpretation for
    /// position i+1 never begins before the text for position i has been
    /// fully appended. A generation failure mid-reading appends one fallback
    /// message and halts without advancing the phase; the session stays
    /// recoverable through the follow-up actions or a reset.
    pub async fn start_reading(&mut self, concern: &str) -> Result<(), ReadingError> {
        let concern = concern.trim().to_string();
        if concern.is_empty() {
            return Err(ReadingError::BlankConcern);
        }
        if !self.is_ready() {
            return Err(ReadingError::DeckNotReady);
        }

        let generation = self.session.generation;
        self.session.concern = concern.clone();
        self.set_phase(ReadingPhase::Opening).await;

        let asked = self.session.append(MessageRole::User, concern.clone());
        self.send(ReaderMessage::Message {
            id: asked,
            role: MessageRole::User,
            content: concern.clone(),
        })
        .await;

        // Short derived title; degrade to the truncated concern
        self.session.display_title =
            match self.generate_clean(&prompt::title(&concern), &SHORT_OPTIONS).await {
                Ok(text) => prompt::tidy_line(&text, 100),
                Err(e) => {
                    tracing::debug!(error = %e, "Title generation failed, truncating concern");
                    prompt::tidy_line(&concern, 100)
                }
            };

        // Opening remark; degrade to a static line rather than block the flow
        let opening = match self
            .generate_clean(&prompt::opening(&concern), &SHORT_OPTIONS)
            .await
        {
            Ok(text) => prompt::tidy_line(&text, 200),
            Err(e) => {
                tracing::warn!(error = %e, "Opening generation failed, using fallback");
                FALLBACK_OPENING.to_string()
            }
        };
        if self.is_stale(generation) {
            return Ok(());
        }
        self.say(opening).await;
        self.beat().await;

        let greeting = self.greeting_line();
        self.say(greeting).await;

        // Cosmetic shuffle: a pause and a status line, no branching
        self.set_phase(ReadingPhase::Shuffling).await;
        self.notify(NotifyLevel::Info, ReadingPhase::Shuffling.description())
            .await;
        self.clock
            .sleep(Duration::from_millis(self.config.shuffle_delay_ms))
            .await;

        let spread = cards::draw_spread(&self.deck, &mut self.rng);
        for drawn in &spread {
            self.send(ReaderMessage::CardDrawn {
                position: drawn.position,
                name: drawn.card.name.clone(),
            })
            .await;
        }
        self.session.drawn = spread;

        for index in 0..SPREAD_SIZE {
            self.set_phase(ReadingPhase::Revealing(index)).await;
            let drawn = self.session.drawn[index].clone();
            self.say(format!(
                "The {} card: {}",
                drawn.position.label(),
                drawn.card.name
            ))
            .await;
            self.beat().await;

            self.set_phase(ReadingPhase::Interpreting(index)).await;
            self.session.interpretation_index = index;

            let request = prompt::interpretation(
                drawn.position,
                &concern,
                self.profile.display_name(),
                &self.session.drawn[..=index],
            );
            let text = match self
                .generate_clean(&request, &INTERPRETATION_OPTIONS)
                .await
            {
                Ok(text) => text,
                Err(e) => {
                    self.degrade(e).await;
                    return Ok(());
                }
            };
            if self.is_stale(generation) {
                return Ok(());
            }
            self.stream_say(text).await;
            self.beat().await;
        }

        self.set_phase(ReadingPhase::Summarizing).await;
        let request = prompt::summary(&concern, self.profile.display_name(), &self.session.drawn);
        let text = match self.generate_clean(&request, &SUMMARY_OPTIONS).await {
            Ok(text) => text,
            Err(e) => {
                self.degrade(e).await;
                return Ok(());
            }
        };
        if self.is_stale(generation) {
            return Ok(());
        }
        self.stream_say(text).await;

        self.session.finalized = true;
        self.set_phase(ReadingPhase::Complete).await;
        Ok(())
    }

    /// Draw one more card on top of the spread and interpret it.
    ///
    /// Excludes every id drawn this session; when none remains the action
    /// surfaces a message and returns [`ReadingError::DeckExhausted`].
    /// Does not change the phase.
    pub async fn draw_supplementary(&mut self) -> Result<(), ReadingError> {
        if !self.session.is_started() {
            return Err(ReadingError::NoActiveReading);
        }
        let generation = self.session.generation;

        let Some(drawn) = cards::draw_supplementary(&self.deck, &self.session.drawn, &mut self.rng)
        else {
            self.notify(NotifyLevel::Warning, "No undrawn cards remain in the deck.")
                .await;
            return Err(ReadingError::DeckExhausted);
        };

        self.send(ReaderMessage::CardDrawn {
            position: drawn.position,
            name: drawn.card.name.clone(),
        })
        .await;
        self.session.drawn.push(drawn.clone());

        let extra_number = self.session.drawn.len() - SPREAD_SIZE;
        self.say(format!("Extra card {extra_number}: {}", drawn.card.name))
            .await;

        let concern = self.session.concern.clone();
        let request = prompt::supplementary(&concern, self.profile.display_name(), &drawn);
        match self.generate_clean(&request, &FOLLOWUP_OPTIONS).await {
            Ok(text) => {
                if self.is_stale(generation) {
                    return Ok(());
                }
                self.stream_say(text).await;
            }
            Err(e) => self.degrade(e).await,
        }
        Ok(())
    }

    /// Offer one piece of practical advice grounded in the drawn cards.
    /// Does not change the phase.
    pub async fn advice(&mut self) -> Result<(), ReadingError> {
        if !self.session.is_started() {
            return Err(ReadingError::NoActiveReading);
        }
        let generation = self.session.generation;

        let concern = self.session.concern.clone();
        let names = self.session.drawn_names();
        let request = prompt::advice(&concern, self.profile.display_name(), &names);
        match self.generate_clean(&request, &FOLLOWUP_OPTIONS).await {
            Ok(text) => {
                if self.is_stale(generation) {
                    return Ok(());
                }
                self.stream_say(text).await;
            }
            Err(e) => self.degrade(e).await,
        }
        Ok(())
    }

    /// Suggest a small luck-improving practice drawn from the cards.
    /// Does not change the phase.
    pub async fn fortune(&mut self) -> Result<(), ReadingError> {
        if !self.session.is_started() {
            return Err(ReadingError::NoActiveReading);
        }
        let generation = self.session.generation;

        let names = self.session.drawn_names();
        let request = prompt::fortune(self.profile.display_name(), &names);
        match self.generate_clean(&request, &FOLLOWUP_OPTIONS).await {
            Ok(text) => {
                if self.is_stale(generation) {
                    return Ok(());
                }
                self.stream_say(text).await;
            }
            Err(e) => self.degrade(e).await,
        }
        Ok(())
    }

    /// Export the reading as shareable text. Pure formatting, no I/O.
    pub fn share_text(&self) -> String {
        let names = self.session.drawn_names().join(", ");
        let body: Vec<&str> = self
            .session
            .transcript
            .iter()
            .filter(|m| m.role == MessageRole::Assistant)
            .map(|m| m.content.as_str())
            .collect();

        format!(
            "🔮 Tarot Reading\n\nConcern: {}\n\nCards drawn: {}\n\nReading:\n{}",
            self.session.concern,
            names,
            body.join("\n\n")
        )
    }

    /// Archive the reading (when cards were drawn) and clear back to `Idle`.
    ///
    /// The archive write is best-effort: a failure is logged and swallowed so
    /// the reset never blocks on the store. The generation bump in
    /// [`Session::clear`] makes any late-arriving response for the old
    /// reading stale.
    pub async fn reset(&mut self) {
        if self.session.is_started() {
            let record = ReadingRecord {
                user_id: self.profile.user_id.clone(),
                user_name: self.profile.display_name().to_string(),
                concern: self.session.concern.clone(),
                title: if self.session.display_title.is_empty() {
                    prompt::tidy_line(&self.session.concern, 30)
                } else {
                    self.session.display_title.clone()
                },
                cards_drawn: self.session.drawn_names(),
                created_at: Utc::now(),
            };

            match self.archiver.save_reading(&record).await {
                Ok(id) => {
                    tracing::info!(reading_id = %id, "Reading archived");
                    self.send(ReaderMessage::Archived { reading_id: id }).await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Archive write failed; continuing with reset");
                }
            }
        }

        self.session.clear();
        self.set_phase(ReadingPhase::Idle).await;
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Greeting spoken once the opening remark has landed
    fn greeting_line(&self) -> String {
        let name = self.profile.display_name();
        match self.profile.greeting {
            GreetingPhase::Returning => {
                format!("Good to see you again, {name}. Let us see what the cards hold.")
            }
            GreetingPhase::FirstVisit | GreetingPhase::NameRequired => {
                format!("Welcome, {name}. Let us see what the cards hold.")
            }
        }
    }

    /// Generate and trim; a well-formed but empty response is a failure
    async fn generate_clean(
        &self,
        request: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerateError> {
        let text = self.generator.generate(request, options).await?;
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(GenerateError::EmptyResponse);
        }
        Ok(text)
    }

    /// True when `generation` no longer matches the session (reset happened
    /// while the request was in flight); the response must be discarded
    fn is_stale(&self, generation: u64) -> bool {
        if self.session.generation != generation {
            tracing::debug!("Discarding response from a superseded reading");
            true
        } else {
            false
        }
    }

    /// Append one fallback message and halt; no retry, no phase advance
    async fn degrade(&mut self, error: GenerateError) {
        tracing::warn!(error = %error, "Generation failed; appending fallback");
        self.say(FALLBACK_INTERPRETATION.to_string()).await;
        self.notify(
            NotifyLevel::Error,
            "The cards went quiet for a moment. Nothing was lost.",
        )
        .await;
    }

    /// Append an assistant message without pacing
    async fn say(&mut self, content: String) -> MessageId {
        let id = self.session.append(MessageRole::Assistant, content.clone());
        self.send(ReaderMessage::Message {
            id: id.clone(),
            role: MessageRole::Assistant,
            content,
        })
        .await;
        id
    }

    /// Reveal `text` through the typewriter, then append it as a finalized
    /// message. Returns only after the full text is in the transcript.
    async fn stream_say(&mut self, text: String) -> MessageId {
        let id = MessageId::new();
        let mut rx = self.typewriter.play(text);

        while let Some(frame) = rx.recv().await {
            match frame {
                RevealFrame::Prefix(prefix) => {
                    self.send(ReaderMessage::StreamUpdate {
                        message_id: id.clone(),
                        content: prefix,
                    })
                    .await;
                }
                RevealFrame::Done { full } => {
                    self.session.append_message(Message {
                        id: id.clone(),
                        role: MessageRole::Assistant,
                        content: full.clone(),
                    });
                    self.send(ReaderMessage::StreamEnd {
                        message_id: id.clone(),
                        final_content: full,
                    })
                    .await;
                }
            }
        }
        id
    }

    /// Short pause between reveal beats
    async fn beat(&self) {
        self.clock
            .sleep(Duration::from_millis(self.config.beat_delay_ms))
            .await;
    }

    /// Advance the phase and tell the surface
    async fn set_phase(&mut self, phase: ReadingPhase) {
        self.session.phase = phase;
        self.send(ReaderMessage::Phase { phase }).await;
    }

    /// Send a notification
    async fn notify(&self, level: NotifyLevel, message: &str) {
        self.send(ReaderMessage::Notify {
            level,
            message: message.to_string(),
        })
        .await;
    }

    /// Send a message to the surface
    async fn send(&self, msg: ReaderMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardId;
    use crate::clock::NoDelayClock;
    use crate::store::StoreError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Backend that answers every call with a distinct line, optionally
    // failing on one specific call (1-based)
    struct MockGenerator {
        fail_on_call: Option<usize>,
        calls: AtomicUsize,
    }

    impl MockGenerator {
        fn ok() -> Self {
            Self {
                fail_on_call: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing_on(call: usize) -> Self {
            Self {
                fail_on_call: Some(call),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for MockGenerator {
        fn name(&self) -> &str {
            "Mock"
        }

        async fn health_check(&self) -> bool {
            true
        }

        async fn generate(
            &self,
            _request: &str,
            _options: &GenerationOptions,
        ) -> Result<String, GenerateError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on_call == Some(call) {
                return Err(GenerateError::BadStatus {
                    status: 500,
                    message: "backend down".to_string(),
                });
            }
            Ok(format!("Response {call}."))
        }
    }

    struct FixedDeck(Vec<Card>);

    #[async_trait]
    impl DeckProvider for FixedDeck {
        async fn list_cards(&self, _deck_id: &str) -> Result<Vec<Card>, StoreError> {
            Ok(self.0.clone())
        }
    }

    struct FailingDeck;

    #[async_trait]
    impl DeckProvider for FailingDeck {
        async fn list_cards(&self, _deck_id: &str) -> Result<Vec<Card>, StoreError> {
            Err(StoreError::BadStatus {
                status: 503,
                message: "down".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingArchiver {
        saves: parking_lot::Mutex<Vec<ReadingRecord>>,
        fail: bool,
    }

    #[async_trait]
    impl SessionArchiver for RecordingArchiver {
        async fn save_reading(&self, record: &ReadingRecord) -> Result<String, StoreError> {
            if self.fail {
                return Err(StoreError::BadStatus {
                    status: 500,
                    message: "insert failed".to_string(),
                });
            }
            self.saves.lock().push(record.clone());
            Ok(format!("consultation_{}", self.saves.lock().len()))
        }
    }

    fn test_deck(n: usize) -> Vec<Card> {
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

    fn test_profile() -> UserProfile {
        UserProfile {
            user_id: "seeker_test".to_string(),
            user_name: Some("Mina".to_string()),
            visit_count: 2,
            greeting: GreetingPhase::Returning,
        }
    }

    fn build_reader(
        generator: MockGenerator,
        deck_size: usize,
        archiver: Arc<RecordingArchiver>,
    ) -> (Reader<MockGenerator>, mpsc::Receiver<ReaderMessage>) {
        let (tx, rx) = mpsc::channel(4096);
        let reader = Reader::new(
            generator,
            Arc::new(FixedDeck(test_deck(deck_size))),
            archiver,
            test_profile(),
            ReaderConfig::default(),
            tx,
        )
        .with_clock(Arc::new(NoDelayClock))
        .with_rng_seed(11);
        (reader, rx)
    }

    fn drain(rx: &mut mpsc::Receiver<ReaderMessage>) -> Vec<ReaderMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    fn phases(messages: &[ReaderMessage]) -> Vec<ReadingPhase> {
        messages
            .iter()
            .filter_map(|m| match m {
                ReaderMessage::Phase { phase } => Some(*phase),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_full_reading_phase_path() {
        let archiver = Arc::new(RecordingArchiver::default());
        let (mut reader, mut rx) = build_reader(MockGenerator::ok(), 10, archiver);

        reader.start().await.unwrap();
        reader.start_reading("career change").await.unwrap();

        let messages = drain(&mut rx);
        assert_eq!(
            phases(&messages),
            vec![
                ReadingPhase::Opening,
                ReadingPhase::Shuffling,
                ReadingPhase::Revealing(0),
                ReadingPhase::Interpreting(0),
                ReadingPhase::Revealing(1),
                ReadingPhase::Interpreting(1),
                ReadingPhase::Revealing(2),
                ReadingPhase::Interpreting(2),
                ReadingPhase::Summarizing,
                ReadingPhase::Complete,
            ]
        );

        // 1 opening + 1 greeting + 3 reveals + 3 interpretations + 1 summary
        assert_eq!(reader.session().assistant_count(), 9);
        assert!(reader.session().finalized);
        assert_eq!(reader.phase(), ReadingPhase::Complete);
    }

    #[tokio::test]
    async fn test_drawn_cards_are_distinct_and_from_deck() {
        let archiver = Arc::new(RecordingArchiver::default());
        let (mut reader, _rx) = build_reader(MockGenerator::ok(), 10, archiver);

        reader.start().await.unwrap();
        reader.start_reading("career change").await.unwrap();

        let drawn = &reader.session().drawn;
        assert_eq!(drawn.len(), SPREAD_SIZE);

        let deck = test_deck(10);
        let mut ids: Vec<_> = drawn.iter().map(|d| d.card.id.clone()).collect();
        for id in &ids {
            assert!(deck.iter().any(|c| &c.id == id));
        }
        ids.sort_by(|a, b| a.0.cmp(&b.0));
        ids.dedup();
        assert_eq!(ids.len(), SPREAD_SIZE);
    }

    #[tokio::test]
    async fn test_interpretation_order_invariant() {
        let archiver = Arc::new(RecordingArchiver::default());
        let (mut reader, mut rx) = build_reader(MockGenerator::ok(), 10, archiver);

        reader.start().await.unwrap();
        reader.start_reading("career change").await.unwrap();

        // Each Interpreting(i+1) phase must come after the StreamEnd that
        // finalized interpretation i.
        let messages = drain(&mut rx);
        let mut stream_ends = Vec::new();
        let mut interpreting_at = vec![None; SPREAD_SIZE];
        for (pos, msg) in messages.iter().enumerate() {
            match msg {
                ReaderMessage::StreamEnd { .. } => stream_ends.push(pos),
                ReaderMessage::Phase {
                    phase: ReadingPhase::Interpreting(i),
                } => interpreting_at[*i] = Some(pos),
                _ => {}
            }
        }

        for i in 1..SPREAD_SIZE {
            let entered = interpreting_at[i].unwrap();
            let prior_appended = stream_ends[i - 1];
            assert!(
                prior_appended < entered,
                "interpretation {i} began before interpretation {} was appended",
                i - 1
            );
        }
    }

    #[tokio::test]
    async fn test_validation_rejects_blank_concern() {
        let archiver = Arc::new(RecordingArchiver::default());
        let (mut reader, _rx) = build_reader(MockGenerator::ok(), 10, archiver);
        reader.start().await.unwrap();

        let result = reader.start_reading("   ").await;
        assert!(matches!(result, Err(ReadingError::BlankConcern)));
        assert_eq!(reader.phase(), ReadingPhase::Idle);
        assert!(reader.session().transcript.is_empty());
    }

    #[tokio::test]
    async fn test_validation_rejects_thin_deck() {
        let archiver = Arc::new(RecordingArchiver::default());
        let (mut reader, _rx) = build_reader(MockGenerator::ok(), 2, archiver);
        reader.start().await.unwrap();

        let result = reader.start_reading("career change").await;
        assert!(matches!(result, Err(ReadingError::DeckNotReady)));
        assert_eq!(reader.phase(), ReadingPhase::Idle);
    }

    #[tokio::test]
    async fn test_deck_load_failure_blocks_start() {
        let (tx, _rx) = mpsc::channel(64);
        let mut reader = Reader::new(
            MockGenerator::ok(),
            Arc::new(FailingDeck),
            Arc::new(RecordingArchiver::default()),
            test_profile(),
            ReaderConfig::default(),
            tx,
        )
        .with_clock(Arc::new(NoDelayClock));

        let result = reader.start().await;
        assert!(matches!(result, Err(ReadingError::BackendUnavailable(_))));
        assert!(!reader.is_ready());
    }

    #[tokio::test]
    async fn test_generation_failure_halts_without_advancing() {
        // Calls: 1 title, 2 opening, 3 first interpretation, 4 second
        let archiver = Arc::new(RecordingArchiver::default());
        let (mut reader, mut rx) = build_reader(MockGenerator::failing_on(4), 10, archiver);

        reader.start().await.unwrap();
        reader.start_reading("career change").await.unwrap();

        let messages = drain(&mut rx);
        let seen = phases(&messages);
        assert_eq!(seen.last(), Some(&ReadingPhase::Interpreting(1)));
        assert!(!seen.contains(&ReadingPhase::Revealing(2)));
        assert!(!reader.session().finalized);

        let last = reader.session().transcript.last().unwrap();
        assert_eq!(last.content, FALLBACK_INTERPRETATION);

        // Still recoverable: a follow-up trigger works
        reader.advice().await.unwrap();
        let after = reader.session().transcript.last().unwrap();
        assert_ne!(after.content, FALLBACK_INTERPRETATION);
    }

    #[tokio::test]
    async fn test_supplementary_draws_never_repeat_until_exhausted() {
        let archiver = Arc::new(RecordingArchiver::default());
        let (mut reader, _rx) = build_reader(MockGenerator::ok(), 5, archiver);

        reader.start().await.unwrap();
        reader.start_reading("career change").await.unwrap();

        // Two cards left after the spread
        reader.draw_supplementary().await.unwrap();
        reader.draw_supplementary().await.unwrap();
        assert_eq!(reader.session().drawn.len(), 5);

        let mut ids: Vec<_> = reader
            .session()
            .drawn
            .iter()
            .map(|d| d.card.id.clone())
            .collect();
        ids.sort_by(|a, b| a.0.cmp(&b.0));
        ids.dedup();
        assert_eq!(ids.len(), 5);

        let result = reader.draw_supplementary().await;
        assert!(matches!(result, Err(ReadingError::DeckExhausted)));
        assert_eq!(reader.session().drawn.len(), 5);
    }

    #[tokio::test]
    async fn test_followups_require_active_reading() {
        let archiver = Arc::new(RecordingArchiver::default());
        let (mut reader, _rx) = build_reader(MockGenerator::ok(), 10, archiver);
        reader.start().await.unwrap();

        assert!(matches!(
            reader.draw_supplementary().await,
            Err(ReadingError::NoActiveReading)
        ));
        assert!(matches!(
            reader.advice().await,
            Err(ReadingError::NoActiveReading)
        ));
        assert!(matches!(
            reader.fortune().await,
            Err(ReadingError::NoActiveReading)
        ));
    }

    #[tokio::test]
    async fn test_reset_archives_once_with_names_in_draw_order() {
        let archiver = Arc::new(RecordingArchiver::default());
        let (mut reader, mut rx) = build_reader(MockGenerator::ok(), 6, Arc::clone(&archiver));

        reader.start().await.unwrap();
        reader.start_reading("career change").await.unwrap();
        reader.draw_supplementary().await.unwrap();
        assert!(reader.session().finalized);

        let expected_names = reader.session().drawn_names();
        assert_eq!(expected_names.len(), 4);

        reader.reset().await;

        let saves = archiver.saves.lock();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].cards_drawn, expected_names);
        assert_eq!(saves[0].concern, "career change");
        assert_eq!(saves[0].user_id, "seeker_test");
        drop(saves);

        assert_eq!(reader.phase(), ReadingPhase::Idle);
        assert!(reader.session().concern.is_empty());
        assert!(reader.session().transcript.is_empty());
        assert!(reader.session().drawn.is_empty());
        assert!(!reader.session().finalized);

        let messages = drain(&mut rx);
        assert!(messages
            .iter()
            .any(|m| matches!(m, ReaderMessage::Archived { .. })));
    }

    #[tokio::test]
    async fn test_reset_without_draws_skips_archive() {
        let archiver = Arc::new(RecordingArchiver::default());
        let (mut reader, _rx) = build_reader(MockGenerator::ok(), 10, Arc::clone(&archiver));
        reader.start().await.unwrap();

        reader.reset().await;
        assert!(archiver.saves.lock().is_empty());
        assert_eq!(reader.phase(), ReadingPhase::Idle);
    }

    #[tokio::test]
    async fn test_archive_failure_never_blocks_reset() {
        let archiver = Arc::new(RecordingArchiver {
            saves: parking_lot::Mutex::new(Vec::new()),
            fail: true,
        });
        let (mut reader, _rx) = build_reader(MockGenerator::ok(), 10, Arc::clone(&archiver));

        reader.start().await.unwrap();
        reader.start_reading("career change").await.unwrap();
        reader.reset().await;

        assert_eq!(reader.phase(), ReadingPhase::Idle);
        assert!(reader.session().transcript.is_empty());
    }

    #[tokio::test]
    async fn test_reset_makes_in_flight_generation_stale() {
        let archiver = Arc::new(RecordingArchiver::default());
        let (mut reader, _rx) = build_reader(MockGenerator::ok(), 10, archiver);

        reader.start().await.unwrap();
        reader.start_reading("career change").await.unwrap();

        let tagged = reader.session().generation;
        assert!(!reader.is_stale(tagged));

        reader.reset().await;
        assert!(reader.is_stale(tagged));
    }

    #[tokio::test]
    async fn test_share_text_carries_concern_cards_and_reading() {
        let archiver = Arc::new(RecordingArchiver::default());
        let (mut reader, _rx) = build_reader(MockGenerator::ok(), 10, archiver);

        reader.start().await.unwrap();
        reader.start_reading("career change").await.unwrap();

        let share = reader.share_text();
        assert!(share.contains("career change"));
        for name in reader.session().drawn_names() {
            assert!(share.contains(&name));
        }
        assert!(share.contains("Response"));
    }

    #[tokio::test]
    async fn test_display_title_is_derived() {
        let archiver = Arc::new(RecordingArchiver::default());
        let (mut reader, _rx) = build_reader(MockGenerator::ok(), 10, archiver);

        reader.start().await.unwrap();
        reader.start_reading("career change").await.unwrap();

        // First generation call produces the title
        assert_eq!(reader.session().display_title, "Response 1.");
    }
}
