//! Typewriter - Paced Text Reveal
//!
//! The text backend returns whole responses; nothing arrives incrementally.
//! Perceived responsiveness is manufactured client-side: given a complete
//! string, the typewriter emits progressively longer prefixes on a fixed
//! cadence until the full string has been shown, then signals completion.
//!
//! For an input of N characters the receiver sees exactly N `Prefix` frames -
//! the ordered prefixes of increasing length ending in the full string -
//! followed by one `Done` frame.
//!
//! Frames are delivered over an mpsc channel; dropping the receiver cancels
//! the pacing task, which is how an abandoned reveal is torn down.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::clock::Clock;

/// A single reveal frame
#[derive(Clone, Debug)]
pub enum RevealFrame {
    /// The prefix revealed so far (grows by one character per frame)
    Prefix(String),
    /// The reveal finished
    Done {
        /// The full string, as handed to [`Typewriter::play`]
        full: String,
    },
}

/// Paces the reveal of complete strings
#[derive(Clone)]
pub struct Typewriter {
    interval: Duration,
    clock: Arc<dyn Clock>,
}

impl Typewriter {
    /// Create a typewriter emitting one character per `interval`
    pub fn new(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { interval, clock }
    }

    /// Start revealing `text`; frames arrive on the returned channel.
    ///
    /// The pacing task stops early if the receiver is dropped.
    pub fn play(&self, text: String) -> mpsc::Receiver<RevealFrame> {
        let (tx, rx) = mpsc::channel(32);
        let clock = Arc::clone(&self.clock);
        let interval = self.interval;

        tokio::spawn(async move {
            let ends: Vec<usize> = text.char_indices().map(|(i, c)| i + c.len_utf8()).collect();
            for end in ends {
                let frame = RevealFrame::Prefix(text[..end].to_string());
                if tx.send(frame).await.is_err() {
                    // Receiver dropped, reveal abandoned
                    return;
                }
                clock.sleep(interval).await;
            }
            let _ = tx.send(RevealFrame::Done { full: text }).await;
        });

        rx
    }
}

/// The ordered character-boundary prefixes of `text`, shortest first
pub fn prefixes(text: &str) -> impl Iterator<Item = &str> {
    text.char_indices()
        .map(move |(i, c)| &text[..i + c.len_utf8()])
}
