//! Prompt Construction
//!
//! Pure, deterministic builders for every prompt the Reader sends to the
//! text-generation backend. Identical inputs always produce identical
//! prompts, so these are testable without a backend.
//!
//! Each interpretation prompt encodes the narrative position's role, the
//! requirement to address the querent by name, a target length band, and an
//! instruction forbidding repetition of earlier output. Later prompts embed
//! the names of earlier-drawn cards so interpretations read as one
//! continuing story rather than three isolated paragraphs.

use std::fmt::Write;

use crate::cards::{DrawnCard, Position};

/// Shared persona preamble for the conversational prompts
const PERSONA: &str = "You are a warm, friendly tarot reader. \
Speak casually but respectfully, like a close friend who takes the cards seriously.";

/// Prompt for the one-line remark spoken before shuffling
#[must_use]
pub fn opening(concern: &str) -> String {
    format!(
        "Read this tarot question and write the natural one-liner a tarot \
         reader would say before shuffling the cards.\n\n\
         Question: \"{concern}\"\n\n\
         Requirements:\n\
         - Name the heart of the question\n\
         - Shape: \"So it's ... that weighs on you. Let me shuffle the cards.\"\n\
         - At most 30 words\n\
         - Warm and empathetic tone\n\n\
         Remark:"
    )
}

/// Prompt for the short session title derived from the concern
#[must_use]
pub fn title(concern: &str) -> String {
    format!(
        "Summarize the following question naturally in under 100 characters:\n\
         \"{concern}\"\n\
         Just the essence, kept short:"
    )
}

/// Prompt for interpreting the card at the end of `drawn_so_far`.
///
/// `drawn_so_far` is the ordered drawn set up to and including the card being
/// interpreted; everything before the last element is referenced as earlier
/// context so the story stays continuous.
#[must_use]
pub fn interpretation(
    position: Position,
    concern: &str,
    user_name: &str,
    drawn_so_far: &[DrawnCard],
) -> String {
    let card = &drawn_so_far[drawn_so_far.len() - 1].card;

    let mut prompt = format!(
        "{PERSONA}\n\n\
         {user_name}'s situation\n\
         Concern: \"{concern}\"\n\n"
    );

    for earlier in &drawn_so_far[..drawn_so_far.len() - 1] {
        let _ = writeln!(
            prompt,
            "{} card: {} ({})",
            capitalize(earlier.position.label()),
            earlier.card.name,
            earlier.position.role_text()
        );
    }

    let _ = write!(
        prompt,
        "{} card: {}\n\
         Keyword: {}\n\
         Meaning: {}\n\n\
         This card speaks to {}.\n",
        capitalize(position.label()),
        card.name,
        card.keyword,
        card.meaning,
        position.role_text()
    );

    match position {
        Position::PastPresent => {
            let _ = write!(
                prompt,
                "Describe naturally what the {} card shows about where things \
                 stand right now.\n",
                card.name
            );
        }
        Position::Inner => {
            let first = &drawn_so_far[0].card;
            let _ = write!(
                prompt,
                "Within the situation {} revealed, describe what is stirring \
                 deep in {}'s heart, continuing naturally from the first card.\n",
                first.name, user_name
            );
        }
        Position::Future | Position::Supplementary => {
            let names: Vec<&str> = drawn_so_far[..drawn_so_far.len() - 1]
                .iter()
                .map(|d| d.card.name.as_str())
                .collect();
            let _ = write!(
                prompt,
                "Where the story of {} meets this card, describe naturally \
                 what current is likely to carry things forward.\n",
                names.join(" and ")
            );
        }
    }

    let _ = write!(
        prompt,
        "\nRules:\n\
         - Address them as \"{user_name}\" (never just a bare name)\n\
         - Around 100 characters, conversational\n\
         - Flow on from the earlier cards; never repeat what was already said\n\
         - No stiff, mechanical phrasing"
    );

    prompt
}

/// Prompt for the final synthesis over the full base spread
#[must_use]
pub fn summary(concern: &str, user_name: &str, spread: &[DrawnCard]) -> String {
    let mut card_lines = String::new();
    for drawn in spread {
        let _ = writeln!(
            card_lines,
            "{}: {}",
            drawn.position.role_text(),
            drawn.card.name
        );
    }

    format!(
        "{PERSONA}\n\n\
         {user_name}'s situation\n\
         Concern: \"{concern}\"\n\n\
         Cards drawn:\n{card_lines}\n\
         Weave the three cards into one continuous story and give your \
         overall reading.\n\n\
         Rules:\n\
         - Address them as \"{user_name}\"\n\
         - A natural arc from past to present to future\n\
         - Around 150 characters\n\
         - Close on a hopeful note\n\
         - Never repeat what was already said"
    )
}

/// Prompt for a supplementary card drawn after the reading completed
#[must_use]
pub fn supplementary(concern: &str, user_name: &str, drawn: &DrawnCard) -> String {
    let card = &drawn.card;
    format!(
        "{user_name}'s situation\n\
         Concern: \"{concern}\"\n\n\
         Cards were already drawn, and this one came up on top:\n\
         {}\n\
         Keyword: {}\n\
         Meaning: {}\n\n\
         Describe briefly what extra message this card carries.\n\n\
         Rules:\n\
         - Around 50 characters, short\n\
         - You may address them as \"{user_name}\"\n\
         - Never repeat what was already said",
        card.name, card.keyword, card.meaning
    )
}

/// Prompt for a piece of practical advice grounded in the drawn cards
#[must_use]
pub fn advice(concern: &str, user_name: &str, card_names: &[String]) -> String {
    format!(
        "{user_name}'s situation\n\
         Concern: \"{concern}\"\n\
         Cards drawn: {}\n\n\
         Based on the cards, give one piece of warm, practical advice.\n\n\
         Rules:\n\
         - Around 50 characters, short\n\
         - One concrete action\n\
         - You may address them as \"{user_name}\"",
        card_names.join(", ")
    )
}

/// Prompt for a small luck-improving suggestion drawn from the cards
#[must_use]
pub fn fortune(user_name: &str, card_names: &[String]) -> String {
    format!(
        "{user_name}'s situation\n\
         Cards drawn: {}\n\n\
         Based on these cards, suggest one small way to improve their luck.\n\n\
         Rules:\n\
         - Around 50 characters, short\n\
         - One color or one action only\n\
         - You may address them as \"{user_name}\"",
        card_names.join(", ")
    )
}

/// Tidy a short model response: strip quotes, collapse to one line, truncate
/// to `max_chars` characters on a char boundary.
#[must_use]
pub fn tidy_line(raw: &str, max_chars: usize) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '"' && *c != '\'')
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    let trimmed = cleaned.trim();
    trimmed.chars().take(max_chars).collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
