//! REST Store Implementation
//!
//! Deck provider and session archiver against a PostgREST-style HTTP store:
//! cards live in a `tarot_cards` table filtered by deck identity and ordered
//! by an external ordinal column; finished readings are inserted into a
//! `consultations` table. Rows are decoded into wire DTOs and converted to
//! domain types, so schema drift surfaces as a decode error rather than a
//! silent field mix-up.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::traits::{DeckProvider, ReadingRecord, SessionArchiver, StoreError};
use crate::cards::{Card, CardId};

/// PostgREST-style store client serving both traits
#[derive(Clone)]
pub struct RestStore {
    base_url: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl RestStore {
    /// Create a client for the given store URL and API key
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Create from environment variables (`ARCANA_STORE_URL`, `ARCANA_STORE_KEY`)
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = std::env::var("ARCANA_STORE_URL").unwrap_or_default();
        let api_key = std::env::var("ARCANA_STORE_KEY").unwrap_or_default();
        Self::new(base_url, api_key)
    }

    fn cards_url(&self, deck_id: &str) -> String {
        format!(
            "{}/rest/v1/tarot_cards?card_type=eq.{deck_id}&order=card_num",
            self.base_url
        )
    }

    fn consultations_url(&self) -> String {
        format!("{}/rest/v1/consultations", self.base_url)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

#[async_trait]
impl DeckProvider for RestStore {
    async fn list_cards(&self, deck_id: &str) -> Result<Vec<Card>, StoreError> {
        let response = self
            .authed(self.http_client.get(self.cards_url(deck_id)))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::BadStatus { status, message });
        }

        let rows: Vec<CardRow> = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        let mut cards: Vec<Card> = rows.into_iter().map(Card::from).collect();
        cards.sort_by_key(|c| c.ordinal);
        Ok(cards)
    }
}

#[async_trait]
impl SessionArchiver for RestStore {
    async fn save_reading(&self, record: &ReadingRecord) -> Result<String, StoreError> {
        let row = ConsultationInsert::from(record);

        let response = self
            .authed(self.http_client.post(self.consultations_url()))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::BadStatus { status, message });
        }

        let mut saved: Vec<ConsultationSaved> = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        if saved.is_empty() {
            return Err(StoreError::Decode(
                "insert returned no representation".to_string(),
            ));
        }
        Ok(saved.remove(0).id)
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Deserialize)]
struct CardRow {
    card_id: String,
    name: String,
    keyword: String,
    meaning: String,
    card_num: u32,
}

impl From<CardRow> for Card {
    fn from(row: CardRow) -> Self {
        Self {
            id: CardId(row.card_id),
            name: row.name,
            keyword: row.keyword,
            meaning: row.meaning,
            ordinal: row.card_num,
        }
    }
}

#[derive(Serialize)]
struct ConsultationInsert {
    user_id: String,
    user_name: String,
    concern: String,
    title: String,
    cards_drawn: String,
    created_at: String,
}

impl From<&ReadingRecord> for ConsultationInsert {
    fn from(record: &ReadingRecord) -> Self {
        Self {
            user_id: record.user_id.clone(),
            user_name: record.user_name.clone(),
            concern: record.concern.clone(),
            title: record.title.clone(),
            cards_drawn: record.cards_drawn.join(", "),
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

#[derive(Deserialize)]
struct ConsultationSaved {
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_card_row_decodes_and_converts() {
        let json = r#"{"card_id":"c7","name":"The River","keyword":"flow","meaning":"let it carry you","card_num":7}"#;
        let row: CardRow = serde_json::from_str(json).unwrap();
        let card = Card::from(row);
        assert_eq!(card.id, CardId("c7".to_string()));
        assert_eq!(card.name, "The River");
        assert_eq!(card.ordinal, 7);
    }

    #[test]
    fn test_consultation_insert_joins_names_in_draw_order() {
        let record = ReadingRecord {
            user_id: "seeker_1".to_string(),
            user_name: "Mina".to_string(),
            concern: "career change".to_string(),
            title: "Career crossroads".to_string(),
            cards_drawn: vec![
                "The Lantern".to_string(),
                "The River".to_string(),
                "The Gate".to_string(),
                "The Key".to_string(),
            ],
            created_at: chrono::Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        };
        let row = ConsultationInsert::from(&record);
        assert_eq!(row.cards_drawn, "The Lantern, The River, The Gate, The Key");
        assert!(row.created_at.starts_with("2025-06-01T12:00:00"));
    }

    #[test]
    fn test_cards_url_filters_and_orders() {
        let store = RestStore::new("https://db.example.com", "anon");
        assert_eq!(
            store.cards_url("classic"),
            "https://db.example.com/rest/v1/tarot_cards?card_type=eq.classic&order=card_num"
        );
    }
}
