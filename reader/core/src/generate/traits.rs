//! Text Generator Trait
//!
//! Trait definition for text-generation backends. The abstraction lets the
//! Reader work with different providers (Gemini, a local model, a scripted
//! mock) without changing orchestration logic.

use async_trait::async_trait;
use thiserror::Error;

/// Sampling configuration for one generation call
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationOptions {
    /// Sampling temperature (higher = more varied)
    pub temperature: f32,
    /// Nucleus sampling mass
    pub top_p: f32,
    /// Top-k cutoff
    pub top_k: u32,
    /// Hard cap on the response length in tokens
    pub max_output_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.9,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 200,
        }
    }
}

impl GenerationOptions {
    /// Set the response token cap
    #[must_use]
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// Set the sampling temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }
}

/// Errors from a text-generation backend
///
/// Any response that does not carry usable text - transport failure, non-2xx
/// status, unexpected body shape, empty candidate list - surfaces here. The
/// Reader converts all of these into a user-visible fallback, never a crash.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Transport-level failure
    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("generation backend returned {status}: {message}")]
    BadStatus {
        /// HTTP status code
        status: u16,
        /// Error body or reason
        message: String,
    },

    /// Response body did not match the expected schema
    #[error("malformed generation response: {0}")]
    MalformedResponse(String),

    /// Response was well-formed but carried no text
    #[error("generation response contained no text")]
    EmptyResponse,
}

/// Text generation backend
///
/// Implement this trait to add support for a different provider.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Backend name (e.g. "Gemini")
    fn name(&self) -> &str;

    /// Check whether the backend is reachable
    async fn health_check(&self) -> bool;

    /// Send a prompt and wait for the complete response text
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerateError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = GenerationOptions::default()
            .with_max_output_tokens(250)
            .with_temperature(0.5);

        assert_eq!(options.max_output_tokens, 250);
        assert!((options.temperature - 0.5).abs() < f32::EPSILON);
        assert!((options.top_p - 0.95).abs() < f32::EPSILON);
        assert_eq!(options.top_k, 40);
    }
}
