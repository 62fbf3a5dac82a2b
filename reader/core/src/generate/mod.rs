//! Text Generation Backends
//!
//! Trait-based abstraction over the generative text service plus the Gemini
//! REST implementation. One call produces one complete response; there is no
//! partial delivery at this layer - pacing happens in the typewriter.

mod gemini;
mod traits;

pub use gemini::GeminiClient;
pub use traits::{GenerateError, GenerationOptions, TextGenerator};
