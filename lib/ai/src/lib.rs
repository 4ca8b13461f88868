//! Reply generation for the parkline concierge.
//!
//! The conversation engine talks to a [`ResponseGenerator`] and never to a
//! model API directly. The production implementation is an OpenAI-compatible
//! chat-completions backend wrapped in a retry policy; when that fails, the
//! engine falls back to [`FallbackGenerator`], which answers from directory
//! data alone.

pub mod error;
pub mod fallback;
pub mod generator;
pub mod openai;
pub mod prompt;
pub mod retry;

pub use error::GenerationError;
pub use fallback::FallbackGenerator;
pub use generator::{GenerationRequest, ResponseGenerator};
pub use openai::{OpenAiConfig, OpenAiGenerator};
pub use retry::RetryPolicy;
