//! LLM Provider Boundary
//!
//! Trait abstraction over the hosted model service plus the Gemini
//! reference implementation. The controller only ever sees
//! [`AgentProvider`] and a stream of [`Fragment`]s.

pub mod gemini;
pub mod traits;

pub use gemini::GeminiProvider;
pub use traits::{AgentProvider, Fragment, ProviderError, TokenUsage};
