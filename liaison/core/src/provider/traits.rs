//! Provider Boundary Traits
//!
//! Abstraction over the hosted LLM service. The core treats the provider as
//! fallible and stateful (its conversation context can expire) but
//! otherwise as a black box that turns one submission into an ordered,
//! non-restartable stream of [`Fragment`]s.
//!
//! # Design Philosophy
//!
//! The stream is delivered over an `mpsc` channel: the provider produces
//! fragments as they arrive on the wire, the controller consumes them one
//! `recv().await` at a time. Ordering, single consumption, and no replay are
//! the contract; the channel is the mechanism.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::session::{ModeProfile, ProviderSession};
use crate::tools::ToolInvocation;

/// Token counts reported by the provider, when it reports any
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenUsage {
    /// Tokens consumed by the request side
    pub input_tokens: u32,
    /// Tokens produced in the reply
    pub output_tokens: u32,
}

/// One incremental unit of a streamed reply
#[derive(Clone, Debug)]
pub enum Fragment {
    /// A text delta
    Text(String),
    /// A structured tool call interleaved with the text
    ToolCall(ToolInvocation),
    /// Reply completed normally
    Complete {
        /// Provider-reported token usage, if any
        usage: Option<TokenUsage>,
    },
    /// The stream failed; no further fragments follow
    Error(String),
}

/// Errors at the provider boundary
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport-level failure
    #[error("provider transport error: {0}")]
    Http(#[from] reqwest::Error),
    /// The provider answered with something the protocol does not allow
    #[error("provider protocol error: {0}")]
    Protocol(String),
    /// The conversation context is no longer valid on the provider side
    #[error("provider session expired")]
    SessionExpired,
    /// The stream broke after it had started
    #[error("provider stream error: {0}")]
    Stream(String),
}

/// A hosted LLM service able to hold multi-turn conversations
#[async_trait]
pub trait AgentProvider: Send + Sync {
    /// Provider name, for logs and telemetry metadata
    fn name(&self) -> &str;

    /// Model identifier requests are routed to
    fn model(&self) -> &str;

    /// Whether the provider is reachable
    ///
    /// Advisory only; a failed check does not prevent an attempt.
    async fn health_check(&self) -> bool {
        true
    }

    /// Open a conversation context configured with `profile`
    async fn open_session(&self, profile: ModeProfile) -> Result<ProviderSession, ProviderError>;

    /// Send one user message and stream the reply
    ///
    /// Fragments arrive in wire order and end with exactly one terminal
    /// fragment (`Complete` or `Error`). The receiver is the single
    /// consumer; dropping it stops production.
    async fn stream_reply(
        &self,
        session: &mut ProviderSession,
        text: &str,
    ) -> Result<mpsc::Receiver<Fragment>, ProviderError>;
}
