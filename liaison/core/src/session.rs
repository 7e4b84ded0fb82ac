//! Session Management
//!
//! One provider-side conversation context at a time, keyed by the active
//! [`Mode`]. The manager owns the session exclusively: `acquire` reuses a
//! live session whose mode matches, opens a fresh one otherwise, and
//! `invalidate` discards the current one after any provider-level failure so
//! the next attempt starts clean.
//!
//! # Design Philosophy
//!
//! The original interface kept its conversation handle in module-global
//! mutable state. Here the handle is an explicitly owned resource with an
//! `acquire`/`invalidate` lifecycle, which removes the hidden coupling and
//! lets several independent interface instances coexist.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::provider::{AgentProvider, ProviderError};
use crate::tools::{TOOL_COPY_EMAIL, TOOL_DOWNLOAD_RESUME, TOOL_NAVIGATE};

/// Session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new unique session ID
    ///
    /// Atomic counter plus timestamp, so two sessions opened in the same
    /// millisecond still differ.
    #[must_use]
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        use std::time::{SystemTime, UNIX_EPOCH};

        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let count = COUNTER.fetch_add(1, Ordering::SeqCst);
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Self(format!("ssn_{timestamp}_{count}"))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Persona/instruction profile selecting the agent's framing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Mode {
    /// Business and strategy framing
    #[default]
    Strategic,
    /// Architecture and engineering framing
    Technical,
}

impl Mode {
    /// Short lowercase name, as used in config and telemetry metadata
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Strategic => "strategic",
            Self::Technical => "technical",
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strategic" => Ok(Self::Strategic),
            "technical" => Ok(Self::Technical),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

const STRATEGIC_INSTRUCTION: &str = "\
You are the liaison agent for this portfolio. Speak to business impact: \
outcomes, delivery, and what working together looks like. Keep replies \
tight and confident. When the visitor wants to see work, navigate them \
there instead of describing where to click.";

const TECHNICAL_INSTRUCTION: &str = "\
You are the liaison agent for this portfolio. Speak engineer-to-engineer: \
architecture choices, trade-offs, and implementation detail. Keep replies \
tight and concrete. When the visitor wants to see work, navigate them \
there instead of describing where to click.";

/// Declaration of one callable tool, sent with every session
#[derive(Clone, Debug)]
pub struct ToolDeclaration {
    /// Function name the model will call
    pub name: &'static str,
    /// What the function does, for the model
    pub description: &'static str,
    /// JSON schema of the parameters
    pub parameters: serde_json::Value,
}

impl ToolDeclaration {
    /// The fixed toolset every session declares
    #[must_use]
    pub fn standard_set() -> Vec<Self> {
        vec![
            Self {
                name: TOOL_NAVIGATE,
                description: "Close the chat overlay and scroll a page section into view",
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "section_id": {
                            "type": "string",
                            "description": "Identifier of the page section to show"
                        }
                    },
                    "required": ["section_id"]
                }),
            },
            Self {
                name: TOOL_DOWNLOAD_RESUME,
                description: "Trigger a download of the resume",
                parameters: serde_json::json!({ "type": "object", "properties": {} }),
            },
            Self {
                name: TOOL_COPY_EMAIL,
                description: "Copy the contact email address to the visitor's clipboard",
                parameters: serde_json::json!({ "type": "object", "properties": {} }),
            },
        ]
    }
}

/// Mode-specific instruction profile plus the common toolset
#[derive(Clone, Debug)]
pub struct ModeProfile {
    /// The mode this profile serves
    pub mode: Mode,
    /// System instruction applied to the whole session
    pub system_instruction: &'static str,
    /// Tools declared to the model
    pub tools: Vec<ToolDeclaration>,
}

impl ModeProfile {
    /// Build the profile for a mode
    #[must_use]
    pub fn for_mode(mode: Mode) -> Self {
        let system_instruction = match mode {
            Mode::Strategic => STRATEGIC_INSTRUCTION,
            Mode::Technical => TECHNICAL_INSTRUCTION,
        };
        Self {
            mode,
            system_instruction,
            tools: ToolDeclaration::standard_set(),
        }
    }
}

/// Who produced a prior turn
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnRole {
    /// Visitor input
    User,
    /// Agent reply
    Agent,
}

/// One completed exchange half, kept as provider context
#[derive(Clone, Debug)]
pub struct Turn {
    /// Who produced it
    pub role: TurnRole,
    /// The text
    pub text: String,
}

/// One provider-side conversation context
///
/// Opaque to everything but the provider that opened it. Invalidated, never
/// repaired: a failed session is dropped and a fresh one opened on the next
/// attempt.
#[derive(Debug)]
pub struct ProviderSession {
    /// Unique handle identity
    pub id: SessionId,
    /// Mode this session was configured with
    pub mode: Mode,
    /// When the session was opened
    pub created_at: DateTime<Utc>,
    /// Instruction profile and toolset the provider was configured with
    pub profile: ModeProfile,
    /// Prior turns, oldest first
    turns: Vec<Turn>,
}

impl ProviderSession {
    /// Create a session shell for a profile
    ///
    /// Providers call this from `open_session` after any provider-side
    /// setup succeeds.
    #[must_use]
    pub fn new(profile: ModeProfile) -> Self {
        Self {
            id: SessionId::new(),
            mode: profile.mode,
            created_at: Utc::now(),
            profile,
            turns: Vec::new(),
        }
    }

    /// Prior turns, oldest first
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Append a completed turn
    pub fn push_turn(&mut self, role: TurnRole, text: impl Into<String>) {
        self.turns.push(Turn {
            role,
            text: text.into(),
        });
    }

    /// Drop oldest turns beyond `max_turns`
    pub fn trim_turns(&mut self, max_turns: usize) {
        if max_turns > 0 && self.turns.len() > max_turns {
            let excess = self.turns.len() - max_turns;
            self.turns.drain(..excess);
            tracing::debug!(removed = excess, remaining = self.turns.len(), "Trimmed session turns");
        }
    }
}

/// Owner of the single reusable provider session
pub struct SessionManager {
    provider: Arc<dyn AgentProvider>,
    current: Option<ProviderSession>,
    max_context_turns: usize,
}

impl SessionManager {
    /// Create a manager over a provider
    pub fn new(provider: Arc<dyn AgentProvider>, max_context_turns: usize) -> Self {
        Self {
            provider,
            current: None,
            max_context_turns,
        }
    }

    /// The provider this manager opens sessions on
    #[must_use]
    pub fn provider(&self) -> Arc<dyn AgentProvider> {
        Arc::clone(&self.provider)
    }

    /// Get a session for `mode`, reusing the current one when its mode matches
    pub async fn acquire(&mut self, mode: Mode) -> Result<&mut ProviderSession, ProviderError> {
        let reusable = self.current.as_ref().is_some_and(|s| s.mode == mode);
        if !reusable {
            let profile = ModeProfile::for_mode(mode);
            let session = self.provider.open_session(profile).await?;
            tracing::info!(session_id = %session.id.0, mode = mode.name(), "Opened provider session");
            self.current = Some(session);
        }
        // Unwrap is safe: the branch above just stored a session.
        Ok(self.current.as_mut().expect("session just ensured"))
    }

    /// Discard the current session unconditionally
    ///
    /// Called after any transport or protocol error. No retry happens here;
    /// the caller decides whether to resubmit.
    pub fn invalidate(&mut self) {
        if let Some(session) = self.current.take() {
            tracing::info!(session_id = %session.id.0, "Invalidated provider session");
        }
    }

    /// Whether a session is currently held
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.current.is_some()
    }

    /// Identity of the held session, if any
    #[must_use]
    pub fn session_id(&self) -> Option<&SessionId> {
        self.current.as_ref().map(|s| &s.id)
    }

    /// Record a completed exchange into the held session's context
    ///
    /// A no-op when the session was invalidated mid-exchange.
    pub fn record_exchange(&mut self, user_text: &str, agent_text: &str) {
        if let Some(session) = self.current.as_mut() {
            session.push_turn(TurnRole::User, user_text);
            session.push_turn(TurnRole::Agent, agent_text);
            session.trim_turns(self.max_context_turns);
        }
    }
}
