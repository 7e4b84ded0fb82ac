//! Transcript Messages and Interface Updates
//!
//! Messages are the units of the visible conversation transcript. Interface
//! updates are what the core sends to whatever UI surface is attached; the
//! surface is a pure renderer that displays what it is told.
//!
//! # Design Philosophy
//!
//! The core owns all conversational state. A UI surface never mutates a
//! message; it receives [`InterfaceUpdate`] values over a channel and redraws
//! from them. This keeps the core headless and lets the same controller
//! drive a web overlay, a terminal, or a test harness unchanged.

use serde::{Deserialize, Serialize};

use crate::status::Status;

/// Message identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a new unique message ID
    #[must_use]
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        Self(format!("msg_{id}"))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

/// Who authored a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    /// Visitor input
    User,
    /// The agent's reply
    Agent,
}

/// One entry in the conversation transcript
///
/// Text grows in place while the reply streams; `streaming` flips to false
/// exactly once, as the final mutation. Messages are never deleted during a
/// session; insertion order is the transcript.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: MessageId,
    /// Who authored this message
    pub role: MessageRole,
    /// Message text (monotonically growing while streaming)
    pub text: String,
    /// Whether the message is still being streamed
    pub streaming: bool,
    /// When the message was created (Unix timestamp ms)
    pub timestamp: u64,
}

impl Message {
    /// Create a completed message
    #[must_use]
    pub fn new(role: MessageRole, text: String) -> Self {
        Self {
            id: MessageId::new(),
            role,
            text,
            streaming: false,
            timestamp: now_ms(),
        }
    }

    /// Create an empty streaming message (text will be updated)
    #[must_use]
    pub fn streaming(role: MessageRole) -> Self {
        Self {
            id: MessageId::new(),
            role,
            text: String::new(),
            streaming: true,
            timestamp: now_ms(),
        }
    }

    /// Mark streaming as complete
    pub fn complete(&mut self) {
        self.streaming = false;
    }
}

/// Updates from the core to the attached UI surface
///
/// The surface renders these; it has no business logic of its own.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum InterfaceUpdate {
    /// A message was appended to the transcript
    MessageAppended {
        /// Snapshot of the new message
        message: Message,
    },

    /// The streaming message's text was refreshed
    ///
    /// `text` is the full accumulated text, not a delta: the surface
    /// replaces, never concatenates.
    MessageText {
        /// Message being refreshed
        message_id: MessageId,
        /// Full text so far
        text: String,
    },

    /// The streaming message completed
    StreamEnd {
        /// Message that completed
        message_id: MessageId,
        /// Final text
        final_text: String,
    },

    /// Operational status changed
    Status {
        /// The new status
        status: Status,
    },
}

/// Current timestamp in milliseconds
fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
