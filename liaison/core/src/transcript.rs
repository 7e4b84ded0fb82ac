//! Conversation Transcript
//!
//! The ordered list of [`Message`]s making up the visible conversation for
//! the current session. Mutably owned by the controller alone; UI surfaces
//! observe immutable snapshots.
//!
//! Invariant: at most one message has `streaming == true`, and when one
//! does, it is the most recently appended message.

use crate::messages::{Message, MessageId, MessageRole};

/// The visible conversation history
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    streaming_id: Option<MessageId>,
}

impl Transcript {
    /// Create an empty transcript
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed user message
    pub fn push_user(&mut self, text: String) -> MessageId {
        let msg = Message::new(MessageRole::User, text);
        let id = msg.id.clone();
        self.messages.push(msg);
        id
    }

    /// Append a completed agent message (used for synthetic notices)
    pub fn push_agent(&mut self, text: String) -> MessageId {
        let msg = Message::new(MessageRole::Agent, text);
        let id = msg.id.clone();
        self.messages.push(msg);
        id
    }

    /// Begin a streaming agent reply
    ///
    /// Closes out any previous streaming message first so the
    /// single-streaming-message invariant holds even on unexpected paths.
    pub fn begin_agent(&mut self) -> MessageId {
        if self.streaming_id.is_some() {
            tracing::warn!("Previous streaming message was never completed");
            self.complete_streaming();
        }
        let msg = Message::streaming(MessageRole::Agent);
        let id = msg.id.clone();
        self.streaming_id = Some(id.clone());
        self.messages.push(msg);
        id
    }

    /// Replace the streaming message's text with the full accumulated text
    pub fn set_streaming_text(&mut self, text: String) {
        let Some(ref id) = self.streaming_id else {
            tracing::warn!("Dropped text update: no streaming message");
            return;
        };
        if let Some(msg) = self.messages.iter_mut().find(|m| &m.id == id) {
            msg.text = text;
        }
    }

    /// Flip the streaming message to complete; the last mutation it sees
    ///
    /// Returns the completed message's ID, if one was streaming.
    pub fn complete_streaming(&mut self) -> Option<MessageId> {
        let id = self.streaming_id.take()?;
        if let Some(msg) = self.messages.iter_mut().find(|m| m.id == id) {
            msg.complete();
        }
        Some(id)
    }

    /// ID of the message currently streaming, if any
    #[must_use]
    pub fn streaming_id(&self) -> Option<&MessageId> {
        self.streaming_id.as_ref()
    }

    /// Whether a reply is currently streaming
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.streaming_id.is_some()
    }

    /// Get a message by ID
    #[must_use]
    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    /// All messages, in insertion order
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Immutable snapshot for UI projection
    #[must_use]
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }
}
