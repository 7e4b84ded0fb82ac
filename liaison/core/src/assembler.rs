//! Token Stream Assembler
//!
//! Accumulates the incremental text fragments of one in-flight reply into a
//! coherent, monotonically growing body. Each accepted fragment yields an
//! [`AssemblerUpdate`] carrying the full text so far, so the corresponding
//! transcript message can be refreshed by replacement rather than by the
//! surface re-concatenating deltas.
//!
//! One assembler serves exactly one reply: fragments arrive in order from a
//! single cooperative consumer, and the assembler is consumed by
//! [`StreamAssembler::close`] when the reply ends.

use crate::messages::MessageId;

/// A published refresh of the in-progress reply
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssemblerUpdate {
    /// Message being assembled
    pub message_id: MessageId,
    /// Full accumulated text
    pub text: String,
}

/// Accumulator for one streamed reply
#[derive(Debug)]
pub struct StreamAssembler {
    message_id: MessageId,
    full_text: String,
}

impl StreamAssembler {
    /// Create an assembler for the given transcript message
    #[must_use]
    pub fn new(message_id: MessageId) -> Self {
        Self {
            message_id,
            full_text: String::new(),
        }
    }

    /// Append a text delta in arrival order
    ///
    /// Empty deltas are a no-op and publish nothing.
    pub fn push(&mut self, delta: &str) -> Option<AssemblerUpdate> {
        if delta.is_empty() {
            return None;
        }
        self.full_text.push_str(delta);
        Some(self.update())
    }

    /// Append a bracketed tool annotation on its own line
    ///
    /// Used by the controller when a tool call executes mid-stream, so the
    /// transcript documents the side effect.
    pub fn annotate(&mut self, annotation: &str) -> AssemblerUpdate {
        if !self.full_text.is_empty() && !self.full_text.ends_with('\n') {
            self.full_text.push('\n');
        }
        self.full_text.push_str(annotation);
        self.full_text.push('\n');
        self.update()
    }

    /// Text accumulated so far
    #[must_use]
    pub fn text(&self) -> &str {
        &self.full_text
    }

    /// Message this assembler feeds
    #[must_use]
    pub fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    /// Finalize the reply, yielding the complete text
    #[must_use]
    pub fn close(self) -> String {
        self.full_text
    }

    fn update(&self) -> AssemblerUpdate {
        AssemblerUpdate {
            message_id: self.message_id.clone(),
            text: self.full_text.clone(),
        }
    }
}
