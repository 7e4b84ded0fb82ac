//! Interface Status State Machine
//!
//! The single source of truth for the interface's operational phase. UI
//! indicators and decoration parameters read the current [`Status`]; nothing
//! outside this module mutates it directly; the controller drives the
//! transitions below and broadcasts the result to the surface.
//!
//! # Design Philosophy
//!
//! Transitions are guarded, not assumed. A transition attempted from the
//! wrong phase is rejected (returning `false`) and logged, never panicked on.
//! The `Idle` gate is what enforces the one-submission-at-a-time rule: a new
//! submission is only admitted through [`StatusMachine::begin_submission`].

use serde::{Deserialize, Serialize};

/// Operational phase of the agent interface
///
/// Exactly one value is visible per interface instance at any time.
/// `Idle` holds if and only if no submission is in flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// No submission in flight; ready for input
    #[default]
    Idle,
    /// Submission accepted, waiting for the first reply fragment
    Analyzing,
    /// Reply fragments are arriving
    Streaming,
    /// A model-issued tool call is being executed
    Executing,
}

impl Status {
    /// Human-readable label for UI status lines
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Standing by",
            Self::Analyzing => "Analyzing...",
            Self::Streaming => "Receiving...",
            Self::Executing => "Executing protocol...",
        }
    }

    /// Whether the interface accepts a new submission
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Guarded state machine over [`Status`]
///
/// Valid transitions, initial `Idle`:
///
/// ```text
/// Idle ──begin_submission──> Analyzing ──first_fragment──> Streaming
/// Streaming ──begin_tool──> Executing ──finish_tool──> Streaming
/// Streaming | Executing | Analyzing ──finish──> Idle
/// ```
///
/// `finish` is also the error path: any phase collapses back to `Idle`.
#[derive(Debug, Default)]
pub struct StatusMachine {
    current: Status,
}

impl StatusMachine {
    /// Create a machine in the `Idle` phase
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase
    #[must_use]
    pub fn current(&self) -> Status {
        self.current
    }

    /// Admit a new submission: `Idle -> Analyzing`
    ///
    /// Returns `false` without changing phase when a submission is already
    /// in flight. Duplicate submissions are ignored, not queued.
    pub fn begin_submission(&mut self) -> bool {
        if self.current == Status::Idle {
            self.current = Status::Analyzing;
            true
        } else {
            tracing::debug!(current = ?self.current, "Submission refused: not idle");
            false
        }
    }

    /// First reply fragment arrived: `Analyzing -> Streaming`
    pub fn first_fragment(&mut self) -> bool {
        if self.current == Status::Analyzing {
            self.current = Status::Streaming;
            true
        } else {
            tracing::warn!(current = ?self.current, "Ignored first_fragment transition");
            false
        }
    }

    /// Tool call detected in the stream: `Streaming -> Executing`
    pub fn begin_tool(&mut self) -> bool {
        if self.current == Status::Streaming {
            self.current = Status::Executing;
            true
        } else {
            tracing::warn!(current = ?self.current, "Ignored begin_tool transition");
            false
        }
    }

    /// Tool dispatch finished with more fragments pending: `Executing -> Streaming`
    pub fn finish_tool(&mut self) -> bool {
        if self.current == Status::Executing {
            self.current = Status::Streaming;
            true
        } else {
            tracing::warn!(current = ?self.current, "Ignored finish_tool transition");
            false
        }
    }

    /// The attempt is over, successfully or not: any phase `-> Idle`
    pub fn finish(&mut self) {
        self.current = Status::Idle;
    }
}
