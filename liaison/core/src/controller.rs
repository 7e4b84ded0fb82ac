//! Agent Interface Controller
//!
//! The orchestration core. One controller owns one conversation: it
//! validates submissions, drives the status machine, feeds the stream
//! assembler, routes tool calls to the dispatcher, and finalizes telemetry,
//! once per submission, on success and failure alike.
//!
//! # Design Philosophy
//!
//! The controller is UI-agnostic. It does not know whether it is behind a
//! web overlay, a terminal, or a test harness; everything UI-visible leaves
//! through a channel of [`InterfaceUpdate`]s. Fragment consumption is one
//! cooperative `recv().await` loop: each fragment is fully applied before
//! the next is requested, so transcript growth is strictly ordered. There
//! is no cancellation: an in-flight reply runs to completion or error, and
//! every path ends back at `Idle`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::assembler::{AssemblerUpdate, StreamAssembler};
use crate::config::InterfaceConfig;
use crate::messages::{InterfaceUpdate, MessageId};
use crate::provider::{AgentProvider, Fragment, TokenUsage};
use crate::session::{Mode, SessionId, SessionManager};
use crate::status::{Status, StatusMachine};
use crate::surface::UiSurface;
use crate::telemetry::{ExchangeReport, TelemetryRecorder, TelemetrySink};
use crate::tools::ToolDispatcher;
use crate::transcript::Transcript;
use crate::validation::{InputValidator, ValidationResult};

/// Synthetic agent notice appended when a stream fails
pub const INTERRUPTED_NOTICE: &str =
    "[CONNECTION INTERRUPTED] The uplink dropped before the reply completed. Give it another shot.";

/// How one exchange's fragment loop ended
enum ExchangeEnd {
    Complete(Option<TokenUsage>),
    Failed(String),
}

/// One conversational agent interface instance
pub struct AgentController {
    config: InterfaceConfig,
    mode: Mode,
    status: StatusMachine,
    transcript: Transcript,
    sessions: SessionManager,
    dispatcher: ToolDispatcher,
    telemetry: TelemetryRecorder,
    validator: InputValidator,
    tx: mpsc::Sender<InterfaceUpdate>,
}

impl AgentController {
    /// Create a controller over a provider, a surface, and a telemetry sink
    ///
    /// `tx` is the channel the attached UI renders from.
    pub fn new(
        provider: Arc<dyn AgentProvider>,
        surface: Arc<dyn UiSurface>,
        sink: Arc<dyn TelemetrySink>,
        config: InterfaceConfig,
        tx: mpsc::Sender<InterfaceUpdate>,
    ) -> Self {
        let dispatcher = ToolDispatcher::new(
            surface,
            Duration::from_millis(config.settle_delay_ms),
            config.resume_path.clone(),
            config.contact_email.clone(),
        );
        let validator = InputValidator::new(config.limits.clone());
        let sessions = SessionManager::new(provider, config.limits.max_context_turns);

        Self {
            mode: config.default_mode,
            status: StatusMachine::new(),
            transcript: Transcript::new(),
            sessions,
            dispatcher,
            telemetry: TelemetryRecorder::new(sink),
            validator,
            config,
            tx,
        }
    }

    /// Current operational status
    #[must_use]
    pub fn status(&self) -> Status {
        self.status.current()
    }

    /// Active persona mode
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch the persona mode
    ///
    /// Takes effect at the next session acquisition; an in-flight reply is
    /// not affected.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            tracing::info!(mode = mode.name(), "Mode switched");
            self.mode = mode;
        }
    }

    /// The conversation transcript
    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Identity of the held provider session, if any
    #[must_use]
    pub fn session_id(&self) -> Option<&SessionId> {
        self.sessions.session_id()
    }

    /// Handle one visitor submission
    ///
    /// Rejected silently when a submission is already in flight or the
    /// input fails validation: no transcript entry, no status change, no
    /// telemetry. Otherwise runs the full exchange and always lands back at
    /// `Idle`.
    pub async fn submit(&mut self, input: &str) {
        if !self.status.current().is_idle() {
            tracing::debug!("Submission ignored: not idle");
            return;
        }
        match self.validator.validate(input) {
            ValidationResult::Valid => {}
            ValidationResult::Rejected(reason) => {
                tracing::debug!(reason = %reason, "Submission rejected");
                return;
            }
        }

        let user_id = self.transcript.push_user(input.to_string());
        self.send_appended(&user_id).await;

        self.status.begin_submission();
        self.publish_status().await;

        let mode = self.mode;
        let provider = self.sessions.provider();
        // Latency is measured from just before the provider is touched.
        let started = Instant::now();

        let opened = match self.sessions.acquire(mode).await {
            Ok(session) => {
                let mut input_messages: Vec<String> =
                    session.turns().iter().map(|t| t.text.clone()).collect();
                input_messages.push(input.to_string());
                match provider.stream_reply(session, input).await {
                    Ok(rx) => Ok((rx, input_messages)),
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e),
        };

        let (mut rx, input_messages) = match opened {
            Ok(opened) => opened,
            Err(e) => {
                self.fail_exchange(vec![input.to_string()], String::new(), e.to_string(), started, 0)
                    .await;
                return;
            }
        };

        let agent_id = self.transcript.begin_agent();
        self.send_appended(&agent_id).await;

        let mut assembler = StreamAssembler::new(agent_id.clone());
        let mut in_tool = false;
        let mut tool_calls: u32 = 0;

        let end = loop {
            match rx.recv().await {
                Some(Fragment::Text(delta)) => {
                    self.leave_tool_if_needed(&mut in_tool).await;
                    self.mark_first_fragment().await;
                    if let Some(update) = assembler.push(&delta) {
                        self.apply_update(update).await;
                    }
                }
                Some(Fragment::ToolCall(invocation)) => {
                    self.leave_tool_if_needed(&mut in_tool).await;
                    self.mark_first_fragment().await;

                    self.status.begin_tool();
                    self.publish_status().await;
                    in_tool = true;
                    tool_calls += 1;

                    let outcome = self.dispatcher.dispatch(&invocation).await;
                    tracing::debug!(ack = %outcome.ack, "Tool dispatched");
                    if let Some(annotation) = outcome.annotation {
                        let update = assembler.annotate(&annotation);
                        self.apply_update(update).await;
                    }
                    // Whether Executing resolves to Streaming or Idle depends
                    // on the next fragment, so the transition waits for it.
                }
                Some(Fragment::Complete { usage }) => break ExchangeEnd::Complete(usage),
                Some(Fragment::Error(message)) => break ExchangeEnd::Failed(message),
                None => break ExchangeEnd::Failed("stream ended unexpectedly".to_string()),
            }
        };

        let final_text = assembler.close();

        match end {
            ExchangeEnd::Complete(usage) => {
                self.transcript.complete_streaming();
                self.send(InterfaceUpdate::StreamEnd {
                    message_id: agent_id,
                    final_text: final_text.clone(),
                })
                .await;
                self.sessions.record_exchange(input, &final_text);

                self.status.finish();
                self.publish_status().await;

                self.telemetry.record(ExchangeReport {
                    model: provider.model().to_string(),
                    input_messages,
                    output_text: final_text,
                    usage,
                    latency_ms: started.elapsed().as_millis() as u64,
                    success: true,
                    error: None,
                    metadata: self.exchange_metadata(tool_calls),
                });
            }
            ExchangeEnd::Failed(message) => {
                // Finalize the partial reply before the synthetic notice so
                // the transcript never carries a dangling stream.
                if self.transcript.complete_streaming().is_some() {
                    self.send(InterfaceUpdate::StreamEnd {
                        message_id: agent_id,
                        final_text: final_text.clone(),
                    })
                    .await;
                }
                self.fail_exchange(input_messages, final_text, message, started, tool_calls)
                    .await;
            }
        }
    }

    /// Shared failure path: synthetic notice, session invalidation, idle
    /// status, one `success = false` telemetry event.
    async fn fail_exchange(
        &mut self,
        input_messages: Vec<String>,
        partial_output: String,
        error: String,
        started: Instant,
        tool_calls: u32,
    ) {
        tracing::warn!(error = %error, "Exchange failed");

        let notice_id = self.transcript.push_agent(INTERRUPTED_NOTICE.to_string());
        self.send_appended(&notice_id).await;

        self.sessions.invalidate();
        self.status.finish();
        self.publish_status().await;

        self.telemetry.record(ExchangeReport {
            model: self.sessions.provider().model().to_string(),
            input_messages,
            output_text: partial_output,
            usage: None,
            latency_ms: started.elapsed().as_millis() as u64,
            success: false,
            error: Some(error),
            metadata: self.exchange_metadata(tool_calls),
        });
    }

    async fn leave_tool_if_needed(&mut self, in_tool: &mut bool) {
        if *in_tool {
            self.status.finish_tool();
            self.publish_status().await;
            *in_tool = false;
        }
    }

    async fn mark_first_fragment(&mut self) {
        if self.status.current() == Status::Analyzing {
            self.status.first_fragment();
            self.publish_status().await;
        }
    }

    async fn apply_update(&mut self, update: AssemblerUpdate) {
        self.transcript.set_streaming_text(update.text.clone());
        self.send(InterfaceUpdate::MessageText {
            message_id: update.message_id,
            text: update.text,
        })
        .await;
    }

    fn exchange_metadata(&self, tool_calls: u32) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();
        metadata.insert("mode".to_string(), self.mode.name().to_string());
        metadata.insert(
            "provider".to_string(),
            self.sessions.provider().name().to_string(),
        );
        if let Some(id) = self.sessions.session_id() {
            metadata.insert("session_id".to_string(), id.0.clone());
        }
        metadata.insert("tool_calls".to_string(), tool_calls.to_string());
        metadata
    }

    async fn publish_status(&self) {
        self.send(InterfaceUpdate::Status {
            status: self.status.current(),
        })
        .await;
    }

    async fn send_appended(&self, id: &MessageId) {
        if let Some(message) = self.transcript.get(id) {
            self.send(InterfaceUpdate::MessageAppended {
                message: message.clone(),
            })
            .await;
        }
    }

    async fn send(&self, update: InterfaceUpdate) {
        if let Err(e) = self.tx.send(update).await {
            tracing::warn!("Failed to send update to surface: {}", e);
        }
    }
}
