//! Integration tests for the agent interface core
//!
//! These tests drive the full controller pipeline (validation, status
//! machine, session lifecycle, stream assembly, tool dispatch, telemetry)
//! against a scripted provider and a recording surface, and assert on the
//! externally observable behavior: the transcript, the update stream, the
//! surface calls, and the emitted telemetry events.

use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;

use liaison_core::{
    AgentController, AgentProvider, Fragment, InterfaceConfig, InterfaceUpdate, MessageRole, Mode,
    ModeProfile, ProviderError, ProviderSession, Status, TelemetryEvent, TelemetrySink,
    ToolInvocation, UiSurface, INTERRUPTED_NOTICE, TOOL_NAVIGATE,
};

// =============================================================================
// Test doubles
// =============================================================================

/// Provider that replays one fragment script per submission
struct ScriptedProvider {
    scripts: Mutex<VecDeque<Vec<Fragment>>>,
    opened: AtomicU32,
}

impl ScriptedProvider {
    fn new(scripts: Vec<Vec<Fragment>>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            opened: AtomicU32::new(0),
        }
    }

    fn opened(&self) -> u32 {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "Scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn open_session(&self, profile: ModeProfile) -> Result<ProviderSession, ProviderError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(ProviderSession::new(profile))
    }

    async fn stream_reply(
        &self,
        _session: &mut ProviderSession,
        _text: &str,
    ) -> Result<mpsc::Receiver<Fragment>, ProviderError> {
        let script = self
            .scripts
            .lock()
            .pop_front()
            .unwrap_or_else(|| vec![Fragment::Complete { usage: None }]);

        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            for fragment in script {
                if tx.send(fragment).await.is_err() {
                    return;
                }
            }
        });
        Ok(rx)
    }
}

/// Surface that records every call it receives
struct RecordingSurface {
    sections: BTreeSet<String>,
    calls: Mutex<Vec<String>>,
}

impl RecordingSurface {
    fn with_sections<const N: usize>(sections: [&str; N]) -> Self {
        Self {
            sections: sections.iter().map(ToString::to_string).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl UiSurface for RecordingSurface {
    fn has_section(&self, section_id: &str) -> bool {
        self.sections.contains(section_id)
    }

    async fn scroll_to_section(&self, section_id: &str) {
        self.calls.lock().push(format!("scroll:{section_id}"));
    }

    async fn close_overlay(&self) {
        self.calls.lock().push("close_overlay".to_string());
    }

    async fn trigger_download(&self, path: &str) -> anyhow::Result<()> {
        self.calls.lock().push(format!("download:{path}"));
        Ok(())
    }

    async fn write_clipboard(&self, text: &str) -> anyhow::Result<()> {
        self.calls.lock().push(format!("clipboard:{text}"));
        Ok(())
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl RecordingSink {
    fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().clone()
    }
}

impl TelemetrySink for RecordingSink {
    fn emit(&self, event: &TelemetryEvent) {
        self.events.lock().push(event.clone());
    }
}

struct Harness {
    controller: AgentController,
    updates: mpsc::Receiver<InterfaceUpdate>,
    provider: Arc<ScriptedProvider>,
    surface: Arc<RecordingSurface>,
    sink: Arc<RecordingSink>,
}

fn harness(scripts: Vec<Vec<Fragment>>) -> Harness {
    let provider = Arc::new(ScriptedProvider::new(scripts));
    let surface = Arc::new(RecordingSurface::with_sections(["projects", "contact"]));
    let sink = Arc::new(RecordingSink::default());

    let config = InterfaceConfig {
        settle_delay_ms: 0,
        ..InterfaceConfig::default()
    };

    let (tx, updates) = mpsc::channel(100);
    let controller = AgentController::new(
        Arc::clone(&provider) as Arc<dyn AgentProvider>,
        Arc::clone(&surface) as Arc<dyn UiSurface>,
        Arc::clone(&sink) as Arc<dyn TelemetrySink>,
        config,
        tx,
    );

    Harness {
        controller,
        updates,
        provider,
        surface,
        sink,
    }
}

fn drain(updates: &mut mpsc::Receiver<InterfaceUpdate>) -> Vec<InterfaceUpdate> {
    let mut collected = Vec::new();
    while let Ok(update) = updates.try_recv() {
        collected.push(update);
    }
    collected
}

fn status_path(updates: &[InterfaceUpdate]) -> Vec<Status> {
    updates
        .iter()
        .filter_map(|u| match u {
            InterfaceUpdate::Status { status } => Some(*status),
            _ => None,
        })
        .collect()
}

fn text(s: &str) -> Fragment {
    Fragment::Text(s.to_string())
}

// =============================================================================
// Stream assembly
// =============================================================================

/// The assembled reply equals the ordered concatenation of the deltas, and
/// empty deltas publish nothing.
#[tokio::test]
async fn test_assembled_text_is_ordered_concatenation() {
    let mut h = harness(vec![vec![
        text("The "),
        text(""),
        text("work "),
        text("speaks."),
        Fragment::Complete { usage: None },
    ]]);

    h.controller.submit("tell me something").await;

    let messages = h.controller.transcript().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].text, "The work speaks.");
    assert!(!messages[1].streaming);

    let updates = drain(&mut h.updates);
    let text_updates: Vec<&str> = updates
        .iter()
        .filter_map(|u| match u {
            InterfaceUpdate::MessageText { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    // The empty delta produced no update; each update carries the full text.
    assert_eq!(text_updates, vec!["The ", "The work ", "The work speaks."]);
}

/// At any update, at most one message is streaming and it is the last one.
#[tokio::test]
async fn test_single_streaming_message_invariant() {
    let mut h = harness(vec![vec![
        text("a"),
        text("b"),
        Fragment::Complete { usage: None },
    ]]);

    h.controller.submit("go").await;

    // Replay the transcript from the update stream and check the invariant
    // after every appended message.
    let mut streaming: Vec<bool> = Vec::new();
    for update in drain(&mut h.updates) {
        match update {
            InterfaceUpdate::MessageAppended { message } => {
                streaming.push(message.streaming);
                let streaming_count = streaming.iter().filter(|s| **s).count();
                assert!(streaming_count <= 1);
                if streaming_count == 1 {
                    assert_eq!(streaming.last(), Some(&true));
                }
            }
            InterfaceUpdate::StreamEnd { .. } => {
                if let Some(last) = streaming.last_mut() {
                    *last = false;
                }
            }
            _ => {}
        }
    }
    assert!(streaming.iter().all(|s| !s));
}

// =============================================================================
// Submission gating
// =============================================================================

/// Blank input appends nothing, changes nothing, records nothing.
#[tokio::test]
async fn test_blank_submission_is_silent() {
    let mut h = harness(vec![]);

    h.controller.submit("").await;
    h.controller.submit("   \t\n").await;

    assert!(h.controller.transcript().is_empty());
    assert_eq!(h.controller.status(), Status::Idle);
    assert!(drain(&mut h.updates).is_empty());
    assert!(h.sink.events().is_empty());
    assert_eq!(h.provider.opened(), 0);
}

// =============================================================================
// Tool dispatch scenario
// =============================================================================

/// "show me your projects": a tool-only reply walks
/// Idle -> Analyzing -> Streaming -> Executing -> Idle, annotates the
/// transcript, navigates the surface, and records one successful event.
#[tokio::test]
async fn test_navigate_tool_scenario() {
    let mut h = harness(vec![vec![
        Fragment::ToolCall(ToolInvocation::new(TOOL_NAVIGATE).with_arg("section_id", "projects")),
        Fragment::Complete { usage: None },
    ]]);

    h.controller.submit("show me your projects").await;

    let updates = drain(&mut h.updates);
    assert_eq!(
        status_path(&updates),
        vec![
            Status::Analyzing,
            Status::Streaming,
            Status::Executing,
            Status::Idle
        ]
    );

    let messages = h.controller.transcript().messages();
    let agent_messages: Vec<_> = messages
        .iter()
        .filter(|m| m.role == MessageRole::Agent)
        .collect();
    assert_eq!(agent_messages.len(), 1);
    assert!(agent_messages[0]
        .text
        .contains("[EXECUTING PROTOCOL: NAVIGATE TO PROJECTS]"));

    assert_eq!(
        h.surface.calls(),
        vec!["close_overlay".to_string(), "scroll:projects".to_string()]
    );

    let events = h.sink.events();
    assert_eq!(events.len(), 1);
    assert!(events[0].success);
    assert_eq!(events[0].metadata["tool_calls"], "1");
}

/// A tool call sandwiched in text returns to Streaming before more text, and
/// an unknown section still acknowledges without touching the surface.
#[tokio::test]
async fn test_tool_between_text_and_unknown_section() {
    let mut h = harness(vec![vec![
        text("One sec."),
        Fragment::ToolCall(ToolInvocation::new(TOOL_NAVIGATE).with_arg("section_id", "vault")),
        text("There you go."),
        Fragment::Complete { usage: None },
    ]]);

    h.controller.submit("open the vault").await;

    let updates = drain(&mut h.updates);
    assert_eq!(
        status_path(&updates),
        vec![
            Status::Analyzing,
            Status::Streaming,
            Status::Executing,
            Status::Streaming,
            Status::Idle
        ]
    );

    // Unknown section: acknowledged and annotated, but no surface calls.
    assert!(h.surface.calls().is_empty());
    let messages = h.controller.transcript().messages();
    assert!(messages[1].text.contains("NAVIGATE TO VAULT"));
    assert!(messages[1].text.contains("There you go."));
}

/// Unknown tool names produce a neutral outcome and the stream continues.
#[tokio::test]
async fn test_unknown_tool_does_not_derail() {
    let mut h = harness(vec![vec![
        Fragment::ToolCall(ToolInvocation::new("launch_missiles")),
        text("Nice try."),
        Fragment::Complete { usage: None },
    ]]);

    h.controller.submit("launch the missiles").await;

    assert_eq!(h.controller.status(), Status::Idle);
    let messages = h.controller.transcript().messages();
    assert_eq!(messages[1].text, "Nice try.");
    assert!(h.surface.calls().is_empty());
    assert!(h.sink.events()[0].success);
}

// =============================================================================
// Failure paths
// =============================================================================

/// A mid-stream transport error records exactly one failed event, appends the
/// interruption notice, invalidates the session, and lands back at Idle.
#[tokio::test]
async fn test_transport_error_mid_stream() {
    let mut h = harness(vec![
        vec![text("Half a tho"), Fragment::Error("socket reset".to_string())],
        vec![text("Fresh start."), Fragment::Complete { usage: None }],
    ]);

    h.controller.submit("first attempt").await;

    assert_eq!(h.controller.status(), Status::Idle);

    let messages = h.controller.transcript().messages();
    // user, partial reply, synthetic notice
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].text, "Half a tho");
    assert!(!messages[1].streaming);
    assert_eq!(messages[2].text, INTERRUPTED_NOTICE);
    assert_eq!(messages[2].role, MessageRole::Agent);

    let events = h.sink.events();
    assert_eq!(events.len(), 1);
    assert!(!events[0].success);
    assert_eq!(events[0].error.as_deref(), Some("socket reset"));
    assert_eq!(events[0].output_text, "Half a tho");

    // The session was invalidated: the retry opens a fresh one.
    assert_eq!(h.provider.opened(), 1);
    h.controller.submit("second attempt").await;
    assert_eq!(h.provider.opened(), 2);
    assert!(h.sink.events()[1].success);
}

/// A stream that closes without a terminal fragment is treated as an error.
#[tokio::test]
async fn test_stream_ending_without_terminal_fragment_fails() {
    let mut h = harness(vec![vec![text("and then noth")]]);

    h.controller.submit("finish this sentence").await;

    assert_eq!(h.controller.status(), Status::Idle);
    let events = h.sink.events();
    assert_eq!(events.len(), 1);
    assert!(!events[0].success);
    assert_eq!(
        events[0].error.as_deref(),
        Some("stream ended unexpectedly")
    );
    assert_eq!(
        h.controller.transcript().messages().last().unwrap().text,
        INTERRUPTED_NOTICE
    );
}

// =============================================================================
// Session lifecycle
// =============================================================================

/// Same mode reuses the session handle; a mode switch opens a fresh one.
#[tokio::test]
async fn test_session_identity_across_modes() {
    let mut h = harness(vec![
        vec![text("one"), Fragment::Complete { usage: None }],
        vec![text("two"), Fragment::Complete { usage: None }],
        vec![text("three"), Fragment::Complete { usage: None }],
    ]);

    h.controller.submit("first").await;
    let first = h.controller.session_id().cloned().unwrap();

    h.controller.submit("second").await;
    let second = h.controller.session_id().cloned().unwrap();
    assert_eq!(first, second);
    assert_eq!(h.provider.opened(), 1);

    h.controller.set_mode(Mode::Technical);
    h.controller.submit("third").await;
    let third = h.controller.session_id().cloned().unwrap();
    assert_ne!(second, third);
    assert_eq!(h.provider.opened(), 2);
}

// =============================================================================
// Telemetry
// =============================================================================

/// Provider-reported usage is preferred; without it the character heuristic
/// applies, and an unknown model still costs out finite and non-negative.
#[tokio::test]
async fn test_telemetry_tokens_and_cost() {
    let mut h = harness(vec![
        vec![
            text("counted"),
            Fragment::Complete {
                usage: Some(liaison_core::TokenUsage {
                    input_tokens: 900,
                    output_tokens: 42,
                }),
            },
        ],
        vec![text("estimated"), Fragment::Complete { usage: None }],
    ]);

    h.controller.submit("with usage").await;
    h.controller.submit("without usage").await;

    let events = h.sink.events();
    assert_eq!(events[0].input_tokens, 900);
    assert_eq!(events[0].output_tokens, 42);

    // "estimated" is 9 chars -> ceil(9 / 4) = 3 tokens.
    assert_eq!(events[1].output_tokens, 3);

    for event in &events {
        // "scripted-model" is not in the rate table; the fallback applies.
        assert!(event.cost_usd.is_finite());
        assert!(event.cost_usd >= 0.0);
        assert_eq!(event.metadata["mode"], "strategic");
        assert_eq!(event.metadata["provider"], "Scripted");
    }
}
