//! Liaison Core - Headless Conversational Agent for a Portfolio Interface
//!
//! This crate is the engine behind the portfolio site's chat overlay,
//! completely independent of any UI framework. It opens a session with a
//! hosted LLM, streams the reply into the transcript, executes model-issued
//! tool calls (site navigation, resume download, clipboard copy), tracks the
//! interface's operational status, and emits one telemetry event per
//! exchange.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        UI Surfaces                            │
//! │   ┌───────────┐   ┌───────────┐   ┌───────────────────────┐  │
//! │   │ Web       │   │ Console   │   │ Headless / Test       │  │
//! │   │ overlay   │   │ (bin)     │   │ harness               │  │
//! │   └─────┬─────┘   └─────┬─────┘   └───────────┬───────────┘  │
//! │         └───────────────┴─────────────────────┘              │
//! │                         │                                    │
//! │                 InterfaceUpdate (down)                       │
//! │                 submit / set_mode (up)                       │
//! └─────────────────────────┼────────────────────────────────────┘
//!                           │
//! ┌─────────────────────────┼────────────────────────────────────┐
//! │                  AGENT CONTROLLER                             │
//! │  ┌──────────┐ ┌────────────┐ ┌────────────┐ ┌─────────────┐  │
//! │  │ Status   │ │ Transcript │ │ Session    │ │ Provider    │  │
//! │  │ Machine  │ │ + Assembler│ │ Manager    │ │ (Gemini)    │  │
//! │  └──────────┘ └────────────┘ └────────────┘ └─────────────┘  │
//! │  ┌────────────────┐  ┌────────────────────┐                  │
//! │  │ Tool Dispatcher│  │ Telemetry Recorder │                  │
//! │  └────────────────┘  └────────────────────┘                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`AgentController`]: orchestrates one conversation end to end
//! - [`InterfaceUpdate`]: messages from the core to the UI surface
//! - [`Status`]: the interface's operational phase
//! - [`AgentProvider`]: the hosted-LLM boundary; [`GeminiProvider`] is the
//!   reference implementation
//! - [`UiSurface`]: the page-side-effect boundary
//! - [`TelemetrySink`]: where exchange events go
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use liaison_core::{
//!     AgentController, GeminiProvider, HeadlessSurface, InterfaceConfig, TracingSink,
//! };
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (tx, mut rx) = mpsc::channel(100);
//!     let mut controller = AgentController::new(
//!         Arc::new(GeminiProvider::from_env()),
//!         Arc::new(HeadlessSurface::with_sections(["projects", "contact"])),
//!         Arc::new(TracingSink),
//!         InterfaceConfig::load(),
//!         tx,
//!     );
//!
//!     // Render updates somewhere
//!     tokio::spawn(async move {
//!         while let Some(update) = rx.recv().await {
//!             println!("{update:?}");
//!         }
//!     });
//!
//!     controller.submit("show me your projects").await;
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`assembler`]: accumulates stream fragments into the reply body
//! - [`config`]: env + TOML configuration
//! - [`controller`]: the orchestration core
//! - [`messages`]: transcript messages and surface updates
//! - [`provider`]: hosted-LLM boundary and the Gemini implementation
//! - [`session`]: mode profiles and session lifecycle
//! - [`status`]: the operational state machine
//! - [`surface`]: page-side-effect boundary
//! - [`telemetry`]: per-exchange analytics and cost events
//! - [`tools`]: tool-call mapping and dispatch
//! - [`transcript`]: the visible conversation
//! - [`validation`]: submission validation
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on any UI framework. It is pure
//! conversation logic that can sit behind a web overlay, a terminal, or a
//! test harness unchanged.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod assembler;
pub mod config;
pub mod controller;
pub mod messages;
pub mod provider;
pub mod session;
pub mod status;
pub mod surface;
pub mod telemetry;
pub mod tools;
pub mod transcript;
pub mod validation;

// Re-exports for convenience
pub use assembler::{AssemblerUpdate, StreamAssembler};
pub use config::{default_config_path, ConfigError, InterfaceConfig, InterfaceLimits};
pub use controller::{AgentController, INTERRUPTED_NOTICE};
pub use messages::{InterfaceUpdate, Message, MessageId, MessageRole};
pub use provider::{AgentProvider, Fragment, GeminiProvider, ProviderError, TokenUsage};
pub use session::{
    Mode, ModeProfile, ProviderSession, SessionId, SessionManager, ToolDeclaration, Turn, TurnRole,
};
pub use status::{Status, StatusMachine};
pub use surface::{HeadlessSurface, NullSurface, UiSurface};
pub use telemetry::{
    estimate_tokens, rate_for_model, ExchangeReport, ModelRate, TelemetryEvent, TelemetryRecorder,
    TelemetrySink, TracingSink, DEFAULT_RATE, MODEL_RATES,
};
pub use tools::{
    ToolAction, ToolDispatcher, ToolInvocation, ToolOutcome, TOOL_COPY_EMAIL, TOOL_DOWNLOAD_RESUME,
    TOOL_NAVIGATE,
};
pub use transcript::Transcript;
pub use validation::{InputValidator, ValidationResult};
