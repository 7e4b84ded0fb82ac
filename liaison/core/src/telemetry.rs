//! Telemetry Recording
//!
//! One structured event per exchange, success or failure, emitted to an
//! external sink the core never reads back. Token counts fall back to a
//! character-count heuristic when the provider reports none, and cost comes
//! from a static per-model rate table with a default rate for unknown
//! model identifiers.
//!
//! Emission is fire-and-forget: a sink that fails, or even panics, is
//! logged and forgotten; nothing propagates into the conversational flow.

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use serde::Serialize;

use crate::provider::TokenUsage;

/// Cost rates for one model family, in dollars per million tokens
#[derive(Clone, Copy, Debug)]
pub struct ModelRate {
    /// Model identifier prefix this rate applies to
    pub model_prefix: &'static str,
    /// Dollars per million input tokens
    pub input_cost_per_million: f64,
    /// Dollars per million output tokens
    pub output_cost_per_million: f64,
}

impl ModelRate {
    /// Cost in dollars for a token pair
    #[must_use]
    pub fn cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        let input = (f64::from(input_tokens) / 1_000_000.0) * self.input_cost_per_million;
        let output = (f64::from(output_tokens) / 1_000_000.0) * self.output_cost_per_million;
        input + output
    }
}

/// Known model rates, longest prefix listed first
pub const MODEL_RATES: &[ModelRate] = &[
    ModelRate {
        model_prefix: "gemini-2.5-pro",
        input_cost_per_million: 1.25,
        output_cost_per_million: 10.00,
    },
    ModelRate {
        model_prefix: "gemini-2.5-flash",
        input_cost_per_million: 0.30,
        output_cost_per_million: 2.50,
    },
    ModelRate {
        model_prefix: "gemini-2.0-flash",
        input_cost_per_million: 0.10,
        output_cost_per_million: 0.40,
    },
];

/// Fallback rate for model identifiers absent from the table
pub const DEFAULT_RATE: ModelRate = ModelRate {
    model_prefix: "",
    input_cost_per_million: 0.50,
    output_cost_per_million: 1.50,
};

/// Rate for a model identifier, falling back to [`DEFAULT_RATE`]
#[must_use]
pub fn rate_for_model(model: &str) -> &'static ModelRate {
    MODEL_RATES
        .iter()
        .find(|rate| model.starts_with(rate.model_prefix))
        .unwrap_or(&DEFAULT_RATE)
}

/// Estimate a token count from text: characters divided by four, rounded up
#[must_use]
pub fn estimate_tokens(text: &str) -> u32 {
    text.chars().count().div_ceil(4) as u32
}

/// One immutable analytics/cost event per submission
#[derive(Clone, Debug, Serialize)]
pub struct TelemetryEvent {
    /// Model the exchange ran against
    pub model: String,
    /// Input messages sent with the request
    pub input_messages: Vec<String>,
    /// Reply text (possibly partial on failure)
    pub output_text: String,
    /// Input token count (provider-reported or estimated)
    pub input_tokens: u32,
    /// Output token count (provider-reported or estimated)
    pub output_tokens: u32,
    /// Estimated cost in dollars
    pub cost_usd: f64,
    /// Wall-clock latency of the exchange in milliseconds
    pub latency_ms: u64,
    /// Whether the exchange completed normally
    pub success: bool,
    /// Error description on failure
    pub error: Option<String>,
    /// Correlation ID
    pub trace_id: String,
    /// Free-form context (mode, session id, fragment counts, ...)
    pub metadata: BTreeMap<String, String>,
}

/// What the controller knows about an exchange when it ends
#[derive(Clone, Debug, Default)]
pub struct ExchangeReport {
    /// Model the exchange ran against
    pub model: String,
    /// Input messages sent with the request
    pub input_messages: Vec<String>,
    /// Reply text (possibly partial on failure)
    pub output_text: String,
    /// Provider-reported usage, when the provider reported any
    pub usage: Option<TokenUsage>,
    /// Wall-clock latency in milliseconds
    pub latency_ms: u64,
    /// Whether the exchange completed normally
    pub success: bool,
    /// Error description on failure
    pub error: Option<String>,
    /// Free-form context
    pub metadata: BTreeMap<String, String>,
}

/// External event consumer
///
/// Implementations must not assume they are called on any particular task;
/// they should return quickly and never block on the event's fate.
pub trait TelemetrySink: Send + Sync {
    /// Consume one event
    fn emit(&self, event: &TelemetryEvent);
}

/// Sink that logs events as structured tracing output
#[derive(Debug, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn emit(&self, event: &TelemetryEvent) {
        tracing::info!(
            target: "liaison::telemetry",
            model = %event.model,
            input_tokens = event.input_tokens,
            output_tokens = event.output_tokens,
            cost_usd = event.cost_usd,
            latency_ms = event.latency_ms,
            success = event.success,
            error = event.error.as_deref().unwrap_or(""),
            trace_id = %event.trace_id,
            "exchange"
        );
    }
}

/// Builds and emits one [`TelemetryEvent`] per exchange
pub struct TelemetryRecorder {
    sink: Arc<dyn TelemetrySink>,
}

impl TelemetryRecorder {
    /// Create a recorder over a sink
    pub fn new(sink: Arc<dyn TelemetrySink>) -> Self {
        Self { sink }
    }

    /// Record one exchange
    ///
    /// Called exactly once per submission attempt, on success and failure
    /// paths alike. Token counts are estimated when the report carries no
    /// provider usage.
    pub fn record(&self, report: ExchangeReport) {
        let (input_tokens, output_tokens) = match report.usage {
            Some(usage) => (usage.input_tokens, usage.output_tokens),
            None => (
                report.input_messages.iter().map(|m| estimate_tokens(m)).sum(),
                estimate_tokens(&report.output_text),
            ),
        };
        let cost_usd = rate_for_model(&report.model).cost(input_tokens, output_tokens);

        let event = TelemetryEvent {
            model: report.model,
            input_messages: report.input_messages,
            output_text: report.output_text,
            input_tokens,
            output_tokens,
            cost_usd,
            latency_ms: report.latency_ms,
            success: report.success,
            error: report.error,
            trace_id: uuid::Uuid::new_v4().to_string(),
            metadata: report.metadata,
        };

        let emit = std::panic::catch_unwind(AssertUnwindSafe(|| self.sink.emit(&event)));
        if emit.is_err() {
            tracing::warn!(trace_id = %event.trace_id, "Telemetry sink panicked; event dropped");
        }
    }
}
