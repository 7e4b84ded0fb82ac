//! Liaison Console
//!
//! Headless console surface for the agent interface. Reads visitor input
//! line by line, streams the reply inline, and prints status changes: the
//! full controller pipeline with no web UI attached.
//!
//! # Usage
//!
//! ```bash
//! # Against the hosted provider (needs GEMINI_API_KEY)
//! liaison-console
//!
//! # Fully offline, with a canned echo provider
//! liaison-console --offline
//!
//! # Start in the technical persona
//! liaison-console --technical
//! ```
//!
//! In-session commands: `/mode strategic|technical`, `/quit`.
//!
//! # Environment Variables
//!
//! - `GEMINI_API_KEY` / `LIAISON_API_KEY`: provider credentials
//! - `LIAISON_MODEL`, `LIAISON_MODE`, `LIAISON_SETTLE_DELAY_MS`, ...: see
//!   the config module
//! - `RUST_LOG`: log level (trace, debug, info, warn, error)

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

use liaison_core::{
    AgentController, AgentProvider, Fragment, GeminiProvider, HeadlessSurface, InterfaceConfig,
    InterfaceUpdate, Mode, ModeProfile, ProviderError, ProviderSession, ToolInvocation,
    TracingSink, TOOL_NAVIGATE,
};

/// Offline provider with canned streaming replies
///
/// Lets the console run the whole pipeline without credentials. Mentions of
/// "projects" in the input trigger a navigation tool call, so tool dispatch
/// is exercised too.
struct EchoProvider;

#[async_trait]
impl AgentProvider for EchoProvider {
    fn name(&self) -> &str {
        "Echo"
    }

    fn model(&self) -> &str {
        "echo-local"
    }

    async fn open_session(&self, profile: ModeProfile) -> Result<ProviderSession, ProviderError> {
        Ok(ProviderSession::new(profile))
    }

    async fn stream_reply(
        &self,
        session: &mut ProviderSession,
        text: &str,
    ) -> Result<mpsc::Receiver<Fragment>, ProviderError> {
        let (tx, rx) = mpsc::channel(16);
        let mode = session.mode;
        let wants_projects = text.to_lowercase().contains("projects");
        let reply = format!(
            "Echoing in {} mode: {text}",
            mode.name()
        );

        tokio::spawn(async move {
            for word in reply.split_inclusive(' ') {
                if tx.send(Fragment::Text(word.to_string())).await.is_err() {
                    return;
                }
                tokio::time::sleep(std::time::Duration::from_millis(40)).await;
            }
            if wants_projects {
                let invocation =
                    ToolInvocation::new(TOOL_NAVIGATE).with_arg("section_id", "projects");
                if tx.send(Fragment::ToolCall(invocation)).await.is_err() {
                    return;
                }
            }
            let _ = tx.send(Fragment::Complete { usage: None }).await;
        });

        Ok(rx)
    }
}

/// Render interface updates to stdout
async fn render_updates(mut rx: mpsc::Receiver<InterfaceUpdate>) {
    let mut streamed_len = 0usize;
    while let Some(update) = rx.recv().await {
        match update {
            InterfaceUpdate::MessageAppended { message } => {
                if message.streaming {
                    streamed_len = 0;
                    print!("agent> ");
                } else {
                    println!("{}> {}", role_tag(&message), message.text);
                }
            }
            InterfaceUpdate::MessageText { text, .. } => {
                // Print only the unseen tail; the text is cumulative.
                print!("{}", &text[streamed_len..]);
                streamed_len = text.len();
            }
            InterfaceUpdate::StreamEnd { .. } => {
                println!();
                streamed_len = 0;
            }
            InterfaceUpdate::Status { status } => {
                println!("  [{}]", status.description());
            }
        }
        let _ = std::io::stdout().flush();
    }
}

fn role_tag(message: &liaison_core::Message) -> &'static str {
    match message.role {
        liaison_core::MessageRole::User => "you",
        liaison_core::MessageRole::Agent => "agent",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("liaison_core=info".parse()?),
        )
        .with_target(true)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let offline = args.iter().any(|a| a == "--offline");
    let technical = args.iter().any(|a| a == "--technical");

    let mut config = InterfaceConfig::load();
    if technical {
        config.default_mode = Mode::Technical;
    }

    let provider: Arc<dyn AgentProvider> = if offline {
        info!("Running offline with the echo provider");
        Arc::new(EchoProvider)
    } else {
        let provider = GeminiProvider::from_env();
        if !provider.health_check().await {
            info!("Provider health check failed - first exchange may error");
        }
        Arc::new(provider)
    };

    let surface = Arc::new(HeadlessSurface::with_sections([
        "projects",
        "experience",
        "writing",
        "contact",
    ]));

    let (tx, rx) = mpsc::channel(100);
    let mut controller = AgentController::new(
        provider,
        surface,
        Arc::new(TracingSink),
        config,
        tx,
    );

    tokio::spawn(render_updates(rx));

    println!("liaison console - {} mode. /mode <m> to switch, /quit to exit.", controller.mode().name());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();

        if let Some(rest) = line.strip_prefix("/mode") {
            match rest.trim().parse::<Mode>() {
                Ok(mode) => {
                    controller.set_mode(mode);
                    println!("  [mode: {}]", mode.name());
                }
                Err(e) => println!("  [{e}]"),
            }
            continue;
        }
        if line == "/quit" || line == "/exit" {
            break;
        }

        controller.submit(&line).await;
    }

    info!("Console session ended");
    Ok(())
}
