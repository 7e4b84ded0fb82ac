//! Tool Call Dispatch
//!
//! The model can trigger local side effects by issuing structured function
//! calls interleaved with the reply stream. The toolset is fixed and small,
//! so dispatch is a closed tagged enum mapped through an explicit match,
//! not an open-ended registry.
//!
//! # Design Philosophy
//!
//! Tool execution must never derail the conversation. Unknown names get a
//! neutral acknowledgment; navigation to a section that does not exist still
//! acknowledges success; side-effect failures are logged and swallowed. The
//! only conversational trace of a dispatch is the bracketed annotation the
//! controller appends to the in-progress reply.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::surface::UiSurface;

/// Tool name for site navigation
pub const TOOL_NAVIGATE: &str = "navigate_site";
/// Tool name for the resume download
pub const TOOL_DOWNLOAD_RESUME: &str = "download_resume";
/// Tool name for copying the contact address
pub const TOOL_COPY_EMAIL: &str = "copy_email";

/// A model-issued function call extracted from the stream
///
/// Transient: constructed from one stream fragment, consumed by the
/// dispatcher, and discarded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Function name
    pub name: String,
    /// String-valued arguments
    pub args: BTreeMap<String, String>,
}

impl ToolInvocation {
    /// Create an invocation with no arguments
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: BTreeMap::new(),
        }
    }

    /// Add an argument
    #[must_use]
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }
}

/// The closed set of local actions the model can trigger
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolAction {
    /// Scroll a named page section into view
    Navigate {
        /// Section identifier from the invocation args
        section_id: String,
    },
    /// Download the fixed resume resource
    DownloadResume,
    /// Copy the fixed contact address to the clipboard
    CopyEmail,
    /// Anything the toolset does not define
    Unknown {
        /// The unrecognized function name
        name: String,
    },
}

impl ToolAction {
    /// Map an invocation onto the closed action set
    #[must_use]
    pub fn from_invocation(invocation: &ToolInvocation) -> Self {
        match invocation.name.as_str() {
            TOOL_NAVIGATE => Self::Navigate {
                section_id: invocation
                    .args
                    .get("section_id")
                    .cloned()
                    .unwrap_or_default(),
            },
            TOOL_DOWNLOAD_RESUME => Self::DownloadResume,
            TOOL_COPY_EMAIL => Self::CopyEmail,
            other => Self::Unknown {
                name: other.to_string(),
            },
        }
    }
}

/// Result of one dispatch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolOutcome {
    /// Acknowledgment text (informational; never an error)
    pub ack: String,
    /// Bracketed transcript annotation, when the action warrants one
    pub annotation: Option<String>,
}

/// Executes tool invocations against the attached surface
pub struct ToolDispatcher {
    surface: Arc<dyn UiSurface>,
    settle_delay: Duration,
    resume_path: String,
    contact_email: String,
}

impl ToolDispatcher {
    /// Create a dispatcher bound to a surface
    pub fn new(
        surface: Arc<dyn UiSurface>,
        settle_delay: Duration,
        resume_path: impl Into<String>,
        contact_email: impl Into<String>,
    ) -> Self {
        Self {
            surface,
            settle_delay,
            resume_path: resume_path.into(),
            contact_email: contact_email.into(),
        }
    }

    /// Execute one invocation
    ///
    /// Always returns an outcome; nothing in here throws into the
    /// conversational flow.
    pub async fn dispatch(&self, invocation: &ToolInvocation) -> ToolOutcome {
        let action = ToolAction::from_invocation(invocation);
        tracing::info!(tool = %invocation.name, ?action, "Dispatching tool call");

        match action {
            ToolAction::Navigate { section_id } => self.navigate(&section_id).await,
            ToolAction::DownloadResume => self.download_resume().await,
            ToolAction::CopyEmail => self.copy_email().await,
            ToolAction::Unknown { name } => {
                tracing::warn!(tool = %name, "Unknown tool invocation");
                ToolOutcome {
                    ack: format!("Unknown function: {name}"),
                    annotation: None,
                }
            }
        }
    }

    /// Close the overlay, wait for the page to settle, scroll to the section.
    ///
    /// Acknowledges success even when the section does not exist, so the
    /// model never sees a navigational dead end.
    async fn navigate(&self, section_id: &str) -> ToolOutcome {
        if self.surface.has_section(section_id) {
            self.surface.close_overlay().await;
            tokio::time::sleep(self.settle_delay).await;
            self.surface.scroll_to_section(section_id).await;
        } else {
            tracing::debug!(section_id, "Navigation target not found; acknowledging anyway");
        }

        ToolOutcome {
            ack: format!("Navigated to {section_id}"),
            annotation: Some(format!(
                "[EXECUTING PROTOCOL: NAVIGATE TO {}]",
                section_id.to_uppercase()
            )),
        }
    }

    async fn download_resume(&self) -> ToolOutcome {
        if let Err(e) = self.surface.trigger_download(&self.resume_path).await {
            tracing::warn!(error = %e, "Resume download trigger failed");
        }
        ToolOutcome {
            ack: "Resume download triggered".to_string(),
            annotation: Some("[EXECUTING PROTOCOL: RESUME DOWNLOAD]".to_string()),
        }
    }

    async fn copy_email(&self) -> ToolOutcome {
        if let Err(e) = self.surface.write_clipboard(&self.contact_email).await {
            tracing::warn!(error = %e, "Clipboard write failed");
        }
        ToolOutcome {
            ack: "Contact address copied".to_string(),
            annotation: Some("[EXECUTING PROTOCOL: EMAIL COPIED]".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::HeadlessSurface;

    fn dispatcher(surface: Arc<dyn UiSurface>) -> ToolDispatcher {
        ToolDispatcher::new(
            surface,
            Duration::from_millis(0),
            "assets/resume.pdf",
            "hello@example.dev",
        )
    }

    #[test]
    fn test_action_mapping() {
        let inv = ToolInvocation::new(TOOL_NAVIGATE).with_arg("section_id", "projects");
        assert_eq!(
            ToolAction::from_invocation(&inv),
            ToolAction::Navigate {
                section_id: "projects".to_string()
            }
        );

        let inv = ToolInvocation::new(TOOL_DOWNLOAD_RESUME);
        assert_eq!(ToolAction::from_invocation(&inv), ToolAction::DownloadResume);

        let inv = ToolInvocation::new("self_destruct");
        assert_eq!(
            ToolAction::from_invocation(&inv),
            ToolAction::Unknown {
                name: "self_destruct".to_string()
            }
        );
    }

    #[test]
    fn test_navigate_missing_arg_defaults_empty() {
        let inv = ToolInvocation::new(TOOL_NAVIGATE);
        assert_eq!(
            ToolAction::from_invocation(&inv),
            ToolAction::Navigate {
                section_id: String::new()
            }
        );
    }

    #[tokio::test]
    async fn test_navigate_known_section() {
        let surface = Arc::new(HeadlessSurface::with_sections(["projects"]));
        let outcome = dispatcher(surface)
            .dispatch(&ToolInvocation::new(TOOL_NAVIGATE).with_arg("section_id", "projects"))
            .await;
        assert_eq!(
            outcome.annotation.as_deref(),
            Some("[EXECUTING PROTOCOL: NAVIGATE TO PROJECTS]")
        );
    }

    #[tokio::test]
    async fn test_navigate_unknown_section_still_acknowledges() {
        let surface = Arc::new(HeadlessSurface::default());
        let outcome = dispatcher(surface)
            .dispatch(&ToolInvocation::new(TOOL_NAVIGATE).with_arg("section_id", "vault"))
            .await;
        assert!(outcome.ack.contains("vault"));
        assert!(outcome.annotation.is_some());
    }

    #[tokio::test]
    async fn test_unknown_tool_neutral_outcome() {
        let surface = Arc::new(HeadlessSurface::default());
        let outcome = dispatcher(surface)
            .dispatch(&ToolInvocation::new("warp_drive"))
            .await;
        assert_eq!(outcome.ack, "Unknown function: warp_drive");
        assert!(outcome.annotation.is_none());
    }

    #[tokio::test]
    async fn test_copy_email_annotation() {
        let surface = Arc::new(HeadlessSurface::default());
        let outcome = dispatcher(surface)
            .dispatch(&ToolInvocation::new(TOOL_COPY_EMAIL))
            .await;
        assert_eq!(
            outcome.annotation.as_deref(),
            Some("[EXECUTING PROTOCOL: EMAIL COPIED]")
        );
    }
}
