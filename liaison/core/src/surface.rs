//! UI Surface Boundary
//!
//! The core drives page-level side effects (overlay close, scrolling,
//! downloads, clipboard) through this trait without owning any layout
//! logic. Implementations are opaque to the core: a web overlay, a terminal
//! shim, or a recording double for tests all satisfy the same contract.
//!
//! All operations are fire-and-forget from the core's perspective. The two
//! fallible ones (`trigger_download`, `write_clipboard`) report failure so
//! the dispatcher can log it, but failure never reaches conversational
//! state.

use std::collections::BTreeSet;

use async_trait::async_trait;
use parking_lot::RwLock;

/// Page-level operations the core may request
#[async_trait]
pub trait UiSurface: Send + Sync {
    /// Whether a section with this identifier exists on the page
    fn has_section(&self, section_id: &str) -> bool;

    /// Scroll the named section into view
    async fn scroll_to_section(&self, section_id: &str);

    /// Close the agent interface overlay
    async fn close_overlay(&self);

    /// Trigger a client-side download of the fixed resource at `path`
    async fn trigger_download(&self, path: &str) -> anyhow::Result<()>;

    /// Write `text` to the system clipboard
    async fn write_clipboard(&self, text: &str) -> anyhow::Result<()>;
}

/// Surface that performs nothing, for fully headless runs
#[derive(Debug, Default)]
pub struct NullSurface;

#[async_trait]
impl UiSurface for NullSurface {
    fn has_section(&self, _section_id: &str) -> bool {
        false
    }

    async fn scroll_to_section(&self, section_id: &str) {
        tracing::debug!(section_id, "NullSurface: scroll ignored");
    }

    async fn close_overlay(&self) {
        tracing::debug!("NullSurface: overlay close ignored");
    }

    async fn trigger_download(&self, path: &str) -> anyhow::Result<()> {
        tracing::debug!(path, "NullSurface: download ignored");
        Ok(())
    }

    async fn write_clipboard(&self, _text: &str) -> anyhow::Result<()> {
        tracing::debug!("NullSurface: clipboard write ignored");
        Ok(())
    }
}

/// Headless surface with a registry of known section identifiers
///
/// Used by the console binary and by tests that need navigation to resolve.
/// Sections can be registered and removed at runtime, mirroring a page
/// mounting and unmounting its anchors.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    sections: RwLock<BTreeSet<String>>,
}

impl HeadlessSurface {
    /// Create a surface with the given section identifiers
    #[must_use]
    pub fn with_sections<I, S>(sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sections: RwLock::new(sections.into_iter().map(Into::into).collect()),
        }
    }

    /// Register a section identifier
    pub fn add_section(&self, section_id: impl Into<String>) {
        self.sections.write().insert(section_id.into());
    }

    /// Remove a section identifier
    pub fn remove_section(&self, section_id: &str) {
        self.sections.write().remove(section_id);
    }
}

#[async_trait]
impl UiSurface for HeadlessSurface {
    fn has_section(&self, section_id: &str) -> bool {
        self.sections.read().contains(section_id)
    }

    async fn scroll_to_section(&self, section_id: &str) {
        tracing::info!(section_id, "Scrolling section into view");
    }

    async fn close_overlay(&self) {
        tracing::info!("Closing interface overlay");
    }

    async fn trigger_download(&self, path: &str) -> anyhow::Result<()> {
        tracing::info!(path, "Download triggered");
        Ok(())
    }

    async fn write_clipboard(&self, text: &str) -> anyhow::Result<()> {
        tracing::info!(len = text.len(), "Clipboard write");
        Ok(())
    }
}
