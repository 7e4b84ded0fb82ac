//! Interface Configuration
//!
//! Runtime configuration for the agent interface: model selection, the
//! default persona mode, the fixed side-effect resources, and input limits.
//! Values layer in precedence order: built-in defaults, then an optional
//! TOML file, then `LIAISON_*` environment variables.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::session::Mode;

/// Limits on what the interface accepts and retains
#[derive(Clone, Debug)]
pub struct InterfaceLimits {
    /// Maximum size of one submission in bytes
    pub max_input_bytes: usize,
    /// Prior turns resent to the provider as context (0 = unlimited)
    pub max_context_turns: usize,
}

impl Default for InterfaceLimits {
    fn default() -> Self {
        Self {
            max_input_bytes: 8 * 1024,
            max_context_turns: 20,
        }
    }
}

/// Configuration for one interface instance
#[derive(Clone, Debug)]
pub struct InterfaceConfig {
    /// Model identifier requests are routed to
    pub model: String,
    /// Persona mode active before the visitor picks one
    pub default_mode: Mode,
    /// Delay between overlay close and scroll, in milliseconds
    pub settle_delay_ms: u64,
    /// Fixed path of the downloadable resume
    pub resume_path: String,
    /// Fixed contact address for the clipboard tool
    pub contact_email: String,
    /// Input limits
    pub limits: InterfaceLimits,
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            default_mode: Mode::Strategic,
            settle_delay_ms: 300,
            resume_path: "assets/resume.pdf".to_string(),
            contact_email: "hello@example.dev".to_string(),
            limits: InterfaceLimits::default(),
        }
    }
}

impl InterfaceConfig {
    /// Built-in defaults overlaid with `LIAISON_*` environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().overlay_env()
    }

    /// Load the default config file when present, then apply the environment
    #[must_use]
    pub fn load() -> Self {
        let base = match default_config_path() {
            Some(path) if path.exists() => match Self::from_file(&path) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                    Self::default()
                }
            },
            _ => Self::default(),
        };
        base.overlay_env()
    }

    /// Load a specific config file, then apply the environment
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::from_file(path)?.overlay_env())
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let file: InterfaceToml = toml::from_str(&raw)?;
        Ok(Self::default().overlay_file(file))
    }

    fn overlay_file(mut self, file: InterfaceToml) -> Self {
        if let Some(model) = file.model {
            self.model = model;
        }
        if let Some(mode) = file.default_mode {
            match mode.parse() {
                Ok(mode) => self.default_mode = mode,
                Err(e) => tracing::warn!(error = %e, "Ignoring invalid default_mode in config file"),
            }
        }
        if let Some(ms) = file.settle_delay_ms {
            self.settle_delay_ms = ms;
        }
        if let Some(path) = file.resume_path {
            self.resume_path = path;
        }
        if let Some(email) = file.contact_email {
            self.contact_email = email;
        }
        if let Some(bytes) = file.max_input_bytes {
            self.limits.max_input_bytes = bytes;
        }
        if let Some(turns) = file.max_context_turns {
            self.limits.max_context_turns = turns;
        }
        self
    }

    fn overlay_env(mut self) -> Self {
        if let Ok(model) = std::env::var("LIAISON_MODEL") {
            self.model = model;
        }
        if let Ok(mode) = std::env::var("LIAISON_MODE") {
            match mode.parse() {
                Ok(mode) => self.default_mode = mode,
                Err(e) => tracing::warn!(error = %e, "Ignoring invalid LIAISON_MODE"),
            }
        }
        if let Some(ms) = env_parse("LIAISON_SETTLE_DELAY_MS") {
            self.settle_delay_ms = ms;
        }
        if let Ok(path) = std::env::var("LIAISON_RESUME_PATH") {
            self.resume_path = path;
        }
        if let Ok(email) = std::env::var("LIAISON_CONTACT_EMAIL") {
            self.contact_email = email;
        }
        if let Some(bytes) = env_parse("LIAISON_MAX_INPUT_BYTES") {
            self.limits.max_input_bytes = bytes;
        }
        if let Some(turns) = env_parse("LIAISON_MAX_CONTEXT_TURNS") {
            self.limits.max_context_turns = turns;
        }
        self
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Default config file location (`<config dir>/liaison/config.toml`)
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("liaison").join("config.toml"))
}

/// Errors loading a config file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// File is not valid TOML for this schema
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// On-disk schema; every field optional
#[derive(Debug, Default, Deserialize)]
struct InterfaceToml {
    model: Option<String>,
    default_mode: Option<String>,
    settle_delay_ms: Option<u64>,
    resume_path: Option<String>,
    contact_email: Option<String>,
    max_input_bytes: Option<usize>,
    max_context_turns: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = InterfaceConfig::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.default_mode, Mode::Strategic);
        assert_eq!(config.settle_delay_ms, 300);
        assert_eq!(config.limits.max_context_turns, 20);
    }

    #[test]
    fn test_file_overlays_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "model = \"gemini-2.5-pro\"\ndefault_mode = \"technical\"\nmax_input_bytes = 2048"
        )
        .unwrap();

        let config = InterfaceConfig::from_file(file.path()).unwrap();
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.default_mode, Mode::Technical);
        assert_eq!(config.limits.max_input_bytes, 2048);
        // Untouched fields keep defaults.
        assert_eq!(config.settle_delay_ms, 300);
    }

    #[test]
    fn test_invalid_mode_in_file_keeps_default() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "default_mode = \"chaotic\"").unwrap();
        let config = InterfaceConfig::from_file(file.path()).unwrap();
        assert_eq!(config.default_mode, Mode::Strategic);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "model = [not toml").unwrap();
        assert!(InterfaceConfig::from_file(file.path()).is_err());
    }
}
