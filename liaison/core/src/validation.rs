//! Input Validation
//!
//! Validation at the one boundary where visitor input enters the core.
//! Rejections are silent by design: no transcript entry, no telemetry, no
//! user-visible error; the submission simply does not happen.

use crate::config::InterfaceLimits;

/// Result of validating a submission
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationResult {
    /// Input may be submitted
    Valid,
    /// Input is rejected with an internal reason (logged, never surfaced)
    Rejected(String),
}

impl ValidationResult {
    /// Whether the input passed
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Validator for visitor submissions
#[derive(Debug)]
pub struct InputValidator {
    limits: InterfaceLimits,
}

impl InputValidator {
    /// Create a validator with the given limits
    #[must_use]
    pub fn new(limits: InterfaceLimits) -> Self {
        Self { limits }
    }

    /// Validate one submission
    pub fn validate(&self, input: &str) -> ValidationResult {
        if input.trim().is_empty() {
            return ValidationResult::Rejected("blank input".to_string());
        }

        if input.len() > self.limits.max_input_bytes {
            return ValidationResult::Rejected(format!(
                "input too large: {} bytes (max: {})",
                input.len(),
                self.limits.max_input_bytes
            ));
        }

        if input
            .chars()
            .any(|c| c.is_control() && c != '\n' && c != '\t' && c != '\r')
        {
            return ValidationResult::Rejected("control characters in input".to_string());
        }

        ValidationResult::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> InputValidator {
        InputValidator::new(InterfaceLimits::default())
    }

    #[test]
    fn test_blank_rejected() {
        assert!(!validator().validate("").is_valid());
        assert!(!validator().validate("   \n\t ").is_valid());
    }

    #[test]
    fn test_normal_input_accepted() {
        assert!(validator().validate("show me your projects").is_valid());
        assert!(validator().validate("multi\nline\tis fine").is_valid());
    }

    #[test]
    fn test_oversized_rejected() {
        let limits = InterfaceLimits {
            max_input_bytes: 8,
            ..Default::default()
        };
        let validator = InputValidator::new(limits);
        assert!(validator.validate("short").is_valid());
        assert!(!validator.validate("way past the limit").is_valid());
    }

    #[test]
    fn test_control_characters_rejected() {
        assert!(!validator().validate("sneaky\u{0007}bell").is_valid());
    }
}
