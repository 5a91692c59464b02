//! Domain error model.

use thiserror::Error;

/// Failure to turn raw input into a domain value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. an unknown audit verb).
    #[error("{0}")]
    Validation(String),

    /// An identifier did not parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_is_shown_verbatim() {
        assert_eq!(DomainError::validation("unknown audit action 'X'").to_string(), "unknown audit action 'X'");
        assert_eq!(DomainError::invalid_id("bad").to_string(), "invalid identifier: bad");
    }
}
