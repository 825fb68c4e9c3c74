//! The error taxonomy shared by every pass.
//!
//! Every condition is fatal for the whole file: the collector and the lowering
//! pass return the first `StubError` they hit and no output is produced.

use crate::Span;
use serde::Serialize;
use thiserror::Error;

/// Coarse classification of a [`StubError`], used for exit codes and reporting.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StubErrorKind {
    /// Legal syntax that has no place in a stub file.
    PolicyViolation,
    /// Legal syntax the backporter does not handle.
    UnsupportedConstruct,
    /// Internally inconsistent input.
    Conflict,
    /// The input could not be parsed.
    Syntax,
}

impl StubErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            StubErrorKind::PolicyViolation => "policy violation",
            StubErrorKind::UnsupportedConstruct => "unsupported construct",
            StubErrorKind::Conflict => "conflict",
            StubErrorKind::Syntax => "syntax error",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StubError {
    #[error("policy violation: {message}")]
    PolicyViolation { message: String, span: Span },

    #[error("unsupported construct: {message}")]
    UnsupportedConstruct { message: String, span: Span },

    #[error("conflict: {message}")]
    Conflict { message: String, span: Span },

    #[error("syntax error: {message}")]
    Syntax { message: String, span: Span },
}

impl StubError {
    pub fn policy(message: impl Into<String>, span: Span) -> StubError {
        StubError::PolicyViolation {
            message: message.into(),
            span,
        }
    }

    pub fn unsupported(message: impl Into<String>, span: Span) -> StubError {
        StubError::UnsupportedConstruct {
            message: message.into(),
            span,
        }
    }

    pub fn conflict(message: impl Into<String>, span: Span) -> StubError {
        StubError::Conflict {
            message: message.into(),
            span,
        }
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> StubError {
        StubError::Syntax {
            message: message.into(),
            span,
        }
    }

    pub fn kind(&self) -> StubErrorKind {
        match self {
            StubError::PolicyViolation { .. } => StubErrorKind::PolicyViolation,
            StubError::UnsupportedConstruct { .. } => StubErrorKind::UnsupportedConstruct,
            StubError::Conflict { .. } => StubErrorKind::Conflict,
            StubError::Syntax { .. } => StubErrorKind::Syntax,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            StubError::PolicyViolation { message, .. }
            | StubError::UnsupportedConstruct { message, .. }
            | StubError::Conflict { message, .. }
            | StubError::Syntax { message, .. } => message,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            StubError::PolicyViolation { span, .. }
            | StubError::UnsupportedConstruct { span, .. }
            | StubError::Conflict { span, .. }
            | StubError::Syntax { span, .. } => *span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind() {
        let err = StubError::unsupported("starred base classes", Span::new(8, 13));
        assert_eq!(err.to_string(), "unsupported construct: starred base classes");
        assert_eq!(err.kind(), StubErrorKind::UnsupportedConstruct);
        assert_eq!(err.span(), Span::new(8, 13));
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let err = StubError::conflict("duplicate type parameter 'T'", Span::new(0, 1));
        let json = serde_json::to_value(&err).expect("serializable");
        assert_eq!(json["kind"], "conflict");
        assert_eq!(json["message"], "duplicate type parameter 'T'");
        assert_eq!(json["span"]["end"], 1);
    }
}
