//! Parse diagnostics.
//!
//! The parser never fails: malformed markup still yields a tree, and what was
//! wrong with it is reported through these diagnostics.

use serde::{Deserialize, Serialize};

use crate::ast::SourceLocation;

/// Diagnostic codes emitted by the tokenizer and parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    EofInTag,
    EofInComment,
    EofInCdata,
    EofInInterpolation,
    MissingEndTagName,
    MissingEndTag,
    InvalidEndTag,
}

impl ErrorCode {
    pub fn message(&self) -> &'static str {
        match self {
            Self::EofInTag => "Unexpected EOF in tag.",
            Self::EofInComment => "Unexpected EOF in comment.",
            Self::EofInCdata => "Unexpected EOF in CDATA section.",
            Self::EofInInterpolation => "Interpolation end sign was not found.",
            Self::MissingEndTagName => "End tag name was expected.",
            Self::MissingEndTag => "Element is missing end tag.",
            Self::InvalidEndTag => "Invalid end tag.",
        }
    }
}

/// A diagnostic produced while parsing a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .code.message())]
pub struct CompilerError {
    pub code: ErrorCode,
    pub loc: Option<SourceLocation>,
}

impl CompilerError {
    pub fn new(code: ErrorCode, loc: Option<SourceLocation>) -> Self {
        Self { code, loc }
    }

    pub fn message(&self) -> &'static str {
        self.code.message()
    }

    /// `line:column` of the diagnostic, when known.
    pub fn position(&self) -> Option<(u32, u32)> {
        self.loc.as_ref().map(|loc| (loc.start.line, loc.start.column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Position;

    #[test]
    fn test_display_uses_code_message() {
        let err = CompilerError::new(ErrorCode::MissingEndTag, None);
        assert_eq!(err.to_string(), "Element is missing end tag.");
        assert_eq!(err.position(), None);
    }

    #[test]
    fn test_position() {
        let loc = SourceLocation::new(Position::new(4, 2, 3), Position::new(5, 2, 4), "<");
        let err = CompilerError::new(ErrorCode::InvalidEndTag, Some(loc));
        assert_eq!(err.position(), Some((2, 3)));
    }
}
