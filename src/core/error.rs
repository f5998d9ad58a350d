//! Tokenizer error codes
//!
//! The engine reports failures as a compact code plus the buffer offset of
//! the offending construct. The dispatcher turns the offset into a
//! line/column pair and wraps everything into a `ParseError`.

use thiserror::Error;

use crate::error::ErrorKind;

/// Error codes for well-formedness and encoding failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SyntaxErrorCode {
    /// Character or construct not allowed at this point
    InvalidToken = 0,
    /// Generic grammar violation outside the element tree
    Syntax,
    /// Input ended inside markup
    UnclosedToken,
    /// Input ended inside a CDATA section
    UnclosedCdata,
    /// Input ended with elements still open
    UnclosedElement,
    /// Input contained no root element
    NoElements,
    /// End tag does not match the innermost open element
    TagMismatch,
    /// Same attribute name twice on one element
    DuplicateAttribute,
    /// Content after the root element closed
    JunkAfterDocElement,
    /// Entity reference with no declaration
    UndefinedEntity,
    /// Entity whose expansion refers back to itself
    RecursiveEntityRef,
    /// Character reference to a code point XML forbids
    BadCharRef,
    /// XML declaration anywhere but the very start
    MisplacedXmlPi,
    /// Declared entities expanded past the size limit
    EntityExpansionLimit,
    /// Byte sequence not valid in the document encoding
    InvalidEncoding,
    /// Declared encoding is not supported
    UnknownEncoding,
    /// Declared encoding contradicts the detected one
    IncorrectEncoding,
}

impl SyntaxErrorCode {
    /// Get a human-readable message for this error code.
    pub fn message(self) -> &'static str {
        match self {
            Self::InvalidToken => "not well-formed (invalid token)",
            Self::Syntax => "syntax error",
            Self::UnclosedToken => "unclosed token",
            Self::UnclosedCdata => "unclosed CDATA section",
            Self::UnclosedElement => "no closing tag for open element",
            Self::NoElements => "no element found",
            Self::TagMismatch => "mismatched tag",
            Self::DuplicateAttribute => "duplicate attribute",
            Self::JunkAfterDocElement => "junk after document element",
            Self::UndefinedEntity => "undefined entity",
            Self::RecursiveEntityRef => "recursive entity reference",
            Self::BadCharRef => "reference to invalid character number",
            Self::EntityExpansionLimit => "entity expansion limit exceeded",
            Self::MisplacedXmlPi => "XML declaration not at start of document",
            Self::InvalidEncoding => "invalid byte sequence for document encoding",
            Self::UnknownEncoding => "unknown encoding",
            Self::IncorrectEncoding => "encoding specified in XML declaration is incorrect",
        }
    }

    /// Whether the failure means "input ended too early" rather than "input is wrong"
    pub fn kind(self) -> ErrorKind {
        match self {
            Self::UnclosedToken | Self::UnclosedCdata | Self::UnclosedElement | Self::NoElements => {
                ErrorKind::Incomplete
            }
            _ => ErrorKind::Malformed,
        }
    }
}

/// A tokenizer failure at a buffer offset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.describe())]
pub struct SyntaxError {
    pub code: SyntaxErrorCode,
    /// Offset into the tokenizer buffer
    pub offset: usize,
    /// Extra context such as the element names involved
    pub detail: Option<String>,
}

impl SyntaxError {
    pub fn new(code: SyntaxErrorCode, offset: usize) -> Self {
        SyntaxError {
            code,
            offset,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Message with optional detail appended
    pub fn describe(&self) -> String {
        match &self.detail {
            Some(detail) => format!("{}: {}", self.code.message(), detail),
            None => self.code.message().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_split() {
        assert_eq!(SyntaxErrorCode::NoElements.kind(), ErrorKind::Incomplete);
        assert_eq!(SyntaxErrorCode::TagMismatch.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn test_describe_with_detail() {
        let err = SyntaxError::new(SyntaxErrorCode::TagMismatch, 6).with_detail("expected </b>, found </a>");
        assert_eq!(err.to_string(), "mismatched tag: expected </b>, found </a>");
    }
}
