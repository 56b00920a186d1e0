//! Error types for PHP serialization and deserialization.
//!
//! Decode errors carry the byte offset where the problem was detected and,
//! optionally, a preview of the surrounding input. Encode errors use the
//! number of bytes emitted so far as their position.

use std::fmt;
use thiserror::Error;

/// The main error type for the codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct PhpSerializeError {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// The byte position where the error occurred.
    pub position: usize,
    /// Optional context about what was being processed.
    pub context: Option<String>,
    /// Preview of input around error position for debugging.
    pub input_preview: Option<String>,
}

impl fmt::Display for PhpSerializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at position {}", self.kind, self.position)?;
        if let Some(ref ctx) = self.context {
            write!(f, " ({})", ctx)?;
        }
        if let Some(ref preview) = self.input_preview {
            write!(f, "\n{}", preview)?;
        }
        Ok(())
    }
}

/// Specific kinds of codec errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unexpected end of input.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A value started with a byte that is not a type marker.
    #[error("malformed token: unknown type marker '{0}'")]
    MalformedToken(char),

    /// A delimiter or terminator was missing.
    #[error("unterminated value: expected '{expected}', found '{found}'")]
    UnterminatedValue {
        /// The delimiter that was expected.
        expected: char,
        /// The byte that was found instead.
        found: char,
    },

    /// A declared byte length does not match the content.
    #[error("length mismatch: expected {expected} bytes, found {found}")]
    LengthMismatch {
        /// The declared length in bytes.
        expected: usize,
        /// The number of bytes actually available before the terminator.
        found: usize,
    },

    /// Invalid integer value.
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// Invalid float value.
    #[error("invalid float: {0}")]
    InvalidFloat(String),

    /// Invalid boolean value.
    #[error("invalid boolean value: {0}")]
    InvalidBoolean(String),

    /// Invalid UTF-8 in a class name.
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,

    /// Back-reference index that is not in the reference table.
    #[error("invalid reference index: {0}")]
    InvalidReference(usize),

    /// A shared array or object contains itself.
    #[error("circular reference detected at depth {0}")]
    CircularReference(usize),

    /// Invalid array key type.
    #[error("invalid array key type: expected string or integer")]
    InvalidArrayKey,

    /// A value cannot be encoded in the position it appears in.
    #[error("unsupported value: {0}")]
    UnsupportedValue(&'static str),

    /// Nesting depth exceeded.
    #[error("maximum nesting depth ({0}) exceeded")]
    MaxDepthExceeded(usize),
}

impl PhpSerializeError {
    /// Create a new error with the given kind and position.
    #[inline]
    pub fn new(kind: ErrorKind, position: usize) -> Self {
        Self {
            kind,
            position,
            context: None,
            input_preview: None,
        }
    }

    /// Add context to the error.
    #[inline]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add input preview around the error position for debugging.
    ///
    /// Shows up to 20 bytes before and after the error position.
    #[cold]
    pub fn with_input_preview(mut self, data: &[u8], error_pos: usize) -> Self {
        let start = error_pos.saturating_sub(20).min(data.len());
        let end = (error_pos + 20).min(data.len());

        if start < end {
            let slice = &data[start..end];
            // Control bytes (mangled member names) would break the caret alignment
            let preview: String = slice
                .iter()
                .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
                .collect();

            let relative_pos = error_pos.saturating_sub(start);
            let mut result = String::with_capacity(preview.len() + relative_pos + 2);
            result.push_str(&preview);
            result.push('\n');
            result.push_str(&" ".repeat(relative_pos));
            result.push('^');

            self.input_preview = Some(result);
        }
        self
    }
}

/// Result type alias for the codec.
pub type Result<T> = std::result::Result<T, PhpSerializeError>;
