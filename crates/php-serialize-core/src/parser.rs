//! PHP unserialize parser.
//!
//! A recursive-descent parser with one method per token kind. Arrays,
//! objects and custom-serialized objects are registered in a
//! [`ReferenceTable`] once their closing brace has been consumed, and
//! `R:`/`r:` tokens resolve against that table. A resolved array or object
//! is the same shared handle as the original, so the two alias each other.
//!
//! # Tracing Support
//!
//! Enable the `tracing` feature for parsing instrumentation. Per-token
//! events are only emitted when [`ParserConfig::debug`] is set:
//!
//! ```toml
//! php-serialize-core = { version = "0.2", features = ["tracing"] }
//! ```

use std::borrow::Cow;
use std::fmt;

use memchr::memchr;

#[cfg(feature = "tracing")]
use tracing::{debug, instrument, trace, warn};

use crate::error::{ErrorKind, PhpSerializeError, Result};
use crate::refs::ReferenceTable;
use crate::token;
use crate::types::{ArrayKey, PhpArray, PhpObject, PhpObjectSerialized, PhpSplArray, PhpValue};

/// Maximum nesting depth to prevent stack overflow.
const MAX_DEPTH: usize = 512;

/// Hook that decodes the opaque payload of a `C:` object.
///
/// It receives the caller's configuration with `max_depth` reduced by the
/// depth of the `C:` token, so [`from_bytes_with_config`] fits directly.
pub type SerializedDecodeFn = fn(&[u8], ParserConfig) -> Result<PhpValue>;

/// Parser configuration options.
#[derive(Clone)]
pub struct ParserConfig {
    /// Maximum nesting depth for arrays and objects.
    pub max_depth: usize,
    /// Emit per-token trace events and attach input previews to errors.
    pub debug: bool,
    /// Decoder for custom-serialized payloads. When unset, payloads are
    /// kept as opaque bytes only.
    pub decode_serialized: Option<SerializedDecodeFn>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            debug: false,
            decode_serialized: None,
        }
    }
}

impl fmt::Debug for ParserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserConfig")
            .field("max_depth", &self.max_depth)
            .field("debug", &self.debug)
            .field("decode_serialized", &self.decode_serialized.is_some())
            .finish()
    }
}

/// A PHP unserialize parser over an in-memory byte slice.
pub struct Parser<'a> {
    /// Input data.
    data: &'a [u8],
    /// Current position in the input.
    pos: usize,
    /// Parser configuration.
    config: ParserConfig,
    /// Current nesting depth.
    depth: usize,
    /// Completed composite values, for R/r references.
    references: ReferenceTable,
}

impl<'a> Parser<'a> {
    /// Create a new parser with default configuration.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_config(data, ParserConfig::default())
    }

    /// Create a new parser with custom configuration.
    pub fn with_config(data: &'a [u8], config: ParserConfig) -> Self {
        Self {
            data,
            pos: 0,
            config,
            depth: 0,
            references: ReferenceTable::new(),
        }
    }

    /// Byte offset just past the last consumed token.
    ///
    /// After a successful [`parse`](Self::parse), any bytes from this offset
    /// on were not part of the value.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Parse one value from the input.
    ///
    /// This is the main entry point for parsing PHP serialized data.
    #[cfg_attr(feature = "tracing", instrument(skip(self), fields(data_len = self.data.len())))]
    pub fn parse(&mut self) -> Result<PhpValue> {
        #[cfg(feature = "tracing")]
        debug!(data_len = self.data.len(), "Starting PHP unserialize");

        let result = self.parse_value().map_err(|e| {
            if self.config.debug && e.input_preview.is_none() {
                let position = e.position;
                e.with_input_preview(self.data, position)
            } else {
                e
            }
        });

        #[cfg(feature = "tracing")]
        match &result {
            Ok(value) => debug!(
                value_type = value.type_name(),
                consumed = self.pos,
                references = self.references.len(),
                "Parse completed successfully"
            ),
            Err(e) => warn!(error = %e, "Parse failed"),
        }

        result
    }

    /// Parse a single value at the current position.
    fn parse_value(&mut self) -> Result<PhpValue> {
        if self.depth > self.config.max_depth {
            #[cfg(feature = "tracing")]
            warn!(depth = self.depth, max_depth = self.config.max_depth, "Max depth exceeded");
            return Err(PhpSerializeError::new(
                ErrorKind::MaxDepthExceeded(self.config.max_depth),
                self.pos,
            ));
        }

        let type_byte = self.peek_byte()?;

        #[cfg(feature = "tracing")]
        if self.config.debug {
            trace!(type_marker = %char::from(type_byte), pos = self.pos, depth = self.depth, "Parsing value");
        }

        match type_byte {
            token::NULL => self.parse_null(),
            token::BOOL => self.parse_bool(),
            token::INT => self.read_int().map(PhpValue::Int),
            token::FLOAT => self.parse_float(),
            token::STRING => self.read_string().map(|s| PhpValue::String(s.to_vec())),
            token::ARRAY => self.parse_array(),
            token::OBJECT => self.parse_object(),
            token::OBJECT_SERIALIZED => self.parse_object_serialized(),
            token::REFERENCE | token::REFERENCE_OBJECT => self.parse_reference(),
            token::SPL_ARRAY => self.parse_spl_array(),
            _ => Err(PhpSerializeError::new(
                ErrorKind::MalformedToken(char::from(type_byte)),
                self.pos,
            )),
        }
    }

    /// Parse a null value: `N;`
    fn parse_null(&mut self) -> Result<PhpValue> {
        self.expect_byte(token::NULL)?;
        self.expect_byte(token::SEPARATOR_VALUES)?;
        Ok(PhpValue::Null)
    }

    /// Parse a boolean value: `b:0;` or `b:1;`
    fn parse_bool(&mut self) -> Result<PhpValue> {
        self.expect_byte(token::BOOL)?;
        self.expect_byte(token::SEPARATOR_TYPE)?;
        let value_byte = self.read_byte()?;
        self.expect_byte(token::SEPARATOR_VALUES)?;

        match value_byte {
            b'0' => Ok(PhpValue::Bool(false)),
            b'1' => Ok(PhpValue::Bool(true)),
            _ => Err(PhpSerializeError::new(
                ErrorKind::InvalidBoolean(char::from(value_byte).to_string()),
                self.pos - 2,
            )),
        }
    }

    /// Parse an integer: `i:<value>;`
    fn read_int(&mut self) -> Result<i64> {
        self.expect_byte(token::INT)?;
        self.expect_byte(token::SEPARATOR_TYPE)?;
        let value = self.read_number(token::SEPARATOR_VALUES)?;
        self.expect_byte(token::SEPARATOR_VALUES)?;
        Ok(value)
    }

    /// Parse a float/double value: `d:<value>;`
    fn parse_float(&mut self) -> Result<PhpValue> {
        self.expect_byte(token::FLOAT)?;
        self.expect_byte(token::SEPARATOR_TYPE)?;

        let start = self.pos;
        let text = self.read_until(token::SEPARATOR_VALUES)?;
        let value = std::str::from_utf8(text)
            .ok()
            .and_then(parse_float_text)
            .ok_or_else(|| {
                PhpSerializeError::new(
                    ErrorKind::InvalidFloat(String::from_utf8_lossy(text).into_owned()),
                    start,
                )
            })?;

        self.expect_byte(token::SEPARATOR_VALUES)?;
        Ok(PhpValue::Float(value))
    }

    /// Parse a string: `s:<len>:"<data>";`
    ///
    /// The declared length is a byte count and must match exactly.
    fn read_string(&mut self) -> Result<&'a [u8]> {
        self.expect_byte(token::STRING)?;
        self.expect_byte(token::SEPARATOR_TYPE)?;
        let len = self.read_length(token::SEPARATOR_TYPE)?;
        self.expect_byte(token::SEPARATOR_TYPE)?;
        self.expect_byte(token::STRING_QUOTE)?;
        self.read_quoted(len, token::SEPARATOR_VALUES)
    }

    /// Parse an array: `a:<count>:{<key><value>...}`
    fn parse_array(&mut self) -> Result<PhpValue> {
        self.expect_byte(token::ARRAY)?;
        self.expect_byte(token::SEPARATOR_TYPE)?;
        let count = self.read_length(token::SEPARATOR_TYPE)?;
        self.expect_byte(token::SEPARATOR_TYPE)?;

        let array = self.parse_members(count)?;
        let value = PhpValue::array(array);
        self.register(&value);
        Ok(value)
    }

    /// Parse an object: `O:<namelen>:"<name>":<count>:{<key><value>...}`
    fn parse_object(&mut self) -> Result<PhpValue> {
        self.expect_byte(token::OBJECT)?;
        self.expect_byte(token::SEPARATOR_TYPE)?;
        let class_name = self.read_class_name()?;
        let count = self.read_length(token::SEPARATOR_TYPE)?;
        self.expect_byte(token::SEPARATOR_TYPE)?;

        let members = self.parse_members(count)?;
        let mut object = PhpObject::new(class_name);
        object.set_members(members);

        let value = PhpValue::object(object);
        self.register(&value);
        Ok(value)
    }

    /// Parse a braced block of `count` key/value pairs.
    fn parse_members(&mut self, count: usize) -> Result<PhpArray> {
        self.expect_byte(token::BLOCK_OPEN)?;

        self.depth += 1;
        // Cap initial allocation, the count is untrusted
        let mut array = PhpArray::with_capacity(count.min(1024));

        for found in 0..count {
            if self.peek_is(token::BLOCK_CLOSE) {
                return Err(PhpSerializeError::new(
                    ErrorKind::LengthMismatch {
                        expected: count,
                        found,
                    },
                    self.pos,
                ));
            }
            let key = self.parse_key()?;
            let value = self.parse_value()?;
            array.set(key, value);
        }

        self.depth -= 1;
        self.expect_byte(token::BLOCK_CLOSE)?;
        Ok(array)
    }

    /// Parse an array key, which must be an integer or a string.
    fn parse_key(&mut self) -> Result<ArrayKey> {
        match self.peek_byte()? {
            token::INT => self.read_int().map(ArrayKey::Int),
            token::STRING => self.read_string().map(ArrayKey::from),
            _ => Err(PhpSerializeError::new(ErrorKind::InvalidArrayKey, self.pos)),
        }
    }

    /// Parse a custom serialized object: `C:<namelen>:"<name>":<datalen>:{<data>}`
    fn parse_object_serialized(&mut self) -> Result<PhpValue> {
        self.expect_byte(token::OBJECT_SERIALIZED)?;
        self.expect_byte(token::SEPARATOR_TYPE)?;
        let class_name = self.read_class_name()?;
        let data_len = self.read_length(token::SEPARATOR_TYPE)?;
        self.expect_byte(token::SEPARATOR_TYPE)?;
        self.expect_byte(token::BLOCK_OPEN)?;

        let data_start = self.pos;
        let data_end = data_start.saturating_add(data_len);
        if self.data.get(data_end) != Some(&token::BLOCK_CLOSE) {
            return Err(match memchr(token::BLOCK_CLOSE, &self.data[data_start..]) {
                Some(found) => PhpSerializeError::new(
                    ErrorKind::LengthMismatch {
                        expected: data_len,
                        found,
                    },
                    data_start,
                ),
                _ => PhpSerializeError::new(ErrorKind::UnexpectedEof, self.data.len()),
            });
        }
        let payload = &self.data[data_start..data_end];
        self.pos = data_end;
        self.expect_byte(token::BLOCK_CLOSE)?;

        let inner = match self.config.decode_serialized {
            Some(decode) => {
                let config = self.payload_config(data_start)?;
                Some(decode(payload, config).map_err(|e| {
                    PhpSerializeError::new(e.kind, data_start + e.position)
                        .with_context(format!("in {} payload", class_name))
                })?)
            }
            None => None,
        };

        let _index = self.references.reserve();

        #[cfg(feature = "tracing")]
        if self.config.debug {
            trace!(index = _index, class = %class_name, "Reserved reference slot");
        }

        Ok(PhpValue::from(PhpObjectSerialized {
            class_name,
            data: payload.to_vec(),
            value: inner,
        }))
    }

    /// Parse a reference: `R:<index>;` or `r:<index>;`
    ///
    /// Both kinds resolve to the registered value itself. Arrays and objects
    /// come back as the same shared handle.
    fn parse_reference(&mut self) -> Result<PhpValue> {
        let ref_type = self.read_byte()?;
        self.expect_byte(token::SEPARATOR_TYPE)?;

        let idx_start = self.pos;
        let idx = self.read_length(token::SEPARATOR_VALUES)?;
        self.expect_byte(token::SEPARATOR_VALUES)?;

        #[cfg(feature = "tracing")]
        if self.config.debug {
            trace!(kind = %char::from(ref_type), index = idx, "Resolving reference");
        }

        self.references.get(idx).cloned().ok_or_else(|| {
            PhpSerializeError::new(ErrorKind::InvalidReference(idx), idx_start).with_context(
                format!(
                    "{}: token, {} values registered",
                    char::from(ref_type),
                    self.references.len()
                ),
            )
        })
    }

    /// Parse an SPL array body: `x:i:<flags>;<value>;m:<value>`
    ///
    /// The bare `x:<flags>:<value>` form is accepted too, and both the `;`
    /// after the wrapped value and the `m:` section are optional.
    fn parse_spl_array(&mut self) -> Result<PhpValue> {
        self.expect_byte(token::SPL_ARRAY)?;
        self.expect_byte(token::SEPARATOR_TYPE)?;

        let flags = if self.peek_byte()? == token::INT {
            self.read_int()?
        } else {
            let flags = self.read_number::<i64>(token::SEPARATOR_TYPE)?;
            self.expect_byte(token::SEPARATOR_TYPE)?;
            flags
        };

        self.depth += 1;
        let array = self.parse_value()?;
        if self.peek_is(token::SEPARATOR_VALUES) {
            self.pos += 1;
        }
        let properties = if self.peek_is(token::SPL_ARRAY_MEMBERS) {
            self.expect_byte(token::SPL_ARRAY_MEMBERS)?;
            self.expect_byte(token::SEPARATOR_TYPE)?;
            Some(self.parse_value()?)
        } else {
            None
        };
        self.depth -= 1;

        Ok(PhpValue::from(
            PhpSplArray::new(Some(array), properties).with_flags(flags),
        ))
    }

    /// Configuration for a nested `C:` payload decode.
    fn payload_config(&self, pos: usize) -> Result<ParserConfig> {
        let depth = self.depth + 1;
        if depth > self.config.max_depth {
            return Err(PhpSerializeError::new(
                ErrorKind::MaxDepthExceeded(self.config.max_depth),
                pos,
            ));
        }
        Ok(ParserConfig {
            max_depth: self.config.max_depth - depth,
            ..self.config.clone()
        })
    }

    /// Register a completed composite value.
    fn register(&mut self, value: &PhpValue) {
        let _index = self.references.register(value.clone());

        #[cfg(feature = "tracing")]
        if self.config.debug {
            trace!(index = _index, value_type = value.type_name(), "Registered reference");
        }
    }

    // Helper methods

    /// Read `<len>:"<name>":` and return the class name.
    fn read_class_name(&mut self) -> Result<String> {
        let len = self.read_length(token::SEPARATOR_TYPE)?;
        self.expect_byte(token::SEPARATOR_TYPE)?;
        self.expect_byte(token::STRING_QUOTE)?;

        let start = self.pos;
        let name = self.read_quoted(len, token::SEPARATOR_TYPE)?;
        std::str::from_utf8(name)
            .map(str::to_owned)
            .map_err(|_| PhpSerializeError::new(ErrorKind::InvalidUtf8, start))
    }

    /// Read `len` bytes followed by `"` and `follow`.
    ///
    /// On mismatch, reports where the closing quote actually is.
    fn read_quoted(&mut self, len: usize, follow: u8) -> Result<&'a [u8]> {
        let start = self.pos;
        let end = start.saturating_add(len);

        match (self.data.get(end), self.data.get(end.saturating_add(1))) {
            (Some(&token::STRING_QUOTE), Some(&next)) if next == follow => {
                self.pos = end + 2;
                Ok(&self.data[start..end])
            }
            (Some(&token::STRING_QUOTE), Some(&next)) => Err(PhpSerializeError::new(
                ErrorKind::UnterminatedValue {
                    expected: char::from(follow),
                    found: char::from(next),
                },
                end + 1,
            )),
            _ => match find_closing_quote(&self.data[start..], follow) {
                Some(found) => Err(PhpSerializeError::new(
                    ErrorKind::LengthMismatch {
                        expected: len,
                        found,
                    },
                    start,
                )),
                None => Err(PhpSerializeError::new(ErrorKind::UnexpectedEof, self.data.len())),
            },
        }
    }

    /// Read a non-negative decimal (length, count, or index) up to `delimiter`.
    fn read_length(&mut self, delimiter: u8) -> Result<usize> {
        self.read_number(delimiter)
    }

    /// Read a decimal number up to `delimiter`, leaving the delimiter unread.
    ///
    /// Only ASCII digits with an optional leading `-` are accepted.
    fn read_number<T: std::str::FromStr>(&mut self, delimiter: u8) -> Result<T> {
        let start = self.pos;
        let digits = self.read_until(delimiter)?;
        let unsigned = digits.strip_prefix(b"-").unwrap_or(digits);
        let well_formed = !unsigned.is_empty() && unsigned.iter().all(u8::is_ascii_digit);
        std::str::from_utf8(digits)
            .ok()
            .filter(|_| well_formed)
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                PhpSerializeError::new(
                    ErrorKind::InvalidInteger(String::from_utf8_lossy(digits).into_owned()),
                    start,
                )
            })
    }

    /// Peek at the current byte without consuming it.
    #[inline(always)]
    fn peek_byte(&self) -> Result<u8> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or_else(|| PhpSerializeError::new(ErrorKind::UnexpectedEof, self.pos))
    }

    /// Returns `true` if the current byte is `byte`; never fails at end of input.
    #[inline]
    fn peek_is(&self, byte: u8) -> bool {
        self.data.get(self.pos) == Some(&byte)
    }

    /// Read and consume the current byte.
    #[inline(always)]
    fn read_byte(&mut self) -> Result<u8> {
        let byte = self.peek_byte()?;
        self.pos += 1;
        Ok(byte)
    }

    /// Expect a specific byte, returning an error if it doesn't match.
    #[inline]
    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        let byte = self.read_byte()?;
        if byte != expected {
            return Err(self.make_unterminated_error(expected, byte));
        }
        Ok(())
    }

    #[cold]
    #[inline(never)]
    fn make_unterminated_error(&self, expected: u8, found: u8) -> PhpSerializeError {
        PhpSerializeError::new(
            ErrorKind::UnterminatedValue {
                expected: char::from(expected),
                found: char::from(found),
            },
            self.pos - 1,
        )
    }

    /// Read bytes until the delimiter, leaving the delimiter unread.
    #[inline]
    fn read_until(&mut self, delimiter: u8) -> Result<&'a [u8]> {
        let start = self.pos;
        match memchr(delimiter, &self.data[start..]) {
            Some(offset) => {
                self.pos = start + offset;
                Ok(&self.data[start..start + offset])
            }
            None => Err(PhpSerializeError::new(ErrorKind::UnexpectedEof, self.data.len())
                .with_context(format!("looking for '{}'", char::from(delimiter)))),
        }
    }
}

/// Offset of the first `"` followed by `follow`.
fn find_closing_quote(data: &[u8], follow: u8) -> Option<usize> {
    let mut from = 0;
    while let Some(offset) = memchr(token::STRING_QUOTE, &data[from..]) {
        let quote = from + offset;
        if data.get(quote + 1) == Some(&follow) {
            return Some(quote);
        }
        from = quote + 1;
    }
    None
}

/// Parse float text, including PHP's `INF`, `-INF` and `NAN`.
fn parse_float_text(text: &str) -> Option<f64> {
    match text {
        token::FLOAT_INF => Some(f64::INFINITY),
        token::FLOAT_NEG_INF => Some(f64::NEG_INFINITY),
        token::FLOAT_NAN => Some(f64::NAN),
        // Rust also accepts inf/infinity/nan in any case, with a sign
        _ => text.parse().ok(),
    }
}

/// Undo database-export quoting.
///
/// Detects input wrapped in `"` whose inner quotes are doubled, like
/// `"a:1:{s:3:""key"";s:5:""value"";}"`, and returns the plain form.
/// Anything else is returned unchanged. The parser never calls this on its own.
pub fn preprocess(data: &[u8]) -> Cow<'_, [u8]> {
    if data.len() >= 2 && data[0] == b'"' && data[data.len() - 1] == b'"' {
        let inner = &data[1..data.len() - 1];
        if inner.first().copied().is_some_and(token::is_value_marker) {
            return Cow::Owned(unescape_double_quotes(inner));
        }
    }

    Cow::Borrowed(data)
}

/// Unescape double quotes (`""` -> `"`).
fn unescape_double_quotes(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        if i + 1 < data.len() && data[i] == b'"' && data[i + 1] == b'"' {
            result.push(b'"');
            i += 2;
        } else {
            result.push(data[i]);
            i += 1;
        }
    }

    result
}

/// Parse PHP serialized data from bytes.
///
/// This is the primary API for parsing PHP serialized data.
///
/// # Example
///
/// ```rust
/// use php_serialize_core::from_bytes;
///
/// let value = from_bytes(b"i:42;").unwrap();
/// assert_eq!(value.as_int(), Some(42));
/// ```
#[inline]
pub fn from_bytes(data: &[u8]) -> Result<PhpValue> {
    Parser::new(data).parse()
}

/// Parse PHP serialized data from bytes with custom configuration.
///
/// # Example
///
/// ```rust
/// use php_serialize_core::{from_bytes_with_config, ParserConfig};
///
/// let config = ParserConfig {
///     max_depth: 64,
///     debug: true,
///     ..Default::default()
/// };
/// let err = from_bytes_with_config(b"a:1:{i:0;X;}", config).unwrap_err();
/// assert!(err.input_preview.is_some());
/// ```
#[inline]
pub fn from_bytes_with_config(data: &[u8], config: ParserConfig) -> Result<PhpValue> {
    #[cfg(feature = "tracing")]
    trace!(data_len = data.len(), ?config, "from_bytes_with_config called");

    Parser::with_config(data, config).parse()
}

#[cfg(test)]
#[allow(clippy::approx_constant)]
mod tests {
    use super::*;

    fn keys(value: &PhpValue) -> Vec<ArrayKey> {
        value.as_array().unwrap().keys().cloned().collect()
    }

    #[test]
    fn test_null() {
        assert_eq!(from_bytes(b"N;").unwrap(), PhpValue::Null);
    }

    #[test]
    fn test_bool() {
        assert_eq!(from_bytes(b"b:0;").unwrap(), PhpValue::Bool(false));
        assert_eq!(from_bytes(b"b:1;").unwrap(), PhpValue::Bool(true));
        let err = from_bytes(b"b:2;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidBoolean("2".into()));
    }

    #[test]
    fn test_int() {
        assert_eq!(from_bytes(b"i:0;").unwrap(), PhpValue::Int(0));
        assert_eq!(from_bytes(b"i:42;").unwrap(), PhpValue::Int(42));
        assert_eq!(from_bytes(b"i:-123;").unwrap(), PhpValue::Int(-123));
        assert_eq!(
            from_bytes(b"i:9223372036854775807;").unwrap(),
            PhpValue::Int(i64::MAX)
        );
    }

    #[test]
    fn test_int_rejects_decimal_point() {
        let err = from_bytes(b"i:1.5;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInteger("1.5".into()));
        assert_eq!(err.position, 2);
    }

    #[test]
    fn test_float() {
        assert_eq!(from_bytes(b"d:0;").unwrap(), PhpValue::Float(0.0));
        assert_eq!(from_bytes(b"d:3.14;").unwrap(), PhpValue::Float(3.14));
        assert_eq!(from_bytes(b"d:-2.5;").unwrap(), PhpValue::Float(-2.5));
        assert_eq!(from_bytes(b"d:1e+20;").unwrap(), PhpValue::Float(1e20));
        assert_eq!(
            from_bytes(b"d:0.10000000000000001;").unwrap(),
            PhpValue::Float(0.1)
        );
    }

    #[test]
    fn test_float_special_values() {
        assert!(matches!(from_bytes(b"d:INF;").unwrap(), PhpValue::Float(f) if f.is_infinite() && f.is_sign_positive()));
        assert!(matches!(from_bytes(b"d:-INF;").unwrap(), PhpValue::Float(f) if f.is_infinite() && f.is_sign_negative()));
        assert!(matches!(from_bytes(b"d:NAN;").unwrap(), PhpValue::Float(f) if f.is_nan()));
        assert!(matches!(from_bytes(b"d:+Inf;").unwrap(), PhpValue::Float(f) if f == f64::INFINITY));
        assert!(matches!(from_bytes(b"d:NaN;").unwrap(), PhpValue::Float(f) if f.is_nan()));
        assert!(from_bytes(b"d:abc;").is_err());
    }

    #[test]
    fn test_string() {
        assert_eq!(from_bytes(b"s:0:\"\";").unwrap(), PhpValue::from(""));
        assert_eq!(from_bytes(b"s:5:\"hello\";").unwrap(), PhpValue::from("hello"));
    }

    #[test]
    fn test_string_multibyte_length_is_bytes() {
        // "한글" = 6 bytes in UTF-8
        let result = from_bytes(b"s:6:\"\xed\x95\x9c\xea\xb8\x80\";").unwrap();
        assert_eq!(result.as_str(), Some("한글"));
    }

    #[test]
    fn test_string_with_quotes_and_semicolons() {
        assert_eq!(from_bytes(b"s:11:\"hello;world\";").unwrap().as_str(), Some("hello;world"));
        assert_eq!(from_bytes(b"s:8:\"say \"hi\"\";").unwrap().as_str(), Some("say \"hi\""));
        assert_eq!(from_bytes(b"s:4:\"a\";b\";").unwrap().as_str(), Some("a\";b"));
    }

    #[test]
    fn test_string_binary() {
        let result = from_bytes(b"s:5:\"a\x00b\x00c\";").unwrap();
        assert_eq!(result.as_bytes(), Some(b"a\x00b\x00c".as_slice()));
    }

    #[test]
    fn test_string_length_mismatch() {
        let err = from_bytes(b"s:5:\"hi\";").unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::LengthMismatch {
                expected: 5,
                found: 2
            }
        );
        assert_eq!(err.position, 5);

        // Declared shorter than the content: no recovery either
        let err = from_bytes(b"s:4:\"\xed\x95\x9c\xea\xb8\x80\";").unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::LengthMismatch {
                expected: 4,
                found: 6
            }
        );
    }

    #[test]
    fn test_string_truncated() {
        let err = from_bytes(b"s:10:\"hello").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_string_missing_semicolon() {
        let err = from_bytes(b"s:2:\"hi\"}").unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::UnterminatedValue {
                expected: ';',
                found: '}'
            }
        );
        assert_eq!(err.position, 8);
    }

    #[test]
    fn test_array_empty() {
        let result = from_bytes(b"a:0:{}").unwrap();
        assert!(result.as_array().unwrap().is_empty());
    }

    #[test]
    fn test_array_order_preserved() {
        let result = from_bytes(b"a:3:{i:0;s:1:\"a\";i:1;s:1:\"b\";i:2;s:1:\"c\";}").unwrap();
        assert_eq!(keys(&result), vec![ArrayKey::Int(0), ArrayKey::Int(1), ArrayKey::Int(2)]);
        assert_eq!(result.as_array().unwrap().get(2).and_then(|v| v.as_str()), Some("c"));
    }

    #[test]
    fn test_array_associative() {
        let result = from_bytes(b"a:2:{s:4:\"name\";s:5:\"Alice\";s:3:\"age\";i:30;}").unwrap();
        let array = result.as_array().unwrap();
        assert_eq!(array.get("name").and_then(|v| v.as_str()), Some("Alice"));
        assert_eq!(array.get("age").and_then(|v| v.as_int()), Some(30));
    }

    #[test]
    fn test_array_non_sequential_keys() {
        let result = from_bytes(b"a:2:{i:5;s:1:\"a\";i:10;s:1:\"b\";}").unwrap();
        assert_eq!(keys(&result), vec![ArrayKey::Int(5), ArrayKey::Int(10)]);
    }

    #[test]
    fn test_array_invalid_key() {
        let err = from_bytes(b"a:1:{a:0:{}i:1;}").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArrayKey);
        assert_eq!(err.position, 5);
    }

    #[test]
    fn test_array_missing_closing_brace() {
        let err = from_bytes(b"a:1:{i:0;i:1;i:2;i:3;}").unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::UnterminatedValue {
                expected: '}',
                found: 'i'
            }
        );
    }

    #[test]
    fn test_array_fewer_entries_than_declared() {
        let err = from_bytes(b"a:3:{i:0;i:1;}").unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::LengthMismatch {
                expected: 3,
                found: 1
            }
        );
        assert_eq!(err.position, 13);
    }

    #[test]
    fn test_array_truncated() {
        let err = from_bytes(b"a:2:{i:0;i:1;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_object() {
        let data = br#"O:8:"stdClass":2:{s:4:"name";s:5:"Alice";s:3:"age";i:30;}"#;
        let result = from_bytes(data).unwrap();
        let object = result.as_object().unwrap();
        assert_eq!(object.class_name(), "stdClass");
        assert_eq!(object.members().len(), 2);
        assert_eq!(object.get_public("name").and_then(|v| v.as_str()), Some("Alice"));
    }

    #[test]
    fn test_object_private_protected() {
        // Private: \0Test\0priv = 10 bytes, Protected: \0*\0prot = 7 bytes
        let data = b"O:4:\"Test\":3:{s:3:\"pub\";s:6:\"public\";s:10:\"\x00Test\x00priv\";s:7:\"private\";s:7:\"\x00*\x00prot\";s:9:\"protected\";}";
        let result = from_bytes(data).unwrap();
        let object = result.as_object().unwrap();
        assert_eq!(object.get_public("pub").and_then(|v| v.as_str()), Some("public"));
        assert_eq!(object.get_private("priv").and_then(|v| v.as_str()), Some("private"));
        assert_eq!(object.get_protected("prot").and_then(|v| v.as_str()), Some("protected"));
        assert_eq!(object.get_public("priv"), None);
    }

    #[test]
    fn test_object_class_name_length_mismatch() {
        let err = from_bytes(br#"O:3:"stdClass":0:{}"#).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::LengthMismatch {
                expected: 3,
                found: 8
            }
        );
    }

    #[test]
    fn test_custom_object() {
        let result = from_bytes(b"C:7:\"MyClass\":5:{hello}").unwrap();
        let custom = result.as_object_serialized().unwrap();
        assert_eq!(custom.class_name, "MyClass");
        assert_eq!(custom.data, b"hello");
        assert!(custom.value.is_none());
    }

    #[test]
    fn test_custom_object_blob_is_opaque() {
        // Braces and quotes inside the payload are not interpreted
        let result = from_bytes(b"C:3:\"Foo\":5:{}{\"x;}").unwrap();
        assert_eq!(result.as_object_serialized().unwrap().data, b"}{\"x;");
    }

    #[test]
    fn test_custom_object_length_mismatch() {
        let err = from_bytes(b"C:3:\"Foo\":2:{hello}").unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::LengthMismatch {
                expected: 2,
                found: 5
            }
        );
        let err = from_bytes(b"C:3:\"Foo\":20:{hello}").unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::LengthMismatch {
                expected: 20,
                found: 5
            }
        );
        assert_eq!(err.position, 14);

        let err = from_bytes(b"C:3:\"Foo\":20:{hello").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_custom_object_with_decode_hook() {
        let config = ParserConfig {
            decode_serialized: Some(from_bytes_with_config),
            ..Default::default()
        };
        let data = b"C:11:\"ArrayObject\":21:{x:i:0;a:0:{};m:a:0:{}}";
        let result = from_bytes_with_config(data, config).unwrap();
        let custom = result.as_object_serialized().unwrap();
        let spl = custom.value.as_ref().and_then(|v| v.as_spl_array()).unwrap();
        assert_eq!(spl.flags, 0);
        assert!(spl.array.as_array().unwrap().is_empty());
    }

    #[test]
    fn test_custom_object_hook_inherits_depth_limit() {
        let config = ParserConfig {
            max_depth: 3,
            decode_serialized: Some(from_bytes_with_config),
            ..Default::default()
        };
        // The payload alone nests 3 levels, under an outer array
        let data = b"a:1:{i:0;C:3:\"Foo\":22:{a:1:{i:0;a:1:{i:0;N;}}}}";
        let err = from_bytes_with_config(data, config.clone()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MaxDepthExceeded(1));
        assert_eq!(err.context.as_deref(), Some("in Foo payload"));

        let shallow = b"a:1:{i:0;C:3:\"Foo\":6:{a:0:{}}}";
        assert!(from_bytes_with_config(shallow, config).is_ok());
    }

    #[test]
    fn test_reference_to_custom_object_slot() {
        let data = b"a:3:{i:0;C:3:\"Foo\":1:{x}i:1;a:0:{}i:2;r:2;}";
        let result = from_bytes(data).unwrap();
        let array = result.as_array().unwrap();
        assert!(array.get(1).unwrap().same_identity(array.get(2).unwrap()));

        let err = from_bytes(b"a:2:{i:0;C:3:\"Foo\":1:{x}i:1;r:1;}").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidReference(1));
    }

    #[test]
    fn test_numbers_reject_plus_sign() {
        let err = from_bytes(b"i:+5;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInteger("+5".to_string()));
        assert_eq!(err.position, 2);

        let err = from_bytes(b"s:+2:\"hi\";").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInteger("+2".to_string()));

        let err = from_bytes(b"a:1:{i:0;r:+1;}").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInteger("+1".to_string()));

        assert_eq!(from_bytes(b"i:-5;").unwrap(), PhpValue::Int(-5));
        assert!(from_bytes(b"i:-;").is_err());
        assert!(from_bytes(b"s:-1:\"\";").is_err());
    }

    #[test]
    fn test_custom_object_hook_error_offset() {
        let config = ParserConfig {
            decode_serialized: Some(from_bytes_with_config),
            ..Default::default()
        };
        let err = from_bytes_with_config(b"C:3:\"Foo\":2:{X;}", config).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedToken('X'));
        assert_eq!(err.position, 13);
        assert_eq!(err.context.as_deref(), Some("in Foo payload"));
    }

    #[test]
    fn test_reference_aliases_array() {
        let result = from_bytes(b"a:2:{i:0;a:1:{i:0;i:1;}i:1;r:1;}").unwrap();
        let outer = result.as_array().unwrap();
        let first = outer.get(0).unwrap();
        let second = outer.get(1).unwrap();
        assert!(first.same_identity(second));

        first.as_array_mut().unwrap().set(1, 2);
        assert_eq!(second.as_array().unwrap().get(1), Some(&PhpValue::Int(2)));
    }

    #[test]
    fn test_reference_to_object() {
        let data = br#"a:2:{i:0;O:8:"stdClass":0:{}i:1;R:1;}"#;
        let result = from_bytes(data).unwrap();
        let outer = result.as_array().unwrap();
        assert!(outer.get(0).unwrap().same_identity(outer.get(1).unwrap()));
    }

    #[test]
    fn test_reference_registration_order() {
        // Inner arrays complete before the outer one
        let data = b"a:3:{i:0;a:0:{}i:1;a:1:{i:0;a:0:{}}i:2;r:3;}";
        let result = from_bytes(data).unwrap();
        let outer = result.as_array().unwrap();
        assert!(outer.get(2).unwrap().same_identity(outer.get(1).unwrap()));
    }

    #[test]
    fn test_reference_out_of_range() {
        let err = from_bytes(b"R:1;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidReference(1));

        let err = from_bytes(b"a:1:{i:0;r:0;}").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidReference(0));
    }

    #[test]
    fn test_reference_forward_is_rejected() {
        // The outer array is not registered until its brace closes
        let err = from_bytes(b"a:1:{i:0;r:1;}").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidReference(1));
    }

    #[test]
    fn test_spl_array() {
        let data = b"x:i:2;a:1:{s:1:\"k\";i:1;};m:a:1:{s:1:\"p\";b:1;}";
        let result = from_bytes(data).unwrap();
        let spl = result.as_spl_array().unwrap();
        assert_eq!(spl.flags, 2);
        assert_eq!(spl.array.as_array().unwrap().get("k"), Some(&PhpValue::Int(1)));
        assert_eq!(spl.properties.as_array().unwrap().get("p"), Some(&PhpValue::Bool(true)));
    }

    #[test]
    fn test_spl_array_bare_form_without_members() {
        let result = from_bytes(b"x:1:a:0:{}").unwrap();
        let spl = result.as_spl_array().unwrap();
        assert_eq!(spl.flags, 1);
        assert!(spl.properties.as_array().unwrap().is_empty());
    }

    #[test]
    fn test_nested_array_depth() {
        let mut data = String::from("s:4:\"leaf\";");
        for _ in 0..100 {
            data = format!("a:1:{{s:1:\"k\";{}}}", data);
        }
        assert!(from_bytes(data.as_bytes()).unwrap().is_array());
    }

    #[test]
    fn test_max_depth_exceeded() {
        let mut data = String::from("N;");
        for _ in 0..10 {
            data = format!("a:1:{{i:0;{}}}", data);
        }
        let config = ParserConfig {
            max_depth: 4,
            ..Default::default()
        };
        let err = from_bytes_with_config(data.as_bytes(), config).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MaxDepthExceeded(4));
    }

    #[test]
    fn test_pathological_depth_fails_gracefully() {
        let data = "a:1:{i:0;".repeat(100_000);
        let err = from_bytes(data.as_bytes()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MaxDepthExceeded(MAX_DEPTH));
    }

    #[test]
    fn test_error_malformed_token() {
        let err = from_bytes(b"X:1;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedToken('X'));
        assert_eq!(err.position, 0);

        let err = from_bytes(b"a:1:{i:0;E:1;}").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedToken('E'));
        assert_eq!(err.position, 9);
    }

    #[test]
    fn test_error_empty_input() {
        assert_eq!(from_bytes(b"").unwrap_err().kind, ErrorKind::UnexpectedEof);
        assert_eq!(from_bytes(b"i:12").unwrap_err().kind, ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_error_invalid_int() {
        assert!(matches!(
            from_bytes(b"i:abc;").unwrap_err().kind,
            ErrorKind::InvalidInteger(_)
        ));
    }

    #[test]
    fn test_debug_adds_preview() {
        let quiet = from_bytes(b"a:1:{i:0;X;}").unwrap_err();
        assert!(quiet.input_preview.is_none());

        let config = ParserConfig {
            debug: true,
            ..Default::default()
        };
        let verbose = from_bytes_with_config(b"a:1:{i:0;X;}", config).unwrap_err();
        assert_eq!(verbose.kind, quiet.kind);
        assert_eq!(verbose.position, quiet.position);
        assert!(verbose.input_preview.unwrap().ends_with("         ^"));
    }

    #[test]
    fn test_trailing_bytes_are_left_unread() {
        let mut parser = Parser::new(b"i:1;i:2;");
        assert_eq!(parser.parse().unwrap(), PhpValue::Int(1));
        assert_eq!(parser.position(), 4);
    }

    #[test]
    fn test_preprocess_db_escaped() {
        let escaped = b"\"a:1:{s:3:\"\"key\"\";s:5:\"\"value\"\";}\"";
        let unescaped = preprocess(escaped);
        assert_eq!(unescaped.as_ref(), b"a:1:{s:3:\"key\";s:5:\"value\";}");
        let result = from_bytes(&unescaped).unwrap();
        assert_eq!(
            result.as_array().unwrap().get("key").and_then(|v| v.as_str()),
            Some("value")
        );
    }

    #[test]
    fn test_preprocess_leaves_plain_input() {
        let plain = b"s:3:\"abc\";";
        assert!(matches!(preprocess(plain), Cow::Borrowed(_)));
        assert!(matches!(preprocess(b"\"hello\""), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escaped_input_is_not_guessed() {
        let escaped = b"\"a:1:{s:3:\"\"key\"\";s:5:\"\"value\"\";}\"";
        assert_eq!(
            from_bytes(escaped).unwrap_err().kind,
            ErrorKind::MalformedToken('"')
        );
    }
}
