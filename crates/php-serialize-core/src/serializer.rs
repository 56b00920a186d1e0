//! PHP serialize encoder.
//!
//! Mirrors the parser token for token. Arrays and objects are registered in
//! a [`ReferenceTable`] after their body has been written; meeting the same
//! shared handle again emits a back-reference instead of a second copy.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

#[cfg(feature = "tracing")]
use tracing::{debug, instrument, trace, warn};

use crate::error::{ErrorKind, PhpSerializeError, Result};
use crate::refs::ReferenceTable;
use crate::token;
use crate::types::{ArrayKey, PhpArray, PhpObjectSerialized, PhpSplArray, PhpValue};

/// Maximum nesting depth to prevent stack overflow.
const MAX_DEPTH: usize = 512;

/// Hook that produces the payload of a `C:` object from its decoded value.
///
/// It receives the caller's configuration with `max_depth` reduced by the
/// depth of the `C:` token, so [`to_bytes_with_config`] fits directly.
pub type SerializedEncodeFn = fn(&PhpValue, SerializerConfig) -> Result<Vec<u8>>;

/// Token used for back-references to shared arrays and objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReferenceKind {
    /// `r:<index>;`, PHP's object handle reference.
    #[default]
    Object,
    /// `R:<index>;`, PHP's `&` reference.
    Value,
}

impl ReferenceKind {
    fn token(self) -> u8 {
        match self {
            ReferenceKind::Object => token::REFERENCE_OBJECT,
            ReferenceKind::Value => token::REFERENCE,
        }
    }
}

/// Serializer configuration options.
#[derive(Clone)]
pub struct SerializerConfig {
    /// Maximum nesting depth for arrays and objects.
    pub max_depth: usize,
    /// Emit per-token trace events.
    pub debug: bool,
    /// Token used when a shared array or object is met again.
    pub reference_kind: ReferenceKind,
    /// Encoder for custom-serialized objects that carry a decoded value.
    /// When unset, the stored payload is written verbatim.
    pub encode_serialized: Option<SerializedEncodeFn>,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            debug: false,
            reference_kind: ReferenceKind::default(),
            encode_serialized: None,
        }
    }
}

impl fmt::Debug for SerializerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializerConfig")
            .field("max_depth", &self.max_depth)
            .field("debug", &self.debug)
            .field("reference_kind", &self.reference_kind)
            .field("encode_serialized", &self.encode_serialized.is_some())
            .finish()
    }
}

/// A PHP serialize encoder writing into an in-memory buffer.
pub struct Serializer {
    out: Vec<u8>,
    config: SerializerConfig,
    depth: usize,
    references: ReferenceTable,
    // Handles whose body is currently being written
    open: HashSet<usize>,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer {
    /// Create a serializer with default configuration.
    pub fn new() -> Self {
        Self::with_config(SerializerConfig::default())
    }

    /// Create a serializer with custom configuration.
    pub fn with_config(config: SerializerConfig) -> Self {
        Self {
            out: Vec::new(),
            config,
            depth: 0,
            references: ReferenceTable::new(),
            open: HashSet::new(),
        }
    }

    /// Serialize a value and return the bytes.
    #[cfg_attr(feature = "tracing", instrument(skip(self, value), fields(value_type = value.type_name())))]
    pub fn serialize(mut self, value: &PhpValue) -> Result<Vec<u8>> {
        #[cfg(feature = "tracing")]
        debug!("Starting PHP serialize");

        if let PhpValue::Reference(_) = value {
            return Err(PhpSerializeError::new(
                ErrorKind::UnsupportedValue("reference marker outside an array or object"),
                0,
            ));
        }

        let result = self.write_value(value);

        #[cfg(feature = "tracing")]
        match &result {
            Ok(()) => debug!(
                bytes = self.out.len(),
                references = self.references.len(),
                "Serialize completed successfully"
            ),
            Err(e) => warn!(error = %e, "Serialize failed"),
        }

        result.map(|()| self.out)
    }

    fn write_value(&mut self, value: &PhpValue) -> Result<()> {
        if self.depth > self.config.max_depth {
            return Err(self.error(ErrorKind::MaxDepthExceeded(self.config.max_depth)));
        }

        #[cfg(feature = "tracing")]
        if self.config.debug {
            trace!(value_type = value.type_name(), pos = self.out.len(), depth = self.depth, "Writing value");
        }

        match value {
            PhpValue::Null => {
                self.out.push(token::NULL);
                self.out.push(token::SEPARATOR_VALUES);
            }
            PhpValue::Bool(b) => {
                self.write_header(token::BOOL);
                self.out.push(if *b { b'1' } else { b'0' });
                self.out.push(token::SEPARATOR_VALUES);
            }
            PhpValue::Int(i) => self.write_int(*i),
            PhpValue::Float(f) => {
                self.write_header(token::FLOAT);
                self.out.extend_from_slice(format_float(*f).as_bytes());
                self.out.push(token::SEPARATOR_VALUES);
            }
            PhpValue::String(s) => self.write_string(s),
            PhpValue::Array(array) => {
                if self.write_back_reference(value, array.addr())? {
                    return Ok(());
                }
                self.open.insert(array.addr());
                let members = array.borrow();
                self.write_header(token::ARRAY);
                self.write_members(&members)?;
                drop(members);
                self.open.remove(&array.addr());
                self.register(value);
            }
            PhpValue::Object(object) => {
                if self.write_back_reference(value, object.addr())? {
                    return Ok(());
                }
                self.open.insert(object.addr());
                let object_ref = object.borrow();
                self.write_header(token::OBJECT);
                self.write_class_name(object_ref.class_name());
                self.write_members(object_ref.members())?;
                drop(object_ref);
                self.open.remove(&object.addr());
                self.register(value);
            }
            PhpValue::ObjectSerialized(custom) => {
                self.write_object_serialized(custom)?;
                let _index = self.references.reserve();

                #[cfg(feature = "tracing")]
                if self.config.debug {
                    trace!(index = _index, class = %custom.class_name, "Reserved reference slot");
                }
            }
            PhpValue::SplArray(spl) => self.write_spl_array(spl)?,
            PhpValue::Reference(index) => {
                if self.references.get(*index).is_none() {
                    return Err(self
                        .error(ErrorKind::InvalidReference(*index))
                        .with_context(format!("{} values registered", self.references.len())));
                }
                self.write_reference(*index);
            }
        }
        Ok(())
    }

    /// Emit a back-reference if this handle was already written.
    ///
    /// Returns `Ok(true)` when a reference was written.
    fn write_back_reference(&mut self, value: &PhpValue, addr: usize) -> Result<bool> {
        if let Some(index) = self.references.index_of(value) {
            self.write_reference(index);
            return Ok(true);
        }
        if self.open.contains(&addr) {
            return Err(self
                .error(ErrorKind::CircularReference(self.depth))
                .with_context(format!("{} contains itself", value.type_name())));
        }
        Ok(false)
    }

    fn write_reference(&mut self, index: usize) {
        #[cfg(feature = "tracing")]
        if self.config.debug {
            trace!(index, "Writing back-reference");
        }

        self.write_header(self.config.reference_kind.token());
        self.write_number(index);
        self.out.push(token::SEPARATOR_VALUES);
    }

    /// Write `<count>:{<key><value>...}`.
    fn write_members(&mut self, members: &PhpArray) -> Result<()> {
        self.write_number(members.len());
        self.out.push(token::SEPARATOR_TYPE);
        self.out.push(token::BLOCK_OPEN);

        self.depth += 1;
        for (key, value) in members {
            self.write_key(key);
            self.write_value(value)?;
        }
        self.depth -= 1;

        self.out.push(token::BLOCK_CLOSE);
        Ok(())
    }

    fn write_key(&mut self, key: &ArrayKey) {
        match key {
            ArrayKey::Int(i) => self.write_int(*i),
            ArrayKey::String(s) => self.write_string(s),
        }
    }

    fn write_object_serialized(&mut self, custom: &PhpObjectSerialized) -> Result<()> {
        let payload = match (self.config.encode_serialized, &custom.value) {
            (Some(encode), Some(inner)) => {
                let pos = self.out.len();
                let depth = self.depth + 1;
                if depth > self.config.max_depth {
                    return Err(self.error(ErrorKind::MaxDepthExceeded(self.config.max_depth)));
                }
                let config = SerializerConfig {
                    max_depth: self.config.max_depth - depth,
                    ..self.config.clone()
                };
                Cow::Owned(encode(inner, config).map_err(|e| {
                    PhpSerializeError::new(e.kind, pos)
                        .with_context(format!("in {} payload", custom.class_name))
                })?)
            }
            _ => Cow::Borrowed(custom.data.as_slice()),
        };

        self.write_header(token::OBJECT_SERIALIZED);
        self.write_class_name(&custom.class_name);
        self.write_number(payload.len());
        self.out.push(token::SEPARATOR_TYPE);
        self.out.push(token::BLOCK_OPEN);
        self.out.extend_from_slice(&payload);
        self.out.push(token::BLOCK_CLOSE);
        Ok(())
    }

    /// Write `x:i:<flags>;<array>;` and, unless the properties are an empty array,
    /// `m:<properties>`.
    fn write_spl_array(&mut self, spl: &PhpSplArray) -> Result<()> {
        self.write_header(token::SPL_ARRAY);
        self.write_int(spl.flags);

        self.depth += 1;
        self.write_value(&spl.array)?;
        self.out.push(token::SEPARATOR_VALUES);
        if has_properties(&spl.properties) {
            self.write_header(token::SPL_ARRAY_MEMBERS);
            self.write_value(&spl.properties)?;
        }
        self.depth -= 1;
        Ok(())
    }

    /// Write `<len>:"<name>":`.
    fn write_class_name(&mut self, name: &str) {
        self.write_number(name.len());
        self.out.push(token::SEPARATOR_TYPE);
        self.out.push(token::STRING_QUOTE);
        self.out.extend_from_slice(name.as_bytes());
        self.out.push(token::STRING_QUOTE);
        self.out.push(token::SEPARATOR_TYPE);
    }

    fn write_int(&mut self, value: i64) {
        self.write_header(token::INT);
        self.write_number(value);
        self.out.push(token::SEPARATOR_VALUES);
    }

    /// Write `s:<len>:"<bytes>";` where `len` is the byte length.
    fn write_string(&mut self, bytes: &[u8]) {
        self.write_header(token::STRING);
        self.write_number(bytes.len());
        self.out.push(token::SEPARATOR_TYPE);
        self.out.push(token::STRING_QUOTE);
        self.out.extend_from_slice(bytes);
        self.out.push(token::STRING_QUOTE);
        self.out.push(token::SEPARATOR_VALUES);
    }

    #[inline]
    fn write_header(&mut self, marker: u8) {
        self.out.push(marker);
        self.out.push(token::SEPARATOR_TYPE);
    }

    #[inline]
    fn write_number(&mut self, n: impl fmt::Display) {
        self.out.extend_from_slice(n.to_string().as_bytes());
    }

    fn register(&mut self, value: &PhpValue) {
        let _index = self.references.register(value.clone());

        #[cfg(feature = "tracing")]
        if self.config.debug {
            trace!(index = _index, value_type = value.type_name(), "Registered reference");
        }
    }

    #[cold]
    fn error(&self, kind: ErrorKind) -> PhpSerializeError {
        PhpSerializeError::new(kind, self.out.len())
    }
}

// A missing `m:` section decodes as an empty array, so only that may be left out
fn has_properties(properties: &PhpValue) -> bool {
    match properties {
        PhpValue::Array(array) => !array.borrow().is_empty(),
        _ => true,
    }
}

/// Format a float with 17 significant digits, like C's `%.17g`.
///
/// Trailing zeros are dropped, the exponent form is used when the decimal
/// exponent is below -4 or at least 17, and the special values are written
/// as `INF`, `-INF` and `NAN`. Parsing the result gives back the same bits.
///
/// ```rust
/// use php_serialize_core::serializer::format_float;
///
/// assert_eq!(format_float(0.1), "0.10000000000000001");
/// assert_eq!(format_float(2.5), "2.5");
/// assert_eq!(format_float(1e20), "1e+20");
/// assert_eq!(format_float(f64::NEG_INFINITY), "-INF");
/// ```
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return token::FLOAT_NAN.to_owned();
    }
    if value.is_infinite() {
        let text = if value > 0.0 {
            token::FLOAT_INF
        } else {
            token::FLOAT_NEG_INF
        };
        return text.to_owned();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_owned();
    }

    // d.ddddddddddddddddde<exp>, correctly rounded
    let scientific = format!("{:.*e}", token::FLOAT_PRECISION - 1, value.abs());
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let Ok(exponent) = exponent.parse::<i64>() else {
        return scientific;
    };

    let mut digits: Vec<u8> = mantissa.bytes().filter(u8::is_ascii_digit).collect();
    while digits.len() > 1 && digits.last() == Some(&b'0') {
        digits.pop();
    }

    let precision = token::FLOAT_PRECISION as i64;
    let nd = digits.len() as i64;
    let dp = exponent + 1;
    let eprec = if precision > nd && nd >= dp { nd } else { precision };

    let mut out = String::with_capacity(24);
    if value.is_sign_negative() {
        out.push('-');
    }

    if exponent < -4 || exponent >= eprec {
        out.push(char::from(digits[0]));
        if digits.len() > 1 {
            out.push('.');
            out.extend(digits[1..].iter().map(|&d| char::from(d)));
        }
        out.push('e');
        out.push(if exponent < 0 { '-' } else { '+' });
        out.push_str(&format!("{:02}", exponent.abs()));
    } else if dp <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat('0').take((-dp) as usize));
        out.extend(digits.iter().map(|&d| char::from(d)));
    } else if dp >= nd {
        out.extend(digits.iter().map(|&d| char::from(d)));
        out.extend(std::iter::repeat('0').take((dp - nd) as usize));
    } else {
        let (int_part, frac_part) = digits.split_at(dp as usize);
        out.extend(int_part.iter().map(|&d| char::from(d)));
        out.push('.');
        out.extend(frac_part.iter().map(|&d| char::from(d)));
    }
    out
}

/// Serialize a value to PHP serialize bytes.
///
/// # Example
///
/// ```rust
/// use php_serialize_core::{to_bytes, PhpArray, PhpValue};
///
/// let mut array = PhpArray::new();
/// array.set("name", "Alice");
/// array.set("age", 30);
/// let bytes = to_bytes(&PhpValue::from(array)).unwrap();
/// assert_eq!(bytes, br#"a:2:{s:4:"name";s:5:"Alice";s:3:"age";i:30;}"#);
/// ```
#[inline]
pub fn to_bytes(value: &PhpValue) -> Result<Vec<u8>> {
    Serializer::new().serialize(value)
}

/// Serialize a value with custom configuration.
///
/// # Example
///
/// ```rust
/// use php_serialize_core::{to_bytes_with_config, PhpArray, PhpValue, ReferenceKind, SerializerConfig};
///
/// let shared = PhpValue::from(PhpArray::new());
/// let outer = PhpValue::from(PhpArray::from_list([shared.clone(), shared]));
/// let config = SerializerConfig {
///     reference_kind: ReferenceKind::Value,
///     ..Default::default()
/// };
/// assert_eq!(to_bytes_with_config(&outer, config).unwrap(), b"a:2:{i:0;a:0:{}i:1;R:1;}");
/// ```
#[inline]
pub fn to_bytes_with_config(value: &PhpValue, config: SerializerConfig) -> Result<Vec<u8>> {
    #[cfg(feature = "tracing")]
    trace!(?config, "to_bytes_with_config called");

    Serializer::with_config(config).serialize(value)
}
