//! Wire grammar shared by the parser and the serializer.
//!
//! ```text
//! N;                                  null
//! b:<0|1>;                            bool
//! i:<digits>;                         int
//! d:<float>;                          float
//! s:<len>:"<bytes>";                  string
//! a:<count>:{<key><value>...}         array
//! O:<len>:"<class>":<count>:{...}     object
//! C:<len>:"<class>":<len>:{<data>}    custom-serialized object
//! R:<index>;  r:<index>;              back-references
//! x:i:<flags>;<value>;m:<value>       SPL array body
//! ```

pub(crate) const NULL: u8 = b'N';
pub(crate) const BOOL: u8 = b'b';
pub(crate) const INT: u8 = b'i';
pub(crate) const FLOAT: u8 = b'd';
pub(crate) const STRING: u8 = b's';
pub(crate) const ARRAY: u8 = b'a';
pub(crate) const OBJECT: u8 = b'O';
pub(crate) const OBJECT_SERIALIZED: u8 = b'C';
pub(crate) const REFERENCE: u8 = b'R';
pub(crate) const REFERENCE_OBJECT: u8 = b'r';
pub(crate) const SPL_ARRAY: u8 = b'x';
pub(crate) const SPL_ARRAY_MEMBERS: u8 = b'm';

pub(crate) const SEPARATOR_TYPE: u8 = b':';
pub(crate) const SEPARATOR_VALUES: u8 = b';';

pub(crate) const STRING_QUOTE: u8 = b'"';
pub(crate) const BLOCK_OPEN: u8 = b'{';
pub(crate) const BLOCK_CLOSE: u8 = b'}';

/// Significant digits used when formatting floats.
pub(crate) const FLOAT_PRECISION: usize = 17;

/// Spellings of the special float values.
pub(crate) const FLOAT_INF: &str = "INF";
pub(crate) const FLOAT_NEG_INF: &str = "-INF";
pub(crate) const FLOAT_NAN: &str = "NAN";

/// Returns `true` if `byte` can start a serialized value.
#[inline]
pub fn is_value_marker(byte: u8) -> bool {
    matches!(
        byte,
        NULL | BOOL
            | INT
            | FLOAT
            | STRING
            | ARRAY
            | OBJECT
            | OBJECT_SERIALIZED
            | REFERENCE
            | REFERENCE_OBJECT
            | SPL_ARRAY
    )
}
