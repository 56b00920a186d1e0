//! PHP native serialization codec.
//!
//! This crate decodes and encodes PHP's `serialize()` format. Decoded arrays
//! keep their insertion order, object members keep their visibility-mangled
//! keys, and `R:`/`r:` back-references come back as shared handles so that a
//! value that was aliased in PHP is aliased in the decoded tree too.
//!
//! # Features
//!
//! - **Byte-exact strings** - String lengths are byte counts and contents are never re-encoded
//! - **Ordered arrays** - Integer and string keys in insertion order
//! - **References** - Shared arrays and objects round-trip through `r:`/`R:` tokens
//! - **Custom serialization** - `C:` payloads kept verbatim, optionally decoded by a hook
//! - **Detailed errors** - Byte offsets, expected vs. found tokens, input previews
//!
//! # Quick Start
//!
//! ```rust
//! use php_serialize_core::{from_bytes, to_bytes};
//!
//! let data = br#"a:2:{s:4:"name";s:5:"Alice";s:3:"age";i:30;}"#;
//! let value = from_bytes(data).unwrap();
//!
//! let array = value.as_array().unwrap();
//! for (key, val) in array.iter() {
//!     println!("{} => {}", key, val);
//! }
//! assert_eq!(array.get("age").and_then(|v| v.as_int()), Some(30));
//! drop(array);
//!
//! assert_eq!(to_bytes(&value).unwrap(), data);
//! ```
//!
//! # Shared Values
//!
//! Cloning an array or object value clones the handle, not the contents.
//! The encoder writes a handle it has already seen as a back-reference:
//!
//! ```rust
//! use php_serialize_core::{to_bytes, PhpArray, PhpValue};
//!
//! let shared = PhpValue::from(PhpArray::from_list([1]));
//! let outer = PhpValue::from(PhpArray::from_list([shared.clone(), shared]));
//! assert_eq!(to_bytes(&outer).unwrap(), b"a:2:{i:0;a:1:{i:0;i:1;}i:1;r:1;}");
//! ```
//!
//! # Supported Types
//!
//! | PHP Type | Rust Type |
//! |----------|-----------|
//! | `null` | `PhpValue::Null` |
//! | `bool` | `PhpValue::Bool(bool)` |
//! | `int` | `PhpValue::Int(i64)` |
//! | `float` | `PhpValue::Float(f64)` |
//! | `string` | `PhpValue::String(Vec<u8>)` |
//! | `array` | `PhpValue::Array(Shared<PhpArray>)` |
//! | `object` | `PhpValue::Object(Shared<PhpObject>)` |
//! | `C:` object | `PhpValue::ObjectSerialized(Box<PhpObjectSerialized>)` |
//! | `ArrayObject` | `PhpValue::SplArray(Box<PhpSplArray>)` |
//! | reference | `PhpValue::Reference(usize)` (encode only) |

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::inline_always)]
#![allow(clippy::unnecessary_wraps)]

pub mod error;
pub mod parser;
pub mod refs;
pub mod serializer;
pub mod token;
pub mod types;

#[cfg(feature = "serde")]
pub mod json;

pub use error::{ErrorKind, PhpSerializeError, Result};
pub use parser::{from_bytes, from_bytes_with_config, preprocess, Parser, ParserConfig};
pub use refs::ReferenceTable;
pub use serializer::{
    format_float, to_bytes, to_bytes_with_config, ReferenceKind, Serializer, SerializerConfig,
};
pub use types::{
    ArrayKey, PhpArray, PhpObject, PhpObjectSerialized, PhpProperty, PhpSplArray, PhpValue,
    Shared, Visibility,
};

#[cfg(feature = "serde")]
pub use json::to_json;
