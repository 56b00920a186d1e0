//! JSON conversion for PHP values.
//!
//! This module provides a lossy conversion from `PhpValue` to JSON using
//! serde_json. Enable the `serde` feature to use this module.

use serde_json::{json, Map, Value as JsonValue};

use crate::types::{ArrayKey, PhpArray, PhpObject, PhpValue, Visibility};

/// Convert a PHP value to a JSON value.
///
/// # Mapping Rules
///
/// | PHP Type | JSON Type |
/// |----------|-----------|
/// | `null` | `null` |
/// | `bool` | `boolean` |
/// | `int` | `number` |
/// | `float` | `number` (`null` for NaN, `"Infinity"`/`"-Infinity"`) |
/// | `string` | `string` (lossy UTF-8 conversion) |
/// | `array` (list) | `array` |
/// | `array` (other keys) | `object` |
/// | `object` | `object` with `__class__` field |
/// | `C:` object | `object` with `__class__` and `__data` |
/// | `ArrayObject` | `object` with `__flags`, `__array`, `__properties` |
/// | reference marker | `{"__ref__": index}` |
///
/// Private members are keyed as `Class::name` and protected members as
/// `*name`. A shared array is expanded at every place it appears.
///
/// # Example
///
/// ```rust
/// use php_serialize_core::{from_bytes, to_json};
///
/// let data = br#"a:2:{s:4:"name";s:5:"Alice";s:3:"age";i:30;}"#;
/// let php_value = from_bytes(data).unwrap();
/// let json = to_json(&php_value);
/// assert_eq!(json, serde_json::json!({"name": "Alice", "age": 30}));
/// ```
pub fn to_json(value: &PhpValue) -> JsonValue {
    match value {
        PhpValue::Null => JsonValue::Null,
        PhpValue::Bool(b) => JsonValue::Bool(*b),
        PhpValue::Int(i) => json!(*i),
        PhpValue::Float(f) => {
            if f.is_nan() {
                JsonValue::Null
            } else if f.is_infinite() {
                if f.is_sign_positive() {
                    json!("Infinity")
                } else {
                    json!("-Infinity")
                }
            } else {
                json!(*f)
            }
        }
        PhpValue::String(s) => JsonValue::String(String::from_utf8_lossy(s).into_owned()),
        PhpValue::Array(array) => array_to_json(&array.borrow()),
        PhpValue::Object(object) => object_to_json(&object.borrow()),
        PhpValue::ObjectSerialized(custom) => {
            let mut map = Map::new();
            map.insert("__class__".to_string(), json!(custom.class_name));
            let data = match &custom.value {
                Some(inner) => to_json(inner),
                None => JsonValue::String(String::from_utf8_lossy(&custom.data).into_owned()),
            };
            map.insert("__data".to_string(), data);
            JsonValue::Object(map)
        }
        PhpValue::SplArray(spl) => json!({
            "__flags": spl.flags,
            "__array": to_json(&spl.array),
            "__properties": to_json(&spl.properties),
        }),
        PhpValue::Reference(idx) => json!({ "__ref__": idx }),
    }
}

fn array_to_json(array: &PhpArray) -> JsonValue {
    if array.is_list() {
        return JsonValue::Array(array.values().map(to_json).collect());
    }

    let mut map = Map::new();
    for (key, value) in array {
        map.insert(key_to_string(key), to_json(value));
    }
    JsonValue::Object(map)
}

fn object_to_json(object: &PhpObject) -> JsonValue {
    let mut map = Map::new();
    map.insert("__class__".to_string(), json!(object.class_name()));

    for prop in object.properties() {
        let name = String::from_utf8_lossy(&prop.name);
        let key = match (prop.visibility, prop.declaring_class) {
            (Visibility::Private, Some(class)) => {
                format!("{}::{}", String::from_utf8_lossy(class), name)
            }
            (Visibility::Protected, _) => format!("*{}", name),
            _ => name.into_owned(),
        };
        map.insert(key, to_json(prop.value));
    }

    JsonValue::Object(map)
}

fn key_to_string(key: &ArrayKey) -> String {
    match key {
        ArrayKey::Int(i) => i.to_string(),
        ArrayKey::String(s) => String::from_utf8_lossy(s).into_owned(),
    }
}

/// Convert a PHP value to a JSON string.
///
/// # Example
///
/// ```rust
/// use php_serialize_core::{from_bytes, json::to_json_string};
///
/// let data = br#"a:2:{s:4:"name";s:5:"Alice";s:3:"age";i:30;}"#;
/// let php_value = from_bytes(data).unwrap();
/// let json_str = to_json_string(&php_value).unwrap();
/// // JSON key order is not guaranteed, so check contents
/// assert!(json_str.contains(r#""name":"Alice""#));
/// assert!(json_str.contains(r#""age":30"#));
/// ```
pub fn to_json_string(value: &PhpValue) -> serde_json::Result<String> {
    let json = to_json(value);
    serde_json::to_string(&json)
}

/// Convert a PHP value to a pretty-printed JSON string.
pub fn to_json_string_pretty(value: &PhpValue) -> serde_json::Result<String> {
    let json = to_json(value);
    serde_json::to_string_pretty(&json)
}
