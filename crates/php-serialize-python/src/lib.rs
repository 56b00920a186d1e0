//! Python bindings for php-serialize-core.

use std::collections::{HashMap, HashSet};

use pyo3::exceptions::{PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyBytes, PyDict, PyFloat, PyInt, PyList, PyString, PyTuple};

use php_serialize_core::{
    from_bytes_with_config, json::to_json_string, to_bytes_with_config, ArrayKey, PhpArray,
    PhpObject, ParserConfig, PhpValue, ReferenceKind, SerializerConfig, Visibility,
};

pyo3::create_exception!(php_serialize, PhpSerializeError, pyo3::exceptions::PyException);

fn codec_error(e: impl std::fmt::Display) -> PyErr {
    PhpSerializeError::new_err(e.to_string())
}

fn bytes_to_python(py: Python<'_>, s: &[u8], errors: &str) -> PyResult<PyObject> {
    match std::str::from_utf8(s) {
        Ok(string) => Ok(string.to_object(py)),
        Err(_) => match errors {
            "strict" => Err(PyValueError::new_err("Invalid UTF-8 in string")),
            "bytes" => Ok(PyBytes::new_bound(py, s).to_object(py)),
            // "replace" and any other value
            _ => Ok(String::from_utf8_lossy(s).to_object(py)),
        },
    }
}

fn key_to_python(py: Python<'_>, key: &ArrayKey) -> PyObject {
    match key {
        ArrayKey::Int(i) => i.to_object(py),
        ArrayKey::String(s) => String::from_utf8_lossy(s).to_object(py),
    }
}

/// Convert a PhpValue to a Python object.
fn php_value_to_python(py: Python<'_>, value: &PhpValue, errors: &str) -> PyResult<PyObject> {
    match value {
        PhpValue::Null => Ok(py.None()),
        PhpValue::Bool(b) => Ok(b.to_object(py)),
        PhpValue::Int(i) => Ok(i.to_object(py)),
        PhpValue::Float(f) => Ok(f.to_object(py)),
        PhpValue::String(s) => bytes_to_python(py, s, errors),
        PhpValue::Array(array) => {
            let array = array.borrow();
            if array.is_list() {
                let list = PyList::empty_bound(py);
                for v in array.values() {
                    list.append(php_value_to_python(py, v, errors)?)?;
                }
                Ok(list.to_object(py))
            } else {
                let dict = PyDict::new_bound(py);
                for (k, v) in array.iter() {
                    dict.set_item(key_to_python(py, k), php_value_to_python(py, v, errors)?)?;
                }
                Ok(dict.to_object(py))
            }
        }
        PhpValue::Object(object) => {
            let object = object.borrow();
            let dict = PyDict::new_bound(py);
            dict.set_item("__class__", object.class_name())?;

            for prop in object.properties() {
                let name = String::from_utf8_lossy(&prop.name);
                let key = match (prop.visibility, prop.declaring_class) {
                    (Visibility::Private, Some(class)) => {
                        format!("{}::{}", String::from_utf8_lossy(class), name)
                    }
                    (Visibility::Protected, _) => format!("*{}", name),
                    _ => name.into_owned(),
                };
                dict.set_item(key, php_value_to_python(py, prop.value, errors)?)?;
            }

            Ok(dict.to_object(py))
        }
        PhpValue::ObjectSerialized(custom) => {
            let dict = PyDict::new_bound(py);
            dict.set_item("__class__", &custom.class_name)?;
            dict.set_item("__data", PyBytes::new_bound(py, &custom.data))?;
            Ok(dict.to_object(py))
        }
        PhpValue::SplArray(spl) => {
            let dict = PyDict::new_bound(py);
            dict.set_item("__flags", spl.flags)?;
            dict.set_item("__array", php_value_to_python(py, &spl.array, errors)?)?;
            dict.set_item("__properties", php_value_to_python(py, &spl.properties, errors)?)?;
            Ok(dict.to_object(py))
        }
        PhpValue::Reference(idx) => {
            let dict = PyDict::new_bound(py);
            dict.set_item("__ref__", *idx)?;
            Ok(dict.to_object(py))
        }
    }
}

/// Builds PhpValues from Python objects.
///
/// A list or dict that appears more than once becomes one shared handle,
/// which the encoder writes as a back-reference.
#[derive(Default)]
struct Converter {
    seen: HashMap<usize, PhpValue>,
    open: HashSet<usize>,
}

impl Converter {
    fn convert(&mut self, obj: &Bound<'_, PyAny>) -> PyResult<PhpValue> {
        if obj.is_none() {
            return Ok(PhpValue::Null);
        }
        // bool is a subclass of int, check it first
        if obj.is_instance_of::<PyBool>() {
            return Ok(PhpValue::Bool(obj.extract()?));
        }
        if obj.is_instance_of::<PyInt>() {
            return Ok(PhpValue::Int(obj.extract()?));
        }
        if obj.is_instance_of::<PyFloat>() {
            return Ok(PhpValue::Float(obj.extract()?));
        }
        if let Ok(s) = obj.downcast::<PyString>() {
            return Ok(PhpValue::from(s.to_str()?));
        }
        if let Ok(b) = obj.downcast::<PyBytes>() {
            return Ok(PhpValue::from(b.as_bytes()));
        }

        let addr = obj.as_ptr() as usize;
        if let Some(shared) = self.seen.get(&addr) {
            return Ok(shared.clone());
        }
        if !self.open.insert(addr) {
            return Err(PyValueError::new_err("circular reference detected"));
        }

        let value = if let Ok(dict) = obj.downcast::<PyDict>() {
            self.convert_dict(dict)?
        } else if obj.is_instance_of::<PyList>() || obj.is_instance_of::<PyTuple>() {
            let mut items = Vec::new();
            for item in obj.iter()? {
                items.push(self.convert(&item?)?);
            }
            PhpValue::from(PhpArray::from_list(items))
        } else {
            return Err(PyTypeError::new_err(format!(
                "cannot serialize {}",
                obj.get_type().name()?
            )));
        };

        self.open.remove(&addr);
        self.seen.insert(addr, value.clone());
        Ok(value)
    }

    /// A dict with a `__class__` entry becomes an object, any other dict an array.
    fn convert_dict(&mut self, dict: &Bound<'_, PyDict>) -> PyResult<PhpValue> {
        let class_name = match dict.get_item("__class__")? {
            Some(name) => Some(name.extract::<String>()?),
            None => None,
        };

        let mut members = PhpArray::with_capacity(dict.len());
        for (k, v) in dict.iter() {
            let key = if let Ok(i) = k.extract::<i64>() {
                ArrayKey::Int(i)
            } else if let Ok(s) = k.downcast::<PyString>() {
                let name = s.to_str()?;
                if class_name.is_some() && name == "__class__" {
                    continue;
                }
                ArrayKey::from(name)
            } else {
                return Err(PyTypeError::new_err("array keys must be int or str"));
            };
            members.set(key, self.convert(&v)?);
        }

        Ok(match class_name {
            Some(name) => {
                let mut object = PhpObject::new(name);
                object.set_members(members);
                PhpValue::from(object)
            }
            None => PhpValue::from(members),
        })
    }
}

/// Deserialize PHP serialized data to a Python object.
///
/// Args:
///     data: Bytes containing PHP serialized data
///     errors: Error handling mode for invalid UTF-8:
///         - "strict": Raise an exception
///         - "replace": Replace invalid bytes with replacement character (default)
///         - "bytes": Return bytes instead of string for binary data
///     max_depth: Maximum nesting depth (default: 512)
///     debug: Attach an input preview to error messages (default: False)
///
/// Returns:
///     The deserialized Python object (dict, list, str, int, float, bool, or None)
///
/// Raises:
///     PhpSerializeError: If the data cannot be parsed
///
/// Example:
///     >>> from php_serialize import loads
///     >>> loads(b'a:2:{s:4:"name";s:5:"Alice";s:3:"age";i:30;}')
///     {'name': 'Alice', 'age': 30}
#[pyfunction]
#[pyo3(signature = (data, *, errors="replace", max_depth=512, debug=false))]
fn loads(
    py: Python<'_>,
    data: &[u8],
    errors: &str,
    max_depth: usize,
    debug: bool,
) -> PyResult<PyObject> {
    let config = ParserConfig {
        max_depth,
        debug,
        ..Default::default()
    };

    let value = from_bytes_with_config(data, config).map_err(codec_error)?;
    php_value_to_python(py, &value, errors)
}

/// Deserialize PHP serialized data directly to a JSON string.
///
/// Avoids the overhead of creating intermediate Python objects.
///
/// Example:
///     >>> from php_serialize import loads_json
///     >>> loads_json(b'a:2:{s:4:"name";s:5:"Alice";s:3:"age";i:30;}')
///     '{"name":"Alice","age":30}'
#[pyfunction]
#[pyo3(signature = (data, *, max_depth=512))]
fn loads_json(data: &[u8], max_depth: usize) -> PyResult<String> {
    let config = ParserConfig {
        max_depth,
        ..Default::default()
    };

    let value = from_bytes_with_config(data, config).map_err(codec_error)?;
    to_json_string(&value).map_err(codec_error)
}

/// Serialize a Python object to PHP serialized bytes.
///
/// Args:
///     obj: None, bool, int, float, str, bytes, list, tuple or dict.
///         A dict with a "__class__" key becomes a PHP object.
///     reference: "r" (default) or "R", the token used when the same list
///         or dict appears more than once
///
/// Example:
///     >>> from php_serialize import dumps
///     >>> dumps({"name": "Alice", "age": 30})
///     b'a:2:{s:4:"name";s:5:"Alice";s:3:"age";i:30;}'
#[pyfunction]
#[pyo3(signature = (obj, *, reference="r", max_depth=512))]
fn dumps<'py>(
    py: Python<'py>,
    obj: &Bound<'py, PyAny>,
    reference: &str,
    max_depth: usize,
) -> PyResult<Bound<'py, PyBytes>> {
    let reference_kind = match reference {
        "r" => ReferenceKind::Object,
        "R" => ReferenceKind::Value,
        other => {
            return Err(PyValueError::new_err(format!(
                "reference must be \"r\" or \"R\", got {:?}",
                other
            )))
        }
    };

    let value = Converter::default().convert(obj)?;
    let config = SerializerConfig {
        max_depth,
        reference_kind,
        ..Default::default()
    };
    let bytes = to_bytes_with_config(&value, config).map_err(codec_error)?;
    Ok(PyBytes::new_bound(py, &bytes))
}

/// Check if data looks like PHP serialized format.
///
/// This is a quick check of the first byte and doesn't validate the data.
///
/// Example:
///     >>> from php_serialize import is_serialized
///     >>> is_serialized(b'a:1:{i:0;s:3:"foo";}')
///     True
///     >>> is_serialized(b'not serialized')
///     False
#[pyfunction]
fn is_serialized(data: &[u8]) -> bool {
    data.first()
        .is_some_and(|&b| php_serialize_core::token::is_value_marker(b))
}

/// Undo database-export quoting.
///
/// Example:
///     >>> from php_serialize import preprocess
///     >>> preprocess(b'"a:1:{s:3:""key"";s:5:""value"";}"')
///     b'a:1:{s:3:"key";s:5:"value";}'
#[pyfunction]
fn preprocess<'py>(py: Python<'py>, data: &[u8]) -> Bound<'py, PyBytes> {
    PyBytes::new_bound(py, &php_serialize_core::preprocess(data))
}

/// Get the version of the library.
#[pyfunction]
fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// PHP serialize module for Python.
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("PhpSerializeError", m.py().get_type_bound::<PhpSerializeError>())?;
    m.add_function(wrap_pyfunction!(loads, m)?)?;
    m.add_function(wrap_pyfunction!(loads_json, m)?)?;
    m.add_function(wrap_pyfunction!(dumps, m)?)?;
    m.add_function(wrap_pyfunction!(is_serialized, m)?)?;
    m.add_function(wrap_pyfunction!(preprocess, m)?)?;
    m.add_function(wrap_pyfunction!(version, m)?)?;
    Ok(())
}
