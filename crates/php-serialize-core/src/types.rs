//! PHP value types.
//!
//! Arrays and objects live behind [`Shared`] handles so that a decoded
//! back-reference aliases the value it points to, and so the serializer can
//! recognise the same array or object by identity rather than by equality.

use std::borrow::Cow;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use bstr::ByteSlice;
use indexmap::IndexMap;
use memchr::memchr;

/// A shared, interior-mutable handle to an array or object.
///
/// Cloning a handle aliases the underlying value.
///
/// Equality compares handle identity first and contents second. Comparing two
/// distinct handles whose contents contain themselves recurses without bound,
/// as does `Display` of a self-containing array. Decoded trees never contain
/// such cycles; the serializer rejects them with `CircularReference`.
pub struct Shared<T>(Rc<RefCell<T>>);

impl<T> Shared<T> {
    /// Wrap a value in a new handle.
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    /// Immutably borrow the wrapped value.
    ///
    /// Panics if the value is currently mutably borrowed.
    #[inline]
    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    /// Mutably borrow the wrapped value.
    ///
    /// Panics if the value is currently borrowed.
    #[inline]
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Returns `true` if both handles point to the same value.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the shared allocation, stable for the lifetime of the handle.
    #[inline]
    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    /// Unwrap the value if this is the only handle, otherwise clone it out.
    pub fn into_inner(self) -> T
    where
        T: Clone,
    {
        match Rc::try_unwrap(self.0) {
            Ok(cell) => cell.into_inner(),
            Err(rc) => rc.borrow().clone(),
        }
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: PartialEq> PartialEq for Shared<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.borrow() == *other.borrow()
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(value) => fmt::Debug::fmt(&*value, f),
            Err(_) => f.write_str("<borrowed>"),
        }
    }
}

/// A PHP value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PhpValue {
    /// PHP null value.
    #[default]
    Null,

    /// PHP boolean value.
    Bool(bool),

    /// PHP integer value.
    Int(i64),

    /// PHP float/double value.
    Float(f64),

    /// PHP string value. PHP strings are byte strings and may not be UTF-8.
    String(Vec<u8>),

    /// PHP array value (ordered map).
    Array(Shared<PhpArray>),

    /// PHP object value.
    Object(Shared<PhpObject>),

    /// Object of a class with custom serialization (`C:` token).
    ObjectSerialized(Box<PhpObjectSerialized>),

    /// SPL container (`ArrayObject`, `ArrayIterator`) body.
    SplArray(Box<PhpSplArray>),

    /// Explicit back-reference to the n-th composite value (1-indexed).
    ///
    /// The parser resolves references instead of producing this variant;
    /// it exists so callers can request a specific back-reference on encode.
    Reference(usize),
}

impl PhpValue {
    /// Wrap an array in a new shared handle.
    pub fn array(array: PhpArray) -> Self {
        PhpValue::Array(Shared::new(array))
    }

    /// Wrap an object in a new shared handle.
    pub fn object(object: PhpObject) -> Self {
        PhpValue::Object(Shared::new(object))
    }

    /// Check if the value is null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, PhpValue::Null)
    }

    /// Check if the value is a boolean.
    #[inline]
    pub fn is_bool(&self) -> bool {
        matches!(self, PhpValue::Bool(_))
    }

    /// Check if the value is an integer.
    #[inline]
    pub fn is_int(&self) -> bool {
        matches!(self, PhpValue::Int(_))
    }

    /// Check if the value is a float.
    #[inline]
    pub fn is_float(&self) -> bool {
        matches!(self, PhpValue::Float(_))
    }

    /// Check if the value is a string.
    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, PhpValue::String(_))
    }

    /// Check if the value is an array.
    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self, PhpValue::Array(_))
    }

    /// Check if the value is an object.
    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self, PhpValue::Object(_))
    }

    /// Get the value as a boolean.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PhpValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the value as an integer.
    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PhpValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a float.
    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PhpValue::Float(f) => Some(*f),
            PhpValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get the value as a byte slice.
    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PhpValue::String(s) => Some(s.as_slice()),
            _ => None,
        }
    }

    /// Get the value as a UTF-8 string.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PhpValue::String(s) => std::str::from_utf8(s).ok(),
            _ => None,
        }
    }

    /// Borrow the array behind this value.
    pub fn as_array(&self) -> Option<Ref<'_, PhpArray>> {
        match self {
            PhpValue::Array(a) => Some(a.borrow()),
            _ => None,
        }
    }

    /// Mutably borrow the array behind this value.
    pub fn as_array_mut(&self) -> Option<RefMut<'_, PhpArray>> {
        match self {
            PhpValue::Array(a) => Some(a.borrow_mut()),
            _ => None,
        }
    }

    /// Borrow the object behind this value.
    pub fn as_object(&self) -> Option<Ref<'_, PhpObject>> {
        match self {
            PhpValue::Object(o) => Some(o.borrow()),
            _ => None,
        }
    }

    /// Mutably borrow the object behind this value.
    pub fn as_object_mut(&self) -> Option<RefMut<'_, PhpObject>> {
        match self {
            PhpValue::Object(o) => Some(o.borrow_mut()),
            _ => None,
        }
    }

    /// Get the custom-serialized object payload.
    pub fn as_object_serialized(&self) -> Option<&PhpObjectSerialized> {
        match self {
            PhpValue::ObjectSerialized(o) => Some(o),
            _ => None,
        }
    }

    /// Get the SPL array payload.
    pub fn as_spl_array(&self) -> Option<&PhpSplArray> {
        match self {
            PhpValue::SplArray(s) => Some(s),
            _ => None,
        }
    }

    /// Returns `true` if both values are the same shared array or object.
    pub fn same_identity(&self, other: &PhpValue) -> bool {
        match (self, other) {
            (PhpValue::Array(a), PhpValue::Array(b)) => a.ptr_eq(b),
            (PhpValue::Object(a), PhpValue::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Get a type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            PhpValue::Null => "null",
            PhpValue::Bool(_) => "boolean",
            PhpValue::Int(_) => "integer",
            PhpValue::Float(_) => "float",
            PhpValue::String(_) => "string",
            PhpValue::Array(_) => "array",
            PhpValue::Object(_) => "object",
            PhpValue::ObjectSerialized(_) => "serialized object",
            PhpValue::SplArray(_) => "spl array",
            PhpValue::Reference(_) => "reference",
        }
    }
}

impl fmt::Display for PhpValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhpValue::Null => write!(f, "null"),
            PhpValue::Bool(b) => write!(f, "{}", b),
            PhpValue::Int(i) => write!(f, "{}", i),
            PhpValue::Float(fl) => write!(f, "{}", fl),
            PhpValue::String(s) => write!(f, "\"{}\"", s.as_bstr()),
            PhpValue::Array(arr) => {
                write!(f, "[")?;
                for (i, (k, v)) in arr.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} => {}", k, v)?;
                }
                write!(f, "]")
            }
            PhpValue::Object(obj) => write!(f, "{}{{...}}", obj.borrow().class_name()),
            PhpValue::ObjectSerialized(obj) => {
                write!(f, "{}<{} bytes>", obj.class_name, obj.data.len())
            }
            PhpValue::SplArray(spl) => write!(f, "spl({}, {})", spl.flags, spl.array),
            PhpValue::Reference(idx) => write!(f, "&{}", idx),
        }
    }
}

impl From<bool> for PhpValue {
    fn from(value: bool) -> Self {
        PhpValue::Bool(value)
    }
}

impl From<i32> for PhpValue {
    fn from(value: i32) -> Self {
        PhpValue::Int(i64::from(value))
    }
}

impl From<i64> for PhpValue {
    fn from(value: i64) -> Self {
        PhpValue::Int(value)
    }
}

impl From<f64> for PhpValue {
    fn from(value: f64) -> Self {
        PhpValue::Float(value)
    }
}

impl From<&str> for PhpValue {
    fn from(value: &str) -> Self {
        PhpValue::String(value.as_bytes().to_vec())
    }
}

impl From<String> for PhpValue {
    fn from(value: String) -> Self {
        PhpValue::String(value.into_bytes())
    }
}

impl From<&[u8]> for PhpValue {
    fn from(value: &[u8]) -> Self {
        PhpValue::String(value.to_vec())
    }
}

impl From<Vec<u8>> for PhpValue {
    fn from(value: Vec<u8>) -> Self {
        PhpValue::String(value)
    }
}

impl From<PhpArray> for PhpValue {
    fn from(value: PhpArray) -> Self {
        PhpValue::array(value)
    }
}

impl From<PhpObject> for PhpValue {
    fn from(value: PhpObject) -> Self {
        PhpValue::object(value)
    }
}

impl From<PhpObjectSerialized> for PhpValue {
    fn from(value: PhpObjectSerialized) -> Self {
        PhpValue::ObjectSerialized(Box::new(value))
    }
}

impl From<PhpSplArray> for PhpValue {
    fn from(value: PhpSplArray) -> Self {
        PhpValue::SplArray(Box::new(value))
    }
}

impl From<ArrayKey> for PhpValue {
    fn from(value: ArrayKey) -> Self {
        match value {
            ArrayKey::Int(i) => PhpValue::Int(i),
            ArrayKey::String(s) => PhpValue::String(s),
        }
    }
}

/// An array key: PHP only allows integers and strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayKey {
    /// Integer key.
    Int(i64),
    /// String key (byte string).
    String(Vec<u8>),
}

impl ArrayKey {
    /// Convert a decoded value into a key, if it is an integer or string.
    pub fn from_value(value: &PhpValue) -> Option<Self> {
        match value {
            PhpValue::Int(i) => Some(ArrayKey::Int(*i)),
            PhpValue::String(s) => Some(ArrayKey::String(s.clone())),
            _ => None,
        }
    }

    /// Get the key as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArrayKey::Int(i) => Some(*i),
            ArrayKey::String(_) => None,
        }
    }

    /// Get the key as bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ArrayKey::Int(_) => None,
            ArrayKey::String(s) => Some(s),
        }
    }
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Int(i) => write!(f, "{}", i),
            ArrayKey::String(s) => write!(f, "\"{}\"", s.as_bstr()),
        }
    }
}

impl From<i32> for ArrayKey {
    fn from(value: i32) -> Self {
        ArrayKey::Int(i64::from(value))
    }
}

impl From<i64> for ArrayKey {
    fn from(value: i64) -> Self {
        ArrayKey::Int(value)
    }
}

impl From<usize> for ArrayKey {
    fn from(value: usize) -> Self {
        ArrayKey::Int(value as i64)
    }
}

impl From<&str> for ArrayKey {
    fn from(value: &str) -> Self {
        ArrayKey::String(value.as_bytes().to_vec())
    }
}

impl From<String> for ArrayKey {
    fn from(value: String) -> Self {
        ArrayKey::String(value.into_bytes())
    }
}

impl From<&[u8]> for ArrayKey {
    fn from(value: &[u8]) -> Self {
        ArrayKey::String(value.to_vec())
    }
}

impl From<Vec<u8>> for ArrayKey {
    fn from(value: Vec<u8>) -> Self {
        ArrayKey::String(value)
    }
}

impl From<&ArrayKey> for ArrayKey {
    fn from(value: &ArrayKey) -> Self {
        value.clone()
    }
}

/// An insertion-ordered PHP array.
///
/// Keys are unique. Re-setting a key keeps its position, deleting a key
/// removes it from the order, and renaming a key keeps its position.
#[derive(Debug, Clone, Default)]
pub struct PhpArray {
    entries: IndexMap<ArrayKey, PhpValue>,
}

impl PhpArray {
    /// Create an empty array.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty array with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Build a list: keys `0..n` in order.
    pub fn from_list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<PhpValue>,
    {
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (ArrayKey::from(i), v.into()))
            .collect()
    }

    /// Insert or update an entry. An existing key keeps its position.
    pub fn set(&mut self, key: impl Into<ArrayKey>, value: impl Into<PhpValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Look up a value by key.
    pub fn get(&self, key: impl Into<ArrayKey>) -> Option<&PhpValue> {
        self.entries.get(&key.into())
    }

    /// Look up a value by key for modification.
    pub fn get_mut(&mut self, key: impl Into<ArrayKey>) -> Option<&mut PhpValue> {
        self.entries.get_mut(&key.into())
    }

    /// Returns `true` if the key is present.
    pub fn contains_key(&self, key: impl Into<ArrayKey>) -> bool {
        self.entries.contains_key(&key.into())
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &ArrayKey> + '_ {
        self.entries.keys()
    }

    /// Values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &PhpValue> + '_ {
        self.entries.values()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, ArrayKey, PhpValue> {
        self.entries.iter()
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the array has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove an entry, preserving the order of the others.
    pub fn delete(&mut self, key: impl Into<ArrayKey>) -> Option<PhpValue> {
        self.entries.shift_remove(&key.into())
    }

    /// Rename a key in place.
    ///
    /// If `new` already exists elsewhere, that entry is dropped. Does nothing
    /// when `old` is missing.
    pub fn replace_key(&mut self, old: impl Into<ArrayKey>, new: impl Into<ArrayKey>) {
        let old = old.into();
        let new = new.into();
        if old == new || !self.entries.contains_key(&old) {
            return;
        }
        self.entries.shift_remove(&new);
        if let Some((index, _, value)) = self.entries.shift_remove_full(&old) {
            self.entries.shift_insert(index, new, value);
        }
    }

    /// Returns `true` if the keys are exactly `0..len` in order.
    pub fn is_list(&self) -> bool {
        self.entries
            .keys()
            .enumerate()
            .all(|(i, k)| matches!(k, ArrayKey::Int(idx) if *idx >= 0 && *idx as usize == i))
    }
}

// Order matters for PHP arrays; IndexMap's own equality ignores it.
impl PartialEq for PhpArray {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.entries.iter().eq(other.entries.iter())
    }
}

impl<K, V> FromIterator<(K, V)> for PhpArray
where
    K: Into<ArrayKey>,
    V: Into<PhpValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut array = PhpArray::new();
        for (k, v) in iter {
            array.set(k, v);
        }
        array
    }
}

impl<'a> IntoIterator for &'a PhpArray {
    type Item = (&'a ArrayKey, &'a PhpValue);
    type IntoIter = indexmap::map::Iter<'a, ArrayKey, PhpValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// PHP property visibility.
///
/// Visibility is encoded in the member key:
/// public is the plain name, protected is `\0*\0name`, private is
/// `\0ClassName\0name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Visibility {
    /// Public property.
    Public,
    /// Protected property (prefixed with `\0*\0`).
    Protected,
    /// Private property (prefixed with `\0ClassName\0`).
    Private,
}

/// Build the member key for a property of `class_name`.
pub fn mangle_member_name(visibility: Visibility, class_name: &str, name: &str) -> Vec<u8> {
    match visibility {
        Visibility::Public => name.as_bytes().to_vec(),
        Visibility::Protected => {
            let mut key = Vec::with_capacity(name.len() + 3);
            key.extend_from_slice(b"\x00*\x00");
            key.extend_from_slice(name.as_bytes());
            key
        }
        Visibility::Private => {
            let mut key = Vec::with_capacity(class_name.len() + name.len() + 2);
            key.push(0);
            key.extend_from_slice(class_name.as_bytes());
            key.push(0);
            key.extend_from_slice(name.as_bytes());
            key
        }
    }
}

/// Split a member key into visibility, declaring class, and plain name.
///
/// A key starting with a NUL byte but lacking the second NUL is treated as public.
pub fn split_member_name(key: &[u8]) -> (Visibility, Option<&[u8]>, &[u8]) {
    if key.first() != Some(&0) {
        return (Visibility::Public, None, key);
    }
    match memchr(0, &key[1..]) {
        Some(second_null) => {
            let prefix = &key[1..1 + second_null];
            let name = &key[2 + second_null..];
            if prefix == b"*" {
                (Visibility::Protected, None, name)
            } else {
                (Visibility::Private, Some(prefix), name)
            }
        }
        None => (Visibility::Public, None, key),
    }
}

/// A PHP object property with its visibility resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct PhpProperty<'a> {
    /// Property name without the visibility prefix.
    pub name: Cow<'a, [u8]>,
    /// Property visibility.
    pub visibility: Visibility,
    /// For private properties, the class that declared it.
    pub declaring_class: Option<&'a [u8]>,
    /// Property value.
    pub value: &'a PhpValue,
}

/// A PHP object: class name plus member array.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PhpObject {
    class_name: String,
    members: PhpArray,
}

impl PhpObject {
    /// Create an object with no members.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            members: PhpArray::new(),
        }
    }

    /// The class name.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Rename the class. Private member keys are not rewritten.
    pub fn set_class_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.class_name = name.into();
        self
    }

    /// The raw member array with mangled keys.
    pub fn members(&self) -> &PhpArray {
        &self.members
    }

    /// The raw member array for modification.
    pub fn members_mut(&mut self) -> &mut PhpArray {
        &mut self.members
    }

    /// Replace the member array.
    pub fn set_members(&mut self, members: PhpArray) -> &mut Self {
        self.members = members;
        self
    }

    /// Get a public member.
    pub fn get_public(&self, name: &str) -> Option<&PhpValue> {
        self.get(Visibility::Public, name)
    }

    /// Set a public member.
    pub fn set_public(&mut self, name: &str, value: impl Into<PhpValue>) -> &mut Self {
        self.set(Visibility::Public, name, value)
    }

    /// Get a protected member.
    pub fn get_protected(&self, name: &str) -> Option<&PhpValue> {
        self.get(Visibility::Protected, name)
    }

    /// Set a protected member.
    pub fn set_protected(&mut self, name: &str, value: impl Into<PhpValue>) -> &mut Self {
        self.set(Visibility::Protected, name, value)
    }

    /// Get a private member declared by this object's class.
    pub fn get_private(&self, name: &str) -> Option<&PhpValue> {
        self.get(Visibility::Private, name)
    }

    /// Set a private member declared by this object's class.
    pub fn set_private(&mut self, name: &str, value: impl Into<PhpValue>) -> &mut Self {
        self.set(Visibility::Private, name, value)
    }

    fn get(&self, visibility: Visibility, name: &str) -> Option<&PhpValue> {
        self.members
            .get(mangle_member_name(visibility, &self.class_name, name))
    }

    fn set(&mut self, visibility: Visibility, name: &str, value: impl Into<PhpValue>) -> &mut Self {
        let key = mangle_member_name(visibility, &self.class_name, name);
        self.members.set(key, value);
        self
    }

    /// Members with their visibility decoded from the key.
    pub fn properties(&self) -> impl Iterator<Item = PhpProperty<'_>> + '_ {
        self.members.iter().map(|(key, value)| match key {
            ArrayKey::Int(i) => PhpProperty {
                name: Cow::Owned(i.to_string().into_bytes()),
                visibility: Visibility::Public,
                declaring_class: None,
                value,
            },
            ArrayKey::String(s) => {
                let (visibility, declaring_class, name) = split_member_name(s);
                PhpProperty {
                    name: Cow::Borrowed(name),
                    visibility,
                    declaring_class,
                    value,
                }
            }
        })
    }
}

/// An object whose class implements custom serialization.
///
/// `data` is the opaque payload between the braces of the `C:` token.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PhpObjectSerialized {
    /// The class name.
    pub class_name: String,
    /// Opaque serialized payload, stored verbatim.
    pub data: Vec<u8>,
    /// Payload decoded by a caller-supplied hook, if any.
    pub value: Option<PhpValue>,
}

impl PhpObjectSerialized {
    /// Create an object with an empty payload.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    /// Set the opaque payload.
    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = data.into();
        self
    }

    /// Set the decoded payload.
    pub fn with_value(mut self, value: impl Into<PhpValue>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// An SPL container body: flags, wrapped storage, and extra properties.
#[derive(Debug, Clone, PartialEq)]
pub struct PhpSplArray {
    /// SPL flags (`ArrayObject::STD_PROP_LIST` and friends).
    pub flags: i64,
    /// The wrapped storage, usually an array or object.
    pub array: PhpValue,
    /// Properties of the container object itself.
    pub properties: PhpValue,
}

impl PhpSplArray {
    /// Create a container. Missing parts default to empty arrays.
    pub fn new(array: Option<PhpValue>, properties: Option<PhpValue>) -> Self {
        Self {
            flags: 0,
            array: array.unwrap_or_else(|| PhpValue::array(PhpArray::new())),
            properties: properties.unwrap_or_else(|| PhpValue::array(PhpArray::new())),
        }
    }

    /// Set the flags.
    pub fn with_flags(mut self, flags: i64) -> Self {
        self.flags = flags;
        self
    }
}

impl Default for PhpSplArray {
    fn default() -> Self {
        Self::new(None, None)
    }
}
