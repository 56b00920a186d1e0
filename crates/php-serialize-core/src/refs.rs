//! Reference table shared by the parser and the serializer.
//!
//! Composite values are registered when they are completed, in order, and
//! addressed by their 1-based registration index. `R:`/`r:` tokens refer to
//! these indices. Each parse or serialize call owns its own table.
//!
//! Custom-serialized objects take a slot so the numbering matches PHP's, but
//! only a placeholder is stored for them.

use std::collections::HashMap;

use crate::types::PhpValue;

/// Ordered registry of completed composite values.
#[derive(Debug, Default)]
pub struct ReferenceTable {
    // `None` marks a reserved slot
    entries: Vec<Option<PhpValue>>,
    // Handle address -> 1-based index, for arrays and objects only
    by_identity: HashMap<usize, usize>,
}

impl ReferenceTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a completed value and return its 1-based index.
    ///
    /// Arrays and objects are also indexed by handle identity. A handle that
    /// is registered twice keeps its first index.
    pub fn register(&mut self, value: PhpValue) -> usize {
        let index = self.entries.len() + 1;
        if let Some(addr) = identity(&value) {
            self.by_identity.entry(addr).or_insert(index);
        }
        self.entries.push(Some(value));
        index
    }

    /// Take the next index without storing a value.
    ///
    /// Looking the index up later gives `None`.
    pub fn reserve(&mut self) -> usize {
        self.entries.push(None);
        self.entries.len()
    }

    /// Look up a value by its 1-based index.
    pub fn get(&self, index: usize) -> Option<&PhpValue> {
        index
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .and_then(Option::as_ref)
    }

    /// Find the index of an array or object handle that is already registered.
    pub fn index_of(&self, value: &PhpValue) -> Option<usize> {
        identity(value).and_then(|addr| self.by_identity.get(&addr).copied())
    }

    /// Number of registered values.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn identity(value: &PhpValue) -> Option<usize> {
    match value {
        PhpValue::Array(a) => Some(a.addr()),
        PhpValue::Object(o) => Some(o.addr()),
        _ => None,
    }
}
