// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Shared name → value tables used as globals, locals and class bodies.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use indexmap::IndexMap;

use crate::value::{lock, Value};

/// A mutable, shareable mapping from names to values.
///
/// Clones share storage; use [`Namespace::snapshot`] for a detached copy.
#[derive(Clone, Default)]
pub struct Namespace(Arc<Mutex<IndexMap<String, Value>>>);

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, IndexMap<String, Value>> {
        lock(&self.0)
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.entries().get(name).cloned()
    }

    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.entries().insert(name.into(), value);
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.entries().shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries().keys().cloned().collect()
    }

    pub fn snapshot(&self) -> IndexMap<String, Value> {
        self.entries().clone()
    }

    pub fn extend(&self, items: impl IntoIterator<Item = (String, Value)>) {
        let mut entries = self.entries();
        for (k, v) in items {
            entries.insert(k, v);
        }
    }

    /// Whether both handles refer to the same table.
    pub fn ptr_eq(&self, other: &Namespace) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl FromIterator<(String, Value)> for Namespace {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Namespace(Arc::new(Mutex::new(iter.into_iter().collect())))
    }
}

impl From<IndexMap<String, Value>> for Namespace {
    fn from(entries: IndexMap<String, Value>) -> Self {
        Namespace(Arc::new(Mutex::new(entries)))
    }
}

// Functions hold their globals, so printing values here could recurse.
impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Namespace").field(&self.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_storage() {
        let ns = Namespace::new();
        let alias = ns.clone();
        alias.set("x", Value::Int(1));
        assert_eq!(ns.get("x"), Some(Value::Int(1)));
        assert!(ns.ptr_eq(&alias));

        let copy: Namespace = ns.snapshot().into();
        copy.set("y", Value::Int(2));
        assert!(!ns.contains("y"));
        assert!(!ns.ptr_eq(&copy));
    }

    #[test]
    fn keeps_insertion_order() {
        let ns: Namespace = [("b".to_string(), Value::None), ("a".to_string(), Value::None)]
            .into_iter()
            .collect();
        assert_eq!(ns.keys(), vec!["b", "a"]);
        ns.remove("b");
        assert_eq!(ns.keys(), vec!["a"]);
    }
}
