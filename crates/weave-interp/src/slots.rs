// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Fixed-arity, mutable, positionally indexed storage.
//!
//! Backs record instances: the number of slots is fixed at creation, the
//! contents are not.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use crate::interp::RuntimeError;
use crate::value::{lock, Value};

#[derive(Clone)]
pub struct Slots(Arc<Mutex<Box<[Value]>>>);

impl Slots {
    pub fn new(values: Vec<Value>) -> Self {
        Slots(Arc::new(Mutex::new(values.into_boxed_slice())))
    }

    pub fn len(&self) -> usize {
        lock(&self.0).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        lock(&self.0).get(index).cloned()
    }

    /// Replace the value at `index`. The length never changes.
    pub fn set(&self, index: usize, value: Value) -> Result<(), RuntimeError> {
        let mut slots = lock(&self.0);
        let len = slots.len();
        match slots.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(RuntimeError::IndexOutOfBounds { index: index as i64, len }),
        }
    }

    /// Write several slots under one lock. Indices must already be valid.
    pub(crate) fn set_many(&self, updates: impl IntoIterator<Item = (usize, Value)>) {
        let mut slots = lock(&self.0);
        for (index, value) in updates {
            if let Some(slot) = slots.get_mut(index) {
                *slot = value;
            }
        }
    }

    pub fn to_vec(&self) -> Vec<Value> {
        lock(&self.0).to_vec()
    }

    pub fn ptr_eq(&self, other: &Slots) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn as_ptr(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for Slots {
    fn eq(&self, other: &Slots) -> bool {
        self.ptr_eq(other) || self.to_vec() == other.to_vec()
    }
}

impl PartialOrd for Slots {
    fn partial_cmp(&self, other: &Slots) -> Option<Ordering> {
        self.to_vec().partial_cmp(&other.to_vec())
    }
}

impl Hash for Slots {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_vec().hash(state);
    }
}

impl std::fmt::Debug for Slots {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.to_vec()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_length_mutable_contents() {
        let slots = Slots::new(vec![Value::Int(1), Value::Int(2)]);
        slots.set(1, Value::Int(5)).unwrap();
        assert_eq!(slots.to_vec(), vec![Value::Int(1), Value::Int(5)]);
        assert!(matches!(
            slots.set(2, Value::None),
            Err(RuntimeError::IndexOutOfBounds { index: 2, len: 2 })
        ));
        assert_eq!(slots.len(), 2);
    }

    #[test]
    fn structural_equality_and_ordering() {
        let a = Slots::new(vec![Value::Int(1), Value::Int(2)]);
        let b = Slots::new(vec![Value::Int(1), Value::Int(2)]);
        let c = Slots::new(vec![Value::Int(1), Value::Int(3)]);
        assert_eq!(a, b);
        assert!(a < c);
        assert_eq!(a, a.clone());
    }
}
