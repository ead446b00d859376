// src/any/dictionary.rs
//
// An insertion-ordered string-keyed map of `AnyValue`s, backed by a
// `Vec<(String, AnyValue)>` rather than a hash map so that re-serializing a
// dictionary preserves the order its keys were first seen — this is what
// lets the JSON writer emit `OTIO_SCHEMA` first and otherwise keep a
// document's field order stable across a read/write round trip.
//
// Lookup is linear. Metadata dictionaries in practice hold a handful of
// entries, so this trades worst-case lookup cost for not pulling in an
// ordered-map dependency the rest of the stack has no other use for.

use std::cell::RefCell;
use std::rc::Rc;

use crate::any::mutation_stamp::MutationStamp;
use crate::any::AnyValue;
use crate::error::{Error, Result};

type Entries = Rc<RefCell<Vec<(String, AnyValue)>>>;

#[derive(Debug, Clone)]
pub struct AnyDictionary {
    entries: Entries,
    stamp: Rc<MutationStamp>,
}

impl AnyDictionary {
    pub fn new() -> Self {
        Self { entries: Rc::new(RefCell::new(Vec::new())), stamp: MutationStamp::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn get(&self, key: &str) -> Option<AnyValue> {
        self.entries.borrow().iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.borrow().iter().any(|(k, _)| k == key)
    }

    /// Insert or overwrite `key`. Overwriting preserves the key's original
    /// position; a new key is appended.
    pub fn insert(&mut self, key: impl Into<String>, value: AnyValue) {
        let key = key.into();
        let mut entries = self.entries.borrow_mut();
        if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            entries.push((key, value));
        }
        drop(entries);
        self.stamp.bump();
    }

    pub fn remove(&mut self, key: &str) -> Option<AnyValue> {
        let mut entries = self.entries.borrow_mut();
        let pos = entries.iter().position(|(k, _)| k == key)?;
        let (_, v) = entries.remove(pos);
        drop(entries);
        self.stamp.bump();
        Some(v)
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.borrow().iter().map(|(k, _)| k.clone()).collect()
    }

    /// A safe, borrow-checked snapshot iterator for ordinary in-process use.
    pub fn iter(&self) -> impl Iterator<Item = (String, AnyValue)> {
        self.entries.borrow().clone().into_iter()
    }

    /// An iterator that survives independently of this dictionary's
    /// lifetime (as a handle returned across an FFI boundary would), and
    /// that reports `Error::InternalError` instead of panicking or reading
    /// stale data if the dictionary is mutated or dropped while the
    /// iterator is still in use.
    pub fn external_iter(&self) -> DictionaryIterator {
        DictionaryIterator {
            entries: self.entries.clone(),
            stamp: self.stamp.clone(),
            captured_generation: self.stamp.generation(),
            index: 0,
        }
    }
}

impl Default for AnyDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AnyDictionary {
    fn drop(&mut self) {
        // Only mark dead when this is the last strong owner of the backing
        // storage; clones (e.g. a dict nested inside another AnyValue that
        // was itself cloned) still share one live stamp.
        if Rc::strong_count(&self.entries) == 1 {
            self.stamp.mark_dead();
        }
    }
}

impl PartialEq for AnyDictionary {
    fn eq(&self, other: &Self) -> bool {
        let a = self.entries.borrow();
        let b = other.entries.borrow();
        if a.len() != b.len() {
            return false;
        }
        a.iter().all(|(k, v)| b.iter().any(|(k2, v2)| k == k2 && crate::any::any_value_eq(v, v2)))
    }
}

pub struct DictionaryIterator {
    entries: Entries,
    stamp: Rc<MutationStamp>,
    captured_generation: u64,
    index: usize,
}

impl DictionaryIterator {
    pub fn next(&mut self) -> Result<Option<(String, AnyValue)>> {
        if !self.stamp.is_alive() {
            return Err(Error::InternalError("dictionary iterator outlived its container".into()));
        }
        if self.stamp.generation() != self.captured_generation {
            return Err(Error::InternalError("dictionary was modified during iteration".into()));
        }
        let entries = self.entries.borrow();
        let item = entries.get(self.index).cloned();
        drop(entries);
        if item.is_some() {
            self.index += 1;
        }
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_preserves_order_on_overwrite() {
        let mut d = AnyDictionary::new();
        d.insert("a", AnyValue::Int(1));
        d.insert("b", AnyValue::Int(2));
        d.insert("a", AnyValue::Int(3));
        assert_eq!(d.keys(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(d.get("a").unwrap().as_i64(), Some(3));
    }

    #[test]
    fn external_iterator_detects_mutation() {
        let mut d = AnyDictionary::new();
        d.insert("a", AnyValue::Int(1));
        let mut it = d.external_iter();
        assert!(it.next().unwrap().is_some());
        d.insert("b", AnyValue::Int(2));
        assert!(it.next().is_err());
    }

    #[test]
    fn external_iterator_detects_destruction() {
        let mut d = AnyDictionary::new();
        d.insert("a", AnyValue::Int(1));
        let mut it = d.external_iter();
        drop(d);
        assert!(it.next().is_err());
    }

    #[test]
    fn external_iterator_walks_all_entries_when_untouched() {
        let mut d = AnyDictionary::new();
        d.insert("a", AnyValue::Int(1));
        d.insert("b", AnyValue::Int(2));
        let mut it = d.external_iter();
        assert_eq!(it.next().unwrap().unwrap().0, "a");
        assert_eq!(it.next().unwrap().unwrap().0, "b");
        assert!(it.next().unwrap().is_none());
    }
}
