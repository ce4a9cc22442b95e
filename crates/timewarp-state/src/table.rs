//! Weak, identity-keyed bookkeeping
//!
//! Entries are keyed by the address of the subject's allocation and hold
//! only a `Weak` to it. The `Weak` pins the allocation, so an address
//! cannot be reused by another subject while its entry exists; once the
//! subject is dropped the entry is unreachable and `purge` discards it.

use std::collections::HashMap;
use std::rc::{Rc, Weak};

#[inline]
fn identity<T: ?Sized>(subject: &Rc<T>) -> usize {
    Rc::as_ptr(subject) as *const () as usize
}

/// Ephemeral association from externally owned subjects to bookkeeping
pub struct WeakTable<T: ?Sized, V> {
    entries: HashMap<usize, (Weak<T>, V)>,
}

impl<T: ?Sized, V> WeakTable<T, V> {
    pub fn new() -> Self {
        WeakTable {
            entries: HashMap::new(),
        }
    }

    /// Bookkeeping for a live subject
    pub fn get(&self, subject: &Rc<T>) -> Option<&V> {
        self.entries
            .get(&identity(subject))
            .filter(|(weak, _)| weak.strong_count() > 0)
            .map(|(_, value)| value)
    }

    /// Mutable bookkeeping for a live subject
    pub fn get_mut(&mut self, subject: &Rc<T>) -> Option<&mut V> {
        self.entries
            .get_mut(&identity(subject))
            .filter(|(weak, _)| weak.strong_count() > 0)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, subject: &Rc<T>) -> bool {
        self.get(subject).is_some()
    }

    /// Bookkeeping for `subject`, created with `init` on first observation.
    /// Returns the entry and whether it was just created.
    pub fn get_or_insert_with<F>(&mut self, subject: &Rc<T>, init: F) -> (&mut V, bool)
    where
        F: FnOnce() -> V,
    {
        let key = identity(subject);
        let mut created = false;
        let (_, value) = self.entries.entry(key).or_insert_with(|| {
            created = true;
            (Rc::downgrade(subject), init())
        });
        (value, created)
    }

    pub fn insert(&mut self, subject: &Rc<T>, value: V) {
        self.entries
            .insert(identity(subject), (Rc::downgrade(subject), value));
    }

    pub fn remove(&mut self, subject: &Rc<T>) -> Option<V> {
        self.entries.remove(&identity(subject)).map(|(_, value)| value)
    }

    /// Drop entries whose subject is gone. Returns how many were dropped.
    pub fn purge(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, (weak, _)| weak.strong_count() > 0);
        before - self.entries.len()
    }

    /// Subjects still alive, upgraded for the duration of a pass
    pub fn live_subjects(&self) -> Vec<Rc<T>> {
        self.entries
            .values()
            .filter_map(|(weak, _)| weak.upgrade())
            .collect()
    }

    /// Number of entries, including any not yet purged
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: ?Sized, V> Default for WeakTable<T, V> {
    fn default() -> Self {
        Self::new()
    }
}
