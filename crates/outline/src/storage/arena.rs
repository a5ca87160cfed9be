//! Heap-backed arena allocator.
//!
//! Nodes live in a flat vector of slots addressed by `NodeIndex`. Removed
//! slots are threaded onto a freelist and reused by later inserts, so an
//! index is only meaningful while the value it was issued for is alive.

use std::mem;
use std::ops::{Index, IndexMut};

use super::entry::Entry;
use super::index_types::NodeIndex;

pub struct Arena<T> {
    entries: Vec<Entry<T>>,

    /// Logical element count (occupied slots only).
    len: usize,

    /// Head of the freelist (index of the next available slot).
    next: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            len: 0,
            next: 0,
        }
    }

    /// Inserts a value, returning its index.
    pub fn insert(&mut self, value: T) -> NodeIndex {
        let key = self.next;
        if key == self.entries.len() {
            self.entries.push(Entry::Occupied(value));
            self.next = self.entries.len();
        } else {
            // Reusing a vacant slot from the freelist
            let next_free = match self.entries[key] {
                Entry::Vacant(next) => next,
                Entry::Occupied(_) => unreachable!("freelist slot unexpectedly occupied"),
            };
            self.entries[key] = Entry::Occupied(value);
            self.next = next_free;
        }
        self.len += 1;
        NodeIndex::new(key)
    }

    pub fn get(&self, index: NodeIndex) -> Option<&T> {
        match self.entries.get(index.get())? {
            Entry::Occupied(value) => Some(value),
            Entry::Vacant(_) => None,
        }
    }

    pub fn get_mut(&mut self, index: NodeIndex) -> Option<&mut T> {
        match self.entries.get_mut(index.get())? {
            Entry::Occupied(value) => Some(value),
            Entry::Vacant(_) => None,
        }
    }

    pub fn contains(&self, index: NodeIndex) -> bool {
        self.get(index).is_some()
    }

    /// Removes the value at `index` if it exists, returning it.
    pub fn try_remove(&mut self, index: NodeIndex) -> Option<T> {
        let slot = index.get();
        let next_free = self.next;
        let entry = self.entries.get_mut(slot)?;
        if matches!(entry, Entry::Vacant(_)) {
            return None;
        }
        match mem::replace(entry, Entry::Vacant(next_free)) {
            Entry::Occupied(value) => {
                self.len = self.len.saturating_sub(1);
                self.next = slot;
                Some(value)
            }
            Entry::Vacant(_) => unreachable!("occupancy checked above"),
        }
    }

    /// Returns the number of occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Mutable access to every occupied value in slot order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.iter_mut().filter_map(|entry| match entry {
            Entry::Occupied(value) => Some(value),
            Entry::Vacant(_) => None,
        })
    }

    /// Returns an iterator over occupied entries in slot order.
    pub fn iter(&self) -> ArenaIter<'_, T> {
        ArenaIter {
            arena: self,
            index: 0,
        }
    }
}

impl<T> Index<NodeIndex> for Arena<T> {
    type Output = T;

    fn index(&self, index: NodeIndex) -> &Self::Output {
        self.get(index).expect("invalid arena index")
    }
}

impl<T> IndexMut<NodeIndex> for Arena<T> {
    fn index_mut(&mut self, index: NodeIndex) -> &mut Self::Output {
        self.get_mut(index).expect("invalid arena index")
    }
}

impl<T> std::fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("len", &self.len)
            .field("next", &self.next)
            .field("slots", &self.entries.len())
            .finish()
    }
}

/// Iterator over occupied entries in an Arena.
pub struct ArenaIter<'a, T> {
    arena: &'a Arena<T>,
    index: usize,
}

impl<'a, T> Iterator for ArenaIter<'a, T> {
    type Item = (NodeIndex, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.arena.entries.len() {
            let idx = NodeIndex::new(self.index);
            self.index += 1;
            if let Some(value) = self.arena.get(idx) {
                return Some((idx, value));
            }
        }
        None
    }
}
