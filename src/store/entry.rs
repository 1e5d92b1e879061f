//! Entry and slot structures for the table

use bytes::Bytes;

/// A single key/value pair owned by a table
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<V> {
    /// The key
    pub key: Bytes,

    /// The value
    pub value: V,
}

/// One position in the slot array
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Slot<V> {
    Empty,
    Occupied(Entry<V>),
}

impl<V> Slot<V> {
    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    pub(crate) fn entry(&self) -> Option<&Entry<V>> {
        match self {
            Slot::Occupied(entry) => Some(entry),
            Slot::Empty => None,
        }
    }

    pub(crate) fn entry_mut(&mut self) -> Option<&mut Entry<V>> {
        match self {
            Slot::Occupied(entry) => Some(entry),
            Slot::Empty => None,
        }
    }
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Slot::Empty
    }
}
