//! Open-addressed hash table with backward-shift deletion

use super::entry::{Entry, Slot};
use super::hash::fnv1a;
use super::StoreError;
use bytes::Bytes;

/// Slot count of a freshly created table (a power of two)
pub const INITIAL_CAPACITY: usize = 16;

/// Byte-keyed hash table
///
/// Linear probing over a power-of-two slot array. The table never holds more
/// than `capacity / 2` entries, so every probe sequence reaches an empty slot.
/// Deletion shifts later cluster members back instead of leaving tombstones,
/// which keeps every key reachable from its home slot without gaps.
pub struct Table<V> {
    /// Slot array, its length is the capacity
    slots: Vec<Slot<V>>,

    /// Number of occupied slots
    len: usize,
}

impl<V> Table<V> {
    /// Create an empty table with `INITIAL_CAPACITY` slots
    pub fn new() -> Result<Self, StoreError> {
        Ok(Table {
            slots: allocate_slots(INITIAL_CAPACITY)?,
            len: 0,
        })
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Borrow the value stored under `key`
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        self.find(key)
            .and_then(|index| self.slots[index].entry())
            .map(|entry| &entry.value)
    }

    /// Mutably borrow the value stored under `key`
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut V> {
        let index = self.find(key)?;
        self.slots[index].entry_mut().map(|entry| &mut entry.value)
    }

    /// Check if a key is present
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.find(key).is_some()
    }

    /// Insert or overwrite a key
    ///
    /// Returns `true` if the key was new. On an existing key the stored entry
    /// (key and value) is replaced and the old one dropped. Growth happens
    /// before a new key is placed if it would take the table past half full;
    /// if growth fails the table is left as it was.
    pub fn set(&mut self, key: impl Into<Bytes>, value: V) -> Result<bool, StoreError> {
        let key = key.into();

        if let Some(index) = self.find(&key) {
            self.slots[index] = Slot::Occupied(Entry { key, value });
            return Ok(false);
        }

        if self.len + 1 > self.capacity() / 2 {
            self.grow()?;
        }

        place(&mut self.slots, Entry { key, value });
        self.len += 1;
        Ok(true)
    }

    /// Delete a key, returns true if the key existed
    pub fn delete(&mut self, key: &[u8]) -> bool {
        let Some(index) = self.find(key) else {
            return false;
        };

        self.slots[index] = Slot::Empty;
        self.len -= 1;
        self.fill_gap(index);
        true
    }

    /// Iterate entries in slot order
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            slots: self.slots.iter(),
        }
    }

    /// Iterate entries in slot order with mutable values
    ///
    /// Keys cannot be changed and the table cannot be resized while this
    /// borrow is alive.
    pub fn iter_mut(&mut self) -> IterMut<'_, V> {
        IterMut {
            slots: self.slots.iter_mut(),
        }
    }

    fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    /// Linear probe from the home slot to the key or the first empty slot
    fn find(&self, key: &[u8]) -> Option<usize> {
        let mask = self.mask();
        let mut index = home_slot(key, mask);

        loop {
            match &self.slots[index] {
                Slot::Empty => return None,
                Slot::Occupied(entry) if entry.key.as_ref() == key => return Some(index),
                Slot::Occupied(_) => index = (index + 1) & mask,
            }
        }
    }

    /// Double the slot array and rehash every entry in old slot order
    fn grow(&mut self) -> Result<(), StoreError> {
        let capacity = self
            .capacity()
            .checked_mul(2)
            .ok_or(StoreError::OutOfMemory { capacity: usize::MAX })?;
        let mut slots = allocate_slots(capacity)?;

        for slot in std::mem::take(&mut self.slots) {
            if let Slot::Occupied(entry) = slot {
                place(&mut slots, entry);
            }
        }

        self.slots = slots;
        Ok(())
    }

    /// Backward-shift deletion starting at the freshly emptied `free` slot
    ///
    /// Walks the rest of the cluster. An entry moves into the free slot when
    /// that slot lies on its probe path, i.e. between its home slot
    /// (inclusive) and its current slot (exclusive). The scan stops at the
    /// first empty slot.
    fn fill_gap(&mut self, mut free: usize) {
        let mask = self.mask();
        let mut current = (free + 1) & mask;

        loop {
            let home = match &self.slots[current] {
                Slot::Empty => break,
                Slot::Occupied(entry) => home_slot(&entry.key, mask),
            };

            let displacement = current.wrapping_sub(home) & mask;
            let distance_to_free = current.wrapping_sub(free) & mask;
            if displacement >= distance_to_free {
                self.slots.swap(free, current);
                free = current;
            }

            current = (current + 1) & mask;
        }
    }
}

impl<'a, V> IntoIterator for &'a Table<V> {
    type Item = (&'a Bytes, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Borrowing iterator over a table's entries
pub struct Iter<'a, V> {
    slots: std::slice::Iter<'a, Slot<V>>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a Bytes, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.slots
            .by_ref()
            .find_map(|slot| slot.entry())
            .map(|entry| (&entry.key, &entry.value))
    }
}

/// Iterator over a table's entries with mutable values
pub struct IterMut<'a, V> {
    slots: std::slice::IterMut<'a, Slot<V>>,
}

impl<'a, V> Iterator for IterMut<'a, V> {
    type Item = (&'a Bytes, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.slots
            .by_ref()
            .find_map(|slot| slot.entry_mut())
            .map(|entry| (&entry.key, &mut entry.value))
    }
}

fn home_slot(key: &[u8], mask: usize) -> usize {
    (fnv1a(key) & mask as u64) as usize
}

/// Place an entry known to be absent at the first empty slot of its probe path
fn place<V>(slots: &mut [Slot<V>], entry: Entry<V>) {
    let mask = slots.len() - 1;
    let mut index = home_slot(&entry.key, mask);

    while !slots[index].is_empty() {
        index = (index + 1) & mask;
    }

    slots[index] = Slot::Occupied(entry);
}

fn allocate_slots<V>(capacity: usize) -> Result<Vec<Slot<V>>, StoreError> {
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(capacity)
        .map_err(|_| StoreError::OutOfMemory { capacity })?;
    slots.resize_with(capacity, Slot::default);
    Ok(slots)
}
