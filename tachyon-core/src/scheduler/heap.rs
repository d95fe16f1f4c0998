//! Bounded indexed min-heap
//!
//! Ordered by `(fire_time_ns, sequence_id, index)`. Tracks each pool node's
//! heap position so cancellation removes the entry in O(log n) instead of
//! leaving tombstones behind. Storage is sized once to the pool capacity.

use super::pool::NIL;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HeapEntry {
    pub fire_time_ns: u64,
    pub sequence_id: u64,
    pub index: u32,
}

impl HeapEntry {
    #[inline(always)]
    fn key(&self) -> (u64, u64, u32) {
        (self.fire_time_ns, self.sequence_id, self.index)
    }
}

pub(crate) struct BoundedHeap {
    entries: Vec<HeapEntry>,
    /// Heap position per pool index, `NIL` when absent
    positions: Vec<u32>,
}

impl BoundedHeap {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: vec![NIL; capacity],
        }
    }

    /// Insert; false when the heap is full or the index is already present
    pub fn push(&mut self, entry: HeapEntry) -> bool {
        let slot = entry.index as usize;
        if self.entries.len() == self.positions.len()
            || slot >= self.positions.len()
            || self.positions[slot] != NIL
        {
            return false;
        }

        let pos = self.entries.len();
        self.entries.push(entry);
        self.positions[slot] = pos as u32;
        self.sift_up(pos);
        true
    }

    #[inline]
    pub fn peek(&self) -> Option<&HeapEntry> {
        self.entries.first()
    }

    pub fn pop(&mut self) -> Option<HeapEntry> {
        if self.entries.is_empty() {
            return None;
        }
        self.remove_at(0)
    }

    /// Remove the entry for a pool index
    pub fn remove(&mut self, index: u32) -> Option<HeapEntry> {
        let pos = *self.positions.get(index as usize)?;
        if pos == NIL {
            return None;
        }
        self.remove_at(pos as usize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn remove_at(&mut self, pos: usize) -> Option<HeapEntry> {
        let last = self.entries.len() - 1;
        self.swap(pos, last);
        let removed = self.entries.pop()?;
        self.positions[removed.index as usize] = NIL;

        if pos < self.entries.len() {
            self.sift_down(pos);
            self.sift_up(pos);
        }
        Some(removed)
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.entries[pos].key() >= self.entries[parent].key() {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut smallest = pos;

            if left < len && self.entries[left].key() < self.entries[smallest].key() {
                smallest = left;
            }
            if right < len && self.entries[right].key() < self.entries[smallest].key() {
                smallest = right;
            }
            if smallest == pos {
                break;
            }
            self.swap(pos, smallest);
            pos = smallest;
        }
    }

    #[inline(always)]
    fn swap(&mut self, a: usize, b: usize) {
        self.entries.swap(a, b);
        self.positions[self.entries[a].index as usize] = a as u32;
        self.positions[self.entries[b].index as usize] = b as u32;
    }
}
