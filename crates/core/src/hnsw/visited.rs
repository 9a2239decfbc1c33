//! Visited marks for graph traversal.
//!
//! A node counts as visited when its slot holds the current round number.
//! Starting a new traversal only advances the round; the slots are rewritten
//! lazily as nodes get marked again.

/// Round-stamped set of node ids, reused from one traversal to the next.
#[derive(Debug)]
pub struct VisitedSet {
    stamps: Vec<u32>,
    epoch: u32,
}

impl VisitedSet {
    /// Set with room for ids below `capacity`. Larger ids still work; the
    /// slot array grows on demand.
    pub fn new(capacity: usize) -> Self {
        Self {
            stamps: vec![0; capacity],
            epoch: 1,
        }
    }

    /// Starts a new traversal with nothing marked.
    pub fn clear(&mut self) {
        match self.epoch.checked_add(1) {
            Some(next) => self.epoch = next,
            None => {
                // Round counter exhausted: stale stamps could alias round 1.
                self.stamps.fill(0);
                self.epoch = 1;
            }
        }
    }

    /// Pre-sizes the slot array for an index holding `len` nodes.
    pub fn ensure_capacity(&mut self, len: usize) {
        if len > self.stamps.len() {
            self.stamps.resize(len, 0);
        }
    }

    /// Marks `id`; `false` means it was already marked this round.
    #[inline]
    pub fn insert(&mut self, id: u32) -> bool {
        let slot = id as usize;
        if slot >= self.stamps.len() {
            self.stamps.resize(slot + 1, 0);
        }
        let seen = self.stamps[slot] == self.epoch;
        self.stamps[slot] = self.epoch;
        !seen
    }
}

impl Default for VisitedSet {
    fn default() -> Self {
        Self::new(0)
    }
}
