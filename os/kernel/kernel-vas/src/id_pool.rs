//! Bitmap-backed window ID set with lowest-available allocation.

use crate::WindowId;
use alloc::vec;
use alloc::vec::Vec;

const BITS: usize = u64::BITS as usize;

/// Free/used tracking for `capacity` window IDs.
///
/// # Invariants
/// - Bit `id` of `in_use` is set iff `id` is owned by a live window.
/// - Bits at or beyond `capacity` in the last word are permanently set, so
///   the scan never hands them out.
/// - No word below `hint` has a clear bit.
/// - `generations[id]` changes on every allocation of `id`.
pub(crate) struct IdPool {
    in_use: Vec<u64>,
    generations: Vec<u32>,
    capacity: u32,
    outstanding: u32,
    hint: usize,
}

impl IdPool {
    pub(crate) fn new(capacity: u32) -> Self {
        let ids = capacity as usize;
        let mut in_use = vec![0u64; ids.div_ceil(BITS)];
        let tail = ids % BITS;
        if tail != 0
            && let Some(last) = in_use.last_mut()
        {
            *last = !((1u64 << tail) - 1);
        }
        Self {
            in_use,
            generations: vec![0; ids],
            capacity,
            outstanding: 0,
            hint: 0,
        }
    }

    pub(crate) const fn outstanding(&self) -> u32 {
        self.outstanding
    }

    /// Take the lowest free ID and stamp it with a fresh generation.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn alloc(&mut self) -> Option<(WindowId, u32)> {
        for (index, word) in self.in_use.iter_mut().enumerate().skip(self.hint) {
            if *word == u64::MAX {
                continue;
            }
            let bit = word.trailing_ones() as usize;
            *word |= 1 << bit;
            self.hint = index;

            let slot = index * BITS + bit;
            let generation = self.generations[slot].wrapping_add(1);
            self.generations[slot] = generation;
            self.outstanding += 1;
            return Some((WindowId::new(slot as u32), generation));
        }
        self.hint = self.in_use.len();
        None
    }

    /// Return `id` if it is live with `generation`; `false` leaves the set untouched.
    pub(crate) fn free(&mut self, id: WindowId, generation: u32) -> bool {
        if !self.is_live(id, generation) {
            return false;
        }
        let (index, mask) = Self::locate(id);
        self.in_use[index] &= !mask;
        self.hint = self.hint.min(index);
        self.outstanding -= 1;
        true
    }

    pub(crate) fn is_allocated(&self, id: WindowId) -> bool {
        if id.as_u32() >= self.capacity {
            return false;
        }
        let (index, mask) = Self::locate(id);
        self.in_use[index] & mask != 0
    }

    pub(crate) fn is_live(&self, id: WindowId, generation: u32) -> bool {
        self.is_allocated(id) && self.generations[id.index()] == generation
    }

    const fn locate(id: WindowId) -> (usize, u64) {
        let slot = id.index();
        (slot / BITS, 1 << (slot % BITS))
    }
}
