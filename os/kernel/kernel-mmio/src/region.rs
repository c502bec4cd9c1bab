//! Opaque register region handles.
//!
//! A [`RegisterRegion`] names a window of mapped device memory by its base
//! and size. It never dereferences anything itself; all access goes through a
//! [`RegisterBackend`](crate::RegisterBackend), which receives the region plus
//! a byte offset and can therefore bounds-check every access.

use crate::{AccessWidth, VirtualAddress};
use core::fmt;

/// A mapped register window `[base, base + size)`.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct RegisterRegion {
    base: VirtualAddress,
    size: u64,
}

impl RegisterRegion {
    #[inline]
    #[must_use]
    pub const fn new(base: VirtualAddress, size: u64) -> Self {
        Self { base, size }
    }

    #[inline]
    #[must_use]
    pub const fn base(&self) -> VirtualAddress {
        self.base
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Whether an access of `width` at `offset` lies fully inside the region
    /// and is naturally aligned.
    #[inline]
    #[must_use]
    pub const fn contains(&self, offset: u64, width: AccessWidth) -> bool {
        let bytes = width.bytes();
        match offset.checked_add(bytes) {
            Some(end) => end <= self.size && offset.is_multiple_of(bytes),
            None => false,
        }
    }

    /// A subregion of `size` bytes starting at `offset`, or `None` if it would
    /// exceed the parent's bounds.
    #[inline]
    #[must_use]
    pub const fn subregion(&self, offset: u64, size: u64) -> Option<Self> {
        let Some(end) = offset.checked_add(size) else {
            return None;
        };
        if end > self.size {
            return None;
        }
        match self.base.checked_add(offset) {
            Some(base) => Some(Self { base, size }),
            None => None,
        }
    }

    /// The `index`-th block of a table of `stride`-sized blocks laid out from
    /// the start of this region.
    #[inline]
    #[must_use]
    pub const fn slot(&self, index: u64, stride: u64) -> Option<Self> {
        match index.checked_mul(stride) {
            Some(offset) => self.subregion(offset, stride),
            None => None,
        }
    }
}

impl fmt::Debug for RegisterRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegisterRegion({}+0x{:X})", self.base, self.size)
    }
}
