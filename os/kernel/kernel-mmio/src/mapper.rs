//! # Address-Space Mappers
//!
//! An [`AddressSpaceMapper`] makes a physical range reachable from the
//! current virtual address space with a given caching attribute and tears
//! that mapping down again. Drivers that hand out doorbell or paste pages
//! depend only on this trait; the kernel decides whether a mapping means new
//! page-table entries, a slot in a fixed MMIO window, or simply an offset
//! into a direct map.
//!
//! [`DirectMapper`] implements the last strategy: with a higher-half direct
//! map every physical address is already visible at `offset + pa`, so mapping
//! is pure arithmetic.

use crate::{PhysicalAddress, VirtualAddress};

/// Memory type requested for a mapping.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum CacheAttribute {
    /// Normal write-back cacheable memory.
    Cacheable,
    /// Strongly ordered device memory.
    Uncacheable,
    WriteCombining,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("physical range {pa} (+0x{len:X}) cannot be mapped")]
    InvalidRange { pa: PhysicalAddress, len: u64 },
    #[error("no virtual address space left for 0x{len:X} bytes")]
    OutOfVirtualSpace { len: u64 },
    #[error("caching attribute {0:?} is not supported by this mapper")]
    UnsupportedAttribute(CacheAttribute),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnmapError {
    #[error("{0} is not mapped")]
    NotMapped(VirtualAddress),
    #[error("length 0x{len:X} does not match the mapping at {va}")]
    LengthMismatch { va: VirtualAddress, len: u64 },
}

/// Establishes and removes virtual mappings of physical ranges.
pub trait AddressSpaceMapper {
    /// Map `[pa, pa + len)` with caching attribute `attr`.
    ///
    /// # Errors
    /// Returns a [`MapError`] if the range or attribute cannot be honored.
    fn map(
        &self,
        pa: PhysicalAddress,
        len: u64,
        attr: CacheAttribute,
    ) -> Result<VirtualAddress, MapError>;

    /// Remove a mapping previously returned by [`map`](Self::map).
    ///
    /// # Errors
    /// Returns an [`UnmapError`] if `va` is not a live mapping of `len` bytes.
    fn unmap(&self, va: VirtualAddress, len: u64) -> Result<(), UnmapError>;
}

impl<M: AddressSpaceMapper + ?Sized> AddressSpaceMapper for &M {
    #[inline]
    fn map(
        &self,
        pa: PhysicalAddress,
        len: u64,
        attr: CacheAttribute,
    ) -> Result<VirtualAddress, MapError> {
        (**self).map(pa, len, attr)
    }

    #[inline]
    fn unmap(&self, va: VirtualAddress, len: u64) -> Result<(), UnmapError> {
        (**self).unmap(va, len)
    }
}

/// [`AddressSpaceMapper`] for kernels with a direct map of physical memory.
///
/// Physical address `pa` is visible at `offset + pa` with the single caching
/// attribute the direct map was built with. Nothing is allocated, so `unmap`
/// only verifies that the address lies inside the direct map.
///
/// # Example
/// ```rust
/// use kernel_mmio::{AddressSpaceMapper, CacheAttribute, DirectMapper, PhysicalAddress};
///
/// let mapper = DirectMapper::new(0xFFFF_8000_0000_0000, CacheAttribute::Cacheable);
/// let va = mapper
///     .map(PhysicalAddress::new(0x1234_0000), 4096, CacheAttribute::Cacheable)
///     .unwrap();
/// assert_eq!(va.as_u64(), 0xFFFF_8000_1234_0000);
/// mapper.unmap(va, 4096).unwrap();
/// ```
#[derive(Debug, Copy, Clone)]
pub struct DirectMapper {
    offset: u64,
    attribute: CacheAttribute,
}

impl DirectMapper {
    #[must_use]
    pub const fn new(offset: u64, attribute: CacheAttribute) -> Self {
        Self { offset, attribute }
    }

    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }
}

impl AddressSpaceMapper for DirectMapper {
    fn map(
        &self,
        pa: PhysicalAddress,
        len: u64,
        attr: CacheAttribute,
    ) -> Result<VirtualAddress, MapError> {
        if attr != self.attribute {
            return Err(MapError::UnsupportedAttribute(attr));
        }
        if len == 0 || pa.checked_add(len).is_none() {
            return Err(MapError::InvalidRange { pa, len });
        }
        let va = self
            .offset
            .checked_add(pa.as_u64())
            .and_then(|start| start.checked_add(len).map(|_| start))
            .ok_or(MapError::OutOfVirtualSpace { len })?;

        log::trace!("direct map {pa} (+0x{len:X}) at 0x{va:016X}");
        Ok(VirtualAddress::new(va))
    }

    fn unmap(&self, va: VirtualAddress, len: u64) -> Result<(), UnmapError> {
        if va.as_u64() < self.offset {
            return Err(UnmapError::NotMapped(va));
        }
        if len == 0 || va.checked_add(len).is_none() {
            return Err(UnmapError::LengthMismatch { va, len });
        }
        Ok(())
    }
}
