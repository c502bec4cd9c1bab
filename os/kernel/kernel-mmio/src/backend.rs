//! # Register Backends
//!
//! A [`RegisterBackend`] performs sized reads and writes at a byte offset
//! inside a [`RegisterRegion`]. Drivers are written against the trait so the
//! same register programming sequence can drive real hardware through
//! [`MmioBackend`] or an in-memory model in tests.
//!
//! ## Example
//! ```rust
//! use kernel_mmio::{MmioBackend, RegisterBackend, RegisterRegion, VirtualAddress};
//!
//! let mut regs = [0u64; 4];
//! let region = RegisterRegion::new(
//!     VirtualAddress::new(regs.as_mut_ptr() as u64),
//!     core::mem::size_of_val(&regs) as u64,
//! );
//! // SAFETY: `region` covers `regs`, which outlives the backend.
//! let mmio = unsafe { MmioBackend::new() };
//! mmio.write64(&region, 0x10, 0xDEAD_BEEF);
//! assert_eq!(mmio.read64(&region, 0x10), 0xDEAD_BEEF);
//! ```

use crate::RegisterRegion;
use core::ptr::{read_volatile, write_volatile};

/// Width of a single register access.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum AccessWidth {
    U8,
    U16,
    U32,
    U64,
}

impl AccessWidth {
    /// Access size in bytes.
    #[inline]
    #[must_use]
    pub const fn bytes(self) -> u64 {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
            Self::U64 => 8,
        }
    }

    /// Mask selecting the low `bytes() * 8` bits of a `u64`.
    #[inline]
    #[must_use]
    pub const fn mask(self) -> u64 {
        match self {
            Self::U8 => 0xFF,
            Self::U16 => 0xFFFF,
            Self::U32 => 0xFFFF_FFFF,
            Self::U64 => u64::MAX,
        }
    }
}

/// Sized register access within a [`RegisterRegion`].
///
/// Values narrower than 64 bits are zero-extended on read and truncated on
/// write. Implementations must treat every call as a single device access of
/// exactly `width` bytes.
pub trait RegisterBackend {
    fn read(&self, region: &RegisterRegion, offset: u64, width: AccessWidth) -> u64;

    fn write(&self, region: &RegisterRegion, offset: u64, width: AccessWidth, value: u64);

    #[inline]
    fn read64(&self, region: &RegisterRegion, offset: u64) -> u64 {
        self.read(region, offset, AccessWidth::U64)
    }

    #[inline]
    fn write64(&self, region: &RegisterRegion, offset: u64, value: u64) {
        self.write(region, offset, AccessWidth::U64, value);
    }
}

impl<B: RegisterBackend + ?Sized> RegisterBackend for &B {
    #[inline]
    fn read(&self, region: &RegisterRegion, offset: u64, width: AccessWidth) -> u64 {
        (**self).read(region, offset, width)
    }

    #[inline]
    fn write(&self, region: &RegisterRegion, offset: u64, width: AccessWidth, value: u64) {
        (**self).write(region, offset, width, value);
    }
}

/// Volatile MMIO access through the current virtual address space.
///
/// Bounds and alignment are checked with `debug_assert!`; release builds
/// trust the caller's offsets.
#[derive(Debug)]
pub struct MmioBackend {
    _private: (),
}

impl MmioBackend {
    /// # Safety
    /// Every [`RegisterRegion`] later passed to this backend must describe
    /// memory that is mapped, accessible with device semantics, and valid for
    /// the duration of each access.
    #[inline]
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterBackend for MmioBackend {
    #[inline]
    fn read(&self, region: &RegisterRegion, offset: u64, width: AccessWidth) -> u64 {
        debug_assert!(
            region.contains(offset, width),
            "MMIO read of {width:?} at offset 0x{offset:X} outside {region:?}"
        );
        let addr = region.base() + offset;
        // SAFETY: constructor contract guarantees the region is mapped; offset is within bounds.
        unsafe {
            match width {
                AccessWidth::U8 => u64::from(read_volatile(addr.as_ptr::<u8>())),
                AccessWidth::U16 => u64::from(read_volatile(addr.as_ptr::<u16>())),
                AccessWidth::U32 => u64::from(read_volatile(addr.as_ptr::<u32>())),
                AccessWidth::U64 => read_volatile(addr.as_ptr::<u64>()),
            }
        }
    }

    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn write(&self, region: &RegisterRegion, offset: u64, width: AccessWidth, value: u64) {
        debug_assert!(
            region.contains(offset, width),
            "MMIO write of {width:?} at offset 0x{offset:X} outside {region:?}"
        );
        let addr = region.base() + offset;
        // SAFETY: constructor contract guarantees the region is mapped; offset is within bounds.
        unsafe {
            match width {
                AccessWidth::U8 => write_volatile(addr.as_mut_ptr::<u8>(), value as u8),
                AccessWidth::U16 => write_volatile(addr.as_mut_ptr::<u16>(), value as u16),
                AccessWidth::U32 => write_volatile(addr.as_mut_ptr::<u32>(), value as u32),
                AccessWidth::U64 => write_volatile(addr.as_mut_ptr::<u64>(), value),
            }
        }
    }
}
