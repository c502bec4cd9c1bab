use core::fmt;
use core::ops::Add;

/// Base page size used for MMIO mappings (4 KiB).
pub const PAGE_SIZE: u64 = 4096;

/// Physical memory address (host RAM or MMIO / bus address).
///
/// A thin wrapper around `u64` that carries intent and prevents accidental
/// VA↔PA mix-ups when handing addresses between drivers and mappers.
///
/// ### Examples
/// ```rust
/// # use kernel_mmio::PhysicalAddress;
/// let pa = PhysicalAddress::new(0x0006_0300_0000_0000);
/// let next = pa.checked_add(0x1_0000).unwrap();
/// assert_eq!(next.offset_from(pa), Some(0x1_0000));
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalAddress(u64);

impl PhysicalAddress {
    #[inline]
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0)
    }

    #[inline]
    #[must_use]
    pub const fn new(v: u64) -> Self {
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Checked add of a byte offset, returning `None` on overflow.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, rhs: u64) -> Option<Self> {
        match self.0.checked_add(rhs) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Distance in bytes from `base` up to `self`, or `None` if `self < base`.
    #[inline]
    #[must_use]
    pub const fn offset_from(self, base: Self) -> Option<u64> {
        self.0.checked_sub(base.0)
    }
}

impl fmt::Debug for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PA(0x{:016X})", self.0)
    }
}

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl From<u64> for PhysicalAddress {
    #[inline]
    fn from(v: u64) -> Self {
        Self::new(v)
    }
}

/// Virtual memory address (page-table translated).
///
/// Register regions and mapped doorbells are always expressed as virtual
/// addresses; only the mapper ever sees both kinds.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VirtualAddress(u64);

impl VirtualAddress {
    #[inline]
    #[must_use]
    pub const fn new(v: u64) -> Self {
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn checked_add(self, rhs: u64) -> Option<Self> {
        match self.0.checked_add(rhs) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn offset_from(self, base: Self) -> Option<u64> {
        self.0.checked_sub(base.0)
    }

    #[inline]
    #[must_use]
    pub const fn as_ptr<T>(self) -> *const T {
        self.0 as *const T
    }

    #[inline]
    #[must_use]
    pub const fn as_mut_ptr<T>(self) -> *mut T {
        self.0 as *mut T
    }
}

impl fmt::Debug for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VA(0x{:016X})", self.0)
    }
}

impl fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl From<u64> for VirtualAddress {
    #[inline]
    fn from(v: u64) -> Self {
        Self::new(v)
    }
}

impl Add<u64> for VirtualAddress {
    type Output = Self;
    #[inline]
    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn checked_add_overflows_to_none() {
        let pa = PhysicalAddress::new(u64::MAX - 4);
        assert_eq!(pa.checked_add(4), Some(PhysicalAddress::new(u64::MAX)));
        assert_eq!(pa.checked_add(5), None);
    }

    #[test]
    fn offset_from_is_none_below_base() {
        let base = VirtualAddress::new(0x1000);
        assert_eq!(VirtualAddress::new(0x1200).offset_from(base), Some(0x200));
        assert_eq!(VirtualAddress::new(0x0FFF).offset_from(base), None);
    }

    #[test]
    fn formatting_is_zero_padded_hex() {
        let pa = PhysicalAddress::new(0xABCD);
        assert_eq!(format!("{pa}"), "0x000000000000ABCD");
        assert_eq!(format!("{pa:?}"), "PA(0x000000000000ABCD)");
        assert_eq!(format!("{:?}", VirtualAddress::new(1)), "VA(0x0000000000000001)");
    }
}
