use core::fmt;
use core::marker::PhantomData;
use kernel_mmio::{PhysicalAddress, RegisterRegion, VirtualAddress};

/// Small-integer window identifier, unique among live windows of a pool.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct WindowId(u32);

impl WindowId {
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity a window is opened for. Written verbatim into the window's
/// `LPID` / `PID` registers; otherwise opaque to the allocator.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct WindowContext {
    pub lpid: u32,
    pub pid: u32,
}

impl WindowContext {
    #[must_use]
    pub const fn new(lpid: u32, pid: u32) -> Self {
        Self { lpid, pid }
    }
}

/// A live window.
///
/// Owned exclusively by whoever allocated it and borrowed from its
/// [`WindowPool`](crate::WindowPool), so it cannot outlive the controller.
/// Neither `Clone` nor `Copy`; [`WindowPool::release`](crate::WindowPool::release)
/// consumes it.
pub struct Window<'pool> {
    pub(crate) id: WindowId,
    pub(crate) generation: u32,
    /// Address of the owning pool, stable while the pool is borrowed.
    pub(crate) owner: usize,
    pub(crate) control: RegisterRegion,
    pub(crate) context: RegisterRegion,
    pub(crate) paste_physical: PhysicalAddress,
    pub(crate) paste_mapped: VirtualAddress,
    pub(crate) _pool: PhantomData<&'pool ()>,
}

impl Window<'_> {
    #[inline]
    #[must_use]
    pub const fn id(&self) -> WindowId {
        self.id
    }

    /// Hypervisor control registers of this window.
    #[inline]
    #[must_use]
    pub const fn control_region(&self) -> RegisterRegion {
        self.control
    }

    /// User context registers of this window.
    #[inline]
    #[must_use]
    pub const fn context_region(&self) -> RegisterRegion {
        self.context
    }

    #[inline]
    #[must_use]
    pub const fn paste_physical(&self) -> PhysicalAddress {
        self.paste_physical
    }

    /// Cacheable kernel mapping of the paste page.
    #[inline]
    #[must_use]
    pub const fn paste_mapped(&self) -> VirtualAddress {
        self.paste_mapped
    }
}

impl fmt::Debug for Window<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("generation", &self.generation)
            .field("control", &self.control)
            .field("context", &self.context)
            .field("paste_physical", &self.paste_physical)
            .field("paste_mapped", &self.paste_mapped)
            .finish()
    }
}
