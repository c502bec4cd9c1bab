//! # Controller Geometry
//!
//! A switchboard controller exposes three per-window address spaces, each
//! indexed by the same window ID:
//!
//! ```text
//!   control (HVWC)   control_base + id * control_stride      512 B per window
//!   context (UWC)    context_base + id * context_stride      4 KiB per window
//!   paste (PA)       paste_base   + (id << id_shift)         one page mapped
//! ```
//!
//! [`ControllerConfig`] captures that geometry once at attach time and is
//! read-only afterwards. [`ControllerConfig::validate`] rejects geometries in
//! which two IDs could alias the same hardware, most importantly a paste
//! region too small for the ID field (`1 << (id_shift + id_width)` bytes).

use crate::{ConfigError, WindowId};
use kernel_mmio::{PAGE_SIZE, PhysicalAddress, RegisterRegion, VirtualAddress};

/// Size of one hypervisor window-context (control) register block.
pub const HVWC_STRIDE: u64 = 512;

/// Size of one user window-context register block.
pub const UWC_STRIDE: u64 = PAGE_SIZE;

/// Bytes mapped at each window's paste address.
pub const PASTE_MAP_LEN: u64 = PAGE_SIZE;

/// Widest window ID field accepted (64 Ki windows).
pub const MAX_ID_WIDTH: u32 = 16;

/// A firmware-described bus resource `[start, start + size)`.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct BusResource {
    start: u64,
    size: u64,
}

impl BusResource {
    #[must_use]
    pub const fn new(start: u64, size: u64) -> Self {
        Self { start, size }
    }

    #[must_use]
    pub const fn start(&self) -> u64 {
        self.start
    }

    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Inclusive end, or `None` for an empty or wrapping resource.
    #[must_use]
    pub const fn end(&self) -> Option<u64> {
        if self.size == 0 {
            return None;
        }
        self.start.checked_add(self.size - 1)
    }
}

/// Resources handed to the driver when the controller is attached.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ControllerResources {
    /// Mapped hypervisor window-context registers.
    pub control: RegisterRegion,
    /// Mapped user window-context registers.
    pub context: RegisterRegion,
    /// Physical paste region (not mapped as a whole).
    pub paste: BusResource,
    /// Position of the window ID within a paste address, in MSB-0 bit
    /// numbering: bits `start..=end` counted from bit 63 downwards.
    pub window_id: BusResource,
}

/// The three per-window addresses derived from a window ID.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct WindowAddresses {
    pub control: RegisterRegion,
    pub context: RegisterRegion,
    pub paste: PhysicalAddress,
}

/// Immutable window geometry of one controller instance.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ControllerConfig {
    control: RegisterRegion,
    control_stride: u64,
    context: RegisterRegion,
    context_stride: u64,
    paste_base: PhysicalAddress,
    paste_size: u64,
    id_shift: u32,
    id_width: u32,
}

impl ControllerConfig {
    /// Geometry with the hardware's default strides ([`HVWC_STRIDE`], [`UWC_STRIDE`]).
    #[must_use]
    pub const fn new(
        control: RegisterRegion,
        context: RegisterRegion,
        paste_base: PhysicalAddress,
        paste_size: u64,
        id_shift: u32,
        id_width: u32,
    ) -> Self {
        Self {
            control,
            control_stride: HVWC_STRIDE,
            context,
            context_stride: UWC_STRIDE,
            paste_base,
            paste_size,
            id_shift,
            id_width,
        }
    }

    #[must_use]
    pub const fn with_control_stride(mut self, stride: u64) -> Self {
        self.control_stride = stride;
        self
    }

    #[must_use]
    pub const fn with_context_stride(mut self, stride: u64) -> Self {
        self.context_stride = stride;
        self
    }

    /// Decode the attach-time resources.
    ///
    /// The ID field is described as an MSB-0 bit range, so its shift is
    /// `63 - end` and its width the resource size.
    ///
    /// # Errors
    /// [`ConfigError::InvalidIdResource`] if the ID resource is empty or
    /// reaches beyond bit 63. The geometry itself is checked later by
    /// [`validate`](Self::validate).
    pub fn from_resources(res: &ControllerResources) -> Result<Self, ConfigError> {
        let invalid = ConfigError::InvalidIdResource {
            start: res.window_id.start(),
            size: res.window_id.size(),
        };
        let end = res.window_id.end().ok_or(invalid)?;
        if end > 63 {
            return Err(invalid);
        }
        let id_shift = u32::try_from(63 - end).map_err(|_| invalid)?;
        let id_width = u32::try_from(res.window_id.size()).map_err(|_| invalid)?;

        Ok(Self::new(
            res.control,
            res.context,
            PhysicalAddress::new(res.paste.start()),
            res.paste.size(),
            id_shift,
            id_width,
        ))
    }

    /// Check that every ID maps to distinct, in-bounds hardware.
    ///
    /// # Errors
    /// The first inconsistency found, as a [`ConfigError`].
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.id_width > MAX_ID_WIDTH {
            return Err(ConfigError::InvalidIdWidth {
                width: self.id_width,
                max: MAX_ID_WIDTH,
            });
        }
        let field_end = match self.id_shift.checked_add(self.id_width) {
            Some(end) if end <= 63 => end,
            _ => {
                return Err(ConfigError::IdFieldOverflow {
                    shift: self.id_shift,
                    width: self.id_width,
                });
            }
        };

        let required = 1u64 << field_end;
        if required > self.paste_size {
            return Err(ConfigError::InconsistentPasteWindow {
                required,
                available: self.paste_size,
            });
        }

        let windows = self.capacity();
        let Some(required) = stride_span(self.control_stride, windows) else {
            return Err(ConfigError::InvalidStride {
                stride: self.control_stride,
            });
        };
        if required > self.control.size() {
            return Err(ConfigError::ControlRegionTooSmall {
                windows,
                required,
                available: self.control.size(),
            });
        }

        let Some(required) = stride_span(self.context_stride, windows) else {
            return Err(ConfigError::InvalidStride {
                stride: self.context_stride,
            });
        };
        if required > self.context.size() {
            return Err(ConfigError::ContextRegionTooSmall {
                windows,
                required,
                available: self.context.size(),
            });
        }

        Ok(())
    }

    /// Number of window IDs, `2^id_width`.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        match 1u32.checked_shl(self.id_width) {
            Some(n) => n,
            None => u32::MAX,
        }
    }

    #[must_use]
    pub const fn control(&self) -> RegisterRegion {
        self.control
    }

    #[must_use]
    pub const fn control_stride(&self) -> u64 {
        self.control_stride
    }

    #[must_use]
    pub const fn context(&self) -> RegisterRegion {
        self.context
    }

    #[must_use]
    pub const fn context_stride(&self) -> u64 {
        self.context_stride
    }

    #[must_use]
    pub const fn paste_base(&self) -> PhysicalAddress {
        self.paste_base
    }

    #[must_use]
    pub const fn paste_size(&self) -> u64 {
        self.paste_size
    }

    #[must_use]
    pub const fn id_shift(&self) -> u32 {
        self.id_shift
    }

    #[must_use]
    pub const fn id_width(&self) -> u32 {
        self.id_width
    }

    /// Derive all three addresses of window `id`, or `None` if `id` is
    /// outside the ID space or the derived blocks leave their regions.
    #[must_use]
    pub const fn window_addresses(&self, id: WindowId) -> Option<WindowAddresses> {
        if id.as_u32() >= self.capacity() {
            return None;
        }
        let index = id.as_u32() as u64;
        let Some(control) = self.control.slot(index, self.control_stride) else {
            return None;
        };
        let Some(context) = self.context.slot(index, self.context_stride) else {
            return None;
        };
        let Some(paste_offset) = index.checked_shl(self.id_shift) else {
            return None;
        };
        let Some(paste) = self.paste_base.checked_add(paste_offset) else {
            return None;
        };
        Some(WindowAddresses {
            control,
            context,
            paste,
        })
    }

    /// Addresses of `id` in a geometry that passed [`validate`](Self::validate).
    ///
    /// `id` must be below [`capacity`](Self::capacity); validation then
    /// guarantees every block lies inside its region.
    pub(crate) fn addresses_of(&self, id: WindowId) -> WindowAddresses {
        debug_assert!(
            self.window_addresses(id).is_some(),
            "window {id} outside the validated geometry"
        );
        let index = u64::from(id.as_u32());
        WindowAddresses {
            control: RegisterRegion::new(
                self.control.base() + index * self.control_stride,
                self.control_stride,
            ),
            context: RegisterRegion::new(
                self.context.base() + index * self.context_stride,
                self.context_stride,
            ),
            paste: PhysicalAddress::new(self.paste_base.as_u64() + (index << self.id_shift)),
        }
    }

    /// Recover the window ID from the base of its control block.
    #[must_use]
    pub fn id_from_control(&self, va: VirtualAddress) -> Option<WindowId> {
        let offset = va.offset_from(self.control.base())?;
        self.id_from_strided(offset, self.control_stride)
    }

    /// Recover the window ID from the base of its context block.
    #[must_use]
    pub fn id_from_context(&self, va: VirtualAddress) -> Option<WindowId> {
        let offset = va.offset_from(self.context.base())?;
        self.id_from_strided(offset, self.context_stride)
    }

    /// Recover the window ID from its paste address.
    #[must_use]
    pub fn id_from_paste(&self, pa: PhysicalAddress) -> Option<WindowId> {
        let offset = pa.offset_from(self.paste_base)?;
        let low_mask = 1u64.checked_shl(self.id_shift)? - 1;
        if offset & low_mask != 0 {
            return None;
        }
        self.checked_id(offset >> self.id_shift)
    }

    fn id_from_strided(&self, offset: u64, stride: u64) -> Option<WindowId> {
        if stride == 0 || !offset.is_multiple_of(stride) {
            return None;
        }
        self.checked_id(offset / stride)
    }

    fn checked_id(&self, index: u64) -> Option<WindowId> {
        let id = u32::try_from(index).ok()?;
        (id < self.capacity()).then_some(WindowId::new(id))
    }
}

/// Bytes covered by `windows` blocks of `stride`; `None` for an unusable stride.
const fn stride_span(stride: u64, windows: u32) -> Option<u64> {
    if stride == 0 || !stride.is_multiple_of(8) {
        return None;
    }
    stride.checked_mul(windows as u64)
}
