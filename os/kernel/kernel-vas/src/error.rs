use crate::WindowId;
use kernel_mmio::{MapError, PhysicalAddress};

/// Inconsistent controller geometry, detected once at bring-up.
///
/// Any of these aborts attachment of the controller; no pool is created.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("window ID width {width} exceeds the maximum of {max}")]
    InvalidIdWidth { width: u32, max: u32 },
    #[error("window ID field (shift {shift}, width {width}) does not fit a 64-bit paste address")]
    IdFieldOverflow { shift: u32, width: u32 },
    #[error(
        "inconsistent paste window and shift: IDs span 0x{required:X} bytes, region has 0x{available:X}"
    )]
    InconsistentPasteWindow { required: u64, available: u64 },
    #[error("register stride 0x{stride:X} is not a non-zero multiple of 8")]
    InvalidStride { stride: u64 },
    #[error("control region has 0x{available:X} bytes, {windows} windows need 0x{required:X}")]
    ControlRegionTooSmall {
        windows: u32,
        required: u64,
        available: u64,
    },
    #[error("context region has 0x{available:X} bytes, {windows} windows need 0x{required:X}")]
    ContextRegionTooSmall {
        windows: u32,
        required: u64,
        available: u64,
    },
    #[error("window ID resource 0x{start:X} (+0x{size:X}) does not describe a bit field")]
    InvalidIdResource { start: u64, size: u64 },
}

/// Failures of [`WindowPool::allocate`](crate::WindowPool::allocate) and
/// [`WindowPool::release`](crate::WindowPool::release).
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    /// Every ID is owned by a live window. Recoverable: retry after a release.
    #[error("all {capacity} window IDs are in use")]
    ResourceExhausted { capacity: u32 },
    /// The paste page could not be mapped. The ID has already been returned.
    #[error("failed to map paste address {pa} for window {id}")]
    MapFailure {
        id: WindowId,
        pa: PhysicalAddress,
        #[source]
        source: MapError,
    },
    /// The handle does not name a live window of this pool.
    #[error("window {id} is not live in this pool")]
    InvalidHandle { id: WindowId },
}
