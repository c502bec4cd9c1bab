//! # Memory-Mapped Register Access
//!
//! Building blocks shared by device drivers that program memory-mapped
//! registers and hand out mapped device pages:
//!
//! | Type | Role |
//! |------|------|
//! | [`PhysicalAddress`] / [`VirtualAddress`] | Distinct address kinds so bus addresses never leak into pointer arithmetic. |
//! | [`RegisterRegion`] | Opaque `(base, size)` handle for a mapped register window. |
//! | [`RegisterBackend`] | Sized reads/writes at an offset inside a region ([`MmioBackend`] for real hardware). |
//! | [`AddressSpaceMapper`] | Map/unmap physical ranges with a [`CacheAttribute`] ([`DirectMapper`] for direct-mapped kernels). |
//!
//! ```text
//!  driver ──offset──▶ RegisterBackend ──volatile──▶ RegisterRegion (VA)
//!     │
//!     └──── PA ─────▶ AddressSpaceMapper ─────────▶ VA
//! ```
//!
//! Drivers take the backend and the mapper as generic parameters, which keeps
//! their register sequences testable against in-memory fakes.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod addresses;
pub mod backend;
pub mod mapper;
mod region;

pub use addresses::{PAGE_SIZE, PhysicalAddress, VirtualAddress};
pub use backend::{AccessWidth, MmioBackend, RegisterBackend};
pub use mapper::{AddressSpaceMapper, CacheAttribute, DirectMapper, MapError, UnmapError};
pub use region::RegisterRegion;
