//! # Virtual Accelerator Switchboard Windows
//!
//! A switchboard multiplexes hardware accelerators between partitions and
//! processes through *windows*: small-integer IDs that each select a
//! hypervisor control block, a user context block, and a physical paste
//! (doorbell) address. This crate allocates those windows.
//!
//! ## Address Spaces
//!
//! All three address spaces are derived from the same ID and therefore move
//! in lock-step:
//!
//! ```text
//!            id = 3
//!              │
//!   ┌──────────┼──────────────────────────┬─────────────────────────────┐
//!   ▼          ▼                          ▼                             ▼
//! control   base + 3 × 512          context  base + 3 × 4096      paste  base + (3 << shift)
//! (HVWC)    reset on allocate       (UWC)    for the caller       (PA)   mapped cacheable
//! ```
//!
//! ## Core Components
//!
//! * [`ControllerConfig`]: validated, immutable geometry of one controller
//!   ([`config`]).
//! * [`WindowPool`]: lowest-available IDs behind a spin lock,
//!   register reset, paste mapping, release ([`pool`]).
//! * [`ControlRegister`] / [`XlateLpcr`]: the control block register map
//!   ([`registers`]).
//! * [`Window`]: a live window handle, borrowed from its pool.
//!
//! Register access and paste mapping go through the
//! [`RegisterBackend`](kernel_mmio::RegisterBackend) and
//! [`AddressSpaceMapper`](kernel_mmio::AddressSpaceMapper) traits from
//! `kernel-mmio`, so the pool can run against real MMIO or in-memory fakes.
//!
//! ## Example
//! ```rust
//! use kernel_mmio::{CacheAttribute, DirectMapper, MmioBackend, PhysicalAddress, RegisterRegion, VirtualAddress};
//! use kernel_vas::{ControlRegister, ControllerConfig, WindowContext, WindowPool};
//!
//! let mut hvwc = vec![0u64; 16 * 512 / 8];
//! let control = RegisterRegion::new(VirtualAddress::new(hvwc.as_mut_ptr() as u64), 16 * 512);
//! let context = RegisterRegion::new(VirtualAddress::new(0xFFFF_9000_0000_0000), 16 * 4096);
//! let config = ControllerConfig::new(control, context, PhysicalAddress::new(0x6_0000_0000), 1 << 20, 16, 4);
//!
//! // SAFETY: `control` covers `hvwc`; context registers are never touched here.
//! let backend = unsafe { MmioBackend::new() };
//! let mapper = DirectMapper::new(0xFFFF_8000_0000_0000, CacheAttribute::Cacheable);
//! let pool = WindowPool::initialize(config, backend, mapper).unwrap();
//!
//! let window = pool.allocate(WindowContext::new(1, 100)).unwrap();
//! assert_eq!(window.id().as_u32(), 0);
//! assert_eq!(pool.read_control(&window, ControlRegister::Pid), 100);
//! pool.release(window).unwrap();
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

pub mod config;
mod error;
mod id_pool;
pub mod pool;
pub mod registers;
mod window;

pub use config::{
    BusResource, ControllerConfig, ControllerResources, HVWC_STRIDE, MAX_ID_WIDTH, PASTE_MAP_LEN,
    UWC_STRIDE, WindowAddresses,
};
pub use error::{ConfigError, WindowError};
pub use pool::WindowPool;
pub use registers::{ControlRegister, XlateLpcr, XlatePageSize};
pub use window::{Window, WindowContext, WindowId};
