//! # Window Pool
//!
//! [`WindowPool`] owns the ID space of one controller and turns IDs into
//! ready-to-use [`Window`]s:
//!
//! ```text
//!  allocate ─┬─ lock: take lowest free ID ─────────── IdReservation
//!            ├─ derive control / context / paste addresses
//!            ├─ write reset sequence into the control block
//!            ├─ map paste page (cacheable) ───── fail ─▶ reservation drops, ID freed
//!            └─ commit reservation ─────────────────▶ Window
//!
//!  release  ─┬─ verify handle is live in this pool
//!            ├─ unmap paste page (errors logged)
//!            └─ lock: publish ID as free
//! ```
//!
//! The lock guards only the ID bitmap. Register writes and mapper calls run
//! outside it; the ID they operate on is exclusively owned by the caller at
//! that point.

use crate::config::PASTE_MAP_LEN;
use crate::id_pool::IdPool;
use crate::registers::{ControlRegister, reset_sequence};
use crate::{ConfigError, ControllerConfig, Window, WindowContext, WindowError, WindowId};
use core::marker::PhantomData;
use kernel_mmio::{AddressSpaceMapper, CacheAttribute, RegisterBackend};
use log::{debug, error, info, trace, warn};
use spin::Mutex;

/// Window allocator of a single switchboard controller.
///
/// `WindowPool` is `Sync` whenever its backend and mapper are, so one pool
/// can serve `allocate`/`release` from any number of threads.
pub struct WindowPool<B, M> {
    config: ControllerConfig,
    backend: B,
    mapper: M,
    ids: Mutex<IdPool>,
}

impl<B, M> WindowPool<B, M>
where
    B: RegisterBackend,
    M: AddressSpaceMapper,
{
    /// Bring up the pool for a controller with geometry `config`.
    ///
    /// The regions named by `config` must already be mapped and accessible
    /// through `backend`.
    ///
    /// # Errors
    /// The [`ConfigError`] from [`ControllerConfig::validate`]; no pool is
    /// created in that case.
    pub fn initialize(config: ControllerConfig, backend: B, mapper: M) -> Result<Self, ConfigError> {
        if let Err(e) = config.validate() {
            error!("Rejecting switchboard geometry: {e}");
            return Err(e);
        }

        info!(
            "Switchboard ready: {} windows, control {:?}, context {:?}, paste {} (+0x{:X}, ID shift {})",
            config.capacity(),
            config.control(),
            config.context(),
            config.paste_base(),
            config.paste_size(),
            config.id_shift()
        );

        Ok(Self {
            ids: Mutex::new(IdPool::new(config.capacity())),
            config,
            backend,
            mapper,
        })
    }

    /// Open a window for `ctx` on the lowest free ID.
    ///
    /// The window's control block is fully reinitialized before it is
    /// returned; nothing written by a previous owner of the same ID survives.
    ///
    /// # Errors
    /// - [`WindowError::ResourceExhausted`] if every ID is in use.
    /// - [`WindowError::MapFailure`] if the paste page cannot be mapped. The
    ///   ID is back in the pool by the time this is returned.
    pub fn allocate(&self, ctx: WindowContext) -> Result<Window<'_>, WindowError> {
        let reservation = self.reserve()?;
        let id = reservation.id;

        // Reserved IDs are below capacity, which validation sized the regions for.
        let addrs = self.config.addresses_of(id);

        for (reg, value) in reset_sequence(&ctx) {
            self.backend.write64(&addrs.control, reg.offset(), value);
        }

        let paste_mapped = self
            .mapper
            .map(addrs.paste, PASTE_MAP_LEN, CacheAttribute::Cacheable)
            .map_err(|source| {
                warn!("Window {id}: mapping paste address {} failed: {source}", addrs.paste);
                WindowError::MapFailure {
                    id,
                    pa: addrs.paste,
                    source,
                }
            })?;

        let generation = reservation.commit();
        trace!(
            "Window {id} opened for LPID {} PID {}: paste {} at {paste_mapped}",
            ctx.lpid, ctx.pid, addrs.paste
        );

        Ok(Window {
            id,
            generation,
            owner: self.tag(),
            control: addrs.control,
            context: addrs.context,
            paste_physical: addrs.paste,
            paste_mapped,
            _pool: PhantomData,
        })
    }

    /// Close `window`, unmapping its paste page and returning its ID.
    ///
    /// A mapper failure during unmap is logged and otherwise ignored; the ID
    /// is still returned. The ID becomes visible to other allocators only
    /// after the unmap call has completed.
    ///
    /// # Errors
    /// [`WindowError::InvalidHandle`] if `window` was not allocated from this
    /// pool. Nothing is unmapped or freed in that case.
    pub fn release(&self, window: Window<'_>) -> Result<(), WindowError> {
        let id = window.id;
        if !self.owns(&window) {
            error!("Window {id}: release of a handle this pool does not own");
            return Err(WindowError::InvalidHandle { id });
        }

        if let Err(e) = self.mapper.unmap(window.paste_mapped, PASTE_MAP_LEN) {
            error!("Window {id}: unmapping paste page failed, possible double release: {e}");
        }

        let freed = self.ids.lock().free(id, window.generation);
        debug_assert!(freed, "window {id} vanished while being released");
        trace!("Window {id} released");
        Ok(())
    }

    /// Read a control register of `window`.
    #[must_use]
    pub fn read_control(&self, window: &Window<'_>, reg: ControlRegister) -> u64 {
        debug_assert!(self.owns(window), "window {} is not owned by this pool", window.id);
        self.backend.read64(&window.control, reg.offset())
    }

    /// Write a control register of `window`.
    pub fn write_control(&self, window: &Window<'_>, reg: ControlRegister, value: u64) {
        debug_assert!(self.owns(window), "window {} is not owned by this pool", window.id);
        self.backend.write64(&window.control, reg.offset(), value);
    }

    fn reserve(&self) -> Result<IdReservation<'_>, WindowError> {
        let allocated = self.ids.lock().alloc();
        let Some((id, generation)) = allocated else {
            let capacity = self.capacity();
            debug!("No free window IDs ({capacity} outstanding)");
            return Err(WindowError::ResourceExhausted { capacity });
        };
        Ok(IdReservation {
            ids: &self.ids,
            id,
            generation,
            committed: false,
        })
    }
}

impl<B, M> WindowPool<B, M> {
    #[must_use]
    pub const fn config(&self) -> &ControllerConfig {
        &self.config
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub const fn mapper(&self) -> &M {
        &self.mapper
    }

    /// Total number of window IDs.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.config.capacity()
    }

    /// Number of windows currently allocated.
    #[must_use]
    pub fn outstanding(&self) -> u32 {
        self.ids.lock().outstanding()
    }

    /// Whether `id` currently belongs to a live window.
    #[must_use]
    pub fn is_live(&self, id: WindowId) -> bool {
        self.ids.lock().is_allocated(id)
    }

    fn tag(&self) -> usize {
        core::ptr::from_ref(self).addr()
    }

    fn owns(&self, window: &Window<'_>) -> bool {
        window.owner == self.tag() && self.ids.lock().is_live(window.id, window.generation)
    }
}

/// An ID taken from the pool but not yet handed out as a [`Window`].
///
/// Dropping it returns the ID; [`commit`](Self::commit) keeps it allocated.
struct IdReservation<'a> {
    ids: &'a Mutex<IdPool>,
    id: WindowId,
    generation: u32,
    committed: bool,
}

impl IdReservation<'_> {
    fn commit(mut self) -> u32 {
        self.committed = true;
        self.generation
    }
}

impl Drop for IdReservation<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.ids.lock().free(self.id, self.generation);
            trace!("Window {}: reservation returned", self.id);
        }
    }
}
