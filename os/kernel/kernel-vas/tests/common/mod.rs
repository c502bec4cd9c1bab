#![allow(dead_code)]

use kernel_mmio::{
    AccessWidth, AddressSpaceMapper, CacheAttribute, MapError, PhysicalAddress, RegisterBackend,
    RegisterRegion, UnmapError, VirtualAddress,
};
use kernel_vas::{ControllerConfig, HVWC_STRIDE, UWC_STRIDE};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub const CONTROL_BASE: u64 = 0xFFFF_9000_0000_0000;
pub const CONTEXT_BASE: u64 = 0xFFFF_9000_4000_0000;
pub const PASTE_BASE: u64 = 0x0006_0300_0000_0000;
pub const PASTE_SHIFT: u32 = 16;
pub const VA_OFFSET: u64 = 0xFFFF_8000_0000_0000;

/// Geometry with `2^id_width` windows and exactly-sized regions.
pub fn geometry(id_width: u32) -> ControllerConfig {
    let windows = 1u64 << id_width;
    ControllerConfig::new(
        RegisterRegion::new(VirtualAddress::new(CONTROL_BASE), windows * HVWC_STRIDE),
        RegisterRegion::new(VirtualAddress::new(CONTEXT_BASE), windows * UWC_STRIDE),
        PhysicalAddress::new(PASTE_BASE),
        1 << (PASTE_SHIFT + id_width),
        PASTE_SHIFT,
        id_width,
    )
}

/// Register file keyed by absolute address; unwritten cells read as 0.
#[derive(Default)]
pub struct FakeRegisters {
    cells: Mutex<HashMap<u64, u64>>,
    writes: AtomicUsize,
}

impl FakeRegisters {
    pub fn peek(&self, addr: u64) -> u64 {
        self.cells.lock().unwrap().get(&addr).copied().unwrap_or(0)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl RegisterBackend for FakeRegisters {
    fn read(&self, region: &RegisterRegion, offset: u64, width: AccessWidth) -> u64 {
        assert!(region.contains(offset, width), "read outside {region:?}");
        self.peek(region.base().as_u64() + offset) & width.mask()
    }

    fn write(&self, region: &RegisterRegion, offset: u64, width: AccessWidth, value: u64) {
        assert!(region.contains(offset, width), "write outside {region:?}");
        assert_eq!(width, AccessWidth::U64, "control registers are 64 bits wide");
        self.cells
            .lock()
            .unwrap()
            .insert(region.base().as_u64() + offset, value & width.mask());
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Direct-offset mapper that tracks live mappings and can be told to fail.
#[derive(Default)]
pub struct FakeMapper {
    live: Mutex<HashSet<u64>>,
    attributes: Mutex<Vec<CacheAttribute>>,
    fail_next: AtomicBool,
}

impl FakeMapper {
    pub fn fail_next_map(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Drop a mapping behind the allocator's back.
    pub fn forget(&self, va: VirtualAddress) {
        assert!(self.live.lock().unwrap().remove(&va.as_u64()));
    }

    pub fn is_mapped(&self, va: VirtualAddress) -> bool {
        self.live.lock().unwrap().contains(&va.as_u64())
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().unwrap().len()
    }

    pub fn attributes(&self) -> Vec<CacheAttribute> {
        self.attributes.lock().unwrap().clone()
    }
}

impl AddressSpaceMapper for FakeMapper {
    fn map(
        &self,
        pa: PhysicalAddress,
        len: u64,
        attr: CacheAttribute,
    ) -> Result<VirtualAddress, MapError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(MapError::OutOfVirtualSpace { len });
        }
        self.attributes.lock().unwrap().push(attr);
        let va = VA_OFFSET.wrapping_add(pa.as_u64());
        assert!(
            self.live.lock().unwrap().insert(va),
            "paste page {pa} mapped twice"
        );
        Ok(VirtualAddress::new(va))
    }

    fn unmap(&self, va: VirtualAddress, _len: u64) -> Result<(), UnmapError> {
        if self.live.lock().unwrap().remove(&va.as_u64()) {
            Ok(())
        } else {
            Err(UnmapError::NotMapped(va))
        }
    }
}

/// `log` sink that keeps every record for later inspection.
pub struct CaptureLogger {
    records: Mutex<Vec<(Level, String)>>,
}

static LOGGER: CaptureLogger = CaptureLogger {
    records: Mutex::new(Vec::new()),
};

impl CaptureLogger {
    /// Install the capture logger; later calls are no-ops.
    pub fn install() -> &'static Self {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
        &LOGGER
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.records
            .lock()
            .unwrap()
            .iter()
            .any(|(l, msg)| *l == level && msg.contains(needle))
    }
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.records
            .lock()
            .unwrap()
            .push((record.level(), format!("{}", record.args())));
    }

    fn flush(&self) {}
}
