mod common;

use common::{FakeMapper, FakeRegisters, geometry};
use kernel_mmio::{
    AddressSpaceMapper, CacheAttribute, MapError, PhysicalAddress, UnmapError, VirtualAddress,
};
use kernel_vas::{WindowContext, WindowError, WindowId, WindowPool};
use std::collections::BTreeSet;
use std::sync::Barrier;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// Mapper whose `unmap` parks until the test has inspected the pool.
struct GatedMapper {
    inner: FakeMapper,
    entered: Barrier,
    resume: Barrier,
}

impl GatedMapper {
    fn new() -> Self {
        Self {
            inner: FakeMapper::default(),
            entered: Barrier::new(2),
            resume: Barrier::new(2),
        }
    }
}

impl AddressSpaceMapper for GatedMapper {
    fn map(
        &self,
        pa: PhysicalAddress,
        len: u64,
        attr: CacheAttribute,
    ) -> Result<VirtualAddress, MapError> {
        self.inner.map(pa, len, attr)
    }

    fn unmap(&self, va: VirtualAddress, len: u64) -> Result<(), UnmapError> {
        self.entered.wait();
        self.resume.wait();
        self.inner.unmap(va, len)
    }
}

#[test]
fn concurrent_allocations_fill_the_pool_exactly() {
    let threads = 16;
    let (regs, mapper) = (FakeRegisters::default(), FakeMapper::default());
    let pool = WindowPool::initialize(geometry(4), &regs, &mapper).unwrap();
    let start = Barrier::new(threads);

    let windows: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let pool = &pool;
                let start = &start;
                s.spawn(move || {
                    start.wait();
                    pool.allocate(WindowContext::new(1, t as u32)).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let ids: BTreeSet<u32> = windows.iter().map(|w| w.id().as_u32()).collect();
    assert_eq!(ids, (0..16).collect::<BTreeSet<_>>());
    assert_eq!(pool.outstanding(), 16);
    assert!(matches!(
        pool.allocate(WindowContext::default()),
        Err(WindowError::ResourceExhausted { capacity: 16 })
    ));

    for w in windows {
        pool.release(w).unwrap();
    }
    assert_eq!(mapper.live_count(), 0);
}

#[test]
fn contended_churn_never_double_issues() {
    let threads = 8; // keep small for determinism
    let iters = 1_000;
    let (regs, mapper) = (FakeRegisters::default(), FakeMapper::default());
    let pool = WindowPool::initialize(geometry(2), &regs, &mapper).unwrap();
    let owned: Vec<AtomicBool> = (0..pool.capacity()).map(|_| AtomicBool::new(false)).collect();
    let start = Barrier::new(threads);

    thread::scope(|s| {
        for t in 0..threads {
            let (pool, owned, start) = (&pool, &owned, &start);
            s.spawn(move || {
                start.wait();
                let mut done = 0;
                while done < iters {
                    let w = match pool.allocate(WindowContext::new(2, t as u32)) {
                        Ok(w) => w,
                        Err(WindowError::ResourceExhausted { .. }) => {
                            thread::yield_now();
                            continue;
                        }
                        Err(e) => panic!("unexpected allocation failure: {e}"),
                    };

                    let slot = &owned[w.id().index()];
                    assert!(!slot.swap(true, Ordering::SeqCst), "{} issued twice", w.id());
                    thread::yield_now();
                    slot.store(false, Ordering::SeqCst);

                    pool.release(w).unwrap();
                    done += 1;
                }
            });
        }
    });

    assert_eq!(pool.outstanding(), 0);
    assert_eq!(mapper.live_count(), 0);
    assert!(owned.iter().all(|o| !o.load(Ordering::SeqCst)));
}

#[test]
fn id_stays_allocated_until_unmap_returns() {
    let (regs, mapper) = (FakeRegisters::default(), GatedMapper::new());
    let pool = WindowPool::initialize(geometry(0), &regs, &mapper).unwrap();
    let w = pool.allocate(WindowContext::new(1, 1)).unwrap();
    let paste = w.paste_mapped();

    thread::scope(|s| {
        let releaser = s.spawn(|| pool.release(w));

        mapper.entered.wait();
        assert!(pool.is_live(WindowId::new(0)));
        assert_eq!(pool.outstanding(), 1);
        assert!(matches!(
            pool.allocate(WindowContext::new(2, 2)),
            Err(WindowError::ResourceExhausted { capacity: 1 })
        ));
        mapper.resume.wait();

        releaser.join().unwrap().unwrap();
    });

    assert!(!pool.is_live(WindowId::new(0)));
    assert!(!mapper.inner.is_mapped(paste));
}
