use super::*;
use crate::device::in_memory::{DeviceEvent, FailPoint, InMemoryDevices};
use crate::device::{DeviceKind, DeviceProvider as _, SyncPhase};
use crate::foundation::core::Size;

fn devices() -> (InMemoryDevices, Box<dyn IonAllocator>, Box<dyn CacheSync>) {
    let devs = InMemoryDevices::new(Size::new(640, 480));
    let alloc = devs.open_allocator().unwrap();
    let sync = devs.cache_sync();
    (devs, alloc, sync)
}

#[test]
fn create_allocates_from_dma_heap_and_exports() {
    let (devs, alloc, _) = devices();
    let surface = DmaSurface::create(alloc.as_ref(), 600, 504, 32).unwrap();

    assert_eq!(surface.layout().stride(), 2432);
    assert_eq!(surface.layout().size(), 1_225_728);
    let handle = surface.handle();
    assert_eq!(
        &devs.events()[1..],
        &[
            DeviceEvent::Alloc {
                handle,
                len: 1_225_728,
                heap_mask: 0x10,
                flags: 0,
            },
            DeviceEvent::Share(handle),
        ]
    );
    assert_eq!(devs.buffer_bytes(handle).map(|b| b.len()), Some(1_225_728));

    surface.release(alloc.as_ref()).unwrap();
    assert!(devs.live_handles().is_empty());
    assert_eq!(devs.events().last(), Some(&DeviceEvent::Free(handle)));
}

#[test]
fn invalid_geometry_never_reaches_allocator() {
    let (devs, alloc, _) = devices();
    assert!(DmaSurface::create(alloc.as_ref(), 0, 10, 32).is_err());
    assert!(DmaSurface::create(alloc.as_ref(), 10, 10, 7).is_err());
    assert_eq!(devs.events(), vec![DeviceEvent::Opened(DeviceKind::Allocator)]);
}

#[test]
fn allocator_refusal_is_allocation_failed() {
    let (devs, alloc, _) = devices();
    devs.fail_at(FailPoint::Alloc, libc::ENOMEM);
    let err = DmaSurface::create(alloc.as_ref(), 64, 64, 32).unwrap_err();
    assert!(matches!(err, BlitError::AllocationFailed { op: "alloc", .. }));
    assert!(devs.live_handles().is_empty());
}

#[test]
fn failed_export_frees_the_handle() {
    let (devs, alloc, _) = devices();
    devs.fail_at(FailPoint::Share, libc::EMFILE);
    let err = DmaSurface::create(alloc.as_ref(), 64, 64, 32).unwrap_err();
    assert!(matches!(err, BlitError::AllocationFailed { op: "share", .. }));
    assert!(devs.live_handles().is_empty());
    assert!(matches!(devs.events().last(), Some(DeviceEvent::Free(_))));
}

#[test]
fn write_is_bracketed_by_sync_signals() {
    let (devs, alloc, sync) = devices();
    let surface = DmaSurface::create(alloc.as_ref(), 16, 2, 32).unwrap();

    let n = surface
        .write_with(sync.as_ref(), |bytes| {
            bytes[0] = 0xAB;
            Ok(bytes.len())
        })
        .unwrap();
    assert_eq!(n, surface.layout().size());

    let events = devs.events();
    let tail = &events[events.len() - 2..];
    assert_eq!(
        tail,
        &[
            DeviceEvent::Sync(SyncRequest::START_WRITE),
            DeviceEvent::Sync(SyncRequest::END_WRITE),
        ]
    );
    assert_eq!(devs.buffer_bytes(surface.handle()).unwrap()[0], 0xAB);
    surface.release(alloc.as_ref()).unwrap();
}

#[test]
fn end_signal_follows_a_failed_write() {
    let (devs, alloc, sync) = devices();
    let surface = DmaSurface::create(alloc.as_ref(), 16, 2, 32).unwrap();

    let err = surface
        .write_with(sync.as_ref(), |_| -> BlitResult<()> {
            Err(BlitError::validation("bad frame"))
        })
        .unwrap_err();
    assert!(matches!(err, BlitError::Validation(_)));
    assert_eq!(
        devs.events().last(),
        Some(&DeviceEvent::Sync(SyncRequest::END_WRITE))
    );
    surface.release(alloc.as_ref()).unwrap();
}

#[test]
fn failed_start_signal_skips_the_write() {
    let (devs, alloc, sync) = devices();
    let surface = DmaSurface::create(alloc.as_ref(), 16, 2, 32).unwrap();
    devs.fail_at(FailPoint::Sync(SyncPhase::Start), libc::EIO);

    let mut called = false;
    let err = surface
        .write_with(sync.as_ref(), |_| {
            called = true;
            Ok(())
        })
        .unwrap_err();
    assert!(matches!(err, BlitError::SyncFailed { .. }));
    assert!(!called);

    devs.clear_failure();
    surface.release(alloc.as_ref()).unwrap();
}

#[test]
fn failed_end_signal_is_reported_after_successful_write() {
    let (devs, alloc, sync) = devices();
    let surface = DmaSurface::create(alloc.as_ref(), 16, 2, 32).unwrap();
    devs.fail_at(FailPoint::Sync(SyncPhase::End), libc::EIO);

    let err = surface.write_with(sync.as_ref(), |_| Ok(())).unwrap_err();
    assert!(matches!(
        err,
        BlitError::SyncFailed {
            request: SyncRequest::END_WRITE,
            ..
        }
    ));

    devs.clear_failure();
    surface.release(alloc.as_ref()).unwrap();
}

#[test]
fn release_reports_allocator_refusal() {
    let (devs, alloc, _) = devices();
    let surface = DmaSurface::create(alloc.as_ref(), 16, 2, 32).unwrap();
    let handle = surface.handle();
    devs.fail_at(FailPoint::Free, libc::EINVAL);

    let err = surface.release(alloc.as_ref()).unwrap_err();
    assert!(matches!(err, BlitError::AllocationFailed { op: "free", .. }));
    assert_eq!(devs.live_handles(), vec![handle]);
}

#[test]
fn handle_stays_allocated_while_descriptor_is_open() {
    let (devs, alloc, _) = devices();
    let surface = DmaSurface::create(alloc.as_ref(), 16, 2, 32).unwrap();
    let handle = surface.handle();

    let err = alloc.free(handle).unwrap_err();
    match err {
        BlitError::AllocationFailed { op, source } => {
            assert_eq!(op, "free");
            assert_eq!(source.raw_os_error(), Some(libc::EBUSY));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(devs.live_handles(), vec![handle]);

    surface.release(alloc.as_ref()).unwrap();
    assert!(devs.live_handles().is_empty());
    assert_eq!(devs.events().last(), Some(&DeviceEvent::Free(handle)));
}
