use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::os::fd::{AsRawFd as _, BorrowedFd, OwnedFd, RawFd};
use std::os::unix::fs::FileExt as _;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::blit::session::{BlitConfig, StretchBlit};
use crate::device::{
    BlitEngine, CacheSync, DeviceKind, DeviceProvider, IonAllocator, IonHandle, OutputDevice,
    SyncPhase, SyncRequest,
};
use crate::foundation::core::Size;
use crate::foundation::error::{BlitError, BlitResult};
use crate::sys::mman::{anonymous_file, is_open_alias};

/// Operations that can be made to fail on purpose.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailPoint {
    /// Opening the given device.
    Open(DeviceKind),
    /// `IonAllocator::alloc`.
    Alloc,
    /// `IonAllocator::share`.
    Share,
    /// `IonAllocator::free`.
    Free,
    /// `CacheSync::sync` for the given phase.
    Sync(SyncPhase),
    /// `BlitEngine::configure`.
    Configure,
    /// `BlitEngine::stretch_blit`.
    StretchBlit,
}

/// Lifecycle event recorded by the in-memory devices.
///
/// Per-frame blit traffic is counted rather than logged; see
/// [`InMemoryDevices::configure_count`] and [`InMemoryDevices::blit_count`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceEvent {
    /// A device was opened.
    Opened(DeviceKind),
    /// A device was closed.
    Closed(DeviceKind),
    /// A buffer was allocated.
    Alloc {
        /// Returned handle.
        handle: IonHandle,
        /// Requested length.
        len: usize,
        /// Requested heap mask.
        heap_mask: u32,
        /// Requested flags.
        flags: u32,
    },
    /// A buffer was exported.
    Share(IonHandle),
    /// A buffer was freed.
    Free(IonHandle),
    /// A cache-sync signal was issued.
    Sync(SyncRequest),
}

#[derive(Debug, Default)]
struct State {
    events: Vec<DeviceEvent>,
    buffers: HashMap<IonHandle, File>,
    exports: HashMap<IonHandle, RawFd>,
    next_handle: i32,

    configured: bool,
    configure_count: u64,
    blit_count: u64,
    last_config: Option<BlitConfig>,
    last_blit: Option<StretchBlit>,

    failure: Option<(FailPoint, i32)>,
}

impl State {
    fn check(&self, point: FailPoint) -> io::Result<()> {
        match self.failure {
            Some((p, errno)) if p == point => Err(io::Error::from_raw_os_error(errno)),
            _ => Ok(()),
        }
    }
}

/// Device provider backed by process memory.
///
/// Buffers are anonymous memory files, so surfaces can be mapped and filled exactly as with
/// real dma-buf descriptors. Clones share the same recorded state.
/// Freeing a handle while its exported descriptor is still open fails with `EBUSY`.
#[derive(Clone, Debug)]
pub struct InMemoryDevices {
    display: Size,
    state: Arc<Mutex<State>>,
}

impl InMemoryDevices {
    /// Create devices whose output reports `display` as the active mode.
    pub fn new(display: Size) -> Self {
        Self {
            display,
            state: Arc::new(Mutex::new(State {
                next_handle: 1,
                ..State::default()
            })),
        }
    }

    /// Make `point` fail with `errno` from now on.
    pub fn fail_at(&self, point: FailPoint, errno: i32) {
        lock(&self.state).failure = Some((point, errno));
    }

    /// Remove any configured failure.
    pub fn clear_failure(&self) {
        lock(&self.state).failure = None;
    }

    /// Recorded lifecycle events in order.
    pub fn events(&self) -> Vec<DeviceEvent> {
        lock(&self.state).events.clone()
    }

    /// Number of accepted `configure` calls.
    pub fn configure_count(&self) -> u64 {
        lock(&self.state).configure_count
    }

    /// Number of executed stretch blits.
    pub fn blit_count(&self) -> u64 {
        lock(&self.state).blit_count
    }

    /// Most recent accepted configuration.
    pub fn last_config(&self) -> Option<BlitConfig> {
        lock(&self.state).last_config.clone()
    }

    /// Most recent executed stretch blit.
    pub fn last_blit(&self) -> Option<StretchBlit> {
        lock(&self.state).last_blit
    }

    /// Handles allocated and not yet freed.
    pub fn live_handles(&self) -> Vec<IonHandle> {
        let mut handles: Vec<_> = lock(&self.state).buffers.keys().copied().collect();
        handles.sort_by_key(|h| h.0);
        handles
    }

    /// Current contents of a live buffer.
    pub fn buffer_bytes(&self, handle: IonHandle) -> Option<Vec<u8>> {
        let state = lock(&self.state);
        let file = state.buffers.get(&handle)?;
        let len = file.metadata().ok()?.len() as usize;
        let mut out = vec![0u8; len];
        file.read_exact_at(&mut out, 0).ok()?;
        Some(out)
    }

    fn open(&self, kind: DeviceKind) -> BlitResult<()> {
        let mut state = lock(&self.state);
        state
            .check(FailPoint::Open(kind))
            .map_err(|e| BlitError::resource_unavailable(format!("in-memory {kind}"), e))?;
        state.events.push(DeviceEvent::Opened(kind));
        Ok(())
    }
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DeviceProvider for InMemoryDevices {
    fn open_allocator(&self) -> BlitResult<Box<dyn IonAllocator>> {
        self.open(DeviceKind::Allocator)?;
        Ok(Box::new(InMemoryAllocator {
            state: self.state.clone(),
        }))
    }

    fn open_output(&self) -> BlitResult<Box<dyn OutputDevice>> {
        self.open(DeviceKind::Output)?;
        Ok(Box::new(InMemoryOutput {
            display: self.display,
            state: self.state.clone(),
        }))
    }

    fn open_blit_engine(&self) -> BlitResult<Box<dyn BlitEngine>> {
        self.open(DeviceKind::BlitEngine)?;
        Ok(Box::new(InMemoryBlitEngine {
            state: self.state.clone(),
        }))
    }

    fn cache_sync(&self) -> Box<dyn CacheSync> {
        Box::new(InMemorySync {
            state: self.state.clone(),
        })
    }
}

struct InMemoryAllocator {
    state: Arc<Mutex<State>>,
}

impl IonAllocator for InMemoryAllocator {
    fn alloc(&self, len: usize, heap_mask: u32, flags: u32) -> BlitResult<IonHandle> {
        let mut state = lock(&self.state);
        state
            .check(FailPoint::Alloc)
            .map_err(|e| BlitError::allocation("alloc", e))?;
        if len == 0 {
            return Err(BlitError::allocation(
                "alloc",
                io::Error::from_raw_os_error(libc::EINVAL),
            ));
        }

        let file = anonymous_file("ionblit-in-memory", len as u64)
            .map_err(|e| BlitError::allocation("alloc", e))?;
        let handle = IonHandle(state.next_handle);
        state.next_handle += 1;
        state.buffers.insert(handle, file);
        state.events.push(DeviceEvent::Alloc {
            handle,
            len,
            heap_mask,
            flags,
        });
        Ok(handle)
    }

    fn share(&self, handle: IonHandle) -> BlitResult<OwnedFd> {
        let mut state = lock(&self.state);
        state
            .check(FailPoint::Share)
            .map_err(|e| BlitError::allocation("share", e))?;
        let file = state
            .buffers
            .get(&handle)
            .ok_or_else(|| {
                BlitError::allocation("share", io::Error::from_raw_os_error(libc::EINVAL))
            })?
            .try_clone()
            .map_err(|e| BlitError::allocation("share", e))?;
        let fd = OwnedFd::from(file);
        state.exports.insert(handle, fd.as_raw_fd());
        state.events.push(DeviceEvent::Share(handle));
        Ok(fd)
    }

    fn free(&self, handle: IonHandle) -> BlitResult<()> {
        let mut state = lock(&self.state);
        state
            .check(FailPoint::Free)
            .map_err(|e| BlitError::allocation("free", e))?;
        let Some(file) = state.buffers.get(&handle) else {
            return Err(BlitError::allocation(
                "free",
                io::Error::from_raw_os_error(libc::EINVAL),
            ));
        };
        // The exported descriptor must be closed before its handle goes away.
        if let Some(&fd) = state.exports.get(&handle)
            && is_open_alias(fd, file)
        {
            return Err(BlitError::allocation(
                "free",
                io::Error::from_raw_os_error(libc::EBUSY),
            ));
        }
        state.buffers.remove(&handle);
        state.exports.remove(&handle);
        state.events.push(DeviceEvent::Free(handle));
        Ok(())
    }
}

impl Drop for InMemoryAllocator {
    fn drop(&mut self) {
        lock(&self.state)
            .events
            .push(DeviceEvent::Closed(DeviceKind::Allocator));
    }
}

struct InMemoryOutput {
    display: Size,
    state: Arc<Mutex<State>>,
}

impl OutputDevice for InMemoryOutput {
    fn active_mode(&self) -> BlitResult<Size> {
        Ok(self.display)
    }
}

impl Drop for InMemoryOutput {
    fn drop(&mut self) {
        lock(&self.state)
            .events
            .push(DeviceEvent::Closed(DeviceKind::Output));
    }
}

struct InMemoryBlitEngine {
    state: Arc<Mutex<State>>,
}

impl BlitEngine for InMemoryBlitEngine {
    fn configure(&self, config: &BlitConfig) -> BlitResult<()> {
        let mut state = lock(&self.state);
        state
            .check(FailPoint::Configure)
            .map_err(|source| BlitError::BlitConfigFailed { source })?;
        state.configured = true;
        state.configure_count += 1;
        state.last_config = Some(config.clone());
        Ok(())
    }

    fn stretch_blit(&self, request: &StretchBlit) -> BlitResult<()> {
        let mut state = lock(&self.state);
        state
            .check(FailPoint::StretchBlit)
            .map_err(|source| BlitError::BlitExecFailed { source })?;
        if !state.configured {
            return Err(BlitError::BlitExecFailed {
                source: io::Error::from_raw_os_error(libc::EINVAL),
            });
        }
        state.blit_count += 1;
        state.last_blit = Some(*request);
        Ok(())
    }
}

impl Drop for InMemoryBlitEngine {
    fn drop(&mut self) {
        lock(&self.state)
            .events
            .push(DeviceEvent::Closed(DeviceKind::BlitEngine));
    }
}

struct InMemorySync {
    state: Arc<Mutex<State>>,
}

impl CacheSync for InMemorySync {
    fn sync(&self, _fd: BorrowedFd<'_>, request: SyncRequest) -> BlitResult<()> {
        let mut state = lock(&self.state);
        state
            .check(FailPoint::Sync(request.phase))
            .map_err(|source| BlitError::SyncFailed { request, source })?;
        state.events.push(DeviceEvent::Sync(request));
        Ok(())
    }
}
