//! Capability traits for the three kernel subsystems, plus the context that owns them.
//!
//! Every device is reached through a trait object so the pipeline can run against real nodes
//! ([`crate::sys::LinuxDevices`]) or recording fakes ([`in_memory::InMemoryDevices`]).

use std::fmt;
use std::os::fd::{BorrowedFd, OwnedFd};

use crate::blit::session::{BlitConfig, StretchBlit};
use crate::foundation::core::Size;
use crate::foundation::error::BlitResult;

/// Device context with lazy opening and reverse-order teardown.
pub mod context;
/// Recording in-memory devices.
pub mod in_memory;

/// ION heap type id of the DMA-contiguous heap.
pub const ION_HEAP_TYPE_DMA: u32 = 4;
/// Heap mask selecting only the DMA-contiguous heap. There is no fallback heap.
pub const DMA_HEAP_MASK: u32 = 1 << ION_HEAP_TYPE_DMA;

/// Allocator-side handle of an ION buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IonHandle(pub i32);

/// Memory allocator subsystem.
pub trait IonAllocator {
    /// Allocate `len` bytes from the heaps in `heap_mask`.
    fn alloc(&self, len: usize, heap_mask: u32, flags: u32) -> BlitResult<IonHandle>;
    /// Export `handle` as a descriptor other subsystems can map or import.
    fn share(&self, handle: IonHandle) -> BlitResult<OwnedFd>;
    /// Free the allocator-side handle.
    fn free(&self, handle: IonHandle) -> BlitResult<()>;
}

/// Which side of a CPU access window a sync signal marks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncPhase {
    /// CPU access begins.
    Start,
    /// CPU access ends.
    End,
}

/// CPU access intent for a sync signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncAccess {
    /// CPU reads only.
    Read,
    /// CPU writes only.
    Write,
    /// CPU reads and writes.
    ReadWrite,
}

/// One cache-sync signal on an exported descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncRequest {
    /// Start or end of the access window.
    pub phase: SyncPhase,
    /// Access intent.
    pub access: SyncAccess,
}

impl SyncRequest {
    /// Begin a CPU write window.
    pub const START_WRITE: Self = Self {
        phase: SyncPhase::Start,
        access: SyncAccess::Write,
    };
    /// End a CPU write window.
    pub const END_WRITE: Self = Self {
        phase: SyncPhase::End,
        access: SyncAccess::Write,
    };
}

impl fmt::Display for SyncRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self.phase {
            SyncPhase::Start => "start",
            SyncPhase::End => "end",
        };
        let access = match self.access {
            SyncAccess::Read => "read",
            SyncAccess::Write => "write",
            SyncAccess::ReadWrite => "read|write",
        };
        write!(f, "{phase}/{access}")
    }
}

/// Cache-sync subsystem operating on exported descriptors.
pub trait CacheSync {
    /// Signal `request` on `fd`.
    fn sync(&self, fd: BorrowedFd<'_>, request: SyncRequest) -> BlitResult<()>;
}

/// Display output subsystem. Read-only: no mode is ever set.
pub trait OutputDevice {
    /// Geometry of the active video mode.
    fn active_mode(&self) -> BlitResult<Size>;
}

/// 2D blit engine with a configure-then-execute contract.
pub trait BlitEngine {
    /// Submit a configuration record.
    fn configure(&self, config: &BlitConfig) -> BlitResult<()>;
    /// Execute a stretch blit under the last configuration.
    fn stretch_blit(&self, request: &StretchBlit) -> BlitResult<()>;
}

/// Subsystem handles managed by a [`context::DeviceContext`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// Memory allocator.
    Allocator,
    /// Display output.
    Output,
    /// 2D blit engine.
    BlitEngine,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Allocator => "allocator",
            Self::Output => "output",
            Self::BlitEngine => "blit engine",
        })
    }
}

/// Factory for subsystem handles.
pub trait DeviceProvider {
    /// Open the memory allocator.
    fn open_allocator(&self) -> BlitResult<Box<dyn IonAllocator>>;
    /// Open the display output.
    fn open_output(&self) -> BlitResult<Box<dyn OutputDevice>>;
    /// Open the 2D blit engine.
    fn open_blit_engine(&self) -> BlitResult<Box<dyn BlitEngine>>;
    /// Cache-sync capability. It needs no device node of its own.
    fn cache_sync(&self) -> Box<dyn CacheSync>;
}
