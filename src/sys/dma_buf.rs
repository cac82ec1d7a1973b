use std::os::fd::BorrowedFd;

use libc::c_ulong;

use crate::device::{CacheSync, SyncAccess, SyncPhase, SyncRequest};
use crate::foundation::error::{BlitError, BlitResult};
use crate::sys::{ioctl_with, iow};

bitflags::bitflags! {
    /// `DMA_BUF_SYNC_*` flags. `START` is the absence of `END`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub(crate) struct DmaBufSyncFlags: u64 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const RW = Self::READ.bits() | Self::WRITE.bits();
        const END = 1 << 2;
    }
}

impl From<SyncRequest> for DmaBufSyncFlags {
    fn from(req: SyncRequest) -> Self {
        let access = match req.access {
            SyncAccess::Read => Self::READ,
            SyncAccess::Write => Self::WRITE,
            SyncAccess::ReadWrite => Self::RW,
        };
        match req.phase {
            SyncPhase::Start => access,
            SyncPhase::End => access | Self::END,
        }
    }
}

/// `struct dma_buf_sync`
#[repr(C)]
#[derive(Debug, Default)]
pub(crate) struct DmaBufSyncArg {
    pub(crate) flags: u64,
}

pub(crate) const DMA_BUF_IOCTL_SYNC: c_ulong = iow(b'b', 0, size_of::<DmaBufSyncArg>());

/// Cache sync through `DMA_BUF_IOCTL_SYNC` on the exported descriptor itself.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct DmaBufSync;

impl CacheSync for DmaBufSync {
    fn sync(&self, fd: BorrowedFd<'_>, request: SyncRequest) -> BlitResult<()> {
        let mut arg = DmaBufSyncArg {
            flags: DmaBufSyncFlags::from(request).bits(),
        };
        // SAFETY: `DmaBufSyncArg` mirrors `struct dma_buf_sync`.
        unsafe { ioctl_with(fd, DMA_BUF_IOCTL_SYNC, &mut arg) }
            .map_err(|source| BlitError::SyncFailed { request, source })?;
        Ok(())
    }
}
