use std::os::fd::{AsFd as _, BorrowedFd, OwnedFd};

use crate::device::{CacheSync, DMA_HEAP_MASK, IonAllocator, IonHandle, SyncRequest};
use crate::foundation::core::SurfaceLayout;
use crate::foundation::error::{BlitError, BlitResult};
use crate::sys::mman::MappedRegion;

/// DMA-contiguous pixel buffer exported as a shareable descriptor.
///
/// The creator is the only owner. [`DmaSurface::release`] consumes the surface, so a surface
/// cannot be released twice or used after release.
#[derive(Debug)]
pub struct DmaSurface {
    layout: SurfaceLayout,
    handle: IonHandle,
    fd: OwnedFd,
}

impl DmaSurface {
    /// Allocate a `width` x `height` surface at `bits_per_pixel` from the DMA heap and export
    /// it.
    pub fn create(
        allocator: &dyn IonAllocator,
        width: u32,
        height: u32,
        bits_per_pixel: u32,
    ) -> BlitResult<Self> {
        let layout = SurfaceLayout::new(width, height, bits_per_pixel)?;
        Self::with_layout(allocator, layout)
    }

    /// Allocate and export a surface with a precomputed layout.
    pub fn with_layout(allocator: &dyn IonAllocator, layout: SurfaceLayout) -> BlitResult<Self> {
        let handle = allocator.alloc(layout.size(), DMA_HEAP_MASK, 0)?;
        let fd = match allocator.share(handle) {
            Ok(fd) => fd,
            Err(e) => {
                if let Err(free_err) = allocator.free(handle) {
                    tracing::warn!(error = %free_err, "free after failed share also failed");
                }
                return Err(e);
            }
        };

        tracing::debug!(
            width = layout.width(),
            height = layout.height(),
            stride = layout.stride(),
            size = layout.size(),
            handle = handle.0,
            "allocated dma surface"
        );
        Ok(Self { layout, handle, fd })
    }

    /// Close the exported descriptor, then free the allocator handle.
    pub fn release(self, allocator: &dyn IonAllocator) -> BlitResult<()> {
        let Self { handle, fd, .. } = self;
        drop(fd);
        allocator.free(handle)?;
        tracing::debug!(handle = handle.0, "released dma surface");
        Ok(())
    }

    /// Surface geometry.
    pub fn layout(&self) -> &SurfaceLayout {
        &self.layout
    }

    /// Allocator-side handle.
    pub fn handle(&self) -> IonHandle {
        self.handle
    }

    /// Exported descriptor.
    pub fn fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }

    /// Map the surface and run `write` over its bytes inside a write sync window.
    ///
    /// The end signal is issued even when `write` fails; `write`'s error then takes precedence.
    pub fn write_with<R>(
        &self,
        sync: &dyn CacheSync,
        write: impl FnOnce(&mut [u8]) -> BlitResult<R>,
    ) -> BlitResult<R> {
        let mut map = MappedRegion::map_shared(self.fd(), self.layout.size())
            .map_err(|source| BlitError::MapFailed { source })?;
        debug_assert_eq!(map.len(), self.layout.size());

        sync.sync(self.fd(), SyncRequest::START_WRITE)?;
        let written = write(map.as_mut_slice());
        let ended = sync.sync(self.fd(), SyncRequest::END_WRITE);

        let out = written?;
        ended?;
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/surface/dma.rs"]
mod tests;
