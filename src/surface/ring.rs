use crate::device::IonAllocator;
use crate::foundation::core::SurfaceLayout;
use crate::foundation::error::{BlitError, BlitResult};
use crate::surface::dma::DmaSurface;

/// Fixed set of identical surfaces cycled frame by frame.
///
/// With two or more surfaces, the surface a frame blits from is not the one the previous
/// frame used.
#[derive(Debug)]
pub struct SurfaceRing {
    layout: SurfaceLayout,
    surfaces: Vec<DmaSurface>,
}

impl SurfaceRing {
    /// Allocate `count` surfaces with `layout`.
    ///
    /// On failure, surfaces already allocated are released before returning.
    pub fn allocate(
        allocator: &dyn IonAllocator,
        count: usize,
        layout: SurfaceLayout,
    ) -> BlitResult<Self> {
        if count == 0 {
            return Err(BlitError::validation("surface ring needs at least one surface"));
        }

        let mut ring = Self {
            layout,
            surfaces: Vec::with_capacity(count),
        };
        for _ in 0..count {
            match DmaSurface::with_layout(allocator, layout) {
                Ok(s) => ring.surfaces.push(s),
                Err(e) => {
                    if let Err(release_err) = ring.release(allocator) {
                        tracing::warn!(error = %release_err, "cleanup after failed allocation");
                    }
                    return Err(e);
                }
            }
        }
        Ok(ring)
    }

    /// Shared surface geometry.
    pub fn layout(&self) -> &SurfaceLayout {
        &self.layout
    }

    /// Number of surfaces.
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    /// Always `false` for an allocated ring.
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Surface used for `frame`.
    pub fn get(&self, frame: u64) -> &DmaSurface {
        let i = (frame % self.surfaces.len() as u64) as usize;
        &self.surfaces[i]
    }

    /// All surfaces in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = &DmaSurface> {
        self.surfaces.iter()
    }

    /// Release every surface, newest first. Keeps going after a failure and returns the first
    /// error.
    pub fn release(mut self, allocator: &dyn IonAllocator) -> BlitResult<()> {
        let mut first_err = None;
        while let Some(surface) = self.surfaces.pop() {
            if let Err(e) = surface.release(allocator) {
                tracing::warn!(error = %e, "surface release failed");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/surface/ring.rs"]
mod tests;
