//! DMA surfaces: allocation, export, CPU access and release.

/// A single exported DMA surface.
pub mod dma;
/// Cycled set of surfaces.
pub mod ring;
