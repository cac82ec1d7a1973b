//! ionblit displays an image through a zero-copy DMA pipeline on Amlogic-class SoCs.
//!
//! A buffer is allocated from the ION DMA heap, exported as a dma-buf descriptor, filled by
//! the CPU inside explicit cache-sync windows, and blitted every frame to the framebuffer by
//! the GE2D engine with one of four rotations.
//!
//! - Build a [`DeviceContext`] from a [`DeviceProvider`] ([`LinuxDevices`] or
//!   [`InMemoryDevices`])
//! - Create a [`Display`] and one or more [`DmaSurface`]s
//! - Submit a [`BlitSession`] per frame, or drive everything with [`pipeline::run`]
#![deny(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Blit sessions and rotation.
pub mod blit;
/// Device capability traits, context and in-memory devices.
pub mod device;
/// Output geometry.
pub mod display;
/// Time-budgeted frame loop.
pub mod frame_loop;
/// End-to-end pipeline.
pub mod pipeline;
/// Raw pixel loading and conversion.
pub mod pixel;
/// DMA surfaces.
pub mod surface;
/// Kernel bindings and the Linux device provider.
pub mod sys;

pub use crate::foundation::config::{
    BackendChoice, CONFIG_ENV, DevicePaths, ImageSource, InMemoryConfig, RunConfig,
};
pub use crate::foundation::core::{Rect, STRIDE_ALIGN, Size, SurfaceLayout, align_up};
pub use crate::foundation::error::{BlitError, BlitResult};

pub use crate::blit::rotation::{Rotation, RotationFlags, flags_for_index};
pub use crate::blit::session::{BlitConfig, BlitSession, StretchBlit};
pub use crate::device::context::DeviceContext;
pub use crate::device::in_memory::{DeviceEvent, FailPoint, InMemoryDevices};
pub use crate::device::{
    BlitEngine, CacheSync, DeviceKind, DeviceProvider, IonAllocator, IonHandle, OutputDevice,
    SyncRequest,
};
pub use crate::display::Display;
pub use crate::frame_loop::{Clock, FrameStats, MonotonicClock, run_timed};
pub use crate::pipeline::PipelineOpts;
pub use crate::surface::dma::DmaSurface;
pub use crate::surface::ring::SurfaceRing;
pub use crate::sys::LinuxDevices;
