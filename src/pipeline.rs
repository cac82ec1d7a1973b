//! Startup, fill and frame loop wired together.

use std::time::Duration;

use crate::blit::rotation::Rotation;
use crate::blit::session::{BlitSession, PixelFormat};
use crate::device::CacheSync;
use crate::device::context::DeviceContext;
use crate::display::Display;
use crate::foundation::config::{ImageSource, RunConfig};
use crate::foundation::core::SurfaceLayout;
use crate::foundation::error::BlitResult;
use crate::frame_loop::{Clock, FrameStats, run_timed};
use crate::pixel::{RawFrame, load_raw_frame, open_raw_image};
use crate::surface::dma::DmaSurface;
use crate::surface::ring::SurfaceRing;

/// Inputs of one pipeline run.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineOpts {
    /// Source image.
    pub image: ImageSource,
    /// Output rotation.
    pub rotation: Rotation,
    /// Accumulated blit time after which the loop stops.
    pub frame_budget: Duration,
    /// Number of surfaces to cycle through.
    pub buffers: usize,
}

impl PipelineOpts {
    /// Options from a validated configuration and a rotation.
    pub fn from_config(cfg: &RunConfig, rotation: Rotation) -> Self {
        Self {
            image: cfg.image.clone(),
            rotation,
            frame_budget: cfg.frame_budget(),
            buffers: cfg.buffers,
        }
    }
}

/// Run the display pipeline against `ctx`.
///
/// Order: query the display, allocate the surfaces, fill each one from the raw image, open the
/// blit engine, then blit until the frame budget is spent. The surfaces are released whether
/// or not the later steps succeed; the first error is returned.
#[tracing::instrument(skip_all, fields(rotation = opts.rotation.degrees(), buffers = opts.buffers))]
pub fn run(
    ctx: &mut DeviceContext,
    opts: &PipelineOpts,
    clock: &mut dyn Clock,
) -> BlitResult<FrameStats> {
    let display = Display::create(ctx.output()?)?;

    let layout = SurfaceLayout::new(
        opts.image.width,
        opts.image.height,
        PixelFormat::S32Argb.bits_per_pixel(),
    )?;
    let ring = SurfaceRing::allocate(ctx.allocator()?, opts.buffers, layout)?;
    // `display` would be shadowed by the `tracing::field::display` helper inside the macro.
    let (display_width, display_height) = (display.width(), display.height());
    tracing::info!(
        display_width,
        display_height,
        stride = layout.stride(),
        size = layout.size(),
        "surfaces allocated"
    );

    let outcome = fill_and_blit(ctx, &ring, &display, opts, clock);
    let released = ctx.allocator().and_then(|a| ring.release(a));

    let stats = outcome?;
    released?;
    tracing::info!(frames = stats.frames, elapsed = ?stats.elapsed, "frame loop finished");
    Ok(stats)
}

fn fill_and_blit(
    ctx: &mut DeviceContext,
    ring: &SurfaceRing,
    display: &Display,
    opts: &PipelineOpts,
    clock: &mut dyn Clock,
) -> BlitResult<FrameStats> {
    for surface in ring.iter() {
        fill_surface(surface, ctx.cache_sync(), &opts.image)?;
    }

    let engine = ctx.blit_engine()?;
    run_timed(clock, opts.frame_budget, |frame| {
        BlitSession::new(ring.get(frame), display, opts.rotation)?.submit(engine)
    })
}

/// Load `image` into `surface`, converting pixels and honouring the surface stride.
pub fn fill_surface(
    surface: &DmaSurface,
    sync: &dyn CacheSync,
    image: &ImageSource,
) -> BlitResult<()> {
    let src = open_raw_image(&image.path, image.width, image.height)?;
    let frame = RawFrame {
        width: image.width,
        rows: image.height,
        stride: surface.layout().stride(),
    };
    surface.write_with(sync, |bytes| load_raw_frame(src, bytes, frame))
}
