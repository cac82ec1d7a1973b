use std::os::fd::{AsRawFd as _, RawFd};

use crate::blit::rotation::Rotation;
use crate::device::BlitEngine;
use crate::display::Display;
use crate::foundation::core::Rect;
use crate::foundation::error::{BlitError, BlitResult};
use crate::surface::dma::DmaSurface;

/// Fully opaque constant alpha/colour operand.
pub const OPAQUE_CONST_COLOR: u32 = 0xffff_ffff;

/// Memory class of a blit endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MemType {
    /// OSD layer 0, the visible output canvas.
    Osd0 = 0,
    /// OSD layer 1.
    Osd1 = 1,
    /// Caller-allocated memory passed by descriptor.
    Alloc = 2,
}

/// Pixel formats understood by this blit path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 32-bit ARGB, one pixel per `u32`.
    S32Argb,
}

impl PixelFormat {
    /// Engine format code.
    pub fn ge2d_code(self) -> i32 {
        match self {
            // GE2D_FMT_S32_RGBA | GE2D_COLOR_MAP_ARGB8888
            Self::S32Argb => 0x0010_0300,
        }
    }

    /// Bits per pixel.
    pub fn bits_per_pixel(self) -> u32 {
        match self {
            Self::S32Argb => 32,
        }
    }
}

/// Geometry and flags of one blit endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceParams {
    /// Memory class.
    pub mem_type: MemType,
    /// Pixel format.
    pub format: PixelFormat,
    /// Active rectangle.
    pub rect: Rect,
    /// Reverse the x axis.
    pub x_rev: bool,
    /// Reverse the y axis.
    pub y_rev: bool,
}

/// Source memory plane passed by descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourcePlane {
    /// Exported descriptor of the source surface.
    pub fd: RawFd,
    /// Row pitch in pixels (`stride / bytes_per_pixel`), so stride padding is skipped.
    pub row_pixels: u32,
    /// Number of rows.
    pub rows: u32,
}

/// Configuration record for the configure phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlitConfig {
    /// Source endpoint.
    pub src: SurfaceParams,
    /// Destination endpoint.
    pub dst: SurfaceParams,
    /// Swap destination axes.
    pub dst_xy_swap: bool,
    /// Source memory plane.
    pub src_plane: SourcePlane,
    /// Constant alpha/colour operand.
    pub alu_const_color: u32,
}

/// Rectangle-to-rectangle request for the execute phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StretchBlit {
    /// Source rectangle.
    pub src: Rect,
    /// Destination rectangle.
    pub dst: Rect,
}

/// One frame's blit: a configuration plus a stretch request.
///
/// The session borrows the surface, so its descriptor is referenced by the engine only while
/// the session exists.
#[derive(Debug)]
pub struct BlitSession<'a> {
    surface: &'a DmaSurface,
    config: BlitConfig,
    request: StretchBlit,
}

impl<'a> BlitSession<'a> {
    /// Build the full-surface to full-display blit of `surface` at `rotation`.
    pub fn new(surface: &'a DmaSurface, display: &Display, rotation: Rotation) -> BlitResult<Self> {
        let format = PixelFormat::S32Argb;
        let layout = surface.layout();
        if layout.bits_per_pixel() != format.bits_per_pixel() {
            return Err(BlitError::validation(format!(
                "blit source must be {} bpp, got {}",
                format.bits_per_pixel(),
                layout.bits_per_pixel()
            )));
        }
        for (what, v) in [
            ("surface width", layout.width()),
            ("surface height", layout.height()),
            ("display width", display.width()),
            ("display height", display.height()),
        ] {
            if i32::try_from(v).is_err() {
                return Err(BlitError::validation(format!("{what} {v} exceeds i32")));
            }
        }

        let flags = rotation.flags();
        let src_rect = Rect::at_origin(layout.dimensions());
        let dst_rect = display.rect();

        let config = BlitConfig {
            src: SurfaceParams {
                mem_type: MemType::Alloc,
                format,
                rect: src_rect,
                x_rev: false,
                y_rev: false,
            },
            dst: SurfaceParams {
                mem_type: MemType::Osd0,
                format,
                rect: dst_rect,
                x_rev: flags.x_rev,
                y_rev: flags.y_rev,
            },
            dst_xy_swap: flags.xy_swap,
            src_plane: SourcePlane {
                fd: surface.fd().as_raw_fd(),
                row_pixels: layout.row_pixels(),
                rows: layout.height(),
            },
            alu_const_color: OPAQUE_CONST_COLOR,
        };
        let request = StretchBlit {
            src: src_rect,
            dst: dst_rect,
        };

        Ok(Self {
            surface,
            config,
            request,
        })
    }

    /// Configuration record for phase one.
    pub fn config(&self) -> &BlitConfig {
        &self.config
    }

    /// Stretch request for phase two.
    pub fn request(&self) -> &StretchBlit {
        &self.request
    }

    /// Source surface.
    pub fn surface(&self) -> &DmaSurface {
        self.surface
    }

    /// Configure, then execute. The session is consumed either way.
    pub fn submit(self, engine: &dyn BlitEngine) -> BlitResult<()> {
        tracing::trace!(
            src = ?self.request.src,
            dst = ?self.request.dst,
            xy_swap = self.config.dst_xy_swap,
            "submitting blit"
        );
        engine.configure(&self.config)?;
        engine.stretch_blit(&self.request)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/blit/session.rs"]
mod tests;
