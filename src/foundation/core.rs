use crate::foundation::error::{BlitError, BlitResult};

/// Row alignment, in bytes, required for DMA surfaces.
pub const STRIDE_ALIGN: u32 = 64;

/// Round `value` up to the next multiple of `align` (a power of two).
///
/// Returns `None` on overflow.
pub fn align_up(value: u32, align: u32) -> Option<u32> {
    debug_assert!(align.is_power_of_two());
    value
        .checked_add(align - 1)
        .map(|v| v & !(align - 1))
}

/// Width/height pair in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a size value.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Return `true` when either dimension is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Pixel rectangle with a signed origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Rectangle covering `size` with its origin at `(0, 0)`.
    pub const fn at_origin(size: Size) -> Self {
        Self {
            x: 0,
            y: 0,
            width: size.width,
            height: size.height,
        }
    }

    /// Dimensions of the rectangle.
    pub fn size(self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Pure geometry of a packed-pixel surface.
///
/// `stride` is the row pitch in bytes, always a multiple of [`STRIDE_ALIGN`] and never smaller
/// than `width * bits_per_pixel / 8`. `size` is `height * stride`. Both are fixed at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceLayout {
    width: u32,
    height: u32,
    bits_per_pixel: u32,
    stride: u32,
    size: usize,
}

impl SurfaceLayout {
    /// Compute the layout for a `width` x `height` surface at `bits_per_pixel`.
    ///
    /// Only byte-sized packed formats (8, 16, 24, 32 bpp) are accepted.
    pub fn new(width: u32, height: u32, bits_per_pixel: u32) -> BlitResult<Self> {
        if width == 0 || height == 0 {
            return Err(BlitError::validation(format!(
                "surface dimensions must be non-zero, got {width}x{height}"
            )));
        }
        if !matches!(bits_per_pixel, 8 | 16 | 24 | 32) {
            return Err(BlitError::validation(format!(
                "unsupported bits per pixel: {bits_per_pixel}"
            )));
        }

        let row_bytes = width
            .checked_mul(bits_per_pixel / 8)
            .ok_or_else(|| BlitError::validation("surface row size overflows u32"))?;
        let stride = align_up(row_bytes, STRIDE_ALIGN)
            .ok_or_else(|| BlitError::validation("surface stride overflows u32"))?;
        let size = (stride as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| BlitError::validation("surface size overflows usize"))?;

        Ok(Self {
            width,
            height,
            bits_per_pixel,
            stride,
            size,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bits per pixel.
    pub fn bits_per_pixel(&self) -> u32 {
        self.bits_per_pixel
    }

    /// Bytes per pixel.
    pub fn bytes_per_pixel(&self) -> u32 {
        self.bits_per_pixel / 8
    }

    /// Row pitch in bytes.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Total byte size (`height * stride`).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Meaningful bytes per row, excluding alignment padding.
    pub fn row_bytes(&self) -> u32 {
        self.width * self.bytes_per_pixel()
    }

    /// Row pitch expressed in pixels (`stride / bytes_per_pixel`).
    pub fn row_pixels(&self) -> u32 {
        self.stride / self.bytes_per_pixel()
    }

    /// Pixel dimensions.
    pub fn dimensions(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
