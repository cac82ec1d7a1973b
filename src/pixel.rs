//! Raw pixel loading with the red/blue channel swap.

use std::fs::File;
use std::io::{BufReader, Read, Take};
use std::path::Path;

use crate::foundation::error::{BlitError, BlitResult};

/// Bytes per source pixel.
pub const SOURCE_BYTES_PER_PIXEL: u32 = 4;

/// Swap the red and blue channels of a 32-bit pixel, keeping alpha and green.
///
/// Applying it twice returns the input.
#[inline]
pub const fn swap_red_blue(px: u32) -> u32 {
    (px & 0xff00_0000)
        | ((px & 0x00ff_0000) >> 16)
        | (px & 0x0000_ff00)
        | ((px & 0x0000_00ff) << 16)
}

/// Convert a row of native-endian 32-bit pixels in place.
pub fn convert_row_in_place(row: &mut [u8]) {
    for px in row.chunks_exact_mut(4) {
        let v = u32::from_ne_bytes([px[0], px[1], px[2], px[3]]);
        px.copy_from_slice(&swap_red_blue(v).to_ne_bytes());
    }
}

/// Shape of a raw frame being loaded into strided memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawFrame {
    /// Source pixels per row.
    pub width: u32,
    /// Number of rows.
    pub rows: u32,
    /// Destination row pitch in bytes.
    pub stride: u32,
}

impl RawFrame {
    /// Bytes of pixel data per source row.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * SOURCE_BYTES_PER_PIXEL as usize
    }

    /// Total bytes consumed from the source stream.
    pub fn source_len(&self) -> u64 {
        self.row_bytes() as u64 * u64::from(self.rows)
    }
}

/// Read `frame.rows` rows from `src` into `dst`, one row every `frame.stride` bytes, swapping
/// red and blue as each row lands. Bytes between rows are left untouched.
pub fn load_raw_frame<R: Read>(mut src: R, dst: &mut [u8], frame: RawFrame) -> BlitResult<()> {
    let row_bytes = frame.row_bytes();
    let stride = frame.stride as usize;
    if row_bytes > stride {
        return Err(BlitError::validation(format!(
            "source row of {row_bytes} bytes does not fit stride {stride}"
        )));
    }
    let needed = match frame.rows {
        0 => 0,
        rows => (rows as usize - 1) * stride + row_bytes,
    };
    if dst.len() < needed {
        return Err(BlitError::validation(format!(
            "destination holds {} bytes, frame needs {needed}",
            dst.len()
        )));
    }

    for y in 0..frame.rows as usize {
        let row = &mut dst[y * stride..y * stride + row_bytes];
        src.read_exact(row)
            .map_err(|e| BlitError::io(format!("read source row {y}"), e))?;
        convert_row_in_place(row);
    }
    Ok(())
}

/// Open a headerless raw image of `width` x `height` 4-byte pixels.
///
/// A file shorter than that is rejected. Trailing bytes beyond it are ignored.
pub fn open_raw_image(
    path: &Path,
    width: u32,
    height: u32,
) -> BlitResult<Take<BufReader<File>>> {
    let ctx = || format!("open raw image '{}'", path.display());
    let file = File::open(path).map_err(|e| BlitError::io(ctx(), e))?;
    let actual = file.metadata().map_err(|e| BlitError::io(ctx(), e))?.len();

    let expected = RawFrame {
        width,
        rows: height,
        stride: 0,
    }
    .source_len();
    if actual < expected {
        return Err(BlitError::validation(format!(
            "raw image '{}' has {actual} bytes, {width}x{height} needs {expected}",
            path.display()
        )));
    }
    if actual > expected {
        tracing::warn!(
            path = %path.display(),
            actual,
            expected,
            "raw image larger than expected; ignoring trailing bytes"
        );
    }

    Ok(BufReader::new(file).take(expected))
}

#[cfg(test)]
#[path = "../tests/unit/pixel.rs"]
mod tests;
