use crate::device::OutputDevice;
use crate::foundation::core::{Rect, Size};
use crate::foundation::error::{BlitError, BlitResult};

/// Snapshot of the active output geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Display {
    size: Size,
}

impl Display {
    /// Query the active mode once. The mode itself is never changed.
    pub fn create(output: &dyn OutputDevice) -> BlitResult<Self> {
        let size = output.active_mode()?;
        if size.is_empty() {
            return Err(BlitError::validation(format!(
                "output reports an empty mode {}x{}",
                size.width, size.height
            )));
        }
        tracing::debug!(width = size.width, height = size.height, "display mode");
        Ok(Self { size })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.size.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Output dimensions.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Full-display rectangle at the origin.
    pub fn rect(&self) -> Rect {
        Rect::at_origin(self.size)
    }
}
