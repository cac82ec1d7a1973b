use std::fs::File;
use std::os::fd::AsFd as _;
use std::path::{Path, PathBuf};

use libc::c_ulong;

use crate::device::OutputDevice;
use crate::foundation::core::Size;
use crate::foundation::error::{BlitError, BlitResult};
use crate::sys::{ioctl_with, open_device};

pub(crate) const FBIOGET_VSCREENINFO: c_ulong = 0x4600;

/// `struct fb_bitfield`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct FbBitfield {
    pub(crate) offset: u32,
    pub(crate) length: u32,
    pub(crate) msb_right: u32,
}

/// `struct fb_var_screeninfo`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct FbVarScreenInfo {
    pub(crate) xres: u32,
    pub(crate) yres: u32,
    pub(crate) xres_virtual: u32,
    pub(crate) yres_virtual: u32,
    pub(crate) xoffset: u32,
    pub(crate) yoffset: u32,
    pub(crate) bits_per_pixel: u32,
    pub(crate) grayscale: u32,
    pub(crate) red: FbBitfield,
    pub(crate) green: FbBitfield,
    pub(crate) blue: FbBitfield,
    pub(crate) transp: FbBitfield,
    pub(crate) nonstd: u32,
    pub(crate) activate: u32,
    pub(crate) height: u32,
    pub(crate) width: u32,
    pub(crate) accel_flags: u32,
    pub(crate) pixclock: u32,
    pub(crate) left_margin: u32,
    pub(crate) right_margin: u32,
    pub(crate) upper_margin: u32,
    pub(crate) lower_margin: u32,
    pub(crate) hsync_len: u32,
    pub(crate) vsync_len: u32,
    pub(crate) sync: u32,
    pub(crate) vmode: u32,
    pub(crate) rotate: u32,
    pub(crate) colorspace: u32,
    pub(crate) reserved: [u32; 4],
}

/// Open framebuffer node, used only to read the active mode.
pub(crate) struct FbDevice {
    file: File,
    path: PathBuf,
}

impl FbDevice {
    pub(crate) fn open(path: &Path) -> BlitResult<Self> {
        let file = open_device(path)?;
        tracing::debug!(path = %path.display(), "opened framebuffer");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    fn var_screeninfo(&self) -> BlitResult<FbVarScreenInfo> {
        let mut info = FbVarScreenInfo::default();
        // SAFETY: `FbVarScreenInfo` mirrors `struct fb_var_screeninfo`.
        unsafe { ioctl_with(self.file.as_fd(), FBIOGET_VSCREENINFO, &mut info) }.map_err(|e| {
            BlitError::resource_unavailable(
                format!("{} (FBIOGET_VSCREENINFO)", self.path.display()),
                e,
            )
        })?;
        Ok(info)
    }
}

impl OutputDevice for FbDevice {
    fn active_mode(&self) -> BlitResult<Size> {
        let info = self.var_screeninfo()?;
        tracing::debug!(
            xres = info.xres,
            yres = info.yres,
            bpp = info.bits_per_pixel,
            "framebuffer mode"
        );
        Ok(Size::new(info.xres, info.yres))
    }
}
