use std::fs::File;
use std::os::fd::AsFd as _;
use std::path::Path;

use libc::{c_int, c_long, c_uint, c_ulong};

use crate::blit::session::{BlitConfig, StretchBlit, SurfaceParams};
use crate::device::BlitEngine;
use crate::foundation::core::Rect;
use crate::foundation::error::{BlitError, BlitResult};
use crate::sys::{ioctl_with, iow, open_device};

const GE2D_IOC_MAGIC: u8 = b'G';

/// Legacy, unencoded request number of the stretch blit.
pub(crate) const GE2D_STRETCHBLIT: c_ulong = 0x46fe;

/// `struct src_dst_para_ex_s`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct SrcDstParaEx {
    pub(crate) canvas_index: c_int,
    pub(crate) top: c_int,
    pub(crate) left: c_int,
    pub(crate) width: c_int,
    pub(crate) height: c_int,
    pub(crate) format: c_int,
    pub(crate) mem_type: c_int,
    pub(crate) color: c_int,
    pub(crate) x_rev: u8,
    pub(crate) y_rev: u8,
    pub(crate) fill_color_en: u8,
    pub(crate) fill_mode: u8,
}

/// `struct src_key_ctrl_s`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct SrcKeyCtrl {
    pub(crate) key_enable: c_int,
    pub(crate) key_color: c_int,
    pub(crate) key_mask: c_int,
    pub(crate) key_mode: c_int,
}

/// `struct config_planes_ion_s`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ConfigPlanesIon {
    pub(crate) shared_fd: c_long,
    pub(crate) w: c_uint,
    pub(crate) h: c_uint,
}

/// `struct config_para_ex_ion_s`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ConfigParaExIon {
    pub(crate) src_para: SrcDstParaEx,
    pub(crate) src2_para: SrcDstParaEx,
    pub(crate) dst_para: SrcDstParaEx,

    pub(crate) src_key: SrcKeyCtrl,
    pub(crate) src2_key: SrcKeyCtrl,

    pub(crate) alu_const_color: c_uint,
    pub(crate) src1_gb_alpha: c_uint,
    pub(crate) op_mode: c_uint,
    pub(crate) bitmask_en: u8,
    pub(crate) bytemask_only: u8,
    pub(crate) bitmask: c_uint,
    pub(crate) dst_xy_swap: u8,

    pub(crate) hf_init_phase: c_uint,
    pub(crate) hf_rpt_num: c_int,
    pub(crate) hsc_start_phase_step: c_uint,
    pub(crate) hsc_phase_slope: c_int,
    pub(crate) vf_init_phase: c_uint,
    pub(crate) vf_rpt_num: c_int,
    pub(crate) vsc_start_phase_step: c_uint,
    pub(crate) vsc_phase_slope: c_int,
    pub(crate) src1_vsc_phase0_always_en: u8,
    pub(crate) src1_hsc_phase0_always_en: u8,
    pub(crate) src1_hsc_rpt_ctrl: u8,
    pub(crate) src1_vsc_rpt_ctrl: u8,

    pub(crate) src_planes: [ConfigPlanesIon; 4],
    pub(crate) src2_planes: [ConfigPlanesIon; 4],
    pub(crate) dst_planes: [ConfigPlanesIon; 4],
}

/// `struct rectangle_s`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Rectangle {
    pub(crate) x: c_int,
    pub(crate) y: c_int,
    pub(crate) w: c_int,
    pub(crate) h: c_int,
}

/// `struct ge2d_para_s`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Ge2dPara {
    pub(crate) color: c_uint,
    pub(crate) src1_rect: Rectangle,
    pub(crate) src2_rect: Rectangle,
    pub(crate) dst_rect: Rectangle,
    pub(crate) op: c_int,
}

pub(crate) const GE2D_CONFIG_EX_ION: c_ulong =
    iow(GE2D_IOC_MAGIC, 0, size_of::<ConfigParaExIon>());

fn c_dim(v: u32) -> c_int {
    c_int::try_from(v).unwrap_or(c_int::MAX)
}

impl From<Rect> for Rectangle {
    fn from(r: Rect) -> Self {
        Self {
            x: r.x,
            y: r.y,
            w: c_dim(r.width),
            h: c_dim(r.height),
        }
    }
}

impl From<&SurfaceParams> for SrcDstParaEx {
    fn from(p: &SurfaceParams) -> Self {
        Self {
            left: p.rect.x,
            top: p.rect.y,
            width: c_dim(p.rect.width),
            height: c_dim(p.rect.height),
            format: p.format.ge2d_code(),
            mem_type: p.mem_type as c_int,
            x_rev: u8::from(p.x_rev),
            y_rev: u8::from(p.y_rev),
            ..Self::default()
        }
    }
}

impl From<&BlitConfig> for ConfigParaExIon {
    fn from(cfg: &BlitConfig) -> Self {
        let mut raw = Self {
            src_para: SrcDstParaEx::from(&cfg.src),
            dst_para: SrcDstParaEx::from(&cfg.dst),
            alu_const_color: cfg.alu_const_color,
            dst_xy_swap: u8::from(cfg.dst_xy_swap),
            ..Self::default()
        };
        raw.src_planes[0] = ConfigPlanesIon {
            shared_fd: c_long::from(cfg.src_plane.fd),
            w: cfg.src_plane.row_pixels,
            h: cfg.src_plane.rows,
        };
        raw
    }
}

impl From<&StretchBlit> for Ge2dPara {
    fn from(req: &StretchBlit) -> Self {
        Self {
            src1_rect: req.src.into(),
            dst_rect: req.dst.into(),
            ..Self::default()
        }
    }
}

/// Open `/dev/ge2d` node.
pub(crate) struct Ge2dDevice {
    file: File,
}

impl Ge2dDevice {
    pub(crate) fn open(path: &Path) -> BlitResult<Self> {
        let file = open_device(path)?;
        tracing::debug!(path = %path.display(), "opened ge2d engine");
        Ok(Self { file })
    }
}

impl BlitEngine for Ge2dDevice {
    fn configure(&self, config: &BlitConfig) -> BlitResult<()> {
        let mut raw = ConfigParaExIon::from(config);
        // SAFETY: `ConfigParaExIon` mirrors `struct config_para_ex_ion_s`.
        unsafe { ioctl_with(self.file.as_fd(), GE2D_CONFIG_EX_ION, &mut raw) }
            .map_err(|source| BlitError::BlitConfigFailed { source })?;
        Ok(())
    }

    fn stretch_blit(&self, request: &StretchBlit) -> BlitResult<()> {
        let mut raw = Ge2dPara::from(request);
        // SAFETY: `Ge2dPara` mirrors `struct ge2d_para_s`.
        unsafe { ioctl_with(self.file.as_fd(), GE2D_STRETCHBLIT, &mut raw) }
            .map_err(|source| BlitError::BlitExecFailed { source })?;
        Ok(())
    }
}
