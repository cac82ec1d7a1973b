use std::os::fd::AsFd as _;

use super::dma_buf::{DMA_BUF_IOCTL_SYNC, DmaBufSyncArg, DmaBufSyncFlags};
use super::fbdev::{FBIOGET_VSCREENINFO, FbVarScreenInfo};
use super::ge2d::{ConfigParaExIon, GE2D_STRETCHBLIT, Ge2dPara, Rectangle, SrcDstParaEx};
use super::ion::{ION_IOC_ALLOC, ION_IOC_FREE, ION_IOC_SHARE, IonFdData, IonHandleData};
use super::mman::{MappedRegion, anonymous_file};
use super::*;
use crate::blit::session::{
    BlitConfig, MemType, OPAQUE_CONST_COLOR, PixelFormat, SourcePlane, StretchBlit,
    SurfaceParams,
};
use crate::device::{SyncAccess, SyncPhase, SyncRequest};
use crate::foundation::core::{Rect, Size};

#[test]
fn ion_request_numbers_match_uapi() {
    assert_eq!(size_of::<IonHandleData>(), 4);
    assert_eq!(size_of::<IonFdData>(), 8);
    assert_eq!(ION_IOC_FREE, 0xC004_4901);
    assert_eq!(ION_IOC_SHARE, 0xC008_4904);
    #[cfg(target_pointer_width = "64")]
    assert_eq!(ION_IOC_ALLOC, 0xC020_4900);
    #[cfg(target_pointer_width = "32")]
    assert_eq!(ION_IOC_ALLOC, 0xC014_4900);
}

#[test]
fn dma_buf_sync_request_number_and_flags() {
    assert_eq!(size_of::<DmaBufSyncArg>(), 8);
    assert_eq!(DMA_BUF_IOCTL_SYNC, 0x4008_6200);

    assert_eq!(DmaBufSyncFlags::from(SyncRequest::START_WRITE).bits(), 2);
    assert_eq!(DmaBufSyncFlags::from(SyncRequest::END_WRITE).bits(), 6);
    let end_rw = SyncRequest {
        phase: SyncPhase::End,
        access: SyncAccess::ReadWrite,
    };
    assert_eq!(DmaBufSyncFlags::from(end_rw).bits(), 7);
    let start_read = SyncRequest {
        phase: SyncPhase::Start,
        access: SyncAccess::Read,
    };
    assert_eq!(DmaBufSyncFlags::from(start_read).bits(), 1);
}

#[test]
fn fbdev_screeninfo_layout() {
    assert_eq!(FBIOGET_VSCREENINFO, 0x4600);
    assert_eq!(size_of::<FbVarScreenInfo>(), 160);
}

#[test]
fn ge2d_records() {
    assert_eq!(GE2D_STRETCHBLIT, 0x46fe);
    assert_eq!(size_of::<Rectangle>(), 16);
    assert_eq!(size_of::<Ge2dPara>(), 56);
    assert_eq!(size_of::<SrcDstParaEx>(), 36);
}

#[test]
fn iow_and_iowr_encode_direction_and_size() {
    assert_eq!(iow(b'b', 0, 8), 0x4008_6200);
    assert_eq!(iowr(b'I', 1, 4), 0xC004_4901);
}

fn sample_config() -> BlitConfig {
    BlitConfig {
        src: SurfaceParams {
            mem_type: MemType::Alloc,
            format: PixelFormat::S32Argb,
            rect: Rect::at_origin(Size::new(600, 504)),
            x_rev: false,
            y_rev: false,
        },
        dst: SurfaceParams {
            mem_type: MemType::Osd0,
            format: PixelFormat::S32Argb,
            rect: Rect::at_origin(Size::new(1280, 720)),
            x_rev: true,
            y_rev: false,
        },
        dst_xy_swap: true,
        src_plane: SourcePlane {
            fd: 42,
            row_pixels: 600,
            rows: 504,
        },
        alu_const_color: OPAQUE_CONST_COLOR,
    }
}

#[test]
fn config_record_carries_surface_fd_and_rotation() {
    let raw = ConfigParaExIon::from(&sample_config());

    assert_eq!(raw.src_para.mem_type, 2);
    assert_eq!(raw.src_para.format, 0x0010_0300);
    assert_eq!((raw.src_para.width, raw.src_para.height), (600, 504));
    assert_eq!((raw.src_para.x_rev, raw.src_para.y_rev), (0, 0));

    assert_eq!(raw.dst_para.mem_type, 0);
    assert_eq!((raw.dst_para.width, raw.dst_para.height), (1280, 720));
    assert_eq!((raw.dst_para.x_rev, raw.dst_para.y_rev), (1, 0));
    assert_eq!(raw.dst_xy_swap, 1);

    assert_eq!(raw.alu_const_color, 0xffff_ffff);
    assert_eq!(raw.src_planes[0].shared_fd, 42);
    assert_eq!((raw.src_planes[0].w, raw.src_planes[0].h), (600, 504));
    assert_eq!(raw.src_planes[1].shared_fd, 0);
    assert_eq!(raw.src2_para.width, 0);
}

#[test]
fn stretch_record_uses_src1_and_dst() {
    let req = StretchBlit {
        src: Rect::at_origin(Size::new(600, 504)),
        dst: Rect::at_origin(Size::new(1920, 1080)),
    };
    let raw = Ge2dPara::from(&req);
    assert_eq!(
        raw.src1_rect,
        Rectangle {
            x: 0,
            y: 0,
            w: 600,
            h: 504
        }
    );
    assert_eq!(
        raw.dst_rect,
        Rectangle {
            x: 0,
            y: 0,
            w: 1920,
            h: 1080
        }
    );
    assert_eq!(raw.src2_rect, Rectangle::default());
}

#[test]
fn missing_device_node_is_resource_unavailable() {
    let err = open_device(Path::new("/nonexistent/ge2d")).unwrap_err();
    assert!(matches!(err, BlitError::ResourceUnavailable { .. }));
    assert_eq!(
        err.os_error().and_then(io::Error::raw_os_error),
        Some(libc::ENOENT)
    );
}

#[test]
fn mapping_writes_through_to_the_file() {
    use std::os::unix::fs::FileExt as _;

    let file = anonymous_file("ionblit-test", 4096).unwrap();
    {
        let mut map = MappedRegion::map_shared(file.as_fd(), 4096).unwrap();
        assert_eq!(map.len(), 4096);
        map.as_mut_slice()[..4].copy_from_slice(&[1, 2, 3, 4]);
    }
    let mut buf = [0u8; 4];
    file.read_exact_at(&mut buf, 0).unwrap();
    assert_eq!(buf, [1, 2, 3, 4]);
}

#[test]
fn zero_length_mapping_is_rejected() {
    let file = anonymous_file("ionblit-test", 0).unwrap();
    assert!(MappedRegion::map_shared(file.as_fd(), 0).is_err());
}
