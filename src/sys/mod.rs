//! Kernel ABI bindings: ioctl request encoding, `#[repr(C)]` argument records and the Linux
//! device implementations.
//!
//! All `unsafe` in the crate lives under this module.
#![allow(unsafe_code)]

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::{AsRawFd as _, BorrowedFd};
use std::path::Path;

use libc::c_ulong;

use crate::device::{BlitEngine, CacheSync, DeviceProvider, IonAllocator, OutputDevice};
use crate::foundation::config::DevicePaths;
use crate::foundation::error::{BlitError, BlitResult};

pub(crate) mod dma_buf;
pub(crate) mod fbdev;
pub(crate) mod ge2d;
pub(crate) mod ion;
pub(crate) mod mman;

const IOC_NRBITS: u32 = 8;
const IOC_TYPEBITS: u32 = 8;
const IOC_SIZEBITS: u32 = 14;

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = IOC_NRSHIFT + IOC_NRBITS;
const IOC_SIZESHIFT: u32 = IOC_TYPESHIFT + IOC_TYPEBITS;
const IOC_DIRSHIFT: u32 = IOC_SIZESHIFT + IOC_SIZEBITS;

const IOC_WRITE: c_ulong = 1;
const IOC_READ: c_ulong = 2;

const fn ioc(dir: c_ulong, ty: u8, nr: u8, size: usize) -> c_ulong {
    (dir << IOC_DIRSHIFT)
        | ((size as c_ulong) << IOC_SIZESHIFT)
        | ((ty as c_ulong) << IOC_TYPESHIFT)
        | ((nr as c_ulong) << IOC_NRSHIFT)
}

/// `_IOW(ty, nr, size)`
pub(crate) const fn iow(ty: u8, nr: u8, size: usize) -> c_ulong {
    ioc(IOC_WRITE, ty, nr, size)
}

/// `_IOWR(ty, nr, size)`
pub(crate) const fn iowr(ty: u8, nr: u8, size: usize) -> c_ulong {
    ioc(IOC_READ | IOC_WRITE, ty, nr, size)
}

/// Issue `request` on `fd` with `arg` as the argument record, retrying on `EINTR`.
///
/// # Safety
///
/// `T` must be the exact `#[repr(C)]` layout the driver expects for `request`.
pub(crate) unsafe fn ioctl_with<T>(
    fd: BorrowedFd<'_>,
    request: c_ulong,
    arg: &mut T,
) -> io::Result<libc::c_int> {
    loop {
        // SAFETY: `fd` is open for the duration of the borrow; `arg` is a valid exclusive
        // pointer to a record the caller vouches for.
        let rc = unsafe { libc::ioctl(fd.as_raw_fd(), request as _, arg as *mut T) };
        if rc >= 0 {
            return Ok(rc);
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

pub(crate) fn open_device(path: &Path) -> BlitResult<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|e| BlitError::resource_unavailable(path.display().to_string(), e))
}

/// Device provider backed by the real `/dev` nodes.
#[derive(Clone, Debug, Default)]
pub struct LinuxDevices {
    paths: DevicePaths,
}

impl LinuxDevices {
    /// Use the given device node paths.
    pub fn new(paths: DevicePaths) -> Self {
        Self { paths }
    }
}

impl DeviceProvider for LinuxDevices {
    fn open_allocator(&self) -> BlitResult<Box<dyn IonAllocator>> {
        Ok(Box::new(ion::IonDevice::open(&self.paths.ion)?))
    }

    fn open_output(&self) -> BlitResult<Box<dyn OutputDevice>> {
        Ok(Box::new(fbdev::FbDevice::open(&self.paths.framebuffer)?))
    }

    fn open_blit_engine(&self) -> BlitResult<Box<dyn BlitEngine>> {
        Ok(Box::new(ge2d::Ge2dDevice::open(&self.paths.ge2d)?))
    }

    fn cache_sync(&self) -> Box<dyn CacheSync> {
        Box::new(dma_buf::DmaBufSync)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sys/ioctl.rs"]
mod tests;
