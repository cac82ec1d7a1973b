use std::fs::File;
use std::os::fd::{AsFd as _, FromRawFd as _, OwnedFd};
use std::path::Path;

use libc::{c_int, c_uint, c_ulong};

use crate::device::{IonAllocator, IonHandle};
use crate::foundation::error::{BlitError, BlitResult};
use crate::sys::{ioctl_with, iowr, open_device};

const ION_IOC_MAGIC: u8 = b'I';

/// `struct ion_allocation_data`
#[repr(C)]
#[derive(Debug, Default)]
pub(crate) struct IonAllocationData {
    pub(crate) len: usize,
    pub(crate) align: usize,
    pub(crate) heap_id_mask: c_uint,
    pub(crate) flags: c_uint,
    pub(crate) handle: c_int,
}

/// `struct ion_fd_data`
#[repr(C)]
#[derive(Debug, Default)]
pub(crate) struct IonFdData {
    pub(crate) handle: c_int,
    pub(crate) fd: c_int,
}

/// `struct ion_handle_data`
#[repr(C)]
#[derive(Debug, Default)]
pub(crate) struct IonHandleData {
    pub(crate) handle: c_int,
}

pub(crate) const ION_IOC_ALLOC: c_ulong =
    iowr(ION_IOC_MAGIC, 0, size_of::<IonAllocationData>());
pub(crate) const ION_IOC_FREE: c_ulong = iowr(ION_IOC_MAGIC, 1, size_of::<IonHandleData>());
pub(crate) const ION_IOC_SHARE: c_ulong = iowr(ION_IOC_MAGIC, 4, size_of::<IonFdData>());

/// Open `/dev/ion` node.
pub(crate) struct IonDevice {
    file: File,
}

impl IonDevice {
    pub(crate) fn open(path: &Path) -> BlitResult<Self> {
        let file = open_device(path)?;
        tracing::debug!(path = %path.display(), "opened ion allocator");
        Ok(Self { file })
    }
}

impl IonAllocator for IonDevice {
    fn alloc(&self, len: usize, heap_mask: u32, flags: u32) -> BlitResult<IonHandle> {
        let mut data = IonAllocationData {
            len,
            align: 0,
            heap_id_mask: heap_mask,
            flags,
            handle: 0,
        };
        // SAFETY: `IonAllocationData` mirrors `struct ion_allocation_data`.
        unsafe { ioctl_with(self.file.as_fd(), ION_IOC_ALLOC, &mut data) }
            .map_err(|e| BlitError::allocation("alloc", e))?;
        Ok(IonHandle(data.handle))
    }

    fn share(&self, handle: IonHandle) -> BlitResult<OwnedFd> {
        let mut data = IonFdData {
            handle: handle.0,
            fd: -1,
        };
        // SAFETY: `IonFdData` mirrors `struct ion_fd_data`.
        unsafe { ioctl_with(self.file.as_fd(), ION_IOC_SHARE, &mut data) }
            .map_err(|e| BlitError::allocation("share", e))?;
        if data.fd < 0 {
            return Err(BlitError::allocation(
                "share",
                std::io::Error::from_raw_os_error(libc::EBADF),
            ));
        }
        // SAFETY: on success the driver installed a new descriptor owned by the caller.
        Ok(unsafe { OwnedFd::from_raw_fd(data.fd) })
    }

    fn free(&self, handle: IonHandle) -> BlitResult<()> {
        let mut data = IonHandleData { handle: handle.0 };
        // SAFETY: `IonHandleData` mirrors `struct ion_handle_data`.
        unsafe { ioctl_with(self.file.as_fd(), ION_IOC_FREE, &mut data) }
            .map_err(|e| BlitError::allocation("free", e))?;
        Ok(())
    }
}
