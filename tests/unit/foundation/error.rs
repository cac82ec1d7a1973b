use super::*;

fn errno(code: i32) -> io::Error {
    io::Error::from_raw_os_error(code)
}

#[test]
fn display_prefixes_are_stable() {
    assert!(
        BlitError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        BlitError::resource_unavailable("/dev/ion", errno(libc::ENOENT))
            .to_string()
            .starts_with("resource unavailable: /dev/ion:")
    );
    assert!(
        BlitError::allocation("share", errno(libc::ENOMEM))
            .to_string()
            .starts_with("allocation failed: share:")
    );
    assert!(
        BlitError::SyncFailed {
            request: SyncRequest::END_WRITE,
            source: errno(libc::EIO),
        }
        .to_string()
        .starts_with("cache sync failed: end/write:")
    );
    assert!(
        BlitError::io("open raw image", errno(libc::ENOENT))
            .to_string()
            .starts_with("io error: open raw image:")
    );
}

#[test]
fn other_preserves_source() {
    let base = io::Error::other("boom");
    let err = BlitError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert!(err.os_error().is_none());
}

#[test]
fn busy_driver_is_transient_missing_device_is_not() {
    let busy = BlitError::BlitExecFailed {
        source: errno(libc::EBUSY),
    };
    assert!(busy.is_transient());

    let again = BlitError::allocation("alloc", errno(libc::EAGAIN));
    assert!(again.is_transient());

    let missing = BlitError::resource_unavailable("/dev/ge2d", errno(libc::ENOENT));
    assert!(!missing.is_transient());

    assert!(!BlitError::validation("bad").is_transient());
}
