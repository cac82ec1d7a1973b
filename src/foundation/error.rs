use std::io;

use crate::device::SyncRequest;

/// Convenience result type used across ionblit.
pub type BlitResult<T> = Result<T, BlitError>;

/// Top-level error taxonomy for allocator, display and blit-engine operations.
#[derive(thiserror::Error, Debug)]
pub enum BlitError {
    /// A required device node could not be opened or queried.
    #[error("resource unavailable: {device}: {source}")]
    ResourceUnavailable {
        /// Device path or subsystem name.
        device: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The allocator rejected an allocate, export or free request.
    #[error("allocation failed: {op}: {source}")]
    AllocationFailed {
        /// Allocator operation (`alloc`, `share`, `free`).
        op: &'static str,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Mapping a surface into process memory failed.
    #[error("map failed: {source}")]
    MapFailed {
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// A cache-sync signal on an exported descriptor failed.
    #[error("cache sync failed: {request}: {source}")]
    SyncFailed {
        /// The sync request that was rejected.
        request: SyncRequest,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The blit engine rejected a configuration record.
    #[error("blit configuration failed: {source}")]
    BlitConfigFailed {
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The blit engine rejected an execute request.
    #[error("blit execution failed: {source}")]
    BlitExecFailed {
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Reading pixel input or configuration failed.
    #[error("io error: {context}: {source}")]
    Io {
        /// What was being read.
        context: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Invalid caller-provided geometry or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BlitError {
    /// Build a [`BlitError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`BlitError::ResourceUnavailable`] value.
    pub fn resource_unavailable(device: impl Into<String>, source: io::Error) -> Self {
        Self::ResourceUnavailable {
            device: device.into(),
            source,
        }
    }

    /// Build a [`BlitError::AllocationFailed`] value.
    pub fn allocation(op: &'static str, source: io::Error) -> Self {
        Self::AllocationFailed { op, source }
    }

    /// Build a [`BlitError::Io`] value.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Underlying OS error, if this error wraps one.
    pub fn os_error(&self) -> Option<&io::Error> {
        match self {
            Self::ResourceUnavailable { source, .. }
            | Self::AllocationFailed { source, .. }
            | Self::MapFailed { source }
            | Self::SyncFailed { source, .. }
            | Self::BlitConfigFailed { source }
            | Self::BlitExecFailed { source }
            | Self::Io { source, .. } => Some(source),
            Self::Validation(_) | Self::Other(_) => None,
        }
    }

    /// Return `true` when the driver reported a busy/retry condition rather than a permanent
    /// failure.
    ///
    /// A missing device node or a rejected argument is never transient.
    pub fn is_transient(&self) -> bool {
        self.os_error()
            .and_then(io::Error::raw_os_error)
            .is_some_and(|errno| {
                errno == libc::EBUSY || errno == libc::EAGAIN || errno == libc::EINTR
            })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
