use crate::device::{BlitEngine, CacheSync, DeviceKind, DeviceProvider, IonAllocator, OutputDevice};
use crate::foundation::error::BlitResult;

/// Owner of the process's subsystem handles.
///
/// Each handle is opened on first use and at most once. [`DeviceContext::close`] (or drop)
/// closes them in reverse acquisition order.
pub struct DeviceContext {
    provider: Box<dyn DeviceProvider>,
    sync: Box<dyn CacheSync>,

    allocator: Option<Box<dyn IonAllocator>>,
    output: Option<Box<dyn OutputDevice>>,
    blit_engine: Option<Box<dyn BlitEngine>>,

    // acquisition order
    opened: Vec<DeviceKind>,
}

impl DeviceContext {
    /// Create a context; no device is opened yet.
    pub fn new(provider: Box<dyn DeviceProvider>) -> Self {
        let sync = provider.cache_sync();
        Self {
            provider,
            sync,
            allocator: None,
            output: None,
            blit_engine: None,
            opened: Vec::new(),
        }
    }

    /// Memory allocator, opened on first call.
    pub fn allocator(&mut self) -> BlitResult<&dyn IonAllocator> {
        let provider = &self.provider;
        open_once(
            &mut self.allocator,
            &mut self.opened,
            DeviceKind::Allocator,
            || provider.open_allocator(),
        )
    }

    /// Display output, opened on first call.
    pub fn output(&mut self) -> BlitResult<&dyn OutputDevice> {
        let provider = &self.provider;
        open_once(
            &mut self.output,
            &mut self.opened,
            DeviceKind::Output,
            || provider.open_output(),
        )
    }

    /// 2D blit engine, opened on first call.
    pub fn blit_engine(&mut self) -> BlitResult<&dyn BlitEngine> {
        let provider = &self.provider;
        open_once(
            &mut self.blit_engine,
            &mut self.opened,
            DeviceKind::BlitEngine,
            || provider.open_blit_engine(),
        )
    }

    /// Cache-sync capability.
    pub fn cache_sync(&self) -> &dyn CacheSync {
        self.sync.as_ref()
    }

    /// Devices opened so far, in acquisition order.
    pub fn opened(&self) -> &[DeviceKind] {
        &self.opened
    }

    /// Close every open device in reverse acquisition order.
    pub fn close(mut self) {
        self.close_all();
    }

    fn close_all(&mut self) {
        while let Some(kind) = self.opened.pop() {
            match kind {
                DeviceKind::Allocator => drop(self.allocator.take()),
                DeviceKind::Output => drop(self.output.take()),
                DeviceKind::BlitEngine => drop(self.blit_engine.take()),
            }
            tracing::debug!(device = %kind, "closed device");
        }
    }
}

impl Drop for DeviceContext {
    fn drop(&mut self) {
        self.close_all();
    }
}

fn open_once<'a, T: ?Sized>(
    slot: &'a mut Option<Box<T>>,
    opened: &mut Vec<DeviceKind>,
    kind: DeviceKind,
    open: impl FnOnce() -> BlitResult<Box<T>>,
) -> BlitResult<&'a T> {
    let dev = match slot.take() {
        Some(dev) => dev,
        None => {
            let dev = open()?;
            opened.push(kind);
            tracing::debug!(device = %kind, "opened device");
            dev
        }
    };
    Ok(&**slot.insert(dev))
}

#[cfg(test)]
#[path = "../../tests/unit/device/context.rs"]
mod tests;
