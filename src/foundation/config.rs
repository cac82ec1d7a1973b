use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::device::DeviceProvider;
use crate::device::in_memory::InMemoryDevices;
use crate::foundation::core::Size;
use crate::foundation::error::{BlitError, BlitResult};
use crate::sys::LinuxDevices;

/// Environment variable naming an optional JSON [`RunConfig`] file.
pub const CONFIG_ENV: &str = "IONBLIT_CONFIG";

/// Which device implementation backs a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendChoice {
    /// Real `/dev/ion`, `/dev/fb0` and `/dev/ge2d` nodes.
    #[default]
    Linux,
    /// Recording in-memory devices (dry runs and tests).
    InMemory,
}

/// Device node paths for the Linux backend.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DevicePaths {
    /// ION allocator node.
    pub ion: PathBuf,
    /// Framebuffer node used for the active-mode query.
    pub framebuffer: PathBuf,
    /// GE2D engine node.
    pub ge2d: PathBuf,
}

impl Default for DevicePaths {
    fn default() -> Self {
        Self {
            ion: PathBuf::from("/dev/ion"),
            framebuffer: PathBuf::from("/dev/fb0"),
            ge2d: PathBuf::from("/dev/ge2d"),
        }
    }
}

/// Raw source image: headerless, row-major, 4 bytes per pixel.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageSource {
    /// File path, relative to the working directory.
    pub path: PathBuf,
    /// Pixels per row.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
}

impl Default for ImageSource {
    fn default() -> Self {
        Self {
            path: PathBuf::from("colorwheel.raw"),
            width: 600,
            height: 504,
        }
    }
}

/// Settings for the in-memory backend.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InMemoryConfig {
    /// Geometry reported as the active output mode.
    pub display: Size,
}

impl Default for InMemoryConfig {
    fn default() -> Self {
        Self {
            display: Size::new(1280, 720),
        }
    }
}

/// Complete run configuration.
///
/// Every field has a default, so an empty JSON object is a valid configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Device implementation.
    pub backend: BackendChoice,
    /// Device node paths (Linux backend).
    pub devices: DevicePaths,
    /// Source image description.
    pub image: ImageSource,
    /// Accumulated blit time after which the frame loop stops.
    pub frame_budget_secs: f64,
    /// Number of surfaces cycled through by the frame loop.
    pub buffers: usize,
    /// In-memory backend settings.
    pub in_memory: InMemoryConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            backend: BackendChoice::default(),
            devices: DevicePaths::default(),
            image: ImageSource::default(),
            frame_budget_secs: 1.0,
            buffers: 1,
            in_memory: InMemoryConfig::default(),
        }
    }
}

impl RunConfig {
    /// Parse a configuration from a JSON string.
    pub fn from_json_str(s: &str) -> BlitResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| BlitError::validation(format!("invalid config JSON: {e}")))
    }

    /// Read and parse a configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> BlitResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| BlitError::io(format!("read config '{}'", path.display()), e))?;
        Self::from_json_str(&s)
    }

    /// Load from the file named by [`CONFIG_ENV`], or fall back to defaults.
    pub fn from_env() -> BlitResult<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_path(PathBuf::from(path)),
            None => Ok(Self::default()),
        }
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> BlitResult<()> {
        if self.image.width == 0 || self.image.height == 0 {
            return Err(BlitError::validation(format!(
                "image dimensions must be non-zero, got {}x{}",
                self.image.width, self.image.height
            )));
        }
        if !self.frame_budget_secs.is_finite() || self.frame_budget_secs <= 0.0 {
            return Err(BlitError::validation(
                "frame_budget_secs must be a positive, finite number",
            ));
        }
        if self.buffers == 0 {
            return Err(BlitError::validation("buffers must be >= 1"));
        }
        if self.backend == BackendChoice::InMemory && self.in_memory.display.is_empty() {
            return Err(BlitError::validation(
                "in_memory.display dimensions must be non-zero",
            ));
        }
        Ok(())
    }

    /// Frame budget as a [`Duration`]. Call after [`RunConfig::validate`].
    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs_f64(self.frame_budget_secs)
    }

    /// Device provider selected by [`RunConfig::backend`].
    pub fn device_provider(&self) -> Box<dyn DeviceProvider> {
        match self.backend {
            BackendChoice::Linux => Box::new(LinuxDevices::new(self.devices.clone())),
            BackendChoice::InMemory => Box::new(InMemoryDevices::new(self.in_memory.display)),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
