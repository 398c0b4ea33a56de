//! Static per-device capability snapshot.

use std::collections::BTreeSet;
use std::fmt;

use crate::driver::AsiDriver;
use crate::error::{CameraError, Result};
use crate::types::{BayerPattern, ImageType};

/// Immutable facts about one camera, fetched once at session open.
///
/// Everything here is static for the lifetime of the device: resolution
/// limits, sensor layout, and hardware feature flags. Live state (control
/// values, the applied ROI) lives elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraInfo {
    /// Model name as reported by the device, e.g. `ZWO ASI294MC Pro`.
    pub name: String,
    /// Driver-side identifier used to address the open handle.
    pub camera_id: i32,
    /// Maximum capture width in pixels.
    pub max_width: u32,
    /// Maximum capture height in pixels.
    pub max_height: u32,
    /// Whether the sensor has a color mosaic.
    pub is_color: bool,
    /// Color mosaic layout; `None` for monochrome sensors.
    pub bayer: BayerPattern,
    /// Supported binning factors. Non-empty, all positive.
    pub supported_bins: BTreeSet<u32>,
    /// Supported pixel encodings. Non-empty.
    pub supported_image_types: BTreeSet<ImageType>,
    /// Physical pixel pitch in micrometers.
    pub pixel_size_um: f64,
    /// Whether the camera has a mechanical shutter (needed for dark frames).
    pub mechanical_shutter: bool,
    /// Whether the camera has an ST4 guide port.
    pub st4_port: bool,
    /// Whether the camera has a cooler.
    pub has_cooler: bool,
    /// Whether the camera is connected to a USB3 host.
    pub is_usb3_host: bool,
    /// Whether the camera itself is a USB3 device.
    pub is_usb3: bool,
    /// Sensor gain in electrons per ADU.
    pub elec_per_adu: f32,
    /// Native bit depth of the sensor.
    pub bit_depth: u32,
    /// Whether the camera supports external triggering.
    pub is_trigger: bool,
}

impl CameraInfo {
    /// Fetch the capability snapshot of the camera at `camera_index`.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::Device`] if the property query fails, e.g. for
    /// an index with no connected camera.
    pub fn fetch<D: AsiDriver>(driver: &mut D, camera_index: i32) -> Result<Self> {
        // The driver cannot address any camera until enumeration has run.
        let _ = driver.camera_count();
        driver
            .camera_property(camera_index)
            .map_err(|code| CameraError::device("failed to read camera infos", camera_index, code))
    }
}

fn flag(value: bool) -> char {
    if value {
        '*'
    } else {
        '-'
    }
}

impl fmt::Display for CameraInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} (id: {})", self.name, self.camera_id)?;
        writeln!(
            f,
            "max height: ({}) | max width: ({}) |",
            self.max_height, self.max_width
        )?;
        writeln!(
            f,
            "colored: {} | mechanical shutter: {} | st4 port: {} |",
            flag(self.is_color),
            flag(self.mechanical_shutter),
            flag(self.st4_port)
        )?;
        writeln!(
            f,
            "has cooler: {} | is usb3 host: {} | is usb3: {} |",
            flag(self.has_cooler),
            flag(self.is_usb3_host),
            flag(self.is_usb3)
        )?;
        writeln!(
            f,
            "is triggered camera: {} | bayer pattern: {}",
            flag(self.is_trigger),
            self.bayer
        )?;
        write!(f, "supported bins: ")?;
        for bin in &self.supported_bins {
            write!(f, "{bin} ")?;
        }
        writeln!(f)?;
        write!(f, "supported image types: ")?;
        for image_type in &self.supported_image_types {
            write!(f, "{image_type} ")?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "pixel size (um): {} | elec per ADU: {} | bit depth: {}",
            self.pixel_size_um, self.elec_per_adu, self.bit_depth
        )
    }
}
