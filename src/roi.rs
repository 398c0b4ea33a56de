//! Region-of-interest model and client-side validation.
//!
//! A [`Roi`] describes the capture rectangle, binning factor, and pixel
//! encoding. It is validated against a device's [`CameraInfo`] before any
//! device mutation is attempted, so a rejected ROI never leaves the device
//! partially configured.

use serde::{Deserialize, Serialize};

use crate::error::RoiError;
use crate::info::CameraInfo;
use crate::types::ImageType;

/// Capture widths must be a multiple of this.
const WIDTH_MODULO: u32 = 8;
/// Capture heights must be a multiple of this.
const HEIGHT_MODULO: u32 = 2;
/// Total pixel count constraint for legacy models on USB2.
const LEGACY_AREA_MODULO: u32 = 1024;
/// Model-name prefix of the legacy family the area constraint applies to.
const LEGACY_MODEL_PREFIX: &str = "ASI120";

/// The capture rectangle, binning factor, and pixel encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Roi {
    /// Horizontal origin of the capture window, in binned pixels.
    pub start_x: u32,
    /// Vertical origin of the capture window, in binned pixels.
    pub start_y: u32,
    /// Capture width in binned pixels.
    pub width: u32,
    /// Capture height in binned pixels.
    pub height: u32,
    /// Binning factor.
    pub bins: u32,
    /// Pixel encoding.
    #[serde(rename = "type")]
    pub image_type: ImageType,
}

impl Default for Roi {
    /// The zero geometry with the monochrome 8-bit encoding.
    fn default() -> Self {
        Self {
            start_x: 0,
            start_y: 0,
            width: 0,
            height: 0,
            bins: 0,
            image_type: ImageType::Y8,
        }
    }
}

impl Roi {
    /// Size in bytes of a frame captured with this geometry.
    #[must_use]
    pub const fn image_bytes(&self) -> usize {
        self.width as usize * self.height as usize * self.image_type.bytes_per_pixel()
    }

    /// Check that this geometry can be applied to the described device.
    ///
    /// Violations are reported in a fixed order, stopping at the first:
    /// width alignment, height alignment, the legacy-family area constraint,
    /// binning support, encoding support.
    ///
    /// # Errors
    ///
    /// Returns the first [`RoiError`] violated, if any.
    pub fn validate(&self, info: &CameraInfo) -> Result<(), RoiError> {
        if self.width % WIDTH_MODULO != 0 {
            return Err(RoiError::WidthAlignment {
                width: self.width,
                modulo: WIDTH_MODULO,
            });
        }
        if self.height % HEIGHT_MODULO != 0 {
            return Err(RoiError::HeightAlignment {
                height: self.height,
                modulo: HEIGHT_MODULO,
            });
        }
        // Model-family quirk: early USB2 models transfer in 1 KiB chunks and
        // reject frames that do not fill the last chunk.
        if info.name.starts_with(LEGACY_MODEL_PREFIX)
            && !info.is_usb3
            && (self.width * self.height) % LEGACY_AREA_MODULO != 0
        {
            return Err(RoiError::AreaAlignment {
                width: self.width,
                height: self.height,
                modulo: LEGACY_AREA_MODULO,
                model: LEGACY_MODEL_PREFIX.to_owned(),
            });
        }
        if !info.supported_bins.contains(&self.bins) {
            return Err(RoiError::UnsupportedBinning { bins: self.bins });
        }
        if !info.supported_image_types.contains(&self.image_type) {
            return Err(RoiError::UnsupportedImageType {
                image_type: self.image_type,
            });
        }
        Ok(())
    }
}
