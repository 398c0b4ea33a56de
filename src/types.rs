//! Domain enums shared across the session, driver boundary, and config layer.
//!
//! Each enum that crosses the vendor boundary carries `from_sdk`/`sdk_code`
//! conversions against the driver's raw integer codes. The mappings are
//! exhaustive: a raw code with no domain counterpart yields `None`, which the
//! SDK driver escalates instead of defaulting.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Pixel encoding of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    /// Raw sensor data, 8 bits per pixel.
    Raw8,
    /// Interleaved RGB, 24 bits per pixel.
    Rgb24,
    /// Raw sensor data, 16 bits per pixel.
    Raw16,
    /// Luminance only, 8 bits per pixel.
    Y8,
}

impl ImageType {
    /// Bytes each pixel occupies in a frame buffer of this encoding.
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Raw8 | Self::Y8 => 1,
            Self::Raw16 => 2,
            Self::Rgb24 => 3,
        }
    }

    /// Translate the driver's image-type code, if it has a domain counterpart.
    #[must_use]
    pub const fn from_sdk(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Raw8),
            1 => Some(Self::Rgb24),
            2 => Some(Self::Raw16),
            3 => Some(Self::Y8),
            _ => None,
        }
    }

    /// The driver's code for this encoding.
    #[must_use]
    pub const fn sdk_code(self) -> i32 {
        match self {
            Self::Raw8 => 0,
            Self::Rgb24 => 1,
            Self::Raw16 => 2,
            Self::Y8 => 3,
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Raw8 => "raw8",
            Self::Rgb24 => "rgb24",
            Self::Raw16 => "raw16",
            Self::Y8 => "y8",
        };
        f.write_str(label)
    }
}

/// Color-filter mosaic layout of the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BayerPattern {
    /// Monochrome sensor, no mosaic.
    None,
    /// Red/green rows first.
    RG,
    /// Blue/green rows first.
    BG,
    /// Green/red rows first.
    GR,
    /// Green/blue rows first.
    GB,
}

impl BayerPattern {
    /// Translate the driver's bayer-pattern code, if it has a domain counterpart.
    #[must_use]
    pub const fn from_sdk(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::RG),
            1 => Some(Self::BG),
            2 => Some(Self::GR),
            3 => Some(Self::GB),
            _ => None,
        }
    }
}

impl fmt::Display for BayerPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::None => "none",
            Self::RG => "RG",
            Self::BG => "BG",
            Self::GR => "GR",
            Self::GB => "GB",
        };
        f.write_str(label)
    }
}

/// Direction of a guiding pulse on the ST4 port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuideDirection {
    /// Declination plus.
    North,
    /// Declination minus.
    South,
    /// Right ascension plus.
    East,
    /// Right ascension minus.
    West,
}

impl GuideDirection {
    /// The driver's code for this direction.
    #[must_use]
    pub const fn sdk_code(self) -> i32 {
        match self {
            Self::North => 0,
            Self::South => 1,
            Self::East => 2,
            Self::West => 3,
        }
    }
}

/// Trigger behavior of the camera, for models with trigger support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraMode {
    /// Free-running capture.
    Normal,
    /// Software edge trigger.
    SoftEdge,
    /// External trigger on the rising edge.
    RiseEdge,
    /// External trigger on the falling edge.
    FallEdge,
    /// Software level trigger.
    SoftLevel,
    /// External trigger while the signal is high.
    HighLevel,
    /// External trigger while the signal is low.
    LowLevel,
}

impl CameraMode {
    /// The driver's code for this mode.
    #[must_use]
    pub const fn sdk_code(self) -> i32 {
        match self {
            Self::Normal => 0,
            Self::SoftEdge => 1,
            Self::RiseEdge => 2,
            Self::FallEdge => 3,
            Self::SoftLevel => 4,
            Self::HighLevel => 5,
            Self::LowLevel => 6,
        }
    }
}

/// State of the exposure engine as reported by the device.
///
/// A capture drives `Idle -> Working -> {Success, Failed}`; some driver
/// revisions report a plain return to `Idle` instead of `Success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExposureStatus {
    /// No exposure in flight.
    Idle,
    /// An exposure is in progress.
    Working,
    /// The last exposure completed and its frame is ready to read.
    Success,
    /// The last exposure failed.
    Failed,
}

impl ExposureStatus {
    /// Translate the driver's status code, if it has a domain counterpart.
    #[must_use]
    pub const fn from_sdk(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Idle),
            1 => Some(Self::Working),
            2 => Some(Self::Success),
            3 => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for ExposureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Working => "working",
            Self::Success => "success",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}
