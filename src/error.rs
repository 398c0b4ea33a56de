//! Typed failure taxonomy for device, control, and geometry faults.
//!
//! Callers are expected to match on the variant, not on the rendered
//! message. `CameraError::Device` carries the error-code category reported
//! by the vendor driver together with the index of the faulting camera.

use std::time::Duration;

use thiserror::Error;

use crate::types::{ExposureStatus, ImageType};

/// Convenience alias for results using the library error type.
pub type Result<T> = std::result::Result<T, CameraError>;

/// Error-code category reported by the vendor driver.
///
/// Mirrors the driver's own error enumeration one-to-one, plus
/// [`SdkError::UnexpectedValue`] for values the driver reports that have no
/// domain mapping (a driver defect, never silently defaulted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SdkError {
    /// No camera at the given enumeration index.
    #[error("ASI_ERROR_INVALID_INDEX")]
    InvalidIndex,
    /// No camera with the given id.
    #[error("ASI_ERROR_INVALID_ID")]
    InvalidId,
    /// Unknown control type.
    #[error("ASI_ERROR_INVALID_CONTROL_TYPE")]
    InvalidControlType,
    /// The camera is not open.
    #[error("ASI_ERROR_CAMERA_CLOSED")]
    CameraClosed,
    /// The camera was unplugged.
    #[error("ASI_ERROR_CAMERA_REMOVED")]
    CameraRemoved,
    /// A file path could not be used.
    #[error("ASI_ERROR_INVALID_PATH")]
    InvalidPath,
    /// A file had the wrong format.
    #[error("ASI_ERROR_INVALID_FILEFORMAT")]
    InvalidFileFormat,
    /// The requested geometry size was rejected.
    #[error("ASI_ERROR_INVALID_SIZE")]
    InvalidSize,
    /// The requested pixel encoding was rejected.
    #[error("ASI_ERROR_INVALID_IMGTYPE")]
    InvalidImageType,
    /// The capture window leaves the sensor area.
    #[error("ASI_ERROR_OUTOF_BOUNDARY")]
    OutOfBoundary,
    /// The driver timed out internally.
    #[error("ASI_ERROR_TIMEOUT")]
    Timeout,
    /// Calls were made in an order the driver forbids.
    #[error("ASI_ERROR_INVALID_SEQUENCE")]
    InvalidSequence,
    /// The provided buffer is too small for the frame.
    #[error("ASI_ERROR_BUFFER_TOO_SMALL")]
    BufferTooSmall,
    /// The operation conflicts with an active video mode.
    #[error("ASI_ERROR_VIDEO_MODE_ACTIVE")]
    VideoModeActive,
    /// An exposure is already in flight.
    #[error("ASI_ERROR_EXPOSURE_IN_PROGRESS")]
    ExposureInProgress,
    /// Unclassified driver failure.
    #[error("ASI_ERROR_GENERAL_ERROR")]
    GeneralError,
    /// The driver reported a value with no domain mapping.
    #[error("unexpected value reported by the driver")]
    UnexpectedValue,
}

impl SdkError {
    /// Map a raw driver error code to its category.
    ///
    /// Code `0` is the driver's success value and has no category; it must
    /// be filtered out before calling this.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::InvalidIndex,
            2 => Self::InvalidId,
            3 => Self::InvalidControlType,
            4 => Self::CameraClosed,
            5 => Self::CameraRemoved,
            6 => Self::InvalidPath,
            7 => Self::InvalidFileFormat,
            8 => Self::InvalidSize,
            9 => Self::InvalidImageType,
            10 => Self::OutOfBoundary,
            11 => Self::Timeout,
            12 => Self::InvalidSequence,
            13 => Self::BufferTooSmall,
            14 => Self::VideoModeActive,
            15 => Self::ExposureInProgress,
            16 => Self::GeneralError,
            _ => Self::UnexpectedValue,
        }
    }
}

/// Geometry violations detected before a region of interest reaches the
/// device. Checks run in a fixed order and stop at the first violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoiError {
    /// The width is not a multiple of the required alignment.
    #[error("ROI width%{modulo} should be 0 (not the case for {width})")]
    WidthAlignment { width: u32, modulo: u32 },
    /// The height is not a multiple of the required alignment.
    #[error("ROI height%{modulo} should be 0 (not the case for {height})")]
    HeightAlignment { height: u32, modulo: u32 },
    /// Legacy model families without USB3 constrain the total pixel count.
    #[error(
        "for camera {model}, ROI width*height%{modulo} should be 0 \
         (not the case for {width}/{height})"
    )]
    AreaAlignment {
        width: u32,
        height: u32,
        modulo: u32,
        model: String,
    },
    /// The binning factor is not in the device's supported set.
    #[error("unsupported number of bin(s): {bins}")]
    UnsupportedBinning { bins: u32 },
    /// The pixel encoding is not in the device's supported set.
    #[error("unsupported image type: {image_type}")]
    UnsupportedImageType { image_type: ImageType },
}

/// Error type for all camera session operations.
#[derive(Debug, Error)]
pub enum CameraError {
    /// A driver call failed.
    #[error("(camera index: {camera_index}) {context} (error code: {code})")]
    Device {
        /// What the session was doing when the driver call failed.
        context: String,
        /// Index of the faulting camera.
        camera_index: i32,
        /// Error-code category reported by the driver.
        code: SdkError,
    },

    /// The named control does not exist on this device.
    #[error("no such controllable: {control}")]
    UnknownControl { control: String },

    /// The named control is read-only.
    #[error("failed to change the value of {control}: not writable")]
    NotWritable { control: String },

    /// The named control does not support auto-mode.
    #[error("failed to change the value of {control} to auto-mode (not supported)")]
    AutoUnsupported { control: String },

    /// A value outside the control's declared range was rejected client-side.
    #[error("out of bound value for {control}: {value} is not in the range {min}; {max}")]
    ControlOutOfRange {
        control: String,
        value: i64,
        min: i64,
        max: i64,
    },

    /// A region of interest failed validation against the device capabilities.
    #[error(transparent)]
    Roi(#[from] RoiError),

    /// A capture was requested while the camera was not idle.
    #[error("could not take a picture: camera {camera_index} busy (exposure status: {status})")]
    Busy {
        camera_index: i32,
        /// The exposure status observed at the moment of the request.
        status: ExposureStatus,
    },

    /// The device reported a failed exposure.
    #[error("failed to get exposure (camera index: {camera_index})")]
    Capture { camera_index: i32 },

    /// The configured capture deadline expired before the exposure settled.
    #[error("exposure did not complete within {waited:?} (camera index: {camera_index})")]
    ExposureTimeout {
        camera_index: i32,
        /// The deadline that was exceeded.
        waited: Duration,
    },

    /// The USB buffer-size budget is too small, usually a udev rules issue.
    #[error(
        "usbfs memory is limited to {usbfs_memory_mb} MB but ASI cameras need at \
         least 200 MB; install the 99-asi.rules udev file (see udev::write_udev_rules) \
         and reconnect the camera"
    )]
    Permission { usbfs_memory_mb: u32 },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A camera profile could not be parsed.
    #[error("failed to parse camera configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A camera profile could not be rendered.
    #[error("failed to render camera configuration: {0}")]
    ConfigRender(#[from] toml::ser::Error),
}

impl CameraError {
    /// Build a [`CameraError::Device`] from the context of a failed call.
    pub(crate) fn device(context: &str, camera_index: i32, code: SdkError) -> Self {
        Self::Device {
            context: context.to_owned(),
            camera_index,
            code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_error_display_includes_index_and_code() {
        let err = CameraError::device("failed to open the camera", 2, SdkError::CameraRemoved);
        assert_eq!(
            err.to_string(),
            "(camera index: 2) failed to open the camera (error code: ASI_ERROR_CAMERA_REMOVED)"
        );
    }

    #[test]
    fn sdk_error_codes_map_to_categories() {
        assert_eq!(SdkError::from_code(1), SdkError::InvalidIndex);
        assert_eq!(SdkError::from_code(13), SdkError::BufferTooSmall);
        assert_eq!(SdkError::from_code(16), SdkError::GeneralError);
        assert_eq!(SdkError::from_code(99), SdkError::UnexpectedValue);
    }

    #[test]
    fn roi_error_display_names_the_faulting_value() {
        let err = RoiError::WidthAlignment {
            width: 13,
            modulo: 8,
        };
        assert_eq!(err.to_string(), "ROI width%8 should be 0 (not the case for 13)");

        let err = RoiError::AreaAlignment {
            width: 24,
            height: 10,
            modulo: 1024,
            model: "ASI120".to_owned(),
        };
        assert!(err.to_string().contains("ASI120"));
        assert!(err.to_string().contains("24/10"));
    }

    #[test]
    fn out_of_range_display_names_the_range() {
        let err = CameraError::ControlOutOfRange {
            control: "Gain".to_owned(),
            value: 700,
            min: 0,
            max: 600,
        };
        assert_eq!(
            err.to_string(),
            "out of bound value for Gain: 700 is not in the range 0; 600"
        );
    }
}
