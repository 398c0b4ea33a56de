//! The vendor driver boundary.
//!
//! [`AsiDriver`] abstracts every driver call the session depends on, enabling
//! production use through the SDK-backed implementation and testing with a
//! scripted mock. Each method is a thin black-box call: it either succeeds or
//! reports the driver's error-code category, and carries no session policy of
//! its own.
//!
//! Cameras are addressed two ways, mirroring the driver: properties are
//! queried by *enumeration index* before a handle exists, while every call on
//! an open handle takes the *camera id* from the property block.

use std::path::Path;

use crate::error::SdkError;
use crate::info::CameraInfo;
use crate::types::{CameraMode, ExposureStatus, GuideDirection, ImageType};

/// Result of a raw driver call.
pub type DriverResult<T> = std::result::Result<T, SdkError>;

/// Identifier the driver uses to address one control on one camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlId(pub i32);

/// Static capability descriptor for one control, as reported by the driver.
///
/// The live value and auto-state are deliberately absent: they are read
/// fresh through [`AsiDriver::control_value`] on every query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlCaps {
    /// Unique name of the control, the key callers address it by.
    pub name: String,
    /// Driver-side identifier for value reads and writes.
    pub id: ControlId,
    /// Smallest accepted value (inclusive).
    pub min_value: i64,
    /// Largest accepted value (inclusive).
    pub max_value: i64,
    /// Factory default value.
    pub default_value: i64,
    /// Whether the control accepts writes.
    pub is_writable: bool,
    /// Whether the device can drive this control autonomously.
    pub supports_auto: bool,
}

/// Black-box interface to the vendor camera driver.
///
/// Implementations translate raw driver enums into domain types exhaustively;
/// an unmapped value surfaces as [`SdkError::UnexpectedValue`] rather than a
/// silent default.
pub trait AsiDriver {
    /// Version string of the underlying SDK.
    fn sdk_version(&self) -> String;

    /// Number of connected cameras.
    ///
    /// The driver requires this enumeration to have run at least once per
    /// process before any camera can be addressed by index.
    fn camera_count(&mut self) -> usize;

    /// Static property block of the camera at `camera_index`.
    fn camera_property(&mut self, camera_index: i32) -> DriverResult<CameraInfo>;

    /// Acquire the handle for `camera_id`.
    fn open(&mut self, camera_id: i32) -> DriverResult<()>;

    /// Initialize an opened camera. Must follow [`AsiDriver::open`].
    fn init(&mut self, camera_id: i32) -> DriverResult<()>;

    /// Release the handle for `camera_id`.
    fn close(&mut self, camera_id: i32) -> DriverResult<()>;

    /// Number of controls the camera exposes.
    fn control_count(&mut self, camera_id: i32) -> DriverResult<usize>;

    /// Capability descriptor of the control at `control_index`.
    fn control_caps(&mut self, camera_id: i32, control_index: usize) -> DriverResult<ControlCaps>;

    /// Live `(value, is_auto)` pair of a control.
    fn control_value(&mut self, camera_id: i32, control: ControlId) -> DriverResult<(i64, bool)>;

    /// Write a control value, optionally handing it to the device's auto mode.
    fn set_control_value(
        &mut self,
        camera_id: i32,
        control: ControlId,
        value: i64,
        auto: bool,
    ) -> DriverResult<()>;

    /// Current capture format as `(width, height, bins, image_type)`.
    fn roi_format(&mut self, camera_id: i32) -> DriverResult<(u32, u32, u32, ImageType)>;

    /// Set the capture format.
    fn set_roi_format(
        &mut self,
        camera_id: i32,
        width: u32,
        height: u32,
        bins: u32,
        image_type: ImageType,
    ) -> DriverResult<()>;

    /// Set the capture window origin.
    fn set_start_position(&mut self, camera_id: i32, start_x: u32, start_y: u32)
        -> DriverResult<()>;

    /// Begin an exposure. `is_dark` asks for a mechanical-shutter dark frame.
    fn start_exposure(&mut self, camera_id: i32, is_dark: bool) -> DriverResult<()>;

    /// Abort an in-flight exposure.
    fn stop_exposure(&mut self, camera_id: i32) -> DriverResult<()>;

    /// Current state of the exposure engine.
    fn exposure_status(&mut self, camera_id: i32) -> DriverResult<ExposureStatus>;

    /// Read the completed frame into `buffer`.
    fn exposure_data(&mut self, camera_id: i32, buffer: &mut [u8]) -> DriverResult<()>;

    /// Start a guiding pulse on the ST4 port.
    fn pulse_guide_on(&mut self, camera_id: i32, direction: GuideDirection) -> DriverResult<()>;

    /// Stop a guiding pulse on the ST4 port.
    fn pulse_guide_off(&mut self, camera_id: i32, direction: GuideDirection) -> DriverResult<()>;

    /// Enable device-side dark-frame subtraction using the given reference
    /// frame. The path is handed to the driver opaquely.
    fn enable_dark_subtract(&mut self, camera_id: i32, dark_frame: &Path) -> DriverResult<()>;

    /// Disable device-side dark-frame subtraction.
    fn disable_dark_subtract(&mut self, camera_id: i32) -> DriverResult<()>;

    /// Set the trigger behavior of a trigger-capable camera.
    fn set_camera_mode(&mut self, camera_id: i32, mode: CameraMode) -> DriverResult<()>;
}
