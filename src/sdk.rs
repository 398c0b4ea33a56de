//! SDK-backed driver implementation.
//!
//! Thin translation layer between [`AsiDriver`] and the vendor ASICamera2
//! library bound by the `asi-sys` crate. Every call site maps the raw return
//! code through [`SdkError::from_code`] and translates vendor enums
//! exhaustively; a value with no domain counterpart surfaces as
//! [`SdkError::UnexpectedValue`].

#![allow(unsafe_code)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::unnecessary_cast)]

use std::collections::BTreeSet;
use std::ffi::{CStr, CString};
use std::mem::MaybeUninit;
use std::os::raw::{c_char, c_int, c_long};
use std::path::Path;

use asi_sys as sys;

use crate::driver::{AsiDriver, ControlCaps, ControlId, DriverResult};
use crate::error::SdkError;
use crate::info::CameraInfo;
use crate::types::{BayerPattern, CameraMode, ExposureStatus, GuideDirection, ImageType};

/// Driver talking to real hardware through the vendor SDK.
///
/// The SDK keeps its own process-global state, so this type carries none;
/// constructing several is harmless but they all address the same driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdkDriver;

impl SdkDriver {
    /// A handle to the vendor SDK.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn check(code: sys::ASI_ERROR_CODE) -> DriverResult<()> {
    if code == sys::ASI_ERROR_CODE_ASI_SUCCESS {
        Ok(())
    } else {
        Err(SdkError::from_code(code as i32))
    }
}

fn to_bool(value: sys::ASI_BOOL) -> bool {
    value == sys::ASI_BOOL_ASI_TRUE
}

fn to_asi_bool(value: bool) -> sys::ASI_BOOL {
    if value {
        sys::ASI_BOOL_ASI_TRUE
    } else {
        sys::ASI_BOOL_ASI_FALSE
    }
}

fn c_name(raw: &[c_char]) -> String {
    unsafe { CStr::from_ptr(raw.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}

fn translate_info(raw: &sys::ASI_CAMERA_INFO) -> DriverResult<CameraInfo> {
    let is_color = to_bool(raw.IsColorCam);
    let bayer = if is_color {
        BayerPattern::from_sdk(raw.BayerPattern as i32).ok_or(SdkError::UnexpectedValue)?
    } else {
        // The vendor struct reports a stale pattern for mono sensors.
        BayerPattern::None
    };

    let mut supported_bins = BTreeSet::new();
    for &bin in &raw.SupportedBins {
        if bin == 0 {
            break;
        }
        supported_bins.insert(u32::try_from(bin).map_err(|_| SdkError::UnexpectedValue)?);
    }

    let mut supported_image_types = BTreeSet::new();
    for &code in &raw.SupportedVideoFormat {
        if code == sys::ASI_IMG_TYPE_ASI_IMG_END {
            break;
        }
        supported_image_types
            .insert(ImageType::from_sdk(code as i32).ok_or(SdkError::UnexpectedValue)?);
    }

    Ok(CameraInfo {
        name: c_name(&raw.Name),
        camera_id: raw.CameraID,
        max_width: u32::try_from(raw.MaxWidth).map_err(|_| SdkError::UnexpectedValue)?,
        max_height: u32::try_from(raw.MaxHeight).map_err(|_| SdkError::UnexpectedValue)?,
        is_color,
        bayer,
        supported_bins,
        supported_image_types,
        pixel_size_um: raw.PixelSize,
        mechanical_shutter: to_bool(raw.MechanicalShutter),
        st4_port: to_bool(raw.ST4Port),
        has_cooler: to_bool(raw.IsCoolerCam),
        is_usb3_host: to_bool(raw.IsUSB3Host),
        is_usb3: to_bool(raw.IsUSB3Camera),
        elec_per_adu: raw.ElecPerADU,
        bit_depth: u32::try_from(raw.BitDepth).map_err(|_| SdkError::UnexpectedValue)?,
        is_trigger: to_bool(raw.IsTriggerCam),
    })
}

impl AsiDriver for SdkDriver {
    fn sdk_version(&self) -> String {
        unsafe { CStr::from_ptr(sys::ASIGetSDKVersion()) }
            .to_string_lossy()
            .into_owned()
    }

    fn camera_count(&mut self) -> usize {
        let count = unsafe { sys::ASIGetNumOfConnectedCameras() };
        usize::try_from(count).unwrap_or(0)
    }

    fn camera_property(&mut self, camera_index: i32) -> DriverResult<CameraInfo> {
        let mut raw = MaybeUninit::<sys::ASI_CAMERA_INFO>::zeroed();
        check(unsafe { sys::ASIGetCameraProperty(raw.as_mut_ptr(), camera_index) })?;
        let raw = unsafe { raw.assume_init() };
        translate_info(&raw)
    }

    fn open(&mut self, camera_id: i32) -> DriverResult<()> {
        check(unsafe { sys::ASIOpenCamera(camera_id) })
    }

    fn init(&mut self, camera_id: i32) -> DriverResult<()> {
        check(unsafe { sys::ASIInitCamera(camera_id) })
    }

    fn close(&mut self, camera_id: i32) -> DriverResult<()> {
        check(unsafe { sys::ASICloseCamera(camera_id) })
    }

    fn control_count(&mut self, camera_id: i32) -> DriverResult<usize> {
        let mut count: c_int = 0;
        check(unsafe { sys::ASIGetNumOfControls(camera_id, &mut count) })?;
        usize::try_from(count).map_err(|_| SdkError::UnexpectedValue)
    }

    fn control_caps(&mut self, camera_id: i32, control_index: usize) -> DriverResult<ControlCaps> {
        let index = c_int::try_from(control_index).map_err(|_| SdkError::UnexpectedValue)?;
        let mut raw = MaybeUninit::<sys::ASI_CONTROL_CAPS>::zeroed();
        check(unsafe { sys::ASIGetControlCaps(camera_id, index, raw.as_mut_ptr()) })?;
        let raw = unsafe { raw.assume_init() };
        Ok(ControlCaps {
            name: c_name(&raw.Name),
            id: ControlId(raw.ControlType as i32),
            min_value: raw.MinValue as i64,
            max_value: raw.MaxValue as i64,
            default_value: raw.DefaultValue as i64,
            is_writable: to_bool(raw.IsWritable),
            supports_auto: to_bool(raw.IsAutoSupported),
        })
    }

    fn control_value(&mut self, camera_id: i32, control: ControlId) -> DriverResult<(i64, bool)> {
        let mut value: c_long = 0;
        let mut auto: sys::ASI_BOOL = sys::ASI_BOOL_ASI_FALSE;
        check(unsafe {
            sys::ASIGetControlValue(
                camera_id,
                control.0 as sys::ASI_CONTROL_TYPE,
                &mut value,
                &mut auto,
            )
        })?;
        Ok((value as i64, to_bool(auto)))
    }

    fn set_control_value(
        &mut self,
        camera_id: i32,
        control: ControlId,
        value: i64,
        auto: bool,
    ) -> DriverResult<()> {
        check(unsafe {
            sys::ASISetControlValue(
                camera_id,
                control.0 as sys::ASI_CONTROL_TYPE,
                value as c_long,
                to_asi_bool(auto),
            )
        })
    }

    fn roi_format(&mut self, camera_id: i32) -> DriverResult<(u32, u32, u32, ImageType)> {
        let mut width: c_int = 0;
        let mut height: c_int = 0;
        let mut bins: c_int = 0;
        let mut image_type: sys::ASI_IMG_TYPE = sys::ASI_IMG_TYPE_ASI_IMG_END;
        check(unsafe {
            sys::ASIGetROIFormat(camera_id, &mut width, &mut height, &mut bins, &mut image_type)
        })?;
        Ok((
            u32::try_from(width).map_err(|_| SdkError::UnexpectedValue)?,
            u32::try_from(height).map_err(|_| SdkError::UnexpectedValue)?,
            u32::try_from(bins).map_err(|_| SdkError::UnexpectedValue)?,
            ImageType::from_sdk(image_type as i32).ok_or(SdkError::UnexpectedValue)?,
        ))
    }

    fn set_roi_format(
        &mut self,
        camera_id: i32,
        width: u32,
        height: u32,
        bins: u32,
        image_type: ImageType,
    ) -> DriverResult<()> {
        let width = c_int::try_from(width).map_err(|_| SdkError::InvalidSize)?;
        let height = c_int::try_from(height).map_err(|_| SdkError::InvalidSize)?;
        let bins = c_int::try_from(bins).map_err(|_| SdkError::InvalidSize)?;
        check(unsafe {
            sys::ASISetROIFormat(
                camera_id,
                width,
                height,
                bins,
                image_type.sdk_code() as sys::ASI_IMG_TYPE,
            )
        })
    }

    fn set_start_position(
        &mut self,
        camera_id: i32,
        start_x: u32,
        start_y: u32,
    ) -> DriverResult<()> {
        let start_x = c_int::try_from(start_x).map_err(|_| SdkError::OutOfBoundary)?;
        let start_y = c_int::try_from(start_y).map_err(|_| SdkError::OutOfBoundary)?;
        check(unsafe { sys::ASISetStartPos(camera_id, start_x, start_y) })
    }

    fn start_exposure(&mut self, camera_id: i32, is_dark: bool) -> DriverResult<()> {
        check(unsafe { sys::ASIStartExposure(camera_id, to_asi_bool(is_dark)) })
    }

    fn stop_exposure(&mut self, camera_id: i32) -> DriverResult<()> {
        check(unsafe { sys::ASIStopExposure(camera_id) })
    }

    fn exposure_status(&mut self, camera_id: i32) -> DriverResult<ExposureStatus> {
        let mut status: sys::ASI_EXPOSURE_STATUS = sys::ASI_EXPOSURE_STATUS_ASI_EXP_IDLE;
        check(unsafe { sys::ASIGetExpStatus(camera_id, &mut status) })?;
        ExposureStatus::from_sdk(status as i32).ok_or(SdkError::UnexpectedValue)
    }

    fn exposure_data(&mut self, camera_id: i32, buffer: &mut [u8]) -> DriverResult<()> {
        let size = c_long::try_from(buffer.len()).map_err(|_| SdkError::BufferTooSmall)?;
        check(unsafe { sys::ASIGetDataAfterExp(camera_id, buffer.as_mut_ptr(), size) })
    }

    fn pulse_guide_on(&mut self, camera_id: i32, direction: GuideDirection) -> DriverResult<()> {
        check(unsafe {
            sys::ASIPulseGuideOn(camera_id, direction.sdk_code() as sys::ASI_GUIDE_DIRECTION)
        })
    }

    fn pulse_guide_off(&mut self, camera_id: i32, direction: GuideDirection) -> DriverResult<()> {
        check(unsafe {
            sys::ASIPulseGuideOff(camera_id, direction.sdk_code() as sys::ASI_GUIDE_DIRECTION)
        })
    }

    fn enable_dark_subtract(&mut self, camera_id: i32, dark_frame: &Path) -> DriverResult<()> {
        let path = CString::new(dark_frame.to_string_lossy().as_bytes())
            .map_err(|_| SdkError::InvalidPath)?;
        check(unsafe { sys::ASIEnableDarkSubtract(camera_id, path.as_ptr().cast_mut()) })
    }

    fn disable_dark_subtract(&mut self, camera_id: i32) -> DriverResult<()> {
        check(unsafe { sys::ASIDisableDarkSubtract(camera_id) })
    }

    fn set_camera_mode(&mut self, camera_id: i32, mode: CameraMode) -> DriverResult<()> {
        check(unsafe {
            sys::ASISetCameraMode(camera_id, mode.sdk_code() as sys::ASI_CAMERA_MODE)
        })
    }
}
