//! Mock driver implementation for testing without hardware.
//!
//! The mock models one camera at enumeration index 0. Tests script the
//! control set, the exposure status sequence, the frame content, and
//! individual call failures, then assert on the recorded call log.

use std::cell::Cell;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::path::Path;
use std::rc::Rc;

use crate::driver::{AsiDriver, ControlCaps, ControlId, DriverResult};
use crate::error::SdkError;
use crate::info::CameraInfo;
use crate::types::{BayerPattern, CameraMode, ExposureStatus, GuideDirection, ImageType};

/// Camera id the mock device reports in its property block.
///
/// Deliberately different from the enumeration index so tests catch code
/// that confuses the two.
pub const MOCK_CAMERA_ID: i32 = 42;

/// Capability snapshot of the mock device.
#[must_use]
pub fn mock_camera_info() -> CameraInfo {
    CameraInfo {
        name: "ZWO ASI Mock".to_owned(),
        camera_id: MOCK_CAMERA_ID,
        max_width: 1280,
        max_height: 960,
        is_color: false,
        bayer: BayerPattern::None,
        supported_bins: BTreeSet::from([1, 2]),
        supported_image_types: BTreeSet::from([
            ImageType::Raw8,
            ImageType::Rgb24,
            ImageType::Raw16,
            ImageType::Y8,
        ]),
        pixel_size_um: 3.75,
        mechanical_shutter: false,
        st4_port: true,
        has_cooler: false,
        is_usb3_host: true,
        is_usb3: true,
        elec_per_adu: 0.25,
        bit_depth: 12,
        is_trigger: true,
    }
}

/// A writable control without auto support.
#[must_use]
pub fn writable_control(name: &str, min: i64, max: i64, default: i64) -> ControlCaps {
    ControlCaps {
        name: name.to_owned(),
        id: ControlId(0),
        min_value: min,
        max_value: max,
        default_value: default,
        is_writable: true,
        supports_auto: false,
    }
}

/// A writable control with auto support.
#[must_use]
pub fn auto_control(name: &str, min: i64, max: i64, default: i64) -> ControlCaps {
    ControlCaps {
        supports_auto: true,
        ..writable_control(name, min, max, default)
    }
}

/// A read-only control.
#[must_use]
pub fn read_only_control(name: &str, min: i64, max: i64) -> ControlCaps {
    ControlCaps {
        is_writable: false,
        ..writable_control(name, min, max, min)
    }
}

/// Scriptable in-memory driver for one camera.
#[derive(Debug)]
pub struct MockDriver {
    info: CameraInfo,
    controls: Vec<ControlCaps>,
    values: HashMap<i32, (i64, bool)>,
    roi: (u32, u32, u32, ImageType),
    start_position: (u32, u32),
    status_script: VecDeque<ExposureStatus>,
    frame: Vec<u8>,
    calls: Vec<&'static str>,

    /// Every `set_control_value` the driver saw, in order.
    pub control_writes: Vec<(ControlId, i64, bool)>,
    /// Number of `set_roi_format` calls.
    pub set_roi_format_count: usize,
    /// Number of `set_start_position` calls.
    pub set_start_position_count: usize,
    /// Number of `start_exposure` calls.
    pub start_exposure_count: usize,
    /// Number of `stop_exposure` calls.
    pub stop_exposure_count: usize,
    /// Number of `exposure_data` calls.
    pub exposure_data_count: usize,
    /// Number of `close` calls; shared so it survives the session's drop.
    pub close_count: Rc<Cell<usize>>,

    /// Fail `init` with this code.
    pub fail_init: Option<SdkError>,
    /// Fail `control_caps` for this control index.
    pub fail_control_caps_at: Option<usize>,
    /// Fail `set_control_value` with this code.
    pub fail_set_control: Option<SdkError>,
    /// Fail `set_roi_format` with this code.
    pub fail_set_roi_format: Option<SdkError>,
    /// Fail `start_exposure` with this code.
    pub fail_start_exposure: Option<SdkError>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    /// A mock with no controls, a 640x480 Raw8 format, and an empty status
    /// script (the status reads idle once the script runs out).
    #[must_use]
    pub fn new() -> Self {
        Self {
            info: mock_camera_info(),
            controls: Vec::new(),
            values: HashMap::new(),
            roi: (640, 480, 1, ImageType::Raw8),
            start_position: (0, 0),
            status_script: VecDeque::new(),
            frame: Vec::new(),
            calls: Vec::new(),
            control_writes: Vec::new(),
            set_roi_format_count: 0,
            set_start_position_count: 0,
            start_exposure_count: 0,
            stop_exposure_count: 0,
            exposure_data_count: 0,
            close_count: Rc::new(Cell::new(0)),
            fail_init: None,
            fail_control_caps_at: None,
            fail_set_control: None,
            fail_set_roi_format: None,
            fail_start_exposure: None,
        }
    }

    /// Add a control with the given live value (non-auto). The control id is
    /// assigned from the insertion order.
    #[must_use]
    pub fn with_control(mut self, mut caps: ControlCaps, value: i64) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let id = ControlId(self.controls.len() as i32);
        caps.id = id;
        self.values.insert(id.0, (value, false));
        self.controls.push(caps);
        self
    }

    /// Script the statuses returned by successive `exposure_status` calls.
    #[must_use]
    pub fn with_status_sequence<I>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = ExposureStatus>,
    {
        self.status_script = statuses.into_iter().collect();
        self
    }

    /// Set the frame bytes a completed exposure delivers.
    #[must_use]
    pub fn with_frame(mut self, frame: Vec<u8>) -> Self {
        self.frame = frame;
        self
    }

    /// The mock device's capability snapshot.
    #[must_use]
    pub fn info(&self) -> &CameraInfo {
        &self.info
    }

    /// The call log, in order.
    #[must_use]
    pub fn calls(&self) -> &[&'static str] {
        &self.calls
    }

    /// The current device-side format as `(width, height, bins, image_type)`.
    #[must_use]
    pub fn roi_state(&self) -> (u32, u32, u32, ImageType) {
        self.roi
    }

    /// The current device-side capture window origin.
    #[must_use]
    pub fn start_position(&self) -> (u32, u32) {
        self.start_position
    }

    fn check_id(&self, camera_id: i32) -> DriverResult<()> {
        if camera_id == self.info.camera_id {
            Ok(())
        } else {
            Err(SdkError::InvalidId)
        }
    }
}

impl AsiDriver for MockDriver {
    fn sdk_version(&self) -> String {
        "mock 1.0".to_owned()
    }

    fn camera_count(&mut self) -> usize {
        self.calls.push("camera_count");
        1
    }

    fn camera_property(&mut self, camera_index: i32) -> DriverResult<CameraInfo> {
        self.calls.push("camera_property");
        if camera_index == 0 {
            Ok(self.info.clone())
        } else {
            Err(SdkError::InvalidIndex)
        }
    }

    fn open(&mut self, camera_id: i32) -> DriverResult<()> {
        self.calls.push("open");
        self.check_id(camera_id)
    }

    fn init(&mut self, camera_id: i32) -> DriverResult<()> {
        self.calls.push("init");
        self.check_id(camera_id)?;
        match self.fail_init {
            Some(code) => Err(code),
            None => Ok(()),
        }
    }

    fn close(&mut self, camera_id: i32) -> DriverResult<()> {
        self.calls.push("close");
        self.check_id(camera_id)?;
        self.close_count.set(self.close_count.get() + 1);
        Ok(())
    }

    fn control_count(&mut self, camera_id: i32) -> DriverResult<usize> {
        self.calls.push("control_count");
        self.check_id(camera_id)?;
        Ok(self.controls.len())
    }

    fn control_caps(&mut self, camera_id: i32, control_index: usize) -> DriverResult<ControlCaps> {
        self.calls.push("control_caps");
        self.check_id(camera_id)?;
        if self.fail_control_caps_at == Some(control_index) {
            return Err(SdkError::GeneralError);
        }
        self.controls
            .get(control_index)
            .cloned()
            .ok_or(SdkError::InvalidControlType)
    }

    fn control_value(&mut self, camera_id: i32, control: ControlId) -> DriverResult<(i64, bool)> {
        self.calls.push("control_value");
        self.check_id(camera_id)?;
        self.values
            .get(&control.0)
            .copied()
            .ok_or(SdkError::InvalidControlType)
    }

    fn set_control_value(
        &mut self,
        camera_id: i32,
        control: ControlId,
        value: i64,
        auto: bool,
    ) -> DriverResult<()> {
        self.calls.push("set_control_value");
        self.check_id(camera_id)?;
        if let Some(code) = self.fail_set_control {
            return Err(code);
        }
        if !self.values.contains_key(&control.0) {
            return Err(SdkError::InvalidControlType);
        }
        self.control_writes.push((control, value, auto));
        self.values.insert(control.0, (value, auto));
        Ok(())
    }

    fn roi_format(&mut self, camera_id: i32) -> DriverResult<(u32, u32, u32, ImageType)> {
        self.calls.push("roi_format");
        self.check_id(camera_id)?;
        Ok(self.roi)
    }

    fn set_roi_format(
        &mut self,
        camera_id: i32,
        width: u32,
        height: u32,
        bins: u32,
        image_type: ImageType,
    ) -> DriverResult<()> {
        self.calls.push("set_roi_format");
        self.check_id(camera_id)?;
        self.set_roi_format_count += 1;
        if let Some(code) = self.fail_set_roi_format {
            return Err(code);
        }
        self.roi = (width, height, bins, image_type);
        Ok(())
    }

    fn set_start_position(
        &mut self,
        camera_id: i32,
        start_x: u32,
        start_y: u32,
    ) -> DriverResult<()> {
        self.calls.push("set_start_position");
        self.check_id(camera_id)?;
        self.set_start_position_count += 1;
        self.start_position = (start_x, start_y);
        Ok(())
    }

    fn start_exposure(&mut self, camera_id: i32, _is_dark: bool) -> DriverResult<()> {
        self.calls.push("start_exposure");
        self.check_id(camera_id)?;
        if let Some(code) = self.fail_start_exposure {
            return Err(code);
        }
        self.start_exposure_count += 1;
        Ok(())
    }

    fn stop_exposure(&mut self, camera_id: i32) -> DriverResult<()> {
        self.calls.push("stop_exposure");
        self.check_id(camera_id)?;
        self.stop_exposure_count += 1;
        Ok(())
    }

    fn exposure_status(&mut self, camera_id: i32) -> DriverResult<ExposureStatus> {
        self.calls.push("exposure_status");
        self.check_id(camera_id)?;
        Ok(self
            .status_script
            .pop_front()
            .unwrap_or(ExposureStatus::Idle))
    }

    fn exposure_data(&mut self, camera_id: i32, buffer: &mut [u8]) -> DriverResult<()> {
        self.calls.push("exposure_data");
        self.check_id(camera_id)?;
        self.exposure_data_count += 1;
        buffer
            .get_mut(..self.frame.len())
            .ok_or(SdkError::BufferTooSmall)?
            .copy_from_slice(&self.frame);
        Ok(())
    }

    fn pulse_guide_on(&mut self, camera_id: i32, _direction: GuideDirection) -> DriverResult<()> {
        self.calls.push("pulse_guide_on");
        self.check_id(camera_id)
    }

    fn pulse_guide_off(&mut self, camera_id: i32, _direction: GuideDirection) -> DriverResult<()> {
        self.calls.push("pulse_guide_off");
        self.check_id(camera_id)
    }

    fn enable_dark_subtract(&mut self, camera_id: i32, _dark_frame: &Path) -> DriverResult<()> {
        self.calls.push("enable_dark_subtract");
        self.check_id(camera_id)
    }

    fn disable_dark_subtract(&mut self, camera_id: i32) -> DriverResult<()> {
        self.calls.push("disable_dark_subtract");
        self.check_id(camera_id)
    }

    fn set_camera_mode(&mut self, camera_id: i32, _mode: CameraMode) -> DriverResult<()> {
        self.calls.push("set_camera_mode");
        self.check_id(camera_id)
    }
}
