//! The device session: one open camera handle plus everything needed to
//! configure it and take pictures.
//!
//! A [`Camera`] exclusively owns its driver handle from construction to drop.
//! All operations are synchronous and observe call order; the capture poll
//! loop is the only point where the calling thread suspends.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::controls::{ControlRegistry, Controllable};
use crate::driver::AsiDriver;
use crate::error::{CameraError, Result, SdkError};
use crate::info::CameraInfo;
use crate::roi::Roi;
use crate::types::{CameraMode, ExposureStatus, GuideDirection};

/// Tuning knobs for the exposure poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExposureOptions {
    /// Sleep between two status queries.
    pub poll_interval: Duration,
    /// Upper bound on how long one poll phase may wait for the status to
    /// move on. `None` waits indefinitely, which is the baseline behavior.
    pub deadline: Option<Duration>,
}

impl Default for ExposureOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_micros(500),
            deadline: None,
        }
    }
}

/// What the poll loop settled on.
enum PollOutcome {
    /// The status moved away from the state being left.
    Settled(ExposureStatus),
    /// The deadline expired first.
    TimedOut,
}

/// Poll `read_status` until it reports anything other than `leaving`, or the
/// optional deadline expires. `wait` is called with the poll interval between
/// queries; status read failures propagate immediately.
fn poll_while<E, S, W>(
    leaving: ExposureStatus,
    options: ExposureOptions,
    mut read_status: S,
    mut wait: W,
) -> std::result::Result<PollOutcome, E>
where
    S: FnMut() -> std::result::Result<ExposureStatus, E>,
    W: FnMut(Duration),
{
    let started = Instant::now();
    loop {
        let status = read_status()?;
        if status != leaving {
            return Ok(PollOutcome::Settled(status));
        }
        if let Some(deadline) = options.deadline {
            if started.elapsed() >= deadline {
                return Ok(PollOutcome::TimedOut);
            }
        }
        wait(options.poll_interval);
    }
}

/// An open session on one camera.
///
/// Constructed by device index via [`Camera::open`]; the underlying handle is
/// released when the session drops, with close failures logged and swallowed.
///
/// The session provides no internal locking. All operations take `&mut self`
/// and are meant to be driven from one logical thread of control; callers
/// sharing a session across threads must add their own mutual exclusion
/// around the whole session, capture included.
#[derive(Debug)]
pub struct Camera<D: AsiDriver> {
    driver: D,
    info: CameraInfo,
    registry: ControlRegistry,
    camera_index: i32,
    roi: Roi,
    exposure: ExposureOptions,
}

impl<D: AsiDriver> Camera<D> {
    /// Open and initialize the camera at `camera_index`.
    ///
    /// Performs, in order: the process-wide enumeration the driver needs
    /// before any camera can be addressed, the capability snapshot fetch,
    /// handle open, device init, control discovery, and a read of the
    /// device's current capture format. If any step after the open fails,
    /// the handle is released before the error is returned.
    pub fn open(mut driver: D, camera_index: i32) -> Result<Self> {
        let info = CameraInfo::fetch(&mut driver, camera_index)?;
        let camera_id = info.camera_id;
        driver
            .open(camera_id)
            .map_err(|code| CameraError::device("failed to open the camera", camera_index, code))?;

        // The handle is held from here on; Drop releases it even when the
        // rest of the bring-up fails.
        let mut camera = Self {
            driver,
            info,
            registry: ControlRegistry::default(),
            camera_index,
            roi: Roi::default(),
            exposure: ExposureOptions::default(),
        };

        camera
            .driver
            .init(camera_id)
            .map_err(|code| CameraError::device("failed to init the camera", camera_index, code))?;
        camera.registry = ControlRegistry::discover(&mut camera.driver, camera_index, camera_id)?;
        camera.roi = camera.read_roi()?;
        Ok(camera)
    }

    /// The capability snapshot fetched at open.
    #[must_use]
    pub fn info(&self) -> &CameraInfo {
        &self.info
    }

    /// The device index this session was opened with.
    #[must_use]
    pub const fn index(&self) -> i32 {
        self.camera_index
    }

    /// The most recently applied region of interest.
    #[must_use]
    pub const fn roi(&self) -> &Roi {
        &self.roi
    }

    /// The current exposure poll tuning.
    #[must_use]
    pub const fn exposure_options(&self) -> ExposureOptions {
        self.exposure
    }

    /// Replace the exposure poll tuning.
    pub fn set_exposure_options(&mut self, options: ExposureOptions) {
        self.exposure = options;
    }

    fn device_error(&self, context: &str, code: SdkError) -> CameraError {
        CameraError::device(context, self.camera_index, code)
    }

    /// Live values of all controls, keyed by name.
    pub fn controls(&mut self) -> Result<BTreeMap<String, Controllable>> {
        self.registry.snapshot(&mut self.driver)
    }

    /// Live state of one control.
    pub fn control(&mut self, name: &str) -> Result<Controllable> {
        self.registry.get(&mut self.driver, name)
    }

    /// Set a control to a fixed value (non-auto mode).
    pub fn set_control(&mut self, name: &str, value: i64) -> Result<()> {
        self.registry.set(&mut self.driver, name, value)
    }

    /// Set a control to a fixed value, validating writability and range
    /// client-side before the device is touched.
    pub fn set_control_checked(&mut self, name: &str, value: i64) -> Result<()> {
        self.registry.set_checked(&mut self.driver, name, value)
    }

    /// Hand a control over to the device's auto mode.
    pub fn set_auto(&mut self, name: &str) -> Result<()> {
        self.registry.set_auto(&mut self.driver, name)
    }

    /// Query the device's current capture format.
    ///
    /// The driver does not report the window origin, so `start_x`/`start_y`
    /// are carried over from the session's current ROI. The session state is
    /// not modified.
    pub fn read_roi(&mut self) -> Result<Roi> {
        let (width, height, bins, image_type) = self
            .driver
            .roi_format(self.info.camera_id)
            .map_err(|code| self.device_error("failed to read the current ROI", code))?;
        Ok(Roi {
            width,
            height,
            bins,
            image_type,
            ..self.roi
        })
    }

    /// Validate and apply a region of interest.
    ///
    /// Validation happens before any device call, so a rejected ROI has no
    /// side effect. The format is applied first, then the window origin; if
    /// the format call fails the origin is never attempted, and the device
    /// keeps whatever the failed call left behind.
    pub fn set_roi(&mut self, roi: &Roi) -> Result<()> {
        roi.validate(&self.info)?;
        let camera_id = self.info.camera_id;
        self.driver
            .set_roi_format(camera_id, roi.width, roi.height, roi.bins, roi.image_type)
            .map_err(|code| self.device_error("failed to set the ROI", code))?;
        self.driver
            .set_start_position(camera_id, roi.start_x, roi.start_y)
            .map_err(|code| self.device_error("failed to set the ROI starting position", code))?;
        self.roi = *roi;
        Ok(())
    }

    /// Apply an ROI and a set of desired control states in one call.
    ///
    /// The ROI goes first. Controls are then applied independently of each
    /// other: read-only entries are skipped silently, entries with `is_auto`
    /// set are handed to auto mode, everything else is written as a fixed
    /// value.
    pub fn configure(
        &mut self,
        roi: &Roi,
        desired: &BTreeMap<String, Controllable>,
    ) -> Result<()> {
        self.set_roi(roi)?;
        for (name, control) in desired {
            if !control.is_writable {
                continue;
            }
            if control.is_auto {
                self.set_auto(name)?;
            } else {
                self.set_control(name, control.value)?;
            }
        }
        Ok(())
    }

    /// Current state of the exposure engine.
    pub fn exposure_status(&mut self) -> Result<ExposureStatus> {
        self.driver
            .exposure_status(self.info.camera_id)
            .map_err(|code| self.device_error("failed to read the exposure status", code))
    }

    fn wait_while(&mut self, leaving: ExposureStatus) -> Result<ExposureStatus> {
        let camera_id = self.info.camera_id;
        let camera_index = self.camera_index;
        let options = self.exposure;

        let driver = &mut self.driver;
        let outcome = poll_while(
            leaving,
            options,
            || {
                driver.exposure_status(camera_id).map_err(|code| {
                    CameraError::device("failed to read the exposure status", camera_index, code)
                })
            },
            thread::sleep,
        )?;

        match outcome {
            PollOutcome::Settled(status) => Ok(status),
            PollOutcome::TimedOut => {
                // Best-effort abort so the device does not stay busy forever.
                if let Err(code) = self.driver.stop_exposure(camera_id) {
                    warn!("camera {camera_index}: failed to abort timed-out exposure: {code}");
                }
                Err(CameraError::ExposureTimeout {
                    camera_index,
                    waited: options.deadline.unwrap_or_default(),
                })
            }
        }
    }

    /// Take one picture into `buffer`.
    ///
    /// `buffer` must be sized to the configured ROI's [`Roi::image_bytes`].
    /// The request is rejected with [`CameraError::Busy`] unless the device
    /// reports idle at the moment of the call; there is no queueing.
    ///
    /// Exposure time itself is governed by the `Exposure` control, not by an
    /// argument here.
    pub fn capture(&mut self, buffer: &mut [u8]) -> Result<()> {
        let status = self.exposure_status()?;
        if status != ExposureStatus::Idle {
            return Err(CameraError::Busy {
                camera_index: self.camera_index,
                status,
            });
        }

        let camera_id = self.info.camera_id;
        self.driver
            .start_exposure(camera_id, false)
            .map_err(|code| self.device_error("failed to start exposure", code))?;

        // The status can still read idle for a short while right after a
        // successful start; wait out that window first.
        self.wait_while(ExposureStatus::Idle)?;
        let terminal = self.wait_while(ExposureStatus::Working)?;

        if terminal == ExposureStatus::Failed {
            return Err(CameraError::Capture {
                camera_index: self.camera_index,
            });
        }

        debug!(
            "camera {}: exposure settled ({terminal}), reading {} bytes",
            self.camera_index,
            buffer.len()
        );
        self.driver
            .exposure_data(camera_id, buffer)
            .map_err(|code| self.device_error("failed to read image after capture", code))
    }

    /// Start a guiding pulse on the ST4 port.
    pub fn pulse_guide_on(&mut self, direction: GuideDirection) -> Result<()> {
        self.driver
            .pulse_guide_on(self.info.camera_id, direction)
            .map_err(|code| self.device_error("failed to set pulse guide on", code))
    }

    /// Stop a guiding pulse on the ST4 port.
    pub fn pulse_guide_off(&mut self, direction: GuideDirection) -> Result<()> {
        self.driver
            .pulse_guide_off(self.info.camera_id, direction)
            .map_err(|code| self.device_error("failed to set off pulse guide", code))
    }

    /// Enable device-side dark-frame subtraction with the given reference
    /// frame. The file must exist; its content is interpreted by the driver.
    pub fn enable_dark_subtract(&mut self, dark_frame: &Path) -> Result<()> {
        if !dark_frame.exists() {
            return Err(CameraError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file not found: {}", dark_frame.display()),
            )));
        }
        self.driver
            .enable_dark_subtract(self.info.camera_id, dark_frame)
            .map_err(|code| self.device_error("failed to enable dark subtract", code))
    }

    /// Disable device-side dark-frame subtraction.
    pub fn disable_dark_subtract(&mut self) -> Result<()> {
        self.driver
            .disable_dark_subtract(self.info.camera_id)
            .map_err(|code| self.device_error("failed to disable dark subtract", code))
    }

    /// Set the trigger behavior of a trigger-capable camera.
    pub fn set_camera_mode(&mut self, mode: CameraMode) -> Result<()> {
        self.driver
            .set_camera_mode(self.info.camera_id, mode)
            .map_err(|code| self.device_error("failed to set camera mode", code))
    }

    /// Human-readable summary: SDK version, device facts, and an aligned
    /// table of every control's live state.
    pub fn report(&mut self) -> Result<String> {
        let controls = self.controls()?;

        let name_width = controls
            .keys()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max("controllable".len())
            + 4;
        let column = |header: &str, values: &mut dyn Iterator<Item = i64>| {
            values
                .map(|value| value.to_string().len())
                .max()
                .unwrap_or(0)
                .max(header.len())
                + 2
        };
        let value_width = column("value", &mut controls.values().map(|c| c.value));
        let min_width = column("min value", &mut controls.values().map(|c| c.min_value));
        let max_width = column("max value", &mut controls.values().map(|c| c.max_value));

        let mut out = String::new();
        let _ = writeln!(out);
        let _ = writeln!(out, "(asi sdk: {})", self.driver.sdk_version());
        let _ = writeln!(out, "{}", self.info);
        let _ = writeln!(
            out,
            "|{:<name_width$}|{:>value_width$} |{:>min_width$} |{:>max_width$} \
             |auto-mode |in auto-mode |writable",
            "controllable", "value", "min value", "max value"
        );
        let _ = writeln!(out, "--");
        for (name, control) in &controls {
            let _ = writeln!(
                out,
                "|{:<name_width$}|{:>value_width$} |{:>min_width$} |{:>max_width$} \
                 |{:^9} |{:^12} |{:^8}",
                name,
                control.value,
                control.min_value,
                control.max_value,
                mark(control.supports_auto),
                mark(control.is_auto),
                mark(control.is_writable)
            );
        }
        Ok(out)
    }
}

const fn mark(value: bool) -> char {
    if value {
        '*'
    } else {
        '-'
    }
}

impl<D: AsiDriver> Drop for Camera<D> {
    /// Release the handle unconditionally; a close failure is logged, never
    /// escalated.
    fn drop(&mut self) {
        if let Err(code) = self.driver.close(self.info.camera_id) {
            warn!(
                "camera {}: failed to close the camera: {code}",
                self.camera_index
            );
        }
    }
}
