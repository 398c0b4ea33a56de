//! Runtime-discovered registry of controllable parameters.
//!
//! Cameras expose a model-dependent set of numeric controls (exposure time,
//! gain, target temperature, ...) that is only known after asking the device.
//! The registry is rebuilt from scratch at session open; static capabilities
//! are kept, while live values are re-read from the device on every query so
//! they never go stale.

use std::collections::BTreeMap;

use crate::driver::{AsiDriver, ControlCaps};
use crate::error::{CameraError, Result};

/// One named, numeric, device-tunable parameter with its live state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controllable {
    /// Unique name, the key the registry is addressed by.
    pub name: String,
    /// Smallest accepted value (inclusive).
    pub min_value: i64,
    /// Largest accepted value (inclusive).
    pub max_value: i64,
    /// Factory default value. Need not equal the current value.
    pub default_value: i64,
    /// Current value as reported by the device.
    pub value: i64,
    /// Whether the control accepts writes.
    pub is_writable: bool,
    /// Whether the device is currently driving this control autonomously.
    pub is_auto: bool,
    /// Whether the device can drive this control autonomously.
    pub supports_auto: bool,
}

impl Controllable {
    /// Whether `value` lies in the control's declared range.
    #[must_use]
    pub const fn contains(&self, value: i64) -> bool {
        self.min_value <= value && value <= self.max_value
    }

    fn new(caps: &ControlCaps, value: i64, is_auto: bool) -> Self {
        Self {
            name: caps.name.clone(),
            min_value: caps.min_value,
            max_value: caps.max_value,
            default_value: caps.default_value,
            value,
            is_writable: caps.is_writable,
            is_auto,
            supports_auto: caps.supports_auto,
        }
    }
}

/// Mapping of control name to capability descriptor for one open camera.
///
/// Built once per session by [`ControlRegistry::discover`]; the descriptors
/// are static but every read of a control's value goes to the device.
#[derive(Debug, Default)]
pub struct ControlRegistry {
    camera_index: i32,
    camera_id: i32,
    caps: BTreeMap<String, ControlCaps>,
}

impl ControlRegistry {
    /// Query the device for every control it exposes.
    ///
    /// Discovery is all-or-nothing: if the count query or any single
    /// capability fetch fails, the whole discovery fails with
    /// [`CameraError::Device`].
    pub fn discover<D: AsiDriver>(
        driver: &mut D,
        camera_index: i32,
        camera_id: i32,
    ) -> Result<Self> {
        let count = driver.control_count(camera_id).map_err(|code| {
            CameraError::device(
                "failed to read the number of controllable parameters",
                camera_index,
                code,
            )
        })?;

        let mut caps = BTreeMap::new();
        for control_index in 0..count {
            let control = driver
                .control_caps(camera_id, control_index)
                .map_err(|code| {
                    CameraError::device(
                        &format!("failed to get capabilities for controllable {control_index}"),
                        camera_index,
                        code,
                    )
                })?;
            caps.insert(control.name.clone(), control);
        }

        Ok(Self {
            camera_index,
            camera_id,
            caps,
        })
    }

    /// Number of known controls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.caps.len()
    }

    /// Whether the device exposes no controls at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.caps.is_empty()
    }

    /// Names of all known controls, in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.caps.keys().map(String::as_str)
    }

    /// Capability descriptor of a control.
    ///
    /// # Errors
    ///
    /// [`CameraError::UnknownControl`] if `name` is not a known control.
    pub fn caps(&self, name: &str) -> Result<&ControlCaps> {
        self.caps
            .get(name)
            .ok_or_else(|| CameraError::UnknownControl {
                control: name.to_owned(),
            })
    }

    fn read<D: AsiDriver>(&self, driver: &mut D, caps: &ControlCaps) -> Result<Controllable> {
        let (value, is_auto) = driver
            .control_value(self.camera_id, caps.id)
            .map_err(|code| {
                CameraError::device(
                    &format!("failed to read values for parameter {}", caps.name),
                    self.camera_index,
                    code,
                )
            })?;
        Ok(Controllable::new(caps, value, is_auto))
    }

    /// A control's descriptor merged with its live value and auto state.
    ///
    /// # Errors
    ///
    /// [`CameraError::UnknownControl`] if `name` is unknown,
    /// [`CameraError::Device`] if the value read fails.
    pub fn get<D: AsiDriver>(&self, driver: &mut D, name: &str) -> Result<Controllable> {
        let caps = self.caps(name)?;
        self.read(driver, caps)
    }

    /// Write a control value in non-auto mode.
    ///
    /// Range enforcement on this path belongs to the device; a rejected
    /// value surfaces as [`CameraError::Device`]. Use
    /// [`ControlRegistry::set_checked`] for a client-side range check.
    pub fn set<D: AsiDriver>(&self, driver: &mut D, name: &str, value: i64) -> Result<()> {
        let caps = self.caps(name)?;
        driver
            .set_control_value(self.camera_id, caps.id, value, false)
            .map_err(|code| {
                CameraError::device(
                    &format!("failed to set values for controllable: {name}"),
                    self.camera_index,
                    code,
                )
            })
    }

    /// Write a control value, rejecting it client-side before any device
    /// write if the control is read-only or the value is out of range.
    ///
    /// # Errors
    ///
    /// [`CameraError::NotWritable`] or [`CameraError::ControlOutOfRange`]
    /// before the device is touched, in addition to everything
    /// [`ControlRegistry::set`] can return.
    pub fn set_checked<D: AsiDriver>(&self, driver: &mut D, name: &str, value: i64) -> Result<()> {
        let control = self.get(driver, name)?;
        if !control.is_writable {
            return Err(CameraError::NotWritable {
                control: name.to_owned(),
            });
        }
        if !control.contains(value) {
            return Err(CameraError::ControlOutOfRange {
                control: name.to_owned(),
                value,
                min: control.min_value,
                max: control.max_value,
            });
        }
        self.set(driver, name, value)
    }

    /// Hand a control over to the device's auto mode.
    ///
    /// The control's current value is re-written with the auto flag set, so
    /// the device starts adjusting from where it is.
    ///
    /// # Errors
    ///
    /// [`CameraError::AutoUnsupported`] (without any device write) if the
    /// control has no auto mode.
    pub fn set_auto<D: AsiDriver>(&self, driver: &mut D, name: &str) -> Result<()> {
        let caps = self.caps(name)?;
        let control = self.read(driver, caps)?;
        if !control.supports_auto {
            return Err(CameraError::AutoUnsupported {
                control: name.to_owned(),
            });
        }
        driver
            .set_control_value(self.camera_id, caps.id, control.value, true)
            .map_err(|code| {
                CameraError::device(
                    &format!("failed to set auto-mode for controllable: {name}"),
                    self.camera_index,
                    code,
                )
            })
    }

    /// Re-read every known control's live value.
    pub fn snapshot<D: AsiDriver>(
        &self,
        driver: &mut D,
    ) -> Result<BTreeMap<String, Controllable>> {
        let mut controls = BTreeMap::new();
        for caps in self.caps.values() {
            controls.insert(caps.name.clone(), self.read(driver, caps)?);
        }
        Ok(controls)
    }
}

#[cfg(test)]
mod tests {
    use crate::driver::ControlId;
    use crate::error::SdkError;
    use crate::mock::{writable_control, MockDriver, MOCK_CAMERA_ID};

    use super::*;

    fn registry_with_gain(driver: &mut MockDriver) -> ControlRegistry {
        ControlRegistry::discover(driver, 0, MOCK_CAMERA_ID).expect("discovery failed")
    }

    #[test]
    fn discover_returns_every_control_with_its_live_value() {
        let mut driver = MockDriver::new().with_control(writable_control("Gain", 0, 100, 50), 50);
        let registry = registry_with_gain(&mut driver);

        assert_eq!(registry.len(), 1);
        let gain = registry.get(&mut driver, "Gain").expect("get failed");
        assert_eq!(gain.value, 50);
        assert_eq!(gain.min_value, 0);
        assert_eq!(gain.max_value, 100);
        assert_eq!(gain.default_value, 50);
        assert!(gain.is_writable);
        assert!(!gain.supports_auto);
        assert!(!gain.is_auto);
    }

    #[test]
    fn discovery_is_all_or_nothing() {
        let mut driver = MockDriver::new()
            .with_control(writable_control("Gain", 0, 100, 50), 50)
            .with_control(writable_control("Exposure", 32, 2_000_000_000, 10_000), 10_000);
        driver.fail_control_caps_at = Some(1);

        let err = ControlRegistry::discover(&mut driver, 0, MOCK_CAMERA_ID)
            .expect_err("discovery must fail when any capability fetch fails");
        assert!(matches!(err, CameraError::Device { .. }));
    }

    #[test]
    fn unknown_controls_are_rejected_regardless_of_contents() {
        let mut driver = MockDriver::new().with_control(writable_control("Gain", 0, 100, 50), 50);
        let registry = registry_with_gain(&mut driver);

        let err = registry
            .get(&mut driver, "nonexistent")
            .expect_err("unknown control");
        assert!(matches!(
            err,
            CameraError::UnknownControl { control } if control == "nonexistent"
        ));

        let err = registry
            .set(&mut driver, "nonexistent", 1)
            .expect_err("unknown control");
        assert!(matches!(err, CameraError::UnknownControl { .. }));
        assert!(driver.control_writes.is_empty(), "no device write expected");
    }

    #[test]
    fn set_writes_through_and_get_observes_the_new_value() {
        let mut driver = MockDriver::new().with_control(writable_control("Gain", 0, 100, 50), 50);
        let registry = registry_with_gain(&mut driver);

        registry.set(&mut driver, "Gain", 75).expect("set failed");
        assert_eq!(
            driver.control_writes,
            vec![(ControlId(0), 75, false)],
            "exactly one non-auto write expected"
        );

        let gain = registry.get(&mut driver, "Gain").expect("get failed");
        assert_eq!(gain.value, 75);
    }

    #[test]
    fn set_surfaces_device_rejections() {
        let mut driver = MockDriver::new().with_control(writable_control("Gain", 0, 100, 50), 50);
        driver.fail_set_control = Some(SdkError::GeneralError);
        let registry = registry_with_gain(&mut driver);

        let err = registry
            .set(&mut driver, "Gain", 75)
            .expect_err("device rejected the write");
        assert!(matches!(
            err,
            CameraError::Device {
                code: SdkError::GeneralError,
                ..
            }
        ));
    }

    #[test]
    fn set_checked_rejects_out_of_range_values_before_the_device() {
        let mut driver = MockDriver::new().with_control(writable_control("Gain", 0, 100, 50), 50);
        let registry = registry_with_gain(&mut driver);

        let err = registry
            .set_checked(&mut driver, "Gain", 101)
            .expect_err("101 is above the maximum");
        assert!(matches!(
            err,
            CameraError::ControlOutOfRange {
                value: 101,
                min: 0,
                max: 100,
                ..
            }
        ));
        assert!(driver.control_writes.is_empty(), "no device write expected");

        registry
            .set_checked(&mut driver, "Gain", 100)
            .expect("boundary value is in range");
    }

    #[test]
    fn set_checked_rejects_read_only_controls() {
        let mut caps = writable_control("Temperature", -100, 1000, 0);
        caps.is_writable = false;
        let mut driver = MockDriver::new().with_control(caps, 215);
        let registry = registry_with_gain(&mut driver);

        let err = registry
            .set_checked(&mut driver, "Temperature", 0)
            .expect_err("read-only control");
        assert!(matches!(err, CameraError::NotWritable { .. }));
        assert!(driver.control_writes.is_empty(), "no device write expected");
    }

    #[test]
    fn set_auto_requires_auto_support_and_performs_no_write_otherwise() {
        let mut driver = MockDriver::new().with_control(writable_control("Gain", 0, 100, 50), 50);
        let registry = registry_with_gain(&mut driver);

        let err = registry
            .set_auto(&mut driver, "Gain")
            .expect_err("Gain has no auto mode");
        assert!(matches!(
            err,
            CameraError::AutoUnsupported { control } if control == "Gain"
        ));
        assert!(driver.control_writes.is_empty(), "no device write expected");
    }

    #[test]
    fn set_auto_rewrites_the_current_value_with_the_auto_flag() {
        let mut caps = writable_control("WB_R", 1, 99, 52);
        caps.supports_auto = true;
        let mut driver = MockDriver::new().with_control(caps, 60);
        let registry = registry_with_gain(&mut driver);

        registry.set_auto(&mut driver, "WB_R").expect("set_auto failed");
        assert_eq!(
            driver.control_writes,
            vec![(ControlId(0), 60, true)],
            "the live value must be re-written in auto mode"
        );
    }

    #[test]
    fn snapshot_reads_every_control() {
        let mut auto_exposure = writable_control("Exposure", 32, 2_000_000_000, 10_000);
        auto_exposure.supports_auto = true;
        let mut driver = MockDriver::new()
            .with_control(writable_control("Gain", 0, 100, 50), 75)
            .with_control(auto_exposure, 20_000);
        let registry = registry_with_gain(&mut driver);

        let controls = registry.snapshot(&mut driver).expect("snapshot failed");
        assert_eq!(controls.len(), 2);
        assert_eq!(controls["Gain"].value, 75);
        assert_eq!(controls["Exposure"].value, 20_000);
    }
}
