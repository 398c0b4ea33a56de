//! TOML camera profiles.
//!
//! A profile captures everything needed to reproduce a camera setup: the
//! `[roi]` table and a `[controllables]` map whose values are either a fixed
//! integer or the literal string `"auto"`. Profiles round-trip through
//! [`CameraConfig::from_camera`] and [`CameraConfig::apply`], so a saved file
//! can be edited by hand and applied back.
//!
//! ```toml
//! [roi]
//! start_x = 0
//! start_y = 0
//! width = 640
//! height = 480
//! bins = 1
//! type = "raw8"
//!
//! [controllables]
//! Exposure = "auto"
//! Gain = 120
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::driver::AsiDriver;
use crate::error::Result;
use crate::roi::Roi;

/// Marker for the `"auto"` profile value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoMode {
    /// Let the device drive the control.
    Auto,
}

/// Desired state of one control in a profile: a fixed value or `"auto"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlSetting {
    /// Fixed value, written in non-auto mode.
    Value(i64),
    /// Hand the control to the device's auto mode.
    Mode(AutoMode),
}

/// A complete camera setup: geometry plus desired control states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// The capture geometry to apply.
    pub roi: Roi,
    /// Desired control states, keyed by control name.
    pub controllables: BTreeMap<String, ControlSetting>,
}

impl CameraConfig {
    /// Parse a profile from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a profile from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Render the profile as TOML text.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the profile to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Snapshot the camera's current setup as a profile.
    ///
    /// Only writable controls are exported; controls currently in auto mode
    /// are recorded as `"auto"` rather than their momentary value.
    pub fn from_camera<D: AsiDriver>(camera: &mut Camera<D>) -> Result<Self> {
        let mut controllables = BTreeMap::new();
        for (name, control) in camera.controls()? {
            if !control.is_writable {
                continue;
            }
            let setting = if control.is_auto {
                ControlSetting::Mode(AutoMode::Auto)
            } else {
                ControlSetting::Value(control.value)
            };
            controllables.insert(name, setting);
        }
        Ok(Self {
            roi: *camera.roi(),
            controllables,
        })
    }

    /// Apply the profile to a camera: the ROI first, then every control.
    pub fn apply<D: AsiDriver>(&self, camera: &mut Camera<D>) -> Result<()> {
        camera.set_roi(&self.roi)?;
        for (name, setting) in &self.controllables {
            match setting {
                ControlSetting::Value(value) => camera.set_control(name, *value)?,
                ControlSetting::Mode(AutoMode::Auto) => camera.set_auto(name)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::CameraError;
    use crate::mock::{auto_control, read_only_control, writable_control, MockDriver};
    use crate::types::ImageType;

    use super::*;

    const PROFILE: &str = r#"
[roi]
start_x = 0
start_y = 0
width = 640
height = 480
bins = 1
type = "raw8"

[controllables]
Exposure = "auto"
Gain = 120
"#;

    fn open_camera(driver: MockDriver) -> Camera<MockDriver> {
        Camera::open(driver, 0).expect("open failed")
    }

    #[test]
    fn profiles_parse_fixed_values_and_auto_markers() {
        let config = CameraConfig::from_toml_str(PROFILE).expect("parse failed");
        assert_eq!(config.roi.width, 640);
        assert_eq!(config.roi.image_type, ImageType::Raw8);
        assert_eq!(
            config.controllables["Gain"],
            ControlSetting::Value(120)
        );
        assert_eq!(
            config.controllables["Exposure"],
            ControlSetting::Mode(AutoMode::Auto)
        );
    }

    #[test]
    fn profiles_reject_arbitrary_strings_and_missing_roi_keys() {
        let err = CameraConfig::from_toml_str(
            "[roi]\nstart_x = 0\nstart_y = 0\nwidth = 640\nheight = 480\nbins = 1\ntype = \"raw8\"\n\n[controllables]\nGain = \"fast\"\n",
        )
        .expect_err("only \"auto\" is an accepted string value");
        assert!(matches!(err, CameraError::ConfigParse(_)));

        CameraConfig::from_toml_str("[roi]\nwidth = 640\n\n[controllables]\n")
            .expect_err("incomplete roi tables must be rejected");
    }

    #[test]
    fn rendering_preserves_the_auto_marker() {
        let config = CameraConfig::from_toml_str(PROFILE).expect("parse failed");
        let rendered = config.to_toml_string().expect("render failed");
        assert!(rendered.contains("Exposure = \"auto\""));
        assert!(rendered.contains("Gain = 120"));

        let reparsed = CameraConfig::from_toml_str(&rendered).expect("reparse failed");
        assert_eq!(reparsed, config);
    }

    #[test]
    fn profiles_round_trip_through_a_file() {
        let config = CameraConfig::from_toml_str(PROFILE).expect("parse failed");
        let file = tempfile::NamedTempFile::new().expect("tempfile failed");
        config.save(file.path()).expect("save failed");

        let loaded = CameraConfig::from_path(file.path()).expect("load failed");
        assert_eq!(loaded, config);
    }

    #[test]
    fn apply_configures_the_roi_and_each_control() {
        let driver = MockDriver::new()
            .with_control(writable_control("Gain", 0, 600, 50), 50)
            .with_control(auto_control("Exposure", 32, 2_000_000_000, 10_000), 10_000);
        let mut camera = open_camera(driver);

        let config = CameraConfig::from_toml_str(PROFILE).expect("parse failed");
        config.apply(&mut camera).expect("apply failed");

        assert_eq!(camera.roi().width, 640);
        assert_eq!(camera.roi().image_type, ImageType::Raw8);

        let gain = camera.control("Gain").expect("Gain missing");
        assert_eq!(gain.value, 120);
        assert!(!gain.is_auto);

        let exposure = camera.control("Exposure").expect("Exposure missing");
        assert!(exposure.is_auto, "Exposure must end up in auto mode");
        assert_eq!(
            exposure.value, 10_000,
            "auto mode starts from the current value"
        );
    }

    #[test]
    fn from_camera_exports_writable_controls_only() {
        let driver = MockDriver::new()
            .with_control(writable_control("Gain", 0, 600, 50), 75)
            .with_control(read_only_control("Temperature", -100, 1000), 215);
        let mut camera = open_camera(driver);

        let config = CameraConfig::from_camera(&mut camera).expect("export failed");
        assert_eq!(
            config.controllables.get("Gain"),
            Some(&ControlSetting::Value(75))
        );
        assert!(!config.controllables.contains_key("Temperature"));
        assert_eq!(&config.roi, camera.roi());
    }
}
