//! Integration tests against a real ASI camera.
//!
//! These tests require:
//! - The `integration` feature flag: `cargo test --features integration`
//! - A ZWO ASI camera connected over USB
//! - The vendor udev rules installed (see `udev::write_udev_rules`)
//!
//! They exercise the full bring-up, configuration, and capture path, and
//! will fail loudly rather than silently skip when no camera is connected,
//! so CI catches a missing or misconfigured device.

#![cfg(feature = "integration")]

use asi_cam_control::{
    AsiDriver, Camera, CameraConfig, ExposureOptions, ImageType, Roi, SdkDriver,
};
use serial_test::serial;
use std::time::Duration;

/// Fail the test run if no camera is connected.
///
/// Integration tests MUST have a camera available - they should fail, not
/// silently skip.
macro_rules! require_camera {
    () => {{
        let mut driver = SdkDriver::new();
        if driver.camera_count() == 0 {
            panic!(
                "no ASI camera connected.\n\
                 Connect a camera and install the udev rules, or run unit \
                 tests only: cargo test --lib"
            );
        }
        0
    }};
}

/// An ROI every ASI model accepts: full alignment, bin 1, raw 8-bit.
fn small_roi() -> Roi {
    Roi {
        start_x: 0,
        start_y: 0,
        width: 640,
        height: 480,
        bins: 1,
        image_type: ImageType::Raw8,
    }
}

#[test]
#[serial]
fn test_open_and_report() {
    let index = require_camera!();

    let mut camera = Camera::open(SdkDriver::new(), index).expect("Failed to open camera");
    let info = camera.info().clone();

    assert!(!info.name.is_empty(), "camera must report a name");
    assert!(info.max_width > 0, "max width should be positive");
    assert!(info.max_height > 0, "max height should be positive");
    assert!(!info.supported_bins.is_empty(), "bins set must be non-empty");

    let report = camera.report().expect("Failed to build report");
    println!("{report}");
    assert!(report.contains(&info.name));
}

#[test]
#[serial]
fn test_control_discovery_and_write() {
    let index = require_camera!();

    let mut camera = Camera::open(SdkDriver::new(), index).expect("Failed to open camera");
    let controls = camera.controls().expect("Failed to read controls");
    assert!(!controls.is_empty(), "every ASI camera exposes controls");

    for (name, control) in &controls {
        println!(
            "{name}: {} (range {}..={})",
            control.value, control.min_value, control.max_value
        );
        assert!(
            control.min_value <= control.value && control.value <= control.max_value,
            "reported value must lie in the declared range"
        );
    }

    // Every ASI model has a writable Gain control.
    let gain = controls.get("Gain").expect("Gain control missing");
    assert!(gain.is_writable);

    let target = (gain.min_value + gain.max_value) / 2;
    camera
        .set_control("Gain", target)
        .expect("Failed to set Gain");
    let gain = camera.control("Gain").expect("Failed to re-read Gain");
    assert_eq!(gain.value, target);
}

#[test]
#[serial]
fn test_roi_round_trip() {
    let index = require_camera!();

    let mut camera = Camera::open(SdkDriver::new(), index).expect("Failed to open camera");
    camera.set_roi(&small_roi()).expect("Failed to set ROI");

    let roi = camera.read_roi().expect("Failed to read ROI");
    assert_eq!(roi.width, 640);
    assert_eq!(roi.height, 480);
    assert_eq!(roi.bins, 1);
    assert_eq!(roi.image_type, ImageType::Raw8);
}

#[test]
#[serial]
fn test_capture_single_frame() {
    let index = require_camera!();

    let mut camera = Camera::open(SdkDriver::new(), index).expect("Failed to open camera");
    camera.set_roi(&small_roi()).expect("Failed to set ROI");

    // 10 ms exposure keeps the test fast; a deadline keeps it bounded.
    camera
        .set_control("Exposure", 10_000)
        .expect("Failed to set exposure time");
    camera.set_exposure_options(ExposureOptions {
        poll_interval: Duration::from_micros(500),
        deadline: Some(Duration::from_secs(10)),
    });

    let mut buffer = vec![0_u8; camera.roi().image_bytes()];
    camera.capture(&mut buffer).expect("Failed to capture");

    println!("Captured {} bytes", buffer.len());
    assert!(
        buffer.iter().any(|&byte| byte != 0),
        "a real exposure should produce at least one non-zero pixel"
    );
}

#[test]
#[serial]
fn test_config_round_trip() {
    let index = require_camera!();

    let mut camera = Camera::open(SdkDriver::new(), index).expect("Failed to open camera");
    camera.set_roi(&small_roi()).expect("Failed to set ROI");

    let config = CameraConfig::from_camera(&mut camera).expect("Failed to export config");
    assert_eq!(config.roi.width, 640);

    let file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    config.save(file.path()).expect("Failed to save config");

    let loaded = CameraConfig::from_path(file.path()).expect("Failed to load config");
    loaded.apply(&mut camera).expect("Failed to apply config");
}
