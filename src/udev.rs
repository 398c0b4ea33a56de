//! USB buffer-size permission check and udev rule remediation.
//!
//! ASI cameras need the kernel's usbfs memory budget raised (the vendor's
//! udev rules set it to 200 MB); with the stock budget, large frames fail to
//! transfer in ways that look like device faults. The check here turns that
//! condition into an actionable [`CameraError::Permission`]. It is not run
//! implicitly at session open — call it from setup tooling.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{CameraError, Result};

/// Kernel parameter holding the usbfs memory budget in MB.
pub const USBFS_MEMORY_PATH: &str = "/sys/module/usbcore/parameters/usbfs_memory_mb";

/// Budget the vendor's udev rules configure.
pub const REQUIRED_USBFS_MEMORY_MB: u32 = 200;

/// File name of the remediation rules.
pub const UDEV_RULES_FILE: &str = "99-asi.rules";

const UDEV_RULES: &str = "\
ACTION==\"add\", ATTR{idVendor}==\"03c3\", \
RUN+=\"/bin/sh -c '/bin/echo 200 >/sys/module/usbcore/parameters/usbfs_memory_mb'\"
# All ASI Cameras and filter wheels
SUBSYSTEMS==\"usb\", ATTR{idVendor}==\"03c3\", MODE=\"0666\"
";

/// Check that the usbfs memory budget is large enough for frame transfers.
///
/// # Errors
///
/// [`CameraError::Permission`] when the budget is below
/// [`REQUIRED_USBFS_MEMORY_MB`], [`CameraError::Io`] when the kernel
/// parameter cannot be read at all.
pub fn check_usbfs_memory() -> Result<()> {
    let contents = fs::read_to_string(USBFS_MEMORY_PATH)?;
    check_budget(&contents)
}

fn check_budget(contents: &str) -> Result<()> {
    let reported = contents.trim().parse::<u32>().unwrap_or(0);
    if reported < REQUIRED_USBFS_MEMORY_MB {
        return Err(CameraError::Permission {
            usbfs_memory_mb: reported,
        });
    }
    Ok(())
}

/// Write the vendor's `99-asi.rules` file into `directory` and return its
/// path. The caller is expected to install it under `/lib/udev/rules.d` and
/// reconnect the camera.
pub fn write_udev_rules(directory: &Path) -> io::Result<PathBuf> {
    let path = directory.join(UDEV_RULES_FILE);
    fs::write(&path, UDEV_RULES)?;
    Ok(path)
}
