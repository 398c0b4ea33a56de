//! asi-cam-control binary for inspecting and configuring ASI cameras.
//!
//! Usage:
//!   asi-cam-control [INDEX]                      print the camera report
//!   asi-cam-control [INDEX] save-config PATH     dump the setup as TOML
//!   asi-cam-control [INDEX] apply-config PATH    apply a TOML setup

use std::env;
use std::path::Path;
use std::process;

use asi_cam_control::{Camera, CameraConfig, SdkDriver};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn run() -> asi_cam_control::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    let (index, command) = match args.first().map(|arg| arg.parse::<i32>()) {
        Some(Ok(index)) => (index, &args[1..]),
        _ => (0, &args[..]),
    };

    let mut camera = Camera::open(SdkDriver::new(), index)?;

    match command {
        [action, path] if action == "save-config" => {
            CameraConfig::from_camera(&mut camera)?.save(Path::new(path))?;
            println!("saved camera {index} configuration to {path}");
        }
        [action, path] if action == "apply-config" => {
            CameraConfig::from_path(Path::new(path))?.apply(&mut camera)?;
            println!("applied {path} to camera {index}");
        }
        _ => print!("{}", camera.report()?),
    }

    Ok(())
}
