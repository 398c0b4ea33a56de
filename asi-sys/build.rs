//! Generates ASICamera2 bindings when the `asi-sdk` feature is enabled.
//!
//! Without the feature this crate compiles to an empty library, so the
//! workspace builds on machines without the vendor SDK installed.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=wrapper.h");
    println!("cargo:rerun-if-env-changed=ASI_SDK_DIR");

    if env::var_os("CARGO_FEATURE_ASI_SDK").is_none() {
        return;
    }

    let sdk_dir = PathBuf::from(
        env::var("ASI_SDK_DIR").expect("ASI_SDK_DIR must be set to build with the asi-sdk feature"),
    );

    println!("cargo:rustc-link-search=native={}", sdk_dir.join("lib").display());
    println!("cargo:rustc-link-lib=ASICamera2");
    println!("cargo:rustc-link-lib=usb-1.0");

    let bindings = bindgen::Builder::default()
        .header("wrapper.h")
        .clang_arg(format!("-I{}", sdk_dir.join("include").display()))
        .allowlist_function("ASI.*")
        .allowlist_type("ASI.*")
        .allowlist_var("ASI.*")
        .generate()
        .expect("failed to generate ASICamera2 bindings");

    let out_path = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set"));
    bindings
        .write_to_file(out_path.join("bindings.rs"))
        .expect("failed to write bindings");
}
