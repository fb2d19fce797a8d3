use std::env;
use std::path::{Path, PathBuf};

const HEADER: &str = "include/tithe_core.h";

fn main() {
    println!("cargo:rerun-if-changed={}", HEADER);

    // Apple hosts link the static library from Swift
    if env::var("TARGET").is_ok_and(|target| target.contains("apple")) {
        println!("cargo:rustc-link-lib=framework=Foundation");
    }

    // Copy the header next to the built library: target/<profile>/
    let Ok(out_dir) = env::var("OUT_DIR") else {
        return;
    };
    let Some(target_dir) = PathBuf::from(out_dir).ancestors().nth(3).map(Path::to_path_buf) else {
        return;
    };
    if Path::new(HEADER).exists() {
        if let Err(e) = std::fs::copy(HEADER, target_dir.join("tithe_core.h")) {
            println!("cargo:warning=Failed to copy header file: {}", e);
        }
    }
}
