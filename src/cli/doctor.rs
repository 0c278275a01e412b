//! Environment readiness check.

use crate::config::{self, EngineConfig};
use crate::driver::chromium::find_chromium;
use anyhow::Result;

/// Check Chromium availability, the data directory, and the config file.
pub async fn run() -> Result<()> {
    println!("Applyflow Doctor");
    println!("================");
    println!();

    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    println!("OS:   {os}");
    println!("Arch: {arch}");
    println!();

    let chromium_path = find_chromium();
    match &chromium_path {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!(
            "[!!] Chromium NOT found. Install google-chrome or chromium, or set APPLYFLOW_CHROMIUM_PATH."
        ),
    }

    let data_dir = config::data_dir();
    match std::fs::create_dir_all(&data_dir) {
        Ok(()) => println!("[OK] Data directory writable: {}", data_dir.display()),
        Err(e) => println!("[!!] Data directory not writable: {e}"),
    }

    let config_path = config::config_path();
    if config_path.exists() {
        match EngineConfig::load() {
            Ok(config) => println!(
                "[OK] Config parsed: profile={}, max_applications={}",
                config.pacing_profile, config.max_applications_per_session
            ),
            Err(e) => println!("[!!] Config invalid: {e}"),
        }
    } else {
        println!("[--] No config file (defaults in effect): {}", config_path.display());
    }

    println!();
    if chromium_path.is_some() {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }

    Ok(())
}
