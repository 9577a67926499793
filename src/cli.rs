// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for booth maintenance
//!
//! These exist for setting a kiosk up: finding the camera port and
//! sanity-checking a capture through the full pipeline without running a
//! session.

use chrono::Local;
use photobooth::backends::{self, CaptureSource, V4l2Source};
use photobooth::compositing::generate_color_templates;
use photobooth::config::BoothConfig;
use photobooth::pipeline::Pipeline;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// List camera ports that pass the open/probe protocol
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let ports = backends::scan_ports();

    if ports.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Working cameras:");
    for port in ports {
        println!("  [{}] /dev/video{}", port, port);
    }

    Ok(())
}

/// Capture one oriented photo through the pipeline
///
/// Without an explicit port the booth config decides; a missing
/// booth.json falls back to config defaults (port 0).
pub fn take_photo(
    camera: Option<usize>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let port = resolve_camera_port(camera, Path::new("booth.json"))?;

    let mut source = V4l2Source::new(port);
    println!("Opening {}...", source.name());
    source.open()?;

    let pipeline = Pipeline::start(Box::new(source), 3, None)?;
    let buffer = pipeline.frame_buffer();

    // Wait for the first processed frame
    println!("Capturing...");
    let deadline = Instant::now() + Duration::from_secs(5);
    let frame = loop {
        if let Some(frame) = buffer.latest() {
            break frame;
        }
        if Instant::now() >= deadline {
            pipeline.shutdown();
            return Err("No frame arrived within 5s".into());
        }
        std::thread::sleep(Duration::from_millis(20));
    };
    pipeline.shutdown();

    let path = output.unwrap_or_else(|| {
        PathBuf::from(format!(
            "photo_{}.jpg",
            Local::now().format("%Y%m%d_%H%M%S")
        ))
    });
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    frame.image.save(&path)?;
    println!("Saved {} ({}x{})", path.display(), frame.image.width(), frame.image.height());

    Ok(())
}

/// Explicit flag wins; otherwise the config file (or its defaults) decides
fn resolve_camera_port(
    flag: Option<usize>,
    config_path: &Path,
) -> Result<usize, Box<dyn std::error::Error>> {
    match flag {
        Some(port) => Ok(port),
        None => Ok(BoothConfig::load(config_path)?.camera_port),
    }
}

/// Set a kiosk directory up: folders, default config, fallback templates
pub fn init_booth(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = dir.join("booth.json");
    let config = BoothConfig::load(&config_path)?;

    for sub in [&config.photos_dir, &config.output_dir, &config.frames_dir] {
        std::fs::create_dir_all(dir.join(sub))?;
    }

    let generated = generate_color_templates(
        &dir.join(&config.frames_dir),
        config.output_width,
        config.output_height,
    )?;
    for path in &generated {
        println!("Generated {}", path.display());
    }

    if !config_path.exists() {
        config.save(&config_path)?;
        println!("Wrote {}", config_path.display());
    }

    println!("Booth initialized at {}", dir.display());
    Ok(())
}
